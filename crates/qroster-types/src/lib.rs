//! Core type definitions for qroster.
//!
//! The data model is small: a [`Roster`] of [`School`] records,
//! each carrying a fixed ten-item [`Checklist`] and a cached completion
//! percentage, plus the [`Session`] that scopes what a signed-in
//! administrator may see.

pub mod checklist;
pub mod reference;
pub mod school;
pub mod session;

pub use checklist::{Checklist, ChecklistItem, completion_percentage, parse_checklist};
pub use reference::{
    AREAS, Area, RegionLookup, SUPER_ADMIN_EMAIL, area_by_id, region_for_email, seed_roster,
};
pub use school::{Roster, School, SchoolType};
pub use session::{Connectivity, LOCAL_SESSION_ID, Role, Scope, Session};
