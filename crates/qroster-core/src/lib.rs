//! qroster core: keeps the local and remote copies of the school roster
//! consistent, establishes sessions (with an offline fallback), and derives
//! what the signed-in administrator sees.

pub mod access;
pub mod config;
pub mod connectivity;
pub mod notice;
pub mod reconciler;
pub mod report;
pub mod session;
pub mod stats;

pub use access::{SchoolQuery, accessible_schools};
pub use config::{RemoteConfig, RosterConfig};
pub use connectivity::probe_connectivity;
pub use notice::{Notice, NoticeLevel};
pub use reconciler::{EditOutcome, Reconciler, StateChange, SyncOutcome};
pub use report::{ComplianceReport, ReportLine};
pub use session::{FALLBACK_PASSWORD, login, normalize_email, session_for_identity};
pub use stats::{AreaCompletion, DashboardStats, TypeCompletion, dashboard_stats};
