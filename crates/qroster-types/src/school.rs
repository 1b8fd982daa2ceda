//! School records and the roster that holds them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::checklist::{self, Checklist};

// ---------------------------------------------------------------------------
// School type
// ---------------------------------------------------------------------------

/// Closed set of vocational school categories.
///
/// Serialized with the Arabic names used by the stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchoolType {
    #[serde(rename = "صناعي")]
    Industrial,
    #[serde(rename = "فندقي")]
    Hospitality,
    #[serde(rename = "تجاري")]
    Commercial,
    #[serde(rename = "زراعي")]
    Agricultural,
}

impl SchoolType {
    pub const ALL: [Self; 4] = [
        Self::Industrial,
        Self::Hospitality,
        Self::Commercial,
        Self::Agricultural,
    ];

    /// Stored (Arabic) name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Industrial => "صناعي",
            Self::Hospitality => "فندقي",
            Self::Commercial => "تجاري",
            Self::Agricultural => "زراعي",
        }
    }

    /// ASCII alias accepted on the command line.
    pub const fn alias(self) -> &'static str {
        match self {
            Self::Industrial => "industrial",
            Self::Hospitality => "hospitality",
            Self::Commercial => "commercial",
            Self::Agricultural => "agricultural",
        }
    }
}

impl fmt::Display for SchoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchoolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == trimmed || kind.alias().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown school type: {s}"))
    }
}

// ---------------------------------------------------------------------------
// School
// ---------------------------------------------------------------------------

/// One school record.
///
/// `completion_percentage` is a cached derivation of `checklist`. It can only
/// change through [`School::set_checklist`], and decoding always recomputes
/// it, so a stale stored value never survives a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SchoolRecord")]
pub struct School {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SchoolType,
    pub area_id: String,
    pub admin_id: String,
    pub accreditation_date: String,
    checklist: Checklist,
    completion_percentage: u8,
}

/// Decoding shape of [`School`]; accepts either checklist encoding.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchoolRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: SchoolType,
    area_id: String,
    #[serde(default)]
    admin_id: String,
    #[serde(default)]
    accreditation_date: String,
    #[serde(deserialize_with = "checklist::deserialize_any_shape")]
    checklist: Checklist,
}

impl From<SchoolRecord> for School {
    fn from(record: SchoolRecord) -> Self {
        Self::new(
            record.id,
            record.name,
            record.kind,
            record.area_id,
            record.admin_id,
            record.accreditation_date,
        )
        .with_checklist(record.checklist)
    }
}

impl School {
    /// New school with an empty checklist.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: SchoolType,
        area_id: impl Into<String>,
        admin_id: impl Into<String>,
        accreditation_date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            area_id: area_id.into(),
            admin_id: admin_id.into(),
            accreditation_date: accreditation_date.into(),
            checklist: Checklist::default(),
            completion_percentage: 0,
        }
    }

    pub fn with_checklist(mut self, checklist: Checklist) -> Self {
        self.set_checklist(checklist);
        self
    }

    /// Replace the checklist and recompute the cached percentage.
    pub fn set_checklist(&mut self, checklist: Checklist) {
        self.checklist = checklist;
        self.completion_percentage = checklist.completion_percentage();
    }

    pub const fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    pub const fn completion_percentage(&self) -> u8 {
        self.completion_percentage
    }

    pub const fn is_complete(&self) -> bool {
        self.completion_percentage == 100
    }

    /// Trailing segment of the id, used as a short report code.
    pub fn short_code(&self) -> &str {
        self.id.rsplit('-').next().unwrap_or(&self.id)
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Ordered collection of schools keyed by `id`.
///
/// Ids are assumed unique; lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    schools: Vec<School>,
}

impl Roster {
    pub const fn new(schools: Vec<School>) -> Self {
        Self { schools }
    }

    pub fn len(&self) -> usize {
        self.schools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, School> {
        self.schools.iter()
    }

    pub fn as_slice(&self) -> &[School] {
        &self.schools
    }

    pub fn get(&self, id: &str) -> Option<&School> {
        self.schools.iter().find(|school| school.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Copy of this roster with one school's checklist replaced, or `None`
    /// when `id` is not present.
    pub fn with_checklist(&self, id: &str, checklist: Checklist) -> Option<Self> {
        let index = self.schools.iter().position(|school| school.id == id)?;
        let mut next = self.clone();
        next.schools[index].set_checklist(checklist);
        Some(next)
    }

    pub fn into_vec(self) -> Vec<School> {
        self.schools
    }
}

impl From<Vec<School>> for Roster {
    fn from(schools: Vec<School>) -> Self {
        Self::new(schools)
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a School;
    type IntoIter = std::slice::Iter<'a, School>;

    fn into_iter(self) -> Self::IntoIter {
        self.schools.iter()
    }
}
