//! What a session may see, and search over it.

use qroster_types::{Roster, School, SchoolType, Session};
use serde::{Deserialize, Serialize};

/// Schools visible to `session`, in roster order.
///
/// Pure and uncached: the result always reflects the roster passed in.
pub fn accessible_schools<'a>(roster: &'a Roster, session: &Session) -> Vec<&'a School> {
    roster
        .iter()
        .filter(|school| session.can_access(school))
        .collect()
}

/// Dashboard search filters. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolQuery {
    pub area_id: Option<String>,
    pub kind: Option<SchoolType>,
    /// Case-insensitive substring of the school name.
    pub search: String,
}

impl SchoolQuery {
    pub fn matches(&self, school: &School) -> bool {
        if self.area_id.as_deref().is_some_and(|area| area != school.area_id) {
            return false;
        }
        if self.kind.is_some_and(|kind| kind != school.kind) {
            return false;
        }
        let needle = self.search.trim();
        needle.is_empty() || school.name.to_lowercase().contains(&needle.to_lowercase())
    }

    pub fn apply<'a, I>(&self, schools: I) -> Vec<&'a School>
    where
        I: IntoIterator<Item = &'a School>,
    {
        schools.into_iter().filter(|school| self.matches(school)).collect()
    }
}
