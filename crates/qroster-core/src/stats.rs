//! Dashboard aggregates over a set of schools.

use qroster_types::{AREAS, School, SchoolType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaCompletion {
    pub area_id: &'static str,
    pub name: &'static str,
    pub schools: usize,
    pub average_completion: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCompletion {
    pub kind: SchoolType,
    pub schools: usize,
    pub average_completion: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_schools: usize,
    pub average_completion: u8,
    pub completed_schools: usize,
    /// Every region in reference order, including empty ones.
    pub by_area: Vec<AreaCompletion>,
    /// Every school type, including empty ones.
    pub by_type: Vec<TypeCompletion>,
    pub administrators: usize,
}

/// Mean of the percentages, rounded half-up; 0 for an empty set.
fn average<'a>(schools: impl Iterator<Item = &'a School>) -> (usize, u8) {
    let (count, sum) = schools.fold((0_usize, 0_usize), |(count, sum), school| {
        (count + 1, sum + usize::from(school.completion_percentage()))
    });
    if count == 0 {
        return (0, 0);
    }
    let rounded = (2 * sum + count) / (2 * count);
    (count, u8::try_from(rounded).unwrap_or(100))
}

pub fn dashboard_stats(schools: &[&School]) -> DashboardStats {
    let (total_schools, average_completion) = average(schools.iter().copied());
    let by_area = AREAS
        .iter()
        .map(|area| {
            let (count, avg) = average(schools.iter().copied().filter(|s| s.area_id == area.id));
            AreaCompletion {
                area_id: area.id,
                name: area.name,
                schools: count,
                average_completion: avg,
            }
        })
        .collect();
    let by_type = SchoolType::ALL
        .iter()
        .map(|&kind| {
            let (count, avg) = average(schools.iter().copied().filter(|s| s.kind == kind));
            TypeCompletion {
                kind,
                schools: count,
                average_completion: avg,
            }
        })
        .collect();

    DashboardStats {
        total_schools,
        average_completion,
        completed_schools: schools.iter().filter(|s| s.is_complete()).count(),
        by_area,
        by_type,
        administrators: AREAS.len(),
    }
}
