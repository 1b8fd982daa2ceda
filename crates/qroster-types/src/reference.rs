//! Static reference data: regions, the admin lookup table, and the seed
//! roster used when no local copy exists yet.

use crate::school::{Roster, School, SchoolType};

/// Reserved email of the super-administrator.
pub const SUPER_ADMIN_EMAIL: &str = "superadmin@gmail.com";

/// Accreditation date given to every seeded school.
pub const SEED_ACCREDITATION_DATE: &str = "2024-01-01";

/// One administrative region and its owning administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub id: &'static str,
    pub name: &'static str,
    pub admin_email: &'static str,
}

pub static AREAS: [Area; 8] = [
    Area { id: "north", name: "شمال الإسماعيلية", admin_email: "admin1@gmail.com" },
    Area { id: "south", name: "جنوب الإسماعيلية", admin_email: "admin2@gmail.com" },
    Area { id: "abusoweir", name: "منطقة أبو صوير", admin_email: "admin3@gmail.com" },
    Area { id: "kassasin", name: "منطقة القصاصين", admin_email: "admin4@gmail.com" },
    Area { id: "tall", name: "منطقة التل الكبير", admin_email: "admin5@gmail.com" },
    Area { id: "fayed", name: "منطقة فايد", admin_email: "admin6@gmail.com" },
    Area { id: "qantara_west", name: "منطقة القنطرة غرب", admin_email: "admin7@gmail.com" },
    Area { id: "qantara_east", name: "منطقة القنطرة شرق", admin_email: "admin8@gmail.com" },
];

pub fn area_by_id(id: &str) -> Option<&'static Area> {
    AREAS.iter().find(|area| area.id == id)
}

/// Result of looking an email up in the admin table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionLookup {
    /// The reserved super-administrator account.
    All,
    Region(&'static str),
}

/// Map an already-normalized email to its region.
pub fn region_for_email(email: &str) -> Option<RegionLookup> {
    if email == SUPER_ADMIN_EMAIL {
        return Some(RegionLookup::All);
    }
    AREAS
        .iter()
        .find(|area| area.admin_email == email)
        .map(|area| RegionLookup::Region(area.id))
}

// ---------------------------------------------------------------------------
// Seed roster
// ---------------------------------------------------------------------------

type SeedGroup = (&'static str, &'static [(&'static str, SchoolType)]);

static SEED: [SeedGroup; 8] = [
    (
        "north",
        &[
            ("تكنولوجيا المعلومات المتقدمة ص. ع. بنين", SchoolType::Industrial),
            ("إبراهيم أحمد عثمان ص. ع. بنين", SchoolType::Industrial),
            ("المعدات الثقيلة ص. ع. بنين", SchoolType::Industrial),
            ("الإسماعيلية المعمارية ص. ع. بنين", SchoolType::Industrial),
            ("السلام الزخرفية ص. ع. بنين", SchoolType::Industrial),
            ("الفنية الكهربية الصناعية بنات", SchoolType::Industrial),
            ("الفنية الزخرفية الصناعية بنات", SchoolType::Industrial),
            ("طلعت حرب التجارية ع بنين", SchoolType::Commercial),
            ("المدرسة الفنية التجارية المتقدمة", SchoolType::Commercial),
            ("التجارة القديمة التجارية بنات", SchoolType::Commercial),
            ("أم المؤمنين التجارية بنات", SchoolType::Commercial),
            ("الفنية التجريبية للاستصلاح الأراضي", SchoolType::Agricultural),
            ("الإسماعيلية الزراعية المشتركة", SchoolType::Agricultural),
        ],
    ),
    (
        "south",
        &[
            ("أبو عطوة الصناعية بنات", SchoolType::Industrial),
            ("أبو عطوة التجارية بنات", SchoolType::Commercial),
        ],
    ),
    (
        "abusoweir",
        &[
            ("الشهيد محمد محمد علي إبراهيم ص. ع. مشتركة", SchoolType::Industrial),
            ("الشهيد صلاح إبراهيم النجار التجارية ع المشتركة", SchoolType::Commercial),
            ("صلاح عبد الغني الزراعية المشتركة", SchoolType::Agricultural),
        ],
    ),
    (
        "kassasin",
        &[
            ("القصاصين ص. ع. مشتركة", SchoolType::Industrial),
            ("حسن غنيمي التجارية المشتركة", SchoolType::Commercial),
            ("القصاصين الزراعية المشتركة", SchoolType::Agricultural),
        ],
    ),
    (
        "tall",
        &[
            ("الشهيد أحمد عادل وصفي ص. ع. مشتركة", SchoolType::Industrial),
            ("التل الكبير التجارية المشتركة", SchoolType::Commercial),
            ("التل الكبير الزراعية المشتركة", SchoolType::Agricultural),
        ],
    ),
    (
        "fayed",
        &[
            ("فايد الصناعية ع بنين", SchoolType::Industrial),
            ("الشهيد طيار محمد جمال الدين ص بنين", SchoolType::Industrial),
            ("الشهيد طيار محمود محمد فؤاد التجارية بنات", SchoolType::Commercial),
            ("الشهيد حسن ربيع حسين التجارية بنين", SchoolType::Commercial),
            ("فنارة الزراعية المشتركة", SchoolType::Agricultural),
            ("سرابيوم الزراعية المشتركة", SchoolType::Agricultural),
        ],
    ),
    (
        "qantara_west",
        &[
            ("القنطرة غرب الصناعية ع بنين (١)", SchoolType::Industrial),
            ("القنطرة غرب الصناعية ع بنين (٢)", SchoolType::Industrial),
            ("القنطرة غرب التجارية المشتركة", SchoolType::Commercial),
            ("أبو خليفة التجارية بنات", SchoolType::Commercial),
            ("القنطرة غرب الزراعية المشتركة", SchoolType::Agricultural),
        ],
    ),
    (
        "qantara_east",
        &[
            ("الشهيد مقدم محمد عبد الإله صالح علي السيد ص ع المشتركة", SchoolType::Industrial),
            ("القنطرة شرق التجارية المشتركة", SchoolType::Commercial),
            ("القنطرة شرق الزراعية المشتركة", SchoolType::Agricultural),
            ("الأحرار الزراعية المشتركة", SchoolType::Agricultural),
        ],
    ),
];

/// Build the static seed roster. Ids are `school-<group>-<index>`.
pub fn seed_roster() -> Roster {
    let schools = SEED
        .iter()
        .enumerate()
        .flat_map(|(group_idx, (area_id, schools))| {
            let admin = area_by_id(area_id).map_or("", |area| area.admin_email);
            schools
                .iter()
                .enumerate()
                .map(move |(school_idx, (name, kind))| {
                    School::new(
                        format!("school-{group_idx}-{school_idx}"),
                        *name,
                        *kind,
                        *area_id,
                        admin,
                        SEED_ACCREDITATION_DATE,
                    )
                })
        })
        .collect::<Vec<_>>();
    Roster::new(schools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_has_unique_ids_and_known_areas() {
        let roster = seed_roster();
        assert_eq!(roster.len(), 39);
        let ids: HashSet<_> = roster.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), roster.len());
        for school in &roster {
            let area = area_by_id(&school.area_id).expect("seed area must exist");
            assert_eq!(school.admin_id, area.admin_email);
            assert_eq!(school.completion_percentage(), 0);
        }
    }

    #[test]
    fn seed_ids_follow_group_layout() {
        let roster = seed_roster();
        assert_eq!(roster.as_slice()[0].id, "school-0-0");
        assert_eq!(roster.get("school-1-1").unwrap().area_id, "south");
        assert_eq!(roster.get("school-7-3").unwrap().area_id, "qantara_east");
    }

    #[test]
    fn email_lookup() {
        assert_eq!(region_for_email("admin1@gmail.com"), Some(RegionLookup::Region("north")));
        assert_eq!(region_for_email(SUPER_ADMIN_EMAIL), Some(RegionLookup::All));
        assert_eq!(region_for_email("nobody@gmail.com"), None);
    }

    #[test]
    fn every_area_has_one_admin() {
        let admins: HashSet<_> = AREAS.iter().map(|a| a.admin_email).collect();
        assert_eq!(admins.len(), AREAS.len());
    }
}
