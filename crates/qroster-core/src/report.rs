//! Printable per-school compliance report.

use std::fmt;

use qroster_types::{ChecklistItem, School, SchoolType, area_by_id};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    /// 1-based position in the checklist.
    pub index: usize,
    pub item: ChecklistItem,
    pub label: &'static str,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceReport {
    pub code: String,
    pub school_id: String,
    pub school_name: String,
    pub kind: SchoolType,
    pub area_name: String,
    pub accreditation_date: String,
    pub generated_on: String,
    pub lines: Vec<ReportLine>,
    pub completion_percentage: u8,
}

impl ComplianceReport {
    /// Report for `school`, stamped with `generated_on` (an ISO date).
    pub fn build(school: &School, generated_on: impl Into<String>) -> Self {
        let area_name = area_by_id(&school.area_id)
            .map_or_else(|| school.area_id.clone(), |area| area.name.to_owned());
        let lines = school
            .checklist()
            .iter()
            .enumerate()
            .map(|(i, (item, done))| ReportLine {
                index: i + 1,
                item,
                label: item.label(),
                done,
            })
            .collect();
        Self {
            code: format!("QR-{}", school.short_code()),
            school_id: school.id.clone(),
            school_name: school.name.clone(),
            kind: school.kind,
            area_name,
            accreditation_date: school.accreditation_date.clone(),
            generated_on: generated_on.into(),
            lines,
            completion_percentage: school.completion_percentage(),
        }
    }
}

impl fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Quality compliance report {}", self.code)?;
        writeln!(f, "School:        {}", self.school_name)?;
        writeln!(f, "Type:          {}", self.kind)?;
        writeln!(f, "Region:        {}", self.area_name)?;
        writeln!(f, "Accredited:    {}", self.accreditation_date)?;
        writeln!(f, "Generated on:  {}", self.generated_on)?;
        writeln!(f)?;
        for line in &self.lines {
            let mark = if line.done { "[x]" } else { "[ ]" };
            writeln!(f, "{:>2}. {mark} {}", line.index, line.label)?;
        }
        writeln!(f)?;
        write!(f, "Completion: {}%", self.completion_percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroster_types::Checklist;

    fn school() -> School {
        School::new(
            "school-2-4",
            "Abu Suweir Industrial",
            SchoolType::Industrial,
            "abusoweir",
            "admin3@gmail.com",
            "2024-01-01",
        )
        .with_checklist(
            Checklist::default()
                .with(ChecklistItem::TeamFormed, true)
                .with(ChecklistItem::TrainingNeeds, true),
        )
    }

    #[test]
    fn lines_follow_checklist_order() {
        let report = ComplianceReport::build(&school(), "2026-10-16");
        assert_eq!(report.code, "QR-4");
        assert_eq!(report.area_name, "منطقة أبو صوير");
        assert_eq!(report.lines.len(), 10);
        assert_eq!(report.lines[0].item, ChecklistItem::TeamFormed);
        assert!(report.lines[0].done);
        assert!(!report.lines[1].done);
        assert_eq!(report.lines[9].index, 10);
        assert!(report.lines[9].done);
        assert_eq!(report.completion_percentage, 20);
    }

    #[test]
    fn unknown_region_falls_back_to_id() {
        let mut s = school();
        s.area_id = "elsewhere".to_owned();
        assert_eq!(ComplianceReport::build(&s, "2026-10-16").area_name, "elsewhere");
    }

    #[test]
    fn renders_as_text() {
        let text = ComplianceReport::build(&school(), "2026-10-16").to_string();
        assert!(text.starts_with("Quality compliance report QR-4"));
        assert!(text.contains(" 1. [x] تشكيل فريق الجودة"));
        assert!(text.contains(" 2. [ ] رؤية ورسالة وأهداف"));
        assert!(text.contains("Generated on:  2026-10-16"));
        assert!(text.ends_with("Completion: 20%"));
    }
}
