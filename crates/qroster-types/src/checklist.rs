//! The ten-item quality checklist and its single parse step.
//!
//! A checklist arrives either as a structured JSON object or as a string
//! holding that object serialized. [`parse_checklist`] is the only place
//! that tells the two apart; anything else is a
//! [`RosterError::MalformedChecklist`].

use std::fmt;

use qroster_error::{Result, RosterError};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// One named compliance item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChecklistItem {
    TeamFormed,
    VisionMission,
    SafetyProcedures,
    AttendanceStats,
    QualityDatabase,
    ProgramFiles,
    AssignmentsLog,
    WarningSigns,
    FireExtinguishers,
    TrainingNeeds,
}

impl ChecklistItem {
    /// Every item, in report order.
    pub const ALL: [Self; 10] = [
        Self::TeamFormed,
        Self::VisionMission,
        Self::SafetyProcedures,
        Self::AttendanceStats,
        Self::QualityDatabase,
        Self::ProgramFiles,
        Self::AssignmentsLog,
        Self::WarningSigns,
        Self::FireExtinguishers,
        Self::TrainingNeeds,
    ];

    /// Wire key of the item (camelCase, as stored locally and remotely).
    pub const fn key(self) -> &'static str {
        match self {
            Self::TeamFormed => "teamFormed",
            Self::VisionMission => "visionMission",
            Self::SafetyProcedures => "safetyProcedures",
            Self::AttendanceStats => "attendanceStats",
            Self::QualityDatabase => "qualityDatabase",
            Self::ProgramFiles => "programFiles",
            Self::AssignmentsLog => "assignmentsLog",
            Self::WarningSigns => "warningSigns",
            Self::FireExtinguishers => "fireExtinguishers",
            Self::TrainingNeeds => "trainingNeeds",
        }
    }

    /// Human-readable label printed on reports.
    pub const fn label(self) -> &'static str {
        match self {
            Self::TeamFormed => "تشكيل فريق الجودة",
            Self::VisionMission => "رؤية ورسالة وأهداف",
            Self::SafetyProcedures => "إجراءات الأمن والسلامة",
            Self::AttendanceStats => "إحصائيات الغياب والانجازات",
            Self::QualityDatabase => "قاعدة بيانات الجودة",
            Self::ProgramFiles => "ملفات البرنامج (مشرفي البرامج)",
            Self::AssignmentsLog => "سجل التكليفات محدث",
            Self::WarningSigns => "إرشادات تحذيرية في الورش",
            Self::FireExtinguishers => "صيانة طفايات الحريق",
            Self::TrainingNeeds => "تحديد الاحتياجات التدريبية",
        }
    }

    /// Look an item up by its wire key. Matching is exact.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.key() == key)
    }
}

impl fmt::Display for ChecklistItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Percentage
// ---------------------------------------------------------------------------

/// `round(100 * done / total)`, rounding halves up. An empty schema yields 0.
pub fn completion_percentage(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total);
    ((200 * done + total) / (2 * total)) as u8
}

// ---------------------------------------------------------------------------
// Checklist
// ---------------------------------------------------------------------------

/// Fixed-shape set of boolean compliance items.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub team_formed: bool,
    pub vision_mission: bool,
    pub safety_procedures: bool,
    pub attendance_stats: bool,
    pub quality_database: bool,
    pub program_files: bool,
    pub assignments_log: bool,
    pub warning_signs: bool,
    pub fire_extinguishers: bool,
    pub training_needs: bool,
}

impl Checklist {
    /// Checklist with every item marked done.
    pub const fn complete() -> Self {
        Self {
            team_formed: true,
            vision_mission: true,
            safety_procedures: true,
            attendance_stats: true,
            quality_database: true,
            program_files: true,
            assignments_log: true,
            warning_signs: true,
            fire_extinguishers: true,
            training_needs: true,
        }
    }

    /// Number of items in the schema.
    pub const fn total_items() -> usize {
        ChecklistItem::ALL.len()
    }

    pub const fn get(&self, item: ChecklistItem) -> bool {
        match item {
            ChecklistItem::TeamFormed => self.team_formed,
            ChecklistItem::VisionMission => self.vision_mission,
            ChecklistItem::SafetyProcedures => self.safety_procedures,
            ChecklistItem::AttendanceStats => self.attendance_stats,
            ChecklistItem::QualityDatabase => self.quality_database,
            ChecklistItem::ProgramFiles => self.program_files,
            ChecklistItem::AssignmentsLog => self.assignments_log,
            ChecklistItem::WarningSigns => self.warning_signs,
            ChecklistItem::FireExtinguishers => self.fire_extinguishers,
            ChecklistItem::TrainingNeeds => self.training_needs,
        }
    }

    pub fn set(&mut self, item: ChecklistItem, done: bool) {
        let slot = match item {
            ChecklistItem::TeamFormed => &mut self.team_formed,
            ChecklistItem::VisionMission => &mut self.vision_mission,
            ChecklistItem::SafetyProcedures => &mut self.safety_procedures,
            ChecklistItem::AttendanceStats => &mut self.attendance_stats,
            ChecklistItem::QualityDatabase => &mut self.quality_database,
            ChecklistItem::ProgramFiles => &mut self.program_files,
            ChecklistItem::AssignmentsLog => &mut self.assignments_log,
            ChecklistItem::WarningSigns => &mut self.warning_signs,
            ChecklistItem::FireExtinguishers => &mut self.fire_extinguishers,
            ChecklistItem::TrainingNeeds => &mut self.training_needs,
        };
        *slot = done;
    }

    /// Copy with one item changed.
    pub fn with(mut self, item: ChecklistItem, done: bool) -> Self {
        self.set(item, done);
        self
    }

    /// `(item, done)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (ChecklistItem, bool)> + '_ {
        ChecklistItem::ALL.into_iter().map(|item| (item, self.get(item)))
    }

    pub fn completed_count(&self) -> usize {
        self.iter().filter(|(_, done)| *done).count()
    }

    pub fn completion_percentage(&self) -> u8 {
        completion_percentage(self.completed_count(), Self::total_items())
    }
}

// ---------------------------------------------------------------------------
// Parse step
// ---------------------------------------------------------------------------

/// Parse a checklist from either a JSON object or a JSON-encoded string.
///
/// # Errors
/// Returns [`RosterError::MalformedChecklist`] when the value is neither
/// shape, or when the object does not carry all ten boolean items.
pub fn parse_checklist(value: &Value) -> Result<Checklist> {
    match value {
        Value::Object(_) => Checklist::deserialize(value)
            .map_err(|err| RosterError::MalformedChecklist(err.to_string())),
        Value::String(encoded) => {
            let inner: Value = serde_json::from_str(encoded).map_err(|err| {
                RosterError::MalformedChecklist(format!("encoded checklist is not JSON: {err}"))
            })?;
            if !inner.is_object() {
                return Err(RosterError::MalformedChecklist(format!(
                    "encoded checklist must hold an object, found {}",
                    json_kind(&inner)
                )));
            }
            parse_checklist(&inner)
        }
        other => Err(RosterError::MalformedChecklist(format!(
            "expected object or encoded string, found {}",
            json_kind(other)
        ))),
    }
}

/// Serde adapter accepting both checklist shapes.
pub fn deserialize_any_shape<'de, D>(deserializer: D) -> std::result::Result<Checklist, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_checklist(&value).map_err(D::Error::custom)
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
