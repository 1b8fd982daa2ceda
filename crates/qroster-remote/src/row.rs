//! Snake_case row shape exchanged with the remote collection.

use qroster_error::{Result, RosterError};
use qroster_types::{School, SchoolType, parse_checklist};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One row of the remote `schools` collection.
///
/// `checklist` is kept as raw JSON because rows written by older clients hold
/// it as an encoded string; [`RemoteRow::into_school`] runs the parse step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRow {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SchoolType,
    pub area_id: String,
    #[serde(default)]
    pub admin_id: Option<String>,
    #[serde(default)]
    pub accreditation_date: Option<String>,
    pub checklist: Value,
    #[serde(default)]
    pub completion_percentage: Option<i64>,
}

impl RemoteRow {
    /// Full row for an upsert.
    pub fn from_school(school: &School) -> Self {
        Self {
            id: school.id.clone(),
            name: school.name.clone(),
            kind: school.kind,
            area_id: school.area_id.clone(),
            admin_id: Some(school.admin_id.clone()),
            accreditation_date: Some(school.accreditation_date.clone()),
            checklist: serde_json::to_value(school.checklist()).unwrap_or(Value::Null),
            completion_percentage: Some(i64::from(school.completion_percentage())),
        }
    }

    /// Map into the local shape. The percentage is recomputed from the
    /// checklist; the remote value is only compared and logged.
    ///
    /// # Errors
    /// [`qroster_error::RosterError::MalformedChecklist`] when the checklist
    /// matches neither accepted shape.
    pub fn into_school(self) -> Result<School> {
        let checklist = parse_checklist(&self.checklist)?;
        let school = School::new(
            self.id,
            self.name,
            self.kind,
            self.area_id,
            self.admin_id.unwrap_or_default(),
            self.accreditation_date.unwrap_or_default(),
        )
        .with_checklist(checklist);

        if let Some(remote_pct) = self.completion_percentage {
            if remote_pct != i64::from(school.completion_percentage()) {
                warn!(
                    school_id = %school.id,
                    remote = remote_pct,
                    recomputed = school.completion_percentage(),
                    "remote completion percentage drifted from its checklist"
                );
            }
        }
        Ok(school)
    }
}

/// Decode a collection body. A body that is valid transport but not a list
/// of rows is a data fault, never a connectivity one.
///
/// # Errors
/// [`RosterError::MalformedRow`] when any row fails to decode.
pub fn decode_rows(body: &str) -> Result<Vec<RemoteRow>> {
    serde_json::from_str(body).map_err(|err| RosterError::MalformedRow(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroster_types::{Checklist, ChecklistItem};
    use serde_json::json;

    fn sample_checklist() -> Checklist {
        Checklist::default()
            .with(ChecklistItem::SafetyProcedures, true)
            .with(ChecklistItem::QualityDatabase, true)
            .with(ChecklistItem::WarningSigns, true)
    }

    #[test]
    fn decodes_structured_checklist() {
        let row: RemoteRow = serde_json::from_value(json!({
            "id": "school-0-0",
            "name": "x",
            "type": "صناعي",
            "area_id": "north",
            "admin_id": "admin1@gmail.com",
            "accreditation_date": "2024-01-01",
            "checklist": sample_checklist(),
            "completion_percentage": 30
        }))
        .unwrap();
        let school = row.into_school().unwrap();
        assert_eq!(*school.checklist(), sample_checklist());
        assert_eq!(school.completion_percentage(), 30);
        assert_eq!(school.admin_id, "admin1@gmail.com");
    }

    #[test]
    fn decodes_encoded_checklist_and_ignores_stale_percentage() {
        let row: RemoteRow = serde_json::from_value(json!({
            "id": "school-0-1",
            "name": "y",
            "type": "تجاري",
            "area_id": "north",
            "admin_id": null,
            "accreditation_date": null,
            "checklist": serde_json::to_string(&sample_checklist()).unwrap(),
            "completion_percentage": 90
        }))
        .unwrap();
        let school = row.into_school().unwrap();
        assert_eq!(*school.checklist(), sample_checklist());
        assert_eq!(school.completion_percentage(), 30);
        assert_eq!(school.admin_id, "");
    }

    #[test]
    fn malformed_checklist_is_typed() {
        let row: RemoteRow = serde_json::from_value(json!({
            "id": "s",
            "name": "z",
            "type": "زراعي",
            "area_id": "tall",
            "checklist": 12
        }))
        .unwrap();
        assert!(matches!(row.into_school(), Err(RosterError::MalformedChecklist(_))));
    }

    #[test]
    fn upsert_row_is_full_snake_case() {
        let school = School::new(
            "school-5-0",
            "n",
            SchoolType::Industrial,
            "fayed",
            "admin6@gmail.com",
            "2024-01-01",
        )
        .with_checklist(sample_checklist());
        let value = serde_json::to_value(RemoteRow::from_school(&school)).unwrap();
        assert_eq!(value["area_id"], json!("fayed"));
        assert_eq!(value["admin_id"], json!("admin6@gmail.com"));
        assert_eq!(value["accreditation_date"], json!("2024-01-01"));
        assert_eq!(value["completion_percentage"], json!(30));
        assert!(value["checklist"].is_object());
        assert_eq!(value["type"], json!("صناعي"));
    }

    #[test]
    fn undecodable_rows_are_a_data_fault() {
        let numeric_id = r#"[{"id":7,"name":"n","type":"صناعي","area_id":"tall","checklist":{}}]"#;
        let unknown_type = r#"[{"id":"s","name":"n","type":"unknown","checklist":{}}]"#;
        for body in [numeric_id, unknown_type, r#"{"rows":[]}"#] {
            let err = decode_rows(body).unwrap_err();
            assert!(matches!(err, RosterError::MalformedRow(_)), "{body}: {err}");
            assert!(!err.is_connectivity());
        }
        assert!(decode_rows("[]").unwrap().is_empty());
    }
}
