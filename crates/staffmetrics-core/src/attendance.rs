use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::AttendanceStatus;
use crate::decimal::tenths;
use crate::validation::{Validate, ValidationErrors};

/// Stored attendance record. At most one per employee and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: Uuid,
    #[serde(rename = "employee")]
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub status: String,
    pub hours_worked: Decimal,
    pub late_minutes: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Attendance fields supplied on insert.
///
/// Only constructible through [`NewAttendance::new`], which zeroes the hours
/// of an Absent day.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "AttendanceDraft")]
pub struct NewAttendance {
    employee_id: Uuid,
    date: NaiveDate,
    status: String,
    hours_worked: Decimal,
    late_minutes: i32,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct AttendanceDraft {
    employee: Uuid,
    date: NaiveDate,
    status: String,
    hours_worked: Decimal,
    #[serde(default)]
    late_minutes: i32,
    #[serde(default)]
    notes: Option<String>,
}

impl From<AttendanceDraft> for NewAttendance {
    fn from(draft: AttendanceDraft) -> Self {
        NewAttendance::new(
            draft.employee,
            draft.date,
            draft.status,
            draft.hours_worked,
            draft.late_minutes,
            draft.notes,
        )
    }
}

/// Partial update; absent fields keep their stored value. `notes: null`
/// clears the notes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttendanceChanges {
    #[serde(rename = "employee")]
    pub employee_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub hours_worked: Option<Decimal>,
    pub late_minutes: Option<i32>,
    #[serde(default, deserialize_with = "crate::patch::explicit")]
    pub notes: Option<Option<String>>,
}

fn hours_for(status: &str, hours_worked: Decimal) -> Decimal {
    if AttendanceStatus::is_absent(status) {
        tenths(0)
    } else {
        hours_worked
    }
}

impl NewAttendance {
    pub fn new(
        employee_id: Uuid,
        date: NaiveDate,
        status: impl Into<String>,
        hours_worked: Decimal,
        late_minutes: i32,
        notes: Option<String>,
    ) -> Self {
        let status = status.into();
        let hours_worked = hours_for(&status, hours_worked);
        Self {
            employee_id,
            date,
            status,
            hours_worked,
            late_minutes,
            notes,
        }
    }

    pub fn employee_id(&self) -> Uuid {
        self.employee_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn hours_worked(&self) -> Decimal {
        self.hours_worked
    }

    pub fn late_minutes(&self) -> i32 {
        self.late_minutes
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// A full replacement expressed as changes to every field.
    pub fn into_changes(self) -> AttendanceChanges {
        AttendanceChanges {
            employee_id: Some(self.employee_id),
            date: Some(self.date),
            status: Some(self.status),
            hours_worked: Some(self.hours_worked),
            late_minutes: Some(self.late_minutes),
            notes: Some(self.notes),
        }
    }
}

impl Validate for NewAttendance {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.text("status", &self.status, 50);
        errors.tenths_range("hours_worked", self.hours_worked, tenths(0), tenths(240));
        errors.int_range("late_minutes", self.late_minutes.into(), 0, 24 * 60);
        errors.into_result()
    }
}

impl Attendance {
    pub fn from_new(id: Uuid, new: NewAttendance, now: DateTime<Utc>) -> Self {
        Self {
            id,
            employee_id: new.employee_id,
            date: new.date,
            status: new.status,
            hours_worked: new.hours_worked,
            late_minutes: new.late_minutes,
            notes: new.notes,
            created_at: now,
        }
    }

    /// Apply a partial update, re-apply the Absent rule and re-validate.
    ///
    /// On failure the record is left untouched.
    pub fn apply(&mut self, changes: AttendanceChanges) -> Result<(), ValidationErrors> {
        let fields = NewAttendance::new(
            changes.employee_id.unwrap_or(self.employee_id),
            changes.date.unwrap_or(self.date),
            changes.status.unwrap_or_else(|| self.status.clone()),
            changes.hours_worked.unwrap_or(self.hours_worked),
            changes.late_minutes.unwrap_or(self.late_minutes),
            changes.notes.unwrap_or_else(|| self.notes.clone()),
        );
        fields.validate()?;

        self.employee_id = fields.employee_id;
        self.date = fields.date;
        self.status = fields.status;
        self.hours_worked = fields.hours_worked;
        self.late_minutes = fields.late_minutes;
        self.notes = fields.notes;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).expect("date")
    }

    #[test]
    fn absent_forces_zero_hours() {
        let record = NewAttendance::new(Uuid::new_v4(), day(), "Absent", tenths(73), 0, None);
        assert_eq!(record.hours_worked(), Decimal::ZERO);

        let record = NewAttendance::new(Uuid::new_v4(), day(), "Remote", tenths(73), 0, None);
        assert_eq!(record.hours_worked(), tenths(73));
    }

    #[test]
    fn deserialized_input_goes_through_constructor() {
        let json = serde_json::json!({
            "employee": Uuid::new_v4(),
            "date": "2024-05-06",
            "status": "Absent",
            "hours_worked": 8.5,
        });
        let record: NewAttendance = serde_json::from_value(json).expect("parse");
        assert_eq!(record.hours_worked(), Decimal::ZERO);
        assert_eq!(record.late_minutes(), 0);
    }

    #[test]
    fn switching_to_absent_zeroes_stored_hours() {
        let new = NewAttendance::new(Uuid::new_v4(), day(), "Present", tenths(80), 0, None);
        let mut record = Attendance::from_new(Uuid::new_v4(), new, Utc::now());

        record
            .apply(AttendanceChanges {
                status: Some("Absent".to_string()),
                ..AttendanceChanges::default()
            })
            .expect("apply");
        assert_eq!(record.hours_worked, Decimal::ZERO);
    }

    #[test]
    fn null_notes_clear_and_missing_notes_keep() {
        let new = NewAttendance::new(
            Uuid::new_v4(),
            day(),
            "Late",
            tenths(70),
            15,
            Some("traffic".to_string()),
        );
        let mut record = Attendance::from_new(Uuid::new_v4(), new, Utc::now());

        let keep: AttendanceChanges =
            serde_json::from_value(serde_json::json!({ "late_minutes": 20 })).expect("parse");
        record.apply(keep).expect("apply");
        assert_eq!(record.notes.as_deref(), Some("traffic"));
        assert_eq!(record.late_minutes, 20);

        let clear: AttendanceChanges =
            serde_json::from_value(serde_json::json!({ "notes": null })).expect("parse");
        record.apply(clear).expect("apply");
        assert_eq!(record.notes, None);
    }

    #[test]
    fn negative_late_minutes_rejected() {
        let record = NewAttendance::new(Uuid::new_v4(), day(), "Late", tenths(70), -3, None);
        let errors = record.validate().expect_err("invalid");
        assert!(errors.has_field("late_minutes"));
    }
}
