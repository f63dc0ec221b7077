use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::tenths;
use crate::validation::{Validate, ValidationErrors};

/// Youngest age accepted; matches the lowest reporting age band.
pub const MIN_AGE: i32 = 20;
pub const MAX_AGE: i32 = 100;
/// Salary ceiling; matches the top reporting salary band.
pub const MAX_SALARY: i32 = 1_000_000;
/// Hire dates further back than this are rejected.
pub const MAX_TENURE_YEARS: u32 = 100;

/// Stored employee record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub age: i32,
    pub department: String,
    pub position: String,
    pub salary: i32,
    pub hire_date: NaiveDate,
    pub performance_score: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employee fields supplied on insert; identity and timestamps are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub age: i32,
    pub department: String,
    pub position: String,
    pub salary: i32,
    pub hire_date: NaiveDate,
    pub performance_score: Decimal,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmployeeChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub salary: Option<i32>,
    pub hire_date: Option<NaiveDate>,
    pub performance_score: Option<Decimal>,
}

impl Employee {
    /// Materialise a freshly inserted record.
    pub fn from_new(id: Uuid, new: NewEmployee, now: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            gender: new.gender,
            age: new.age,
            department: new.department,
            position: new.position,
            salary: new.salary,
            hire_date: new.hire_date,
            performance_score: new.performance_score,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update and re-validate the resulting record.
    ///
    /// On failure the record is left untouched.
    pub fn apply(&mut self, changes: EmployeeChanges) -> Result<(), ValidationErrors> {
        let mut next = self.clone();
        let EmployeeChanges {
            first_name,
            last_name,
            email,
            gender,
            age,
            department,
            position,
            salary,
            hire_date,
            performance_score,
        } = changes;

        if let Some(value) = first_name {
            next.first_name = value;
        }
        if let Some(value) = last_name {
            next.last_name = value;
        }
        if let Some(value) = email {
            next.email = value;
        }
        if let Some(value) = gender {
            next.gender = value;
        }
        if let Some(value) = age {
            next.age = value;
        }
        if let Some(value) = department {
            next.department = value;
        }
        if let Some(value) = position {
            next.position = value;
        }
        if let Some(value) = salary {
            next.salary = value;
        }
        if let Some(value) = hire_date {
            next.hire_date = value;
        }
        if let Some(value) = performance_score {
            next.performance_score = value;
        }

        next.fields().validate()?;
        *self = next;
        Ok(())
    }

    /// The writable fields of this record.
    pub fn fields(&self) -> NewEmployee {
        NewEmployee {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            gender: self.gender.clone(),
            age: self.age,
            department: self.department.clone(),
            position: self.position.clone(),
            salary: self.salary,
            hire_date: self.hire_date,
            performance_score: self.performance_score,
        }
    }
}

impl NewEmployee {
    /// A full replacement expressed as changes to every field.
    pub fn into_changes(self) -> EmployeeChanges {
        EmployeeChanges {
            first_name: Some(self.first_name),
            last_name: Some(self.last_name),
            email: Some(self.email),
            gender: Some(self.gender),
            age: Some(self.age),
            department: Some(self.department),
            position: Some(self.position),
            salary: Some(self.salary),
            hire_date: Some(self.hire_date),
            performance_score: Some(self.performance_score),
        }
    }
}

impl NewEmployee {
    /// Validate against a fixed reference day; `hire_date` must fall within
    /// [`MAX_TENURE_YEARS`] before `today` and not after it.
    pub fn validate_on(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.text("first_name", &self.first_name, 100);
        errors.text("last_name", &self.last_name, 100);
        errors.text("email", &self.email, 254);
        if !looks_like_email(&self.email) {
            errors.push("email", "must be a valid email address");
        }
        errors.text("gender", &self.gender, 20);
        errors.int_range("age", self.age.into(), MIN_AGE.into(), MAX_AGE.into());
        errors.text("department", &self.department, 100);
        errors.text("position", &self.position, 100);
        errors.int_range("salary", self.salary.into(), 0, MAX_SALARY.into());
        if self.hire_date > today {
            errors.push("hire_date", "must not be in the future");
        }
        match today.checked_sub_months(Months::new(MAX_TENURE_YEARS * 12)) {
            Some(earliest) if self.hire_date < earliest => {
                errors.push("hire_date", "must be within the last 100 years");
            }
            _ => {}
        }
        errors.tenths_range(
            "performance_score",
            self.performance_score,
            tenths(10),
            tenths(50),
        );
        errors.into_result()
    }
}

impl Validate for NewEmployee {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_on(Utc::now().date_naive())
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
