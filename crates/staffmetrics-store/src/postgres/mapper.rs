use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use staffmetrics_core::{Attendance, Employee, PerformanceReview, ReviewScores};

use crate::query::{DepartmentRollup, GenderCount};

#[derive(Debug, FromRow)]
pub struct EmployeeRow {
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

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            gender: row.gender,
            age: row.age,
            department: row.department,
            position: row.position,
            salary: row.salary,
            hire_date: row.hire_date,
            performance_score: row.performance_score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct AttendanceRow {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub status: String,
    pub hours_worked: Decimal,
    pub late_minutes: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AttendanceRow> for Attendance {
    fn from(row: AttendanceRow) -> Self {
        Attendance {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            status: row.status,
            hours_worked: row.hours_worked,
            late_minutes: row.late_minutes,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

/// The stored `overall_score` column is written from [`ReviewScores`] and is
/// not read back; the scores are rebuilt from the sub-scores.
#[derive(Debug, FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub reviewer_id: Option<Uuid>,
    pub review_date: NaiveDate,
    pub communication_score: Decimal,
    pub teamwork_score: Decimal,
    pub technical_score: Decimal,
    pub leadership_score: Decimal,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewRow> for PerformanceReview {
    fn from(row: ReviewRow) -> Self {
        PerformanceReview {
            id: row.id,
            employee_id: row.employee_id,
            reviewer_id: row.reviewer_id,
            review_date: row.review_date,
            scores: ReviewScores::new(
                row.communication_score,
                row.teamwork_score,
                row.technical_score,
                row.leadership_score,
            ),
            comments: row.comments,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DepartmentRow {
    pub department: String,
    pub employee_count: i64,
    pub average_salary: Decimal,
    pub average_performance: Decimal,
}

impl From<DepartmentRow> for DepartmentRollup {
    fn from(row: DepartmentRow) -> Self {
        DepartmentRollup {
            department: row.department,
            employee_count: row.employee_count,
            average_salary: row.average_salary,
            average_performance: row.average_performance,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct GenderRow {
    pub gender: String,
    pub count: i64,
}

impl From<GenderRow> for GenderCount {
    fn from(row: GenderRow) -> Self {
        GenderCount {
            gender: row.gender,
            count: row.count,
        }
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
