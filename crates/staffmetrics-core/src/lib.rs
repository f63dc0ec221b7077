//! Core contracts for staffmetrics.
//!
//! This crate defines the employee, attendance and performance-review
//! records, the category vocabularies, the derived-score invariants and the
//! validation rules shared by the store, the generator and the API.

pub mod attendance;
pub mod category;
pub mod decimal;
pub mod employee;
pub mod error;
pub mod patch;
pub mod review;
pub mod validation;

pub use attendance::{Attendance, AttendanceChanges, NewAttendance};
pub use category::{AttendanceStatus, Department, Gender, Position};
pub use decimal::{round_tenths, tenths};
pub use employee::{
    Employee, EmployeeChanges, MAX_AGE, MAX_SALARY, MAX_TENURE_YEARS, MIN_AGE, NewEmployee,
};
pub use error::{Error, Result};
pub use review::{NewPerformanceReview, PerformanceReview, ReviewChanges, ReviewScores};
pub use validation::{FieldError, Validate, ValidationErrors};
