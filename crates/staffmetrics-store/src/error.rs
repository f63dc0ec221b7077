use staffmetrics_core::ValidationErrors;
use thiserror::Error;

/// Errors surfaced by record store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key (email, employee+date, employee+review date) already exists.
    #[error("duplicate {entity}: {key}")]
    UniqueViolation { entity: &'static str, key: String },
    /// A referenced employee does not exist.
    #[error("{entity} references a missing employee: {key}")]
    ForeignKeyViolation { entity: &'static str, key: String },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    /// An update produced a record that fails field validation.
    #[error("invalid {entity}: {errors}")]
    Invalid {
        entity: &'static str,
        errors: ValidationErrors,
    },
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True for errors that mean "this key is taken".
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Entity names used in errors and logs.
pub mod entity {
    pub const EMPLOYEE: &str = "employee";
    pub const ATTENDANCE: &str = "attendance";
    pub const REVIEW: &str = "performance review";
}

/// Key strings for the composite unique constraints.
pub fn attendance_key(employee_id: uuid::Uuid, date: chrono::NaiveDate) -> String {
    format!("employee {employee_id} on {date}")
}

pub fn review_key(employee_id: uuid::Uuid, review_date: chrono::NaiveDate) -> String {
    format!("employee {employee_id} on {review_date}")
}
