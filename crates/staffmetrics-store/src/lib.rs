//! Record store for employee, attendance and performance-review data.
//!
//! [`RecordStore`] is the seam every other crate talks to. Two adapters
//! implement it: [`PostgresStore`] for real deployments and [`MemoryStore`]
//! for tests and dry runs. Both enforce the same uniqueness, cascade and
//! set-null rules.

pub mod adapter;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;

pub use adapter::RecordStore;
pub use error::{StoreError, StoreResult, attendance_key, entity, review_key};
pub use memory::MemoryStore;
pub use postgres::{PostgresStore, connect, migrate};
pub use query::{
    AttendanceFilter, DepartmentRollup, EmployeeFilter, EmployeeRange, GenderCount, Page,
    PageRequest, ReviewFilter,
};
