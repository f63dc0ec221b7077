use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use staffmetrics_core::{
    Attendance, AttendanceChanges, Employee, EmployeeChanges, NewAttendance, NewEmployee,
    NewPerformanceReview, PerformanceReview, ReviewChanges,
};

use crate::error::StoreResult;
use crate::query::{
    AttendanceFilter, DepartmentRollup, EmployeeFilter, EmployeeRange, GenderCount, Page,
    PageRequest, ReviewFilter,
};

/// Trait implemented by record store adapters.
///
/// Every method is one bounded read or write. Batch inserts are atomic per
/// call; nothing is atomic across calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Cheap reachability probe.
    async fn ping(&self) -> StoreResult<()>;

    // ---- employees -------------------------------------------------------

    /// Insert a batch of employees in one transaction, in order.
    async fn insert_employees(&self, batch: &[NewEmployee]) -> StoreResult<Vec<Employee>>;

    async fn get_employee(&self, id: Uuid) -> StoreResult<Employee>;

    /// Filtered employees, newest first.
    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Employee>>;

    async fn update_employee(&self, id: Uuid, changes: EmployeeChanges) -> StoreResult<Employee>;

    /// Delete one employee, cascading to their attendance and reviews and
    /// clearing them as reviewer elsewhere.
    async fn delete_employee(&self, id: Uuid) -> StoreResult<()>;

    /// Delete every employee (and by cascade every other record). Returns the
    /// number of employees removed.
    async fn delete_all_employees(&self) -> StoreResult<u64>;

    /// Every employee id in creation order.
    async fn employee_ids(&self) -> StoreResult<Vec<Uuid>>;

    /// The subset of `candidates` already used by some employee.
    async fn taken_emails(&self, candidates: &[String]) -> StoreResult<HashSet<String>>;

    /// Up to `limit` employees with id greater than `after`, ordered by id.
    /// Used for bounded-memory full-table scans.
    async fn employees_after(&self, after: Option<Uuid>, limit: u32)
    -> StoreResult<Vec<Employee>>;

    // ---- attendance ------------------------------------------------------

    async fn insert_attendance(&self, batch: &[NewAttendance]) -> StoreResult<Vec<Attendance>>;

    async fn get_attendance(&self, id: Uuid) -> StoreResult<Attendance>;

    /// Filtered attendance, by date then employee.
    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Attendance>>;

    async fn update_attendance(
        &self,
        id: Uuid,
        changes: AttendanceChanges,
    ) -> StoreResult<Attendance>;

    async fn delete_attendance(&self, id: Uuid) -> StoreResult<()>;

    /// Dates that already carry an attendance record for `employee_id`.
    async fn attendance_dates(&self, employee_id: Uuid) -> StoreResult<BTreeSet<NaiveDate>>;

    // ---- performance reviews ---------------------------------------------

    async fn insert_reviews(
        &self,
        batch: &[NewPerformanceReview],
    ) -> StoreResult<Vec<PerformanceReview>>;

    async fn get_review(&self, id: Uuid) -> StoreResult<PerformanceReview>;

    /// Filtered reviews, by review date then employee.
    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        page: PageRequest,
    ) -> StoreResult<Page<PerformanceReview>>;

    async fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChanges,
    ) -> StoreResult<PerformanceReview>;

    async fn delete_review(&self, id: Uuid) -> StoreResult<()>;

    /// Review dates already used for `employee_id`.
    async fn review_dates(&self, employee_id: Uuid) -> StoreResult<BTreeSet<NaiveDate>>;

    // ---- aggregates ------------------------------------------------------

    async fn count_employees(&self) -> StoreResult<i64>;

    async fn count_employees_in(&self, range: EmployeeRange) -> StoreResult<i64>;

    /// Per-department headcount and averages, ordered by department bytewise
    /// (`collate "C"`), independent of the database locale.
    async fn department_rollup(&self) -> StoreResult<Vec<DepartmentRollup>>;

    /// Headcount per stored gender value, ordered by gender bytewise.
    async fn gender_counts(&self) -> StoreResult<Vec<GenderCount>>;
}
