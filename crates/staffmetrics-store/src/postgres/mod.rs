//! Postgres record store backed by a sqlx pool.

mod mapper;
mod queries;

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};
use uuid::Uuid;

use staffmetrics_core::{
    Attendance, AttendanceChanges, Employee, EmployeeChanges, NewAttendance, NewEmployee,
    NewPerformanceReview, PerformanceReview, ReviewChanges,
};

use crate::adapter::RecordStore;
use crate::error::{StoreError, StoreResult, attendance_key, entity, review_key};
use crate::query::{
    AttendanceFilter, DepartmentRollup, EmployeeFilter, EmployeeRange, GenderCount, Page,
    PageRequest, ReviewFilter,
};

/// Open a connection pool against `database_url`.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;
    debug!(max_connections, "postgres pool ready");
    Ok(pool)
}

/// Apply the bundled schema migrations.
pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("migrations applied");
    Ok(())
}

/// Foreign key names Postgres assigns to the inline references in the
/// initial migration.
mod constraint {
    pub const ATTENDANCE_EMPLOYEE: &str = "attendance_employee_id_fkey";
    pub const REVIEW_EMPLOYEE: &str = "performance_reviews_employee_id_fkey";
    pub const REVIEW_REVIEWER: &str = "performance_reviews_reviewer_id_fkey";
}

/// Map constraint failures onto store errors carrying the offending key.
/// `key` receives the name of the violated constraint when Postgres reports one.
fn classify(
    err: sqlx::Error,
    entity: &'static str,
    key: impl FnOnce(Option<&str>) -> String,
) -> StoreError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            return StoreError::UniqueViolation {
                entity,
                key: key(db.constraint()),
            };
        }
        if db.is_foreign_key_violation() {
            return StoreError::ForeignKeyViolation {
                entity,
                key: key(db.constraint()),
            };
        }
    }
    StoreError::Db(err)
}

/// A missing employee reports its id; anything else the `(employee, date)` pair.
fn attendance_conflict_key(violated: Option<&str>, employee_id: Uuid, date: NaiveDate) -> String {
    match violated {
        Some(constraint::ATTENDANCE_EMPLOYEE) => employee_id.to_string(),
        _ => attendance_key(employee_id, date),
    }
}

fn review_conflict_key(violated: Option<&str>, review: &PerformanceReview) -> String {
    match (violated, review.reviewer_id) {
        (Some(constraint::REVIEW_EMPLOYEE), _) => review.employee_id.to_string(),
        (Some(constraint::REVIEW_REVIEWER), Some(reviewer)) => reviewer.to_string(),
        _ => review_key(review.employee_id, review.review_date),
    }
}

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("select 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_employees(&self, batch: &[NewEmployee]) -> StoreResult<Vec<Employee>> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(batch.len());
        for new in batch {
            let row = queries::insert_employee(&mut *tx, new)
                .await
                .map_err(|err| classify(err, entity::EMPLOYEE, |_| new.email.clone()))?;
            inserted.push(Employee::from(row));
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn get_employee(&self, id: Uuid) -> StoreResult<Employee> {
        queries::find_employee(&self.pool, id, false)
            .await?
            .map(Employee::from)
            .ok_or_else(|| StoreError::not_found(entity::EMPLOYEE, id))
    }

    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Employee>> {
        let count = queries::count_employees_matching(&self.pool, filter).await?;
        let rows = queries::list_employees(&self.pool, filter, page).await?;
        Ok(Page {
            count: count as u64,
            page: page.page,
            page_size: page.page_size,
            results: rows.into_iter().map(Employee::from).collect(),
        })
    }

    async fn update_employee(&self, id: Uuid, changes: EmployeeChanges) -> StoreResult<Employee> {
        let mut tx = self.pool.begin().await?;
        let mut employee: Employee = queries::find_employee(&mut *tx, id, true)
            .await?
            .map(Employee::from)
            .ok_or_else(|| StoreError::not_found(entity::EMPLOYEE, id))?;
        employee
            .apply(changes)
            .map_err(|errors| StoreError::Invalid {
                entity: entity::EMPLOYEE,
                errors,
            })?;
        let row = queries::write_employee(&mut *tx, &employee)
            .await
            .map_err(|err| classify(err, entity::EMPLOYEE, |_| employee.email.clone()))?;
        tx.commit().await?;
        Ok(Employee::from(row))
    }

    async fn delete_employee(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("delete from employees where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(entity::EMPLOYEE, id));
        }
        Ok(())
    }

    async fn delete_all_employees(&self) -> StoreResult<u64> {
        let result = sqlx::query("delete from employees")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn employee_ids(&self) -> StoreResult<Vec<Uuid>> {
        Ok(queries::employee_ids(&self.pool).await?)
    }

    async fn taken_emails(&self, candidates: &[String]) -> StoreResult<HashSet<String>> {
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }
        let taken = queries::taken_emails(&self.pool, candidates).await?;
        Ok(taken.into_iter().collect())
    }

    async fn employees_after(
        &self,
        after: Option<Uuid>,
        limit: u32,
    ) -> StoreResult<Vec<Employee>> {
        let rows = queries::employees_after(&self.pool, after, limit).await?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn insert_attendance(&self, batch: &[NewAttendance]) -> StoreResult<Vec<Attendance>> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(batch.len());
        for new in batch {
            let row = queries::insert_attendance(&mut *tx, new)
                .await
                .map_err(|err| {
                    classify(err, entity::ATTENDANCE, |violated| {
                        attendance_conflict_key(violated, new.employee_id(), new.date())
                    })
                })?;
            inserted.push(Attendance::from(row));
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn get_attendance(&self, id: Uuid) -> StoreResult<Attendance> {
        queries::find_attendance(&self.pool, id, false)
            .await?
            .map(Attendance::from)
            .ok_or_else(|| StoreError::not_found(entity::ATTENDANCE, id))
    }

    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Attendance>> {
        let count = queries::count_attendance_matching(&self.pool, filter).await?;
        let rows = queries::list_attendance(&self.pool, filter, page).await?;
        Ok(Page {
            count: count as u64,
            page: page.page,
            page_size: page.page_size,
            results: rows.into_iter().map(Attendance::from).collect(),
        })
    }

    async fn update_attendance(
        &self,
        id: Uuid,
        changes: AttendanceChanges,
    ) -> StoreResult<Attendance> {
        let mut tx = self.pool.begin().await?;
        let mut record: Attendance = queries::find_attendance(&mut *tx, id, true)
            .await?
            .map(Attendance::from)
            .ok_or_else(|| StoreError::not_found(entity::ATTENDANCE, id))?;
        record.apply(changes).map_err(|errors| StoreError::Invalid {
            entity: entity::ATTENDANCE,
            errors,
        })?;
        let row = queries::write_attendance(&mut *tx, &record)
            .await
            .map_err(|err| {
                classify(err, entity::ATTENDANCE, |violated| {
                    attendance_conflict_key(violated, record.employee_id, record.date)
                })
            })?;
        tx.commit().await?;
        Ok(Attendance::from(row))
    }

    async fn delete_attendance(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("delete from attendance where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(entity::ATTENDANCE, id));
        }
        Ok(())
    }

    async fn attendance_dates(&self, employee_id: Uuid) -> StoreResult<BTreeSet<NaiveDate>> {
        let dates = queries::attendance_dates(&self.pool, employee_id).await?;
        Ok(dates.into_iter().collect())
    }

    async fn insert_reviews(
        &self,
        batch: &[NewPerformanceReview],
    ) -> StoreResult<Vec<PerformanceReview>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(batch.len());
        for new in batch {
            let review = PerformanceReview::from_new(Uuid::new_v4(), new.clone(), now);
            let row = queries::insert_review(&mut *tx, &review)
                .await
                .map_err(|err| {
                    classify(err, entity::REVIEW, |violated| {
                        review_conflict_key(violated, &review)
                    })
                })?;
            inserted.push(PerformanceReview::from(row));
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn get_review(&self, id: Uuid) -> StoreResult<PerformanceReview> {
        queries::find_review(&self.pool, id, false)
            .await?
            .map(PerformanceReview::from)
            .ok_or_else(|| StoreError::not_found(entity::REVIEW, id))
    }

    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        page: PageRequest,
    ) -> StoreResult<Page<PerformanceReview>> {
        let count = queries::count_reviews_matching(&self.pool, filter).await?;
        let rows = queries::list_reviews(&self.pool, filter, page).await?;
        Ok(Page {
            count: count as u64,
            page: page.page,
            page_size: page.page_size,
            results: rows.into_iter().map(PerformanceReview::from).collect(),
        })
    }

    async fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChanges,
    ) -> StoreResult<PerformanceReview> {
        let mut tx = self.pool.begin().await?;
        let mut review: PerformanceReview = queries::find_review(&mut *tx, id, true)
            .await?
            .map(PerformanceReview::from)
            .ok_or_else(|| StoreError::not_found(entity::REVIEW, id))?;
        review.apply(changes).map_err(|errors| StoreError::Invalid {
            entity: entity::REVIEW,
            errors,
        })?;
        let row = queries::write_review(&mut *tx, &review)
            .await
            .map_err(|err| {
                classify(err, entity::REVIEW, |violated| {
                    review_conflict_key(violated, &review)
                })
            })?;
        tx.commit().await?;
        Ok(PerformanceReview::from(row))
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("delete from performance_reviews where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(entity::REVIEW, id));
        }
        Ok(())
    }

    async fn review_dates(&self, employee_id: Uuid) -> StoreResult<BTreeSet<NaiveDate>> {
        let dates = queries::review_dates(&self.pool, employee_id).await?;
        Ok(dates.into_iter().collect())
    }

    async fn count_employees(&self) -> StoreResult<i64> {
        Ok(queries::count_employees(&self.pool).await?)
    }

    async fn count_employees_in(&self, range: EmployeeRange) -> StoreResult<i64> {
        Ok(queries::count_employees_in(&self.pool, range).await?)
    }

    async fn department_rollup(&self) -> StoreResult<Vec<DepartmentRollup>> {
        let rows = queries::department_rollup(&self.pool).await?;
        Ok(rows.into_iter().map(DepartmentRollup::from).collect())
    }

    async fn gender_counts(&self) -> StoreResult<Vec<GenderCount>> {
        let rows = queries::gender_counts(&self.pool).await?;
        Ok(rows.into_iter().map(GenderCount::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use staffmetrics_core::{NewPerformanceReview, ReviewScores, tenths};

    use super::*;

    fn review(reviewer_id: Option<Uuid>) -> PerformanceReview {
        let new = NewPerformanceReview {
            employee_id: Uuid::new_v4(),
            reviewer_id,
            review_date: NaiveDate::from_ymd_opt(2024, 5, 6).expect("date"),
            scores: ReviewScores::new(tenths(40), tenths(40), tenths(40), tenths(40)),
            comments: None,
        };
        PerformanceReview::from_new(Uuid::new_v4(), new, Utc::now())
    }

    #[test]
    fn review_keys_follow_the_violated_constraint() {
        let reviewer = Uuid::new_v4();
        let review = review(Some(reviewer));

        assert_eq!(
            review_conflict_key(Some(constraint::REVIEW_REVIEWER), &review),
            reviewer.to_string()
        );
        assert_eq!(
            review_conflict_key(Some(constraint::REVIEW_EMPLOYEE), &review),
            review.employee_id.to_string()
        );
        assert_eq!(
            review_conflict_key(Some("performance_reviews_employee_id_review_date_key"), &review),
            review_key(review.employee_id, review.review_date)
        );
        assert_eq!(
            review_conflict_key(None, &review),
            review_key(review.employee_id, review.review_date)
        );
    }

    #[test]
    fn attendance_keys_follow_the_violated_constraint() {
        let employee = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).expect("date");
        assert_eq!(
            attendance_conflict_key(Some(constraint::ATTENDANCE_EMPLOYEE), employee, day),
            employee.to_string()
        );
        assert_eq!(
            attendance_conflict_key(Some("attendance_employee_id_date_key"), employee, day),
            attendance_key(employee, day)
        );
    }
}
