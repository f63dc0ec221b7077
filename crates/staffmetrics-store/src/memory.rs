use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
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

/// In-process record store with the same key and cascade rules as the
/// Postgres schema. Rows are kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    employees: Vec<Employee>,
    attendance: Vec<Attendance>,
    reviews: Vec<PerformanceReview>,
}

impl Tables {
    fn employee_exists(&self, id: Uuid) -> bool {
        self.employees.iter().any(|employee| employee.id == id)
    }

    fn require_employee(&self, entity: &'static str, id: Uuid) -> StoreResult<()> {
        if self.employee_exists(id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation {
                entity,
                key: id.to_string(),
            })
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn matches_employee(filter: &EmployeeFilter, employee: &Employee) -> bool {
    if filter
        .department
        .as_ref()
        .is_some_and(|value| *value != employee.department)
    {
        return false;
    }
    if filter
        .position
        .as_ref()
        .is_some_and(|value| *value != employee.position)
    {
        return false;
    }
    if filter
        .gender
        .as_ref()
        .is_some_and(|value| *value != employee.gender)
    {
        return false;
    }
    match filter.search.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => {
            let term = term.to_lowercase();
            contains_ci(&employee.first_name, &term)
                || contains_ci(&employee.last_name, &term)
                || contains_ci(&employee.department, &term)
                || contains_ci(&employee.position, &term)
        }
        _ => true,
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn engine(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_employees(&self, batch: &[NewEmployee]) -> StoreResult<Vec<Employee>> {
        let mut tables = self.tables();
        let mut emails: HashSet<&str> = tables
            .employees
            .iter()
            .map(|employee| employee.email.as_str())
            .collect();
        for new in batch {
            if !emails.insert(new.email.as_str()) {
                return Err(StoreError::UniqueViolation {
                    entity: entity::EMPLOYEE,
                    key: new.email.clone(),
                });
            }
        }

        let now = Utc::now();
        let inserted: Vec<Employee> = batch
            .iter()
            .cloned()
            .map(|new| Employee::from_new(Uuid::new_v4(), new, now))
            .collect();
        tables.employees.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn get_employee(&self, id: Uuid) -> StoreResult<Employee> {
        self.tables()
            .employees
            .iter()
            .find(|employee| employee.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(entity::EMPLOYEE, id))
    }

    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Employee>> {
        let tables = self.tables();
        let matching: Vec<Employee> = tables
            .employees
            .iter()
            .rev()
            .filter(|employee| matches_employee(filter, employee))
            .cloned()
            .collect();
        Ok(Page::from_all(matching, page))
    }

    async fn update_employee(&self, id: Uuid, changes: EmployeeChanges) -> StoreResult<Employee> {
        let mut tables = self.tables();
        let idx = tables
            .employees
            .iter()
            .position(|employee| employee.id == id)
            .ok_or_else(|| StoreError::not_found(entity::EMPLOYEE, id))?;

        let mut next = tables.employees[idx].clone();
        next.apply(changes).map_err(|errors| StoreError::Invalid {
            entity: entity::EMPLOYEE,
            errors,
        })?;
        if tables
            .employees
            .iter()
            .any(|other| other.id != id && other.email == next.email)
        {
            return Err(StoreError::UniqueViolation {
                entity: entity::EMPLOYEE,
                key: next.email,
            });
        }

        next.updated_at = Utc::now();
        tables.employees[idx] = next.clone();
        Ok(next)
    }

    async fn delete_employee(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables();
        if !tables.employee_exists(id) {
            return Err(StoreError::not_found(entity::EMPLOYEE, id));
        }
        tables.employees.retain(|employee| employee.id != id);
        tables.attendance.retain(|record| record.employee_id != id);
        tables.reviews.retain(|review| review.employee_id != id);
        for review in tables.reviews.iter_mut() {
            if review.reviewer_id == Some(id) {
                review.reviewer_id = None;
            }
        }
        Ok(())
    }

    async fn delete_all_employees(&self) -> StoreResult<u64> {
        let mut tables = self.tables();
        let removed = tables.employees.len() as u64;
        tables.employees.clear();
        tables.attendance.clear();
        tables.reviews.clear();
        Ok(removed)
    }

    async fn employee_ids(&self) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .tables()
            .employees
            .iter()
            .map(|employee| employee.id)
            .collect())
    }

    async fn taken_emails(&self, candidates: &[String]) -> StoreResult<HashSet<String>> {
        let tables = self.tables();
        let existing: HashSet<&str> = tables
            .employees
            .iter()
            .map(|employee| employee.email.as_str())
            .collect();
        Ok(candidates
            .iter()
            .filter(|email| existing.contains(email.as_str()))
            .cloned()
            .collect())
    }

    async fn employees_after(
        &self,
        after: Option<Uuid>,
        limit: u32,
    ) -> StoreResult<Vec<Employee>> {
        let tables = self.tables();
        let mut rows: Vec<Employee> = tables
            .employees
            .iter()
            .filter(|employee| after.is_none_or(|cursor| employee.id > cursor))
            .cloned()
            .collect();
        rows.sort_by_key(|employee| employee.id);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn insert_attendance(&self, batch: &[NewAttendance]) -> StoreResult<Vec<Attendance>> {
        let mut tables = self.tables();
        let mut keys: HashSet<(Uuid, NaiveDate)> = tables
            .attendance
            .iter()
            .map(|record| (record.employee_id, record.date))
            .collect();
        for new in batch {
            tables.require_employee(entity::ATTENDANCE, new.employee_id())?;
            if !keys.insert((new.employee_id(), new.date())) {
                return Err(StoreError::UniqueViolation {
                    entity: entity::ATTENDANCE,
                    key: attendance_key(new.employee_id(), new.date()),
                });
            }
        }

        let now = Utc::now();
        let inserted: Vec<Attendance> = batch
            .iter()
            .cloned()
            .map(|new| Attendance::from_new(Uuid::new_v4(), new, now))
            .collect();
        tables.attendance.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn get_attendance(&self, id: Uuid) -> StoreResult<Attendance> {
        self.tables()
            .attendance
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(entity::ATTENDANCE, id))
    }

    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Attendance>> {
        let tables = self.tables();
        let mut matching: Vec<Attendance> = tables
            .attendance
            .iter()
            .filter(|record| filter.employee_id.is_none_or(|id| record.employee_id == id))
            .filter(|record| filter.date.is_none_or(|date| record.date == date))
            .filter(|record| {
                filter
                    .status
                    .as_ref()
                    .is_none_or(|status| *status == record.status)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|record| (record.date, record.employee_id));
        Ok(Page::from_all(matching, page))
    }

    async fn update_attendance(
        &self,
        id: Uuid,
        changes: AttendanceChanges,
    ) -> StoreResult<Attendance> {
        let mut tables = self.tables();
        let idx = tables
            .attendance
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| StoreError::not_found(entity::ATTENDANCE, id))?;

        let mut next = tables.attendance[idx].clone();
        next.apply(changes).map_err(|errors| StoreError::Invalid {
            entity: entity::ATTENDANCE,
            errors,
        })?;
        tables.require_employee(entity::ATTENDANCE, next.employee_id)?;
        if tables.attendance.iter().any(|other| {
            other.id != id && other.employee_id == next.employee_id && other.date == next.date
        }) {
            return Err(StoreError::UniqueViolation {
                entity: entity::ATTENDANCE,
                key: attendance_key(next.employee_id, next.date),
            });
        }

        tables.attendance[idx] = next.clone();
        Ok(next)
    }

    async fn delete_attendance(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables();
        let before = tables.attendance.len();
        tables.attendance.retain(|record| record.id != id);
        if tables.attendance.len() == before {
            return Err(StoreError::not_found(entity::ATTENDANCE, id));
        }
        Ok(())
    }

    async fn attendance_dates(&self, employee_id: Uuid) -> StoreResult<BTreeSet<NaiveDate>> {
        Ok(self
            .tables()
            .attendance
            .iter()
            .filter(|record| record.employee_id == employee_id)
            .map(|record| record.date)
            .collect())
    }

    async fn insert_reviews(
        &self,
        batch: &[NewPerformanceReview],
    ) -> StoreResult<Vec<PerformanceReview>> {
        let mut tables = self.tables();
        let mut keys: HashSet<(Uuid, NaiveDate)> = tables
            .reviews
            .iter()
            .map(|review| (review.employee_id, review.review_date))
            .collect();
        for new in batch {
            tables.require_employee(entity::REVIEW, new.employee_id)?;
            if let Some(reviewer) = new.reviewer_id {
                tables.require_employee(entity::REVIEW, reviewer)?;
            }
            if !keys.insert((new.employee_id, new.review_date)) {
                return Err(StoreError::UniqueViolation {
                    entity: entity::REVIEW,
                    key: review_key(new.employee_id, new.review_date),
                });
            }
        }

        let now = Utc::now();
        let inserted: Vec<PerformanceReview> = batch
            .iter()
            .cloned()
            .map(|new| PerformanceReview::from_new(Uuid::new_v4(), new, now))
            .collect();
        tables.reviews.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn get_review(&self, id: Uuid) -> StoreResult<PerformanceReview> {
        self.tables()
            .reviews
            .iter()
            .find(|review| review.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(entity::REVIEW, id))
    }

    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        page: PageRequest,
    ) -> StoreResult<Page<PerformanceReview>> {
        let tables = self.tables();
        let mut matching: Vec<PerformanceReview> = tables
            .reviews
            .iter()
            .filter(|review| filter.employee_id.is_none_or(|id| review.employee_id == id))
            .filter(|review| {
                filter
                    .review_date
                    .is_none_or(|date| review.review_date == date)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|review| (review.review_date, review.employee_id));
        Ok(Page::from_all(matching, page))
    }

    async fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChanges,
    ) -> StoreResult<PerformanceReview> {
        let mut tables = self.tables();
        let idx = tables
            .reviews
            .iter()
            .position(|review| review.id == id)
            .ok_or_else(|| StoreError::not_found(entity::REVIEW, id))?;

        let mut next = tables.reviews[idx].clone();
        next.apply(changes).map_err(|errors| StoreError::Invalid {
            entity: entity::REVIEW,
            errors,
        })?;
        tables.require_employee(entity::REVIEW, next.employee_id)?;
        if let Some(reviewer) = next.reviewer_id {
            tables.require_employee(entity::REVIEW, reviewer)?;
        }
        if tables.reviews.iter().any(|other| {
            other.id != id
                && other.employee_id == next.employee_id
                && other.review_date == next.review_date
        }) {
            return Err(StoreError::UniqueViolation {
                entity: entity::REVIEW,
                key: review_key(next.employee_id, next.review_date),
            });
        }

        tables.reviews[idx] = next.clone();
        Ok(next)
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables();
        let before = tables.reviews.len();
        tables.reviews.retain(|review| review.id != id);
        if tables.reviews.len() == before {
            return Err(StoreError::not_found(entity::REVIEW, id));
        }
        Ok(())
    }

    async fn review_dates(&self, employee_id: Uuid) -> StoreResult<BTreeSet<NaiveDate>> {
        Ok(self
            .tables()
            .reviews
            .iter()
            .filter(|review| review.employee_id == employee_id)
            .map(|review| review.review_date)
            .collect())
    }

    async fn count_employees(&self) -> StoreResult<i64> {
        Ok(self.tables().employees.len() as i64)
    }

    async fn count_employees_in(&self, range: EmployeeRange) -> StoreResult<i64> {
        Ok(self
            .tables()
            .employees
            .iter()
            .filter(|employee| range.matches(employee))
            .count() as i64)
    }

    async fn department_rollup(&self) -> StoreResult<Vec<DepartmentRollup>> {
        let tables = self.tables();
        let mut groups: BTreeMap<&str, (i64, i64, Decimal)> = BTreeMap::new();
        for employee in &tables.employees {
            let entry = groups
                .entry(employee.department.as_str())
                .or_insert((0, 0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += i64::from(employee.salary);
            entry.2 += employee.performance_score;
        }

        Ok(groups
            .into_iter()
            .map(|(department, (count, salary_sum, score_sum))| {
                let divisor = Decimal::from(count);
                DepartmentRollup {
                    department: department.to_string(),
                    employee_count: count,
                    average_salary: Decimal::from(salary_sum) / divisor,
                    average_performance: score_sum / divisor,
                }
            })
            .collect())
    }

    async fn gender_counts(&self) -> StoreResult<Vec<GenderCount>> {
        let tables = self.tables();
        let mut groups: BTreeMap<&str, i64> = BTreeMap::new();
        for employee in &tables.employees {
            *groups.entry(employee.gender.as_str()).or_insert(0) += 1;
        }
        Ok(groups
            .into_iter()
            .map(|(gender, count)| GenderCount {
                gender: gender.to_string(),
                count,
            })
            .collect())
    }
}
