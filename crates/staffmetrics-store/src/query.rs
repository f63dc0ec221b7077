//! Filters, paging and aggregate row shapes accepted and returned by
//! [`RecordStore`](crate::RecordStore).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Employee list filters. Exact matches on the categorical columns, plus a
/// case-insensitive substring `search` over first name, last name,
/// department and position.
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub position: Option<String>,
    pub gender: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub employee_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub employee_id: Option<Uuid>,
    pub review_date: Option<NaiveDate>,
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 50)
    }
}

/// One page of results with the total number of matching rows.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Slice an already-filtered, already-ordered result set.
    pub fn from_all(items: Vec<T>, request: PageRequest) -> Self {
        let count = items.len() as u64;
        let results = items
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.page_size as usize)
            .collect();
        Self {
            count,
            page: request.page,
            page_size: request.page_size,
            results,
        }
    }
}

/// Inclusive range predicates over the employee table used by the
/// distribution reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeRange {
    /// `min <= salary <= max`
    Salary { min: i32, max: i32 },
    /// `min <= age <= max`
    Age { min: i32, max: i32 },
    /// `on_or_after <= hire_date < before`
    HiredBetween {
        on_or_after: NaiveDate,
        before: NaiveDate,
    },
}

impl EmployeeRange {
    pub fn matches(&self, employee: &staffmetrics_core::Employee) -> bool {
        match *self {
            EmployeeRange::Salary { min, max } => (min..=max).contains(&employee.salary),
            EmployeeRange::Age { min, max } => (min..=max).contains(&employee.age),
            EmployeeRange::HiredBetween {
                on_or_after,
                before,
            } => employee.hire_date >= on_or_after && employee.hire_date < before,
        }
    }
}

/// Per-department aggregate as computed by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentRollup {
    pub department: String,
    pub employee_count: i64,
    pub average_salary: Decimal,
    pub average_performance: Decimal,
}

/// Headcount for one stored gender value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenderCount {
    pub gender: String,
    pub count: i64,
}
