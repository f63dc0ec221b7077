//! Fixed, ordered distribution buckets.

use chrono::{Days, Months, NaiveDate};

use staffmetrics_core::{MAX_AGE, MAX_SALARY, MAX_TENURE_YEARS, MIN_AGE};
use staffmetrics_store::EmployeeRange;

/// A labelled range. Salary and age buckets are inclusive on both ends;
/// tenure buckets are `(min, max]` in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub label: &'static str,
    pub min: i32,
    pub max: i32,
}

const fn bucket(label: &'static str, min: i32, max: i32) -> Bucket {
    Bucket { label, min, max }
}

pub const SALARY_BUCKETS: [Bucket; 5] = [
    bucket("$0-$50K", 0, 50_000),
    bucket("$50K-$75K", 50_001, 75_000),
    bucket("$75K-$100K", 75_001, 100_000),
    bucket("$100K-$150K", 100_001, 150_000),
    bucket("$150K+", 150_001, MAX_SALARY),
];

pub const AGE_BUCKETS: [Bucket; 5] = [
    bucket("20-29", MIN_AGE, 29),
    bucket("30-39", 30, 39),
    bucket("40-49", 40, 49),
    bucket("50-59", 50, 59),
    bucket("60+", 60, MAX_AGE),
];

pub const TENURE_BUCKETS: [Bucket; 5] = [
    bucket("<1 Year", 0, 1),
    bucket("1-2 Years", 1, 2),
    bucket("2-5 Years", 2, 5),
    bucket("5-10 Years", 5, 10),
    bucket("10+ Years", 10, MAX_TENURE_YEARS as i32),
];

/// `date` moved back `years` calendar years. Feb 29 lands on Feb 28 when
/// the target year is not a leap year.
pub fn shift_years(date: NaiveDate, years: i32) -> NaiveDate {
    let months = Months::new(years.unsigned_abs() * 12);
    let shifted = if years >= 0 {
        date.checked_sub_months(months)
    } else {
        date.checked_add_months(months)
    };
    shifted.unwrap_or(if years >= 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Hire-date window of a tenure bucket as seen on `today`.
///
/// `(min, max]` years of tenure means `today - max <= hire_date < today - min`.
/// The first bucket also takes hires dated today.
pub fn tenure_window(bucket: &Bucket, today: NaiveDate) -> EmployeeRange {
    let on_or_after = shift_years(today, bucket.max);
    let before = if bucket.min == 0 {
        today.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)
    } else {
        shift_years(today, bucket.min)
    };
    EmployeeRange::HiredBetween {
        on_or_after,
        before,
    }
}

pub fn salary_range(bucket: &Bucket) -> EmployeeRange {
    EmployeeRange::Salary {
        min: bucket.min,
        max: bucket.max,
    }
}

pub fn age_range(bucket: &Bucket) -> EmployeeRange {
    EmployeeRange::Age {
        min: bucket.min,
        max: bucket.max,
    }
}
