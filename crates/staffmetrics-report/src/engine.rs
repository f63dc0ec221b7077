use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::debug;

use staffmetrics_store::{EmployeeRange, GenderCount, RecordStore};

use crate::buckets::{
    AGE_BUCKETS, Bucket, SALARY_BUCKETS, TENURE_BUCKETS, age_range, salary_range, tenure_window,
};
use crate::errors::ReportError;
use crate::model::{DepartmentStat, RangeCount};

/// Read-only aggregate views over the employee table.
///
/// Each report is computed from independent store reads; two reports
/// requested together are not a consistent snapshot.
#[derive(Clone)]
pub struct ReportEngine {
    store: Arc<dyn RecordStore>,
}

impl ReportEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// One entry per department that has employees, ordered by name.
    pub async fn department_stats(&self) -> Result<Vec<DepartmentStat>, ReportError> {
        let rollup = self.store.department_rollup().await?;
        Ok(rollup.into_iter().map(DepartmentStat::from).collect())
    }

    pub async fn salary_distribution(&self) -> Result<Vec<RangeCount>, ReportError> {
        self.distribution("salary", &SALARY_BUCKETS, salary_range).await
    }

    pub async fn age_distribution(&self) -> Result<Vec<RangeCount>, ReportError> {
        self.distribution("age", &AGE_BUCKETS, age_range).await
    }

    /// Headcount per stored gender value, ordered by value.
    pub async fn gender_distribution(&self) -> Result<Vec<GenderCount>, ReportError> {
        Ok(self.store.gender_counts().await?)
    }

    /// Tenure distribution as of the current UTC date.
    pub async fn tenure_distribution(&self) -> Result<Vec<RangeCount>, ReportError> {
        self.tenure_distribution_on(Utc::now().date_naive()).await
    }

    pub async fn tenure_distribution_on(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<RangeCount>, ReportError> {
        self.distribution("tenure", &TENURE_BUCKETS, |bucket| {
            tenure_window(bucket, today)
        })
        .await
    }

    async fn distribution(
        &self,
        name: &'static str,
        buckets: &[Bucket],
        range: impl Fn(&Bucket) -> EmployeeRange,
    ) -> Result<Vec<RangeCount>, ReportError> {
        let mut counts = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let count = self.store.count_employees_in(range(bucket)).await?;
            counts.push(RangeCount {
                range: bucket.label,
                count,
            });
        }
        debug!(
            distribution = name,
            total = counts.iter().map(|entry| entry.count).sum::<i64>(),
            "distribution computed"
        );
        Ok(counts)
    }
}
