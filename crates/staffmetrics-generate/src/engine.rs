use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use uuid::Uuid;

use staffmetrics_store::{RecordStore, attendance_key, entity, review_key};

use crate::errors::GenerationError;
use crate::model::{CollisionPolicy, GenerateOptions, GenerationReport};
use crate::records::{
    draw_attendance, draw_attendance_date, draw_employee, draw_review, draw_review_date,
    pick_reviewer, redraw_name,
};

/// Entry point for filling a record store with synthetic data.
pub struct GenerationEngine {
    options: GenerateOptions,
    store: Arc<dyn RecordStore>,
}

impl GenerationEngine {
    pub fn new(store: Arc<dyn RecordStore>, options: GenerateOptions) -> Self {
        Self { options, store }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub async fn run(&self) -> Result<GenerationReport, GenerationError> {
        self.check_options()?;
        let start = Instant::now();
        let seed = self.options.seed.unwrap_or_else(rand::random);
        let today = self.options.today.unwrap_or_else(|| Utc::now().date_naive());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut report = GenerationReport::new(seed, today);

        info!(
            engine = self.store.engine(),
            seed,
            %today,
            employees = self.options.employee_count,
            attendance_per_employee = self.options.attendance_per_employee,
            reviews_per_employee = self.options.reviews_per_employee,
            on_collision = ?self.options.on_collision,
            "generation started"
        );

        if self.options.clean {
            report.deleted = self.store.delete_all_employees().await?;
            info!(deleted = report.deleted, "existing data cleaned");
        }

        let fresh = self.generate_employees(&mut rng, today, &mut report).await?;

        let needs_ids =
            self.options.attendance_per_employee > 0 || self.options.reviews_per_employee > 0;
        if needs_ids {
            let ids = self.store.employee_ids().await?;
            if self.options.attendance_per_employee > 0 {
                self.generate_attendance(&mut rng, today, &ids, &fresh, &mut report)
                    .await?;
            }
            if self.options.reviews_per_employee > 0 {
                self.generate_reviews(&mut rng, today, &ids, &fresh, &mut report)
                    .await?;
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            employees = report.employees.inserted,
            attendance = report.attendance.inserted,
            reviews = report.reviews.inserted,
            redraws = report.employees.redraws
                + report.attendance.redraws
                + report.reviews.redraws,
            duration_ms = report.duration_ms,
            "generation finished"
        );
        Ok(report)
    }

    fn check_options(&self) -> Result<(), GenerationError> {
        if self.options.batch_size == 0 {
            return Err(GenerationError::InvalidOptions(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.options.max_attempts_per_record == 0 {
            return Err(GenerationError::InvalidOptions(
                "max_attempts_per_record must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Decide whether a record that collided after `attempts` draws may be
    /// drawn again.
    fn on_collision(
        &self,
        attempts: u32,
        entity: &'static str,
        key: impl FnOnce() -> String,
    ) -> Result<(), GenerationError> {
        let exhausted = match self.options.on_collision {
            CollisionPolicy::Abort => true,
            CollisionPolicy::Redraw => attempts >= self.options.max_attempts_per_record,
        };
        if exhausted {
            return Err(GenerationError::Duplicate { entity, key: key() });
        }
        Ok(())
    }

    /// Insert employees in batches and return the ids created by this run.
    async fn generate_employees(
        &self,
        rng: &mut ChaCha8Rng,
        today: NaiveDate,
        report: &mut GenerationReport,
    ) -> Result<HashSet<Uuid>, GenerationError> {
        let total = self.options.employee_count;
        report.employees.requested = u64::from(total);
        let mut fresh = HashSet::with_capacity(total as usize);
        let mut seen: HashSet<String> = HashSet::new();
        let mut produced = 0_u32;

        while produced < total {
            let size = self.options.batch_size.min(total - produced) as usize;
            let mut batch = Vec::with_capacity(size);
            let mut attempts = Vec::with_capacity(size);

            for _ in 0..size {
                let mut employee = draw_employee(rng, today);
                let mut tries = 1;
                while !seen.insert(employee.email.clone()) {
                    self.on_collision(tries, entity::EMPLOYEE, || employee.email.clone())?;
                    tries += 1;
                    report.employees.redraws += 1;
                    redraw_name(&mut employee, rng);
                }
                batch.push(employee);
                attempts.push(tries);
            }

            // Emails already in the store stay in `seen`, so a redraw can
            // never land on them again.
            let mut pending: Vec<usize> = (0..batch.len()).collect();
            loop {
                let candidates: Vec<String> =
                    pending.iter().map(|&i| batch[i].email.clone()).collect();
                let taken = self.store.taken_emails(&candidates).await?;
                pending.retain(|&i| taken.contains(&batch[i].email));
                if pending.is_empty() {
                    break;
                }
                for &i in &pending {
                    loop {
                        self.on_collision(attempts[i], entity::EMPLOYEE, || {
                            batch[i].email.clone()
                        })?;
                        attempts[i] += 1;
                        report.employees.redraws += 1;
                        redraw_name(&mut batch[i], rng);
                        if seen.insert(batch[i].email.clone()) {
                            break;
                        }
                    }
                }
            }

            let inserted = self.store.insert_employees(&batch).await?;
            fresh.extend(inserted.iter().map(|employee| employee.id));
            produced += size as u32;
            report.employees.inserted += inserted.len() as u64;
            info!(
                batch = inserted.len(),
                progress = produced,
                total,
                "employee batch inserted"
            );
        }
        Ok(fresh)
    }

    async fn generate_attendance(
        &self,
        rng: &mut ChaCha8Rng,
        today: NaiveDate,
        ids: &[Uuid],
        fresh: &HashSet<Uuid>,
        report: &mut GenerationReport,
    ) -> Result<(), GenerationError> {
        let per_employee = self.options.attendance_per_employee;
        report.attendance.requested = u64::from(per_employee) * ids.len() as u64;

        for (index, &employee_id) in ids.iter().enumerate() {
            let mut taken = self.existing_dates(employee_id, fresh, DateKind::Attendance).await?;
            let mut batch = Vec::with_capacity(per_employee as usize);
            for _ in 0..per_employee {
                let mut date = draw_attendance_date(rng, today);
                let mut tries = 1;
                while !taken.insert(date) {
                    self.on_collision(tries, entity::ATTENDANCE, || {
                        attendance_key(employee_id, date)
                    })?;
                    tries += 1;
                    report.attendance.redraws += 1;
                    date = draw_attendance_date(rng, today);
                }
                batch.push(draw_attendance(rng, employee_id, date));
            }
            let inserted = self.store.insert_attendance(&batch).await?;
            report.attendance.inserted += inserted.len() as u64;
            self.progress("attendance", index, ids.len());
        }
        info!(
            inserted = report.attendance.inserted,
            per_employee, "attendance generated"
        );
        Ok(())
    }

    async fn generate_reviews(
        &self,
        rng: &mut ChaCha8Rng,
        today: NaiveDate,
        ids: &[Uuid],
        fresh: &HashSet<Uuid>,
        report: &mut GenerationReport,
    ) -> Result<(), GenerationError> {
        let per_employee = self.options.reviews_per_employee;
        report.reviews.requested = u64::from(per_employee) * ids.len() as u64;

        for (index, &employee_id) in ids.iter().enumerate() {
            let mut taken = self.existing_dates(employee_id, fresh, DateKind::Review).await?;
            let mut batch = Vec::with_capacity(per_employee as usize);
            for _ in 0..per_employee {
                let mut review_date = draw_review_date(rng, today);
                let mut tries = 1;
                while !taken.insert(review_date) {
                    self.on_collision(tries, entity::REVIEW, || {
                        review_key(employee_id, review_date)
                    })?;
                    tries += 1;
                    report.reviews.redraws += 1;
                    review_date = draw_review_date(rng, today);
                }
                let reviewer = pick_reviewer(rng, ids, index);
                batch.push(draw_review(rng, employee_id, reviewer, review_date));
            }
            let inserted = self.store.insert_reviews(&batch).await?;
            report.reviews.inserted += inserted.len() as u64;
            self.progress("reviews", index, ids.len());
        }
        info!(
            inserted = report.reviews.inserted,
            per_employee, "performance reviews generated"
        );
        Ok(())
    }

    /// Dates already used by `employee_id`. Employees created in this run
    /// have none, so the store is not asked.
    async fn existing_dates(
        &self,
        employee_id: Uuid,
        fresh: &HashSet<Uuid>,
        kind: DateKind,
    ) -> Result<BTreeSet<NaiveDate>, GenerationError> {
        if fresh.contains(&employee_id) {
            return Ok(BTreeSet::new());
        }
        let dates = match kind {
            DateKind::Attendance => self.store.attendance_dates(employee_id).await?,
            DateKind::Review => self.store.review_dates(employee_id).await?,
        };
        Ok(dates)
    }

    fn progress(&self, stage: &'static str, index: usize, total: usize) {
        let done = index + 1;
        if done % self.options.batch_size as usize == 0 || done == total {
            debug!(stage, employees = done, total, "progress");
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DateKind {
    Attendance,
    Review,
}
