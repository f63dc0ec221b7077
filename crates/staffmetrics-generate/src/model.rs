use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What to do when a drawn record collides with a unique key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Re-draw the colliding field, up to `max_attempts_per_record` times.
    #[default]
    Redraw,
    /// Fail on the first collision.
    Abort,
}

/// Options for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub employee_count: u32,
    pub attendance_per_employee: u32,
    pub reviews_per_employee: u32,
    /// Delete every employee (and by cascade everything else) first.
    pub clean: bool,
    /// Seed for the record RNG. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Employees built and inserted per store call.
    pub batch_size: u32,
    pub on_collision: CollisionPolicy,
    /// Draws allowed for one record before giving up under `Redraw`.
    pub max_attempts_per_record: u32,
    /// Anchor for hire dates, attendance dates and review dates. `None`
    /// means the current UTC date.
    pub today: Option<NaiveDate>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            employee_count: 10,
            attendance_per_employee: 30,
            reviews_per_employee: 2,
            clean: false,
            seed: None,
            batch_size: 100,
            on_collision: CollisionPolicy::Redraw,
            max_attempts_per_record: 50,
            today: None,
        }
    }
}

/// Per-entity counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReport {
    pub requested: u64,
    pub inserted: u64,
    /// Draws thrown away because of a key collision.
    pub redraws: u64,
}

/// Summary of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub seed: u64,
    pub today: NaiveDate,
    /// Employees removed by `clean`.
    pub deleted: u64,
    pub employees: EntityReport,
    pub attendance: EntityReport,
    pub reviews: EntityReport,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(seed: u64, today: NaiveDate) -> Self {
        Self {
            seed,
            today,
            deleted: 0,
            employees: EntityReport::default(),
            attendance: EntityReport::default(),
            reviews: EntityReport::default(),
            duration_ms: 0,
        }
    }
}
