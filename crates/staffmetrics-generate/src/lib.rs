//! Synthetic employee, attendance and performance-review data.
//!
//! [`GenerationEngine`] draws randomized records from a seeded RNG and writes
//! them through any [`RecordStore`](staffmetrics_store::RecordStore), keeping
//! every unique key unique under an explicit [`CollisionPolicy`].

pub mod corpus;
pub mod engine;
pub mod errors;
pub mod model;
pub mod records;

pub use engine::GenerationEngine;
pub use errors::GenerationError;
pub use model::{CollisionPolicy, EntityReport, GenerateOptions, GenerationReport};
