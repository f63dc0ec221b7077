//! Read-only reports over the employee table: department rollups, fixed
//! bucket distributions and the CSV export.

pub mod buckets;
pub mod engine;
pub mod errors;
pub mod export;
pub mod model;

pub use buckets::{
    AGE_BUCKETS, Bucket, SALARY_BUCKETS, TENURE_BUCKETS, shift_years, tenure_window,
};
pub use engine::ReportEngine;
pub use errors::ReportError;
pub use export::{CSV_HEADER, ExportSummary, employee_csv_stream, export_employees_csv};
pub use model::{DepartmentStat, RangeCount};
