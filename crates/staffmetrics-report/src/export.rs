//! Employee CSV export.
//!
//! The table is read in id-ordered chunks so neither the writer export nor
//! the byte stream ever holds more than one chunk of rows.

use std::io::Write;
use std::sync::Arc;

use futures::Stream;
use futures::stream;
use tracing::info;
use uuid::Uuid;

use staffmetrics_core::Employee;
use staffmetrics_store::RecordStore;

use crate::errors::ReportError;

pub const CSV_HEADER: [&str; 11] = [
    "ID",
    "First Name",
    "Last Name",
    "Email",
    "Gender",
    "Age",
    "Department",
    "Position",
    "Salary",
    "Hire Date",
    "Performance Score",
];

/// Rows and bytes written by [`export_employees_csv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: u64,
    pub bytes: u64,
}

fn csv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(inner)
}

fn record(employee: &Employee) -> [String; 11] {
    [
        employee.id.to_string(),
        employee.first_name.clone(),
        employee.last_name.clone(),
        employee.email.clone(),
        employee.gender.clone(),
        employee.age.to_string(),
        employee.department.clone(),
        employee.position.clone(),
        employee.salary.to_string(),
        employee.hire_date.format("%Y-%m-%d").to_string(),
        format!("{:.1}", employee.performance_score),
    ]
}

/// Write the header and every employee to `out`.
pub async fn export_employees_csv<W: Write>(
    store: &dyn RecordStore,
    out: W,
    chunk_size: u32,
) -> Result<ExportSummary, ReportError> {
    let chunk_size = chunk_size.max(1);
    let mut writer = csv_writer(CountingWriter::new(out));
    writer.write_record(CSV_HEADER)?;

    let mut rows = 0_u64;
    let mut after: Option<Uuid> = None;
    loop {
        let chunk = store.employees_after(after, chunk_size).await?;
        for employee in &chunk {
            writer.write_record(record(employee))?;
        }
        rows += chunk.len() as u64;
        if chunk.len() < chunk_size as usize {
            break;
        }
        after = chunk.last().map(|employee| employee.id);
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    let summary = ExportSummary {
        rows,
        bytes: counting.bytes_written(),
    };
    info!(rows = summary.rows, bytes = summary.bytes, "employee export written");
    Ok(summary)
}

enum Cursor {
    Header,
    After(Option<Uuid>),
    Done,
}

/// The export as a stream of encoded chunks: the header first, then one
/// chunk per store read.
pub fn employee_csv_stream(
    store: Arc<dyn RecordStore>,
    chunk_size: u32,
) -> impl Stream<Item = Result<Vec<u8>, ReportError>> + Send + 'static {
    let chunk_size = chunk_size.max(1);
    stream::try_unfold(Cursor::Header, move |cursor| {
        let store = Arc::clone(&store);
        async move {
            match cursor {
                Cursor::Header => {
                    let bytes = encode(|writer| writer.write_record(CSV_HEADER))?;
                    Ok(Some((bytes, Cursor::After(None))))
                }
                Cursor::After(after) => {
                    let chunk = store.employees_after(after, chunk_size).await?;
                    if chunk.is_empty() {
                        return Ok(None);
                    }
                    let next = if chunk.len() < chunk_size as usize {
                        Cursor::Done
                    } else {
                        Cursor::After(chunk.last().map(|employee| employee.id))
                    };
                    let bytes = encode(|writer| {
                        chunk
                            .iter()
                            .try_for_each(|employee| writer.write_record(record(employee)))
                    })?;
                    Ok(Some((bytes, next)))
                }
                Cursor::Done => Ok(None),
            }
        }
    })
}

fn encode(
    fill: impl FnOnce(&mut csv::Writer<Vec<u8>>) -> Result<(), csv::Error>,
) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv_writer(Vec::new());
    fill(&mut writer)?;
    writer.flush()?;
    Ok(writer.into_inner().map_err(|err| err.into_error())?)
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
