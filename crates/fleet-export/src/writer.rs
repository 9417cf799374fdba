//! The `ExportWriter` trait implemented by all backends.

use crate::row::{EventLogRow, KpiRow};
use crate::ExportResult;

/// Trait implemented by the CSV and SQLite writers.
pub trait ExportWriter {
    /// Append a batch of event rows.
    fn write_events(&mut self, rows: &[EventLogRow]) -> ExportResult<()>;

    /// Append one KPI sample.
    fn write_kpis(&mut self, row: &KpiRow) -> ExportResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> ExportResult<()>;
}
