//! `fleet-export` — the event-stream consumer.
//!
//! The engine itself persists nothing; this crate is the external
//! collaborator that tails the event ring and appends what it sees to
//! flat files, plus periodic KPI rows.
//!
//! Two backends behind one trait:
//!
//! | Feature  | Backend | Files created                      |
//! |----------|---------|------------------------------------|
//! | *(none)* | CSV     | `event_log.csv`, `kpi_log.csv`     |
//! | `sqlite` | SQLite  | `fleet_log.db`                     |
//!
//! Because the ring is bounded, the exporter must run at least once per
//! `ring_size` events or the oldest entries fall off before being seen;
//! [`EventExporter`] tracks the last exported sequence number and reports
//! gaps.

pub mod csv;
pub mod error;
pub mod exporter;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::CsvExporter;
pub use error::{ExportError, ExportResult};
pub use exporter::EventExporter;
pub use row::{EventLogRow, KpiRow};
pub use writer::ExportWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExporter;
