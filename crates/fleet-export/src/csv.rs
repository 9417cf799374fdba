//! CSV export backend.
//!
//! Creates two files in the configured directory:
//! - `event_log.csv`
//! - `kpi_log.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::row::{EventLogRow, KpiRow};
use crate::writer::ExportWriter;
use crate::ExportResult;

/// Writes the event stream and KPI samples to two CSV files.
pub struct CsvExporter {
    events: Writer<File>,
    kpis: Writer<File>,
    finished: bool,
}

impl CsvExporter {
    /// Open (or create) both files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> ExportResult<Self> {
        let mut events = Writer::from_path(dir.join("event_log.csv"))?;
        events.write_record(["seq", "timestamp", "event_type", "details"])?;

        let mut kpis = Writer::from_path(dir.join("kpi_log.csv"))?;
        kpis.write_record([
            "timestamp",
            "total_vehicles",
            "idle_vehicles",
            "en_route_vehicles",
            "available_loads",
            "active_trips",
            "avg_utilization",
            "total_km_today",
        ])?;

        Ok(Self { events, kpis, finished: false })
    }
}

impl ExportWriter for CsvExporter {
    fn write_events(&mut self, rows: &[EventLogRow]) -> ExportResult<()> {
        for row in rows {
            self.events.write_record(&[
                row.seq.to_string(),
                format!("{:.3}", row.timestamp),
                row.event_type.to_string(),
                row.details.clone(),
            ])?;
        }
        Ok(())
    }

    fn write_kpis(&mut self, row: &KpiRow) -> ExportResult<()> {
        self.kpis.write_record(&[
            format!("{:.3}", row.timestamp),
            row.total_vehicles.to_string(),
            row.idle_vehicles.to_string(),
            row.en_route_vehicles.to_string(),
            row.available_loads.to_string(),
            row.active_trips.to_string(),
            format!("{:.2}", row.avg_utilization),
            format!("{:.1}", row.total_km_today),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> ExportResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.events.flush()?;
        self.kpis.flush()?;
        Ok(())
    }
}
