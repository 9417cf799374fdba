//! `EventExporter<W>` — tails the event ring through any backend.

use fleet_store::Snapshot;

use crate::row::{EventLogRow, KpiRow};
use crate::writer::ExportWriter;
use crate::ExportResult;

/// Drains events newer than a sequence watermark from successive
/// snapshots and appends them to a backend.
///
/// The ring is bounded, so a consumer that lags more than `ring_size`
/// events misses the overflow; [`gap_detected`](Self::gap_detected)
/// reports when that happened.
pub struct EventExporter<W: ExportWriter> {
    writer: W,
    last_seq: Option<u64>,
    gap_detected: bool,
}

impl<W: ExportWriter> EventExporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            last_seq: None,
            gap_detected: false,
        }
    }

    /// Export every event in `snapshot` newer than the watermark.
    /// Returns the number of rows written.
    pub fn export_new(&mut self, snapshot: &Snapshot) -> ExportResult<usize> {
        let newer_than = self.last_seq;
        let rows: Vec<EventLogRow> = snapshot
            .recent_events
            .iter()
            .filter(|e| newer_than.is_none() || Some(e.seq) > newer_than)
            .map(|e| {
                Ok(EventLogRow {
                    seq: e.seq,
                    timestamp: e.timestamp,
                    event_type: e.kind.type_name(),
                    details: serde_json::to_string(&e.kind)?,
                })
            })
            .collect::<ExportResult<_>>()?;

        if let (Some(last), Some(first_new)) = (self.last_seq, rows.first()) {
            if first_new.seq > last + 1 {
                self.gap_detected = true;
            }
        }

        if let Some(newest) = rows.last() {
            self.last_seq = Some(newest.seq);
        }
        self.writer.write_events(&rows)?;
        Ok(rows.len())
    }

    /// Append one KPI sample.
    pub fn export_kpis(&mut self, row: &KpiRow) -> ExportResult<()> {
        self.writer.write_kpis(row)
    }

    /// `true` if events fell off the ring before being exported.
    pub fn gap_detected(&self) -> bool {
        self.gap_detected
    }

    /// Flush and close the backend, returning it.
    pub fn finish(mut self) -> ExportResult<W> {
        self.writer.finish()?;
        Ok(self.writer)
    }
}
