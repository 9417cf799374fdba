//! Unit tests for fleet-export.

use fleet_core::LoadId;
use fleet_store::{EventKind, FleetStore};

use crate::csv::CsvExporter;
use crate::exporter::EventExporter;
use crate::row::{EventLogRow, KpiRow};
use crate::writer::ExportWriter;
use crate::ExportResult;

fn post_events(store: &FleetStore, start: u32, count: u32, at: f64) {
    for i in start..start + count {
        store.apply_events(at, vec![EventKind::NewLoadPosted { load_id: LoadId(i) }]);
    }
}

fn kpi_row(at: f64) -> KpiRow {
    KpiRow {
        timestamp: at,
        total_vehicles: 3,
        idle_vehicles: 2,
        en_route_vehicles: 1,
        available_loads: 4,
        active_trips: 1,
        avg_utilization: 61.25,
        total_km_today: 412.5,
    }
}

// ── In-memory backend for exporter logic ──────────────────────────────────────

#[derive(Default)]
struct MemoryWriter {
    events: Vec<EventLogRow>,
    kpis: Vec<KpiRow>,
    finished: u32,
}

impl ExportWriter for MemoryWriter {
    fn write_events(&mut self, rows: &[EventLogRow]) -> ExportResult<()> {
        self.events.extend_from_slice(rows);
        Ok(())
    }

    fn write_kpis(&mut self, row: &KpiRow) -> ExportResult<()> {
        self.kpis.push(*row);
        Ok(())
    }

    fn finish(&mut self) -> ExportResult<()> {
        self.finished += 1;
        Ok(())
    }
}

#[test]
fn watermark_exports_each_event_once() {
    let store = FleetStore::new(100);
    let mut exporter = EventExporter::new(MemoryWriter::default());

    post_events(&store, 1, 3, 1_000.0);
    assert_eq!(exporter.export_new(&store.snapshot(1_000.0)).unwrap(), 3);

    // Nothing new: nothing written.
    assert_eq!(exporter.export_new(&store.snapshot(1_001.0)).unwrap(), 0);

    post_events(&store, 4, 2, 1_002.0);
    assert_eq!(exporter.export_new(&store.snapshot(1_002.0)).unwrap(), 2);
    assert!(!exporter.gap_detected());

    let writer = exporter.finish().unwrap();
    let seqs: Vec<u64> = writer.events.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    assert_eq!(writer.events[0].event_type, "new_load_posted");
    assert!(writer.events[0].details.contains("load_001"));
}

#[test]
fn ring_overflow_is_reported_as_a_gap() {
    // Tiny ring: events fall off between export passes.
    let store = FleetStore::new(2);
    let mut exporter = EventExporter::new(MemoryWriter::default());

    post_events(&store, 1, 2, 1_000.0);
    exporter.export_new(&store.snapshot(1_000.0)).unwrap();

    // Five more events through a 2-slot ring: seqs 2..=4 are gone.
    post_events(&store, 3, 5, 1_001.0);
    exporter.export_new(&store.snapshot(1_001.0)).unwrap();
    assert!(exporter.gap_detected());
}

#[test]
fn csv_backend_writes_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FleetStore::new(100);
    post_events(&store, 1, 4, 1_000.0);

    let mut exporter = EventExporter::new(CsvExporter::new(dir.path()).unwrap());
    exporter.export_new(&store.snapshot(1_000.0)).unwrap();
    exporter.export_kpis(&kpi_row(1_000.0)).unwrap();
    exporter.finish().unwrap();

    let events = std::fs::read_to_string(dir.path().join("event_log.csv")).unwrap();
    assert!(events.starts_with("seq,timestamp,event_type,details"));
    assert_eq!(events.lines().count(), 5); // header + 4 rows
    assert!(events.contains("new_load_posted"));

    let kpis = std::fs::read_to_string(dir.path().join("kpi_log.csv")).unwrap();
    assert_eq!(kpis.lines().count(), 2);
    assert!(kpis.contains("61.25"));
}

#[test]
fn finish_is_idempotent() {
    let mut writer = MemoryWriter::default();
    writer.finish().unwrap();
    writer.finish().unwrap();
    // The in-memory double counts calls; real backends guard with a flag.
    assert_eq!(writer.finished, 2);

    let dir = tempfile::tempdir().unwrap();
    let mut csv = CsvExporter::new(dir.path()).unwrap();
    csv.finish().unwrap();
    csv.finish().unwrap();
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use crate::sqlite::SqliteExporter;

    #[test]
    fn sqlite_backend_round_trips_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = FleetStore::new(100);
        post_events(&store, 1, 3, 1_000.0);

        let mut exporter = EventExporter::new(SqliteExporter::new(dir.path()).unwrap());
        exporter.export_new(&store.snapshot(1_000.0)).unwrap();
        exporter.export_kpis(&kpi_row(1_000.0)).unwrap();
        exporter.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("fleet_log.db")).unwrap();
        let events: i64 = conn
            .query_row("SELECT COUNT(*) FROM event_log", [], |r| r.get(0))
            .unwrap();
        assert_eq!(events, 3);
        let kpis: i64 = conn
            .query_row("SELECT COUNT(*) FROM kpi_log", [], |r| r.get(0))
            .unwrap();
        assert_eq!(kpis, 1);
    }
}
