//! SQLite export backend (feature `sqlite`).
//!
//! Creates a single `fleet_log.db` in the configured directory with two
//! tables: `event_log` and `kpi_log`.

use std::path::Path;

use rusqlite::Connection;

use crate::row::{EventLogRow, KpiRow};
use crate::writer::ExportWriter;
use crate::ExportResult;

/// Writes the event stream and KPI samples to an SQLite database.
pub struct SqliteExporter {
    conn: Connection,
    finished: bool,
}

impl SqliteExporter {
    /// Open (or create) `fleet_log.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> ExportResult<Self> {
        let conn = Connection::open(dir.join("fleet_log.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS event_log (
                 seq        INTEGER PRIMARY KEY,
                 timestamp  REAL NOT NULL,
                 event_type TEXT NOT NULL,
                 details    TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS kpi_log (
                 timestamp         REAL NOT NULL,
                 total_vehicles    INTEGER NOT NULL,
                 idle_vehicles     INTEGER NOT NULL,
                 en_route_vehicles INTEGER NOT NULL,
                 available_loads   INTEGER NOT NULL,
                 active_trips      INTEGER NOT NULL,
                 avg_utilization   REAL NOT NULL,
                 total_km_today    REAL NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl ExportWriter for SqliteExporter {
    fn write_events(&mut self, rows: &[EventLogRow]) -> ExportResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO event_log (seq, timestamp, event_type, details) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.seq,
                    row.timestamp,
                    row.event_type,
                    row.details,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_kpis(&mut self, row: &KpiRow) -> ExportResult<()> {
        self.conn.execute(
            "INSERT INTO kpi_log (timestamp, total_vehicles, idle_vehicles, \
             en_route_vehicles, available_loads, active_trips, avg_utilization, \
             total_km_today) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                row.timestamp,
                row.total_vehicles,
                row.idle_vehicles,
                row.en_route_vehicles,
                row.available_loads,
                row.active_trips,
                row.avg_utilization,
                row.total_km_today,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> ExportResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
