//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine calls store methods. Nothing else executes SQL directly.

mod clock;

use crate::{command::PlayerCommand, error::SimResult, event::EventLogEntry, types::Tick};
use rusqlite::{params, Connection, OptionalExtension};

pub use clock::ClockRow;

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_clock_state.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    pub fn run_seed(&self, run_id: &str) -> SimResult<Option<u64>> {
        let seed = self
            .conn
            .query_row(
                "SELECT seed FROM run WHERE run_id = ?1",
                params![run_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(seed.map(|s| s as u64))
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, tick, subsystem, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.run_id,
                entry.tick as i64,
                entry.subsystem,
                entry.event_type,
                entry.payload,
                entry.tick as i64,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_tick(&self, run_id: &str, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, tick, subsystem, event_type, payload
             FROM event_log WHERE run_id = ?1 AND tick = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id, tick as i64], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    run_id: row.get(1)?,
                    tick: row.get::<_, i64>(2)? as u64,
                    subsystem: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> SimResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
                params![run_id, event_type],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    // ── Snapshot ───────────────────────────────────────────────

    /// Insert a snapshot row. Returns its id.
    pub fn save_snapshot(&self, run_id: &str, tick: Tick, state_json: &str) -> SimResult<i64> {
        self.conn.execute(
            "INSERT INTO snapshot (run_id, tick, state_json, saved_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, tick as i64, state_json, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent snapshot of a run: (snapshot id, tick, state json).
    pub fn latest_snapshot(&self, run_id: &str) -> SimResult<Option<(i64, Tick, String)>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, tick, state_json FROM snapshot
                 WHERE run_id = ?1 ORDER BY id DESC LIMIT 1",
                params![run_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)? as u64,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        Ok(result)
    }

    // ── Player Command Storage ────────────────────────────────

    pub fn store_player_command(
        &self,
        run_id: &str,
        tick: Tick,
        command: &PlayerCommand,
    ) -> SimResult<i64> {
        let payload = serde_json::to_string(command)?;

        self.conn.execute(
            "INSERT INTO player_command (run_id, tick, cmd_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![run_id, tick as i64, command.type_name(), payload],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_player_command(
        &self,
        run_id: &str,
        command_id: i64,
    ) -> SimResult<Option<PlayerCommand>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM player_command WHERE id = ?1 AND run_id = ?2",
                params![command_id, run_id],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }
}
