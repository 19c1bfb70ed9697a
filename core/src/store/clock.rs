use super::SimStore;
use crate::{error::SimResult, snapshot::SavedClockEntity};
use rusqlite::params;

/// One row of the clock_state table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockRow {
    pub uid:              u64,
    pub tile_x:           i32,
    pub tile_y:           i32,
    pub is_emitting_high: bool,
    pub up_period:        i32,
    pub down_period:      i32,
}

impl SimStore {
    // ── Clock state ────────────────────────────────────────────────

    pub fn insert_clock_rows(&self, snapshot_id: i64, clocks: &[SavedClockEntity]) -> SimResult<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO clock_state (
                snapshot_id, uid, tile_x, tile_y, is_emitting_high, up_period, down_period
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for c in clocks {
            stmt.execute(params![
                snapshot_id,
                c.uid as i64,
                c.tile.x,
                c.tile.y,
                if c.state.is_emitting_high { 1i32 } else { 0i32 },
                c.state.up_period.tenths(),
                c.state.down_period.tenths(),
            ])?;
        }
        Ok(())
    }

    pub fn clock_rows(&self, snapshot_id: i64) -> SimResult<Vec<ClockRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT uid, tile_x, tile_y, is_emitting_high, up_period, down_period
             FROM clock_state WHERE snapshot_id = ?1
             ORDER BY uid ASC",
        )?;
        let rows = stmt.query_map(params![snapshot_id], |row| {
            Ok(ClockRow {
                uid: row.get::<_, i64>(0)? as u64,
                tile_x: row.get(1)?,
                tile_y: row.get(2)?,
                is_emitting_high: row.get::<_, i32>(3)? != 0,
                up_period: row.get(4)?,
                down_period: row.get(5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
