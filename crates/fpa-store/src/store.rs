use std::path::Path;

use rusqlite::{Connection, params};

use fpa_core::PathCompass;

use crate::error::{Result, StoreError};
use crate::schema;

/// One persisted segment row: the scalar summary columns plus the full
/// compass state rehydrated from its JSON snapshot.
#[derive(Debug)]
pub struct SegmentRecord {
    pub id: i64,
    pub compass: PathCompass,
    pub created_at: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).ok();
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Save ---

    /// Persist one finished segment. Scalar summary fields land in queryable
    /// columns; the full compass state is kept as a JSON snapshot so a
    /// segment can be rehydrated losslessly.
    pub fn save_segment(&self, segment: &PathCompass) -> Result<i64> {
        let state = serde_json::to_string(segment)
            .map_err(|e| StoreError::InvalidData(format!("segment serialization failed: {e}")))?;

        self.conn.execute(
            "INSERT INTO segments
             (subject_id, start_timestamp, end_timestamp, step_count, total_path_length,
              mean_step_size, dimension, min_multiplier, max_multiplier, velocity_mode, state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                segment.subject_id,
                segment.start_timestamp,
                segment.end_timestamp,
                segment.step_count,
                segment.total_path_length,
                segment.mean_step_size,
                segment.dimension,
                segment.min_multiplier,
                segment.max_multiplier,
                segment.velocity_mode as i32,
                state,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Persist a batch of segments in one transaction.
    pub fn save_segments(&self, segments: &[PathCompass]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO segments
                 (subject_id, start_timestamp, end_timestamp, step_count, total_path_length,
                  mean_step_size, dimension, min_multiplier, max_multiplier, velocity_mode, state)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for segment in segments {
                let state = serde_json::to_string(segment).map_err(|e| {
                    StoreError::InvalidData(format!("segment serialization failed: {e}"))
                })?;
                stmt.execute(params![
                    segment.subject_id,
                    segment.start_timestamp,
                    segment.end_timestamp,
                    segment.step_count,
                    segment.total_path_length,
                    segment.mean_step_size,
                    segment.dimension,
                    segment.min_multiplier,
                    segment.max_multiplier,
                    segment.velocity_mode as i32,
                    state,
                ])?;
            }
        }
        tx.commit()?;
        tracing::info!("saved {} segments", segments.len());
        Ok(())
    }

    // --- Load ---

    /// All segments in insertion order.
    pub fn load_segments(&self) -> Result<Vec<SegmentRecord>> {
        self.query_segments("SELECT id, state, created_at FROM segments ORDER BY id", &[])
    }

    /// Segments for one subject, in insertion order.
    pub fn load_segments_for(&self, subject_id: &str) -> Result<Vec<SegmentRecord>> {
        self.query_segments(
            "SELECT id, state, created_at FROM segments WHERE subject_id = ?1 ORDER BY id",
            &[&subject_id],
        )
    }

    fn query_segments(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<SegmentRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows: Vec<(i64, String, String)> = stmt
            .query_map(args, |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter()
            .map(|(id, state, created_at)| {
                let compass: PathCompass = serde_json::from_str(&state).map_err(|e| {
                    StoreError::InvalidData(format!("corrupt segment state (id {id}): {e}"))
                })?;
                Ok(SegmentRecord {
                    id,
                    compass,
                    created_at,
                })
            })
            .collect()
    }

    /// Distinct subject ids with at least one stored segment.
    pub fn subject_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT subject_id FROM segments ORDER BY subject_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(ids)
    }

    pub fn segment_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM segments", [], |row| row.get(0))?;
        Ok(count)
    }
}
