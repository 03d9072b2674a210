use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::TagStore;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::Tag;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }

    /// Inserts a subject row. Hosts that keep subjects in their own
    /// tables only need this when the bundled schema is used as-is.
    pub fn create_subject(&self, id: &str) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO subjects (id, created_at) VALUES (?1, ?2)",
                params![id, format_datetime(&Utc::now())],
            )
            .map_err(constraint_to_exists)?;
        Ok(())
    }

    /// Removes a subject row. Call `TagSynchronizer::before_delete`
    /// first so frequencies and associations stay consistent.
    pub fn delete_subject(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM subjects WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn constraint_to_exists(e: rusqlite::Error) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::AlreadyExists
        }
        other => Error::Database(other),
    }
}

fn read_tag(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        frequency: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

impl TagStore for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn create_tag(&self, tag: &Tag) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO tags (id, name, frequency, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    tag.id,
                    tag.name,
                    tag.frequency,
                    format_datetime(&tag.created_at),
                ],
            )
            .map_err(constraint_to_exists)?;
        Ok(())
    }

    fn save_tag(&self, tag: &Tag) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE tags SET name = ?1, frequency = ?2 WHERE id = ?3",
                params![tag.name, tag.frequency, tag.id],
            )
            .map_err(constraint_to_exists)?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn get_tag_by_id(&self, id: &str) -> Result<Option<Tag>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, frequency, created_at FROM tags WHERE id = ?1",
            params![id],
            read_tag,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, frequency, created_at FROM tags WHERE name = ?1",
            params![name],
            read_tag,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_tags(&self, cursor: &str, limit: i32) -> Result<Vec<Tag>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, frequency, created_at
             FROM tags WHERE name > ?1 ORDER BY name LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], read_tag)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_tag(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn link(&self, subject_id: &str, tag_id: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO subject_tags (subject_id, tag_id) VALUES (?1, ?2)",
            params![subject_id, tag_id],
        )?;
        Ok(())
    }

    fn unlink(&self, subject_id: &str, tag_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM subject_tags WHERE subject_id = ?1 AND tag_id = ?2",
            params![subject_id, tag_id],
        )?;
        Ok(rows > 0)
    }

    fn linked_tags(&self, subject_id: &str) -> Result<Vec<Tag>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.frequency, t.created_at
             FROM tags t
             JOIN subject_tags st ON t.id = st.tag_id
             WHERE st.subject_id = ?1
             ORDER BY t.name",
        )?;

        let rows = stmt.query_map(params![subject_id], read_tag)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_tag_subjects(&self, tag_id: &str) -> Result<i64> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM subject_tags WHERE tag_id = ?1",
            params![tag_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn clear_associations(&self, subject_id: &str) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM subject_tags WHERE subject_id = ?1",
            params![subject_id],
        )?;
        Ok(rows)
    }

    fn bulk_decrement_frequency(&self, tag_ids: &[String], delta: i64) -> Result<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        let placeholders = vec!["?"; tag_ids.len()].join(", ");
        let sql = format!("UPDATE tags SET frequency = frequency - ? WHERE id IN ({placeholders})");

        let mut values: Vec<&dyn rusqlite::types::ToSql> = Vec::with_capacity(tag_ids.len() + 1);
        values.push(&delta);
        for id in tag_ids {
            values.push(id);
        }

        self.conn().execute(&sql, values.as_slice())?;
        Ok(())
    }

    fn batch_insert_associations(&self, rows: &[(String, String)]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        for (subject_id, tag_id) in rows {
            tx.execute(
                "INSERT OR IGNORE INTO subject_tags (subject_id, tag_id) VALUES (?1, ?2)",
                params![subject_id, tag_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}
