use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::format_date;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::plugin::PluginMigrations;

pub const NOTES_TABLE: &str = "calendar_notes";

const CREATE_NOTES_SQL: &str = "CREATE TABLE IF NOT EXISTS calendar_notes (
    id INTEGER PRIMARY KEY,
    note_date TEXT NOT NULL UNIQUE,
    body TEXT NOT NULL
)";

const DROP_NOTES_SQL: &str = "DROP TABLE IF EXISTS calendar_notes";

pub struct CalendarMigrations;

impl PluginMigrations for CalendarMigrations {
    fn create_tables(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(CREATE_NOTES_SQL)?;
        Ok(())
    }

    fn drop_tables(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(DROP_NOTES_SQL)?;
        Ok(())
    }
}

/// The note for `date`; `None` also when the notes table was never created.
pub fn get_note(db: &Database, date: NaiveDate) -> Result<Option<String>> {
    if !db.table_exists(NOTES_TABLE)? {
        return Ok(None);
    }
    db.with_transaction(|tx| {
        let body = tx
            .query_row(
                "SELECT body FROM calendar_notes WHERE note_date = ?1",
                params![format_date(date)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body)
    })
}

/// Insert or replace the note for `date`.
pub fn set_note(db: &Database, date: NaiveDate, body: &str) -> Result<()> {
    if !db.table_exists(NOTES_TABLE)? {
        return Err(Error::OperationFailed(
            "calendar notes table missing; run `keeper migrate calendar create`".to_string(),
        ));
    }
    db.with_transaction(|tx| {
        tx.execute(
            "INSERT INTO calendar_notes (note_date, body) VALUES (?1, ?2)
             ON CONFLICT(note_date) DO UPDATE SET body = excluded.body",
            params![format_date(date), body],
        )?;
        Ok(())
    })?;
    tracing::debug!(date = %date, "calendar note saved");
    Ok(())
}
