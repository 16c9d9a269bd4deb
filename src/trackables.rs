//! Trackable API: the only sanctioned path from plugins to persistent state.
//!
//! A trackable is anything a plugin wants to follow over time (a task, a
//! habit, a metric). Its changing state is never stored on the row itself;
//! it is derived from the append-only `trackable_events` history.
//!
//! # Invariants
//! - Ids are assigned by the store and never change.
//! - `archived_at` only moves forward: there is no un-archive.
//! - Listings and event histories come back in insertion (id) order.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::Database;
use crate::error::{Error, Result};

const TRACKABLE_SELECT_SQL: &str = "SELECT
    id, type, plugin_owner, name, description, color, points, config_json, created_at, archived_at
FROM trackables";

const EVENT_SELECT_SQL: &str = "SELECT
    id, trackable_id, event_type, value, note, data_json, created_at
FROM trackable_events";

/// Largest points value the CLI and the views accept for a new trackable.
pub const MAX_POINTS: i64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trackable {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub plugin_owner: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub points: i64,
    pub config_json: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Trackable {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Decode the plugin payload, if one was stored.
    pub fn config<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.config_json.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(raw)?)),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackableEvent {
    pub id: i64,
    pub trackable_id: i64,
    pub event_type: String,
    pub value: Option<f64>,
    pub note: Option<String>,
    pub data_json: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for [`TrackableStore::create_trackable`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrackable {
    pub kind: String,
    pub plugin_owner: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub points: i64,
    pub config_json: Option<String>,
}

impl NewTrackable {
    pub fn new(
        kind: impl Into<String>,
        plugin_owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            plugin_owner: plugin_owner.into(),
            name: name.into(),
            description: None,
            color: None,
            points: 1,
            config_json: None,
        }
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }

    pub fn points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }

    pub fn config_json(mut self, config_json: Option<String>) -> Self {
        self.config_json = config_json;
        self
    }
}

/// Input for [`TrackableStore::add_trackable_event`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrackableEvent {
    pub trackable_id: i64,
    pub event_type: String,
    pub value: Option<f64>,
    pub note: Option<String>,
    pub data_json: Option<String>,
}

impl NewTrackableEvent {
    pub fn new(trackable_id: i64, event_type: impl Into<String>) -> Self {
        Self {
            trackable_id,
            event_type: event_type.into(),
            value: None,
            note: None,
            data_json: None,
        }
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub fn data_json(mut self, data_json: Option<String>) -> Self {
        self.data_json = data_json;
        self
    }
}

/// AND-combined filters for [`TrackableStore::list_trackables`]; `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackableFilter {
    pub kind: Option<String>,
    pub plugin_owner: Option<String>,
    /// `Some(false)`: active only. `Some(true)`: archived only.
    pub archived: Option<bool>,
}

impl TrackableFilter {
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn plugin_owner(mut self, plugin_owner: impl Into<String>) -> Self {
        self.plugin_owner = Some(plugin_owner.into());
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }
}

/// Trackable API over one database file.
#[derive(Debug, Clone)]
pub struct TrackableStore {
    db: Database,
}

impl TrackableStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create_trackable(&self, input: &NewTrackable) -> Result<i64> {
        let id = self.db.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO trackables (
                    type, plugin_owner, name, description, color, points, config_json, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    input.kind,
                    input.plugin_owner,
                    input.name,
                    input.description,
                    input.color,
                    input.points,
                    input.config_json,
                    Utc::now(),
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })?;
        tracing::debug!(id, kind = %input.kind, owner = %input.plugin_owner, "trackable created");
        Ok(id)
    }

    pub fn get_trackable(&self, id: i64) -> Result<Option<Trackable>> {
        self.db.with_transaction(|tx| {
            let mut stmt = tx.prepare(&format!("{TRACKABLE_SELECT_SQL} WHERE id = ?1"))?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(parse_trackable_row(row)?)),
                None => Ok(None),
            }
        })
    }

    pub fn list_trackables(&self, filter: &TrackableFilter) -> Result<Vec<Trackable>> {
        let mut sql = format!("{TRACKABLE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(kind) = filter.kind.as_ref() {
            sql.push_str(" AND type = ?");
            bind_values.push(Value::Text(kind.clone()));
        }
        if let Some(owner) = filter.plugin_owner.as_ref() {
            sql.push_str(" AND plugin_owner = ?");
            bind_values.push(Value::Text(owner.clone()));
        }
        match filter.archived {
            Some(true) => sql.push_str(" AND archived_at IS NOT NULL"),
            Some(false) => sql.push_str(" AND archived_at IS NULL"),
            None => {}
        }
        sql.push_str(" ORDER BY id ASC");

        self.db.with_transaction(|tx| {
            let mut stmt = tx.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values.iter()))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(parse_trackable_row(row)?);
            }
            Ok(out)
        })
    }

    /// Stamp `archived_at` with the current time.
    ///
    /// Succeeds even when `id` matches nothing; the returned flag tells the two
    /// cases apart. Re-archiving refreshes the timestamp.
    pub fn archive_trackable(&self, id: i64) -> Result<bool> {
        let changed = self.db.with_transaction(|tx| {
            Ok(tx.execute(
                "UPDATE trackables SET archived_at = ?1 WHERE id = ?2",
                params![Utc::now(), id],
            )?)
        })?;
        if changed == 0 {
            tracing::debug!(id, "archive matched no trackable");
        }
        Ok(changed > 0)
    }

    /// Append an event. A missing parent surfaces as [`Error::ForeignKeyViolation`].
    pub fn add_trackable_event(&self, input: &NewTrackableEvent) -> Result<i64> {
        let id = self.db.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO trackable_events (
                    trackable_id, event_type, value, note, data_json, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    input.trackable_id,
                    input.event_type,
                    input.value,
                    input.note,
                    input.data_json,
                    Utc::now(),
                ],
            )
            .map_err(|err| map_foreign_key(err, input.trackable_id))?;
            Ok(tx.last_insert_rowid())
        })?;
        tracing::debug!(
            id,
            trackable_id = input.trackable_id,
            event_type = %input.event_type,
            "trackable event recorded"
        );
        Ok(id)
    }

    pub fn get_trackable_events(
        &self,
        trackable_id: i64,
        event_type: Option<&str>,
    ) -> Result<Vec<TrackableEvent>> {
        let mut sql = format!("{EVENT_SELECT_SQL} WHERE trackable_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Integer(trackable_id)];
        if let Some(event_type) = event_type {
            sql.push_str(" AND event_type = ?");
            bind_values.push(Value::Text(event_type.to_string()));
        }
        sql.push_str(" ORDER BY id ASC");

        self.db.with_transaction(|tx| {
            let mut stmt = tx.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values.iter()))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(parse_event_row(row)?);
            }
            Ok(out)
        })
    }

    /// Current value of a two-state property such as "completed".
    pub fn latest_toggle_state(
        &self,
        trackable_id: i64,
        on_event: &str,
        off_event: &str,
    ) -> Result<bool> {
        let events = self.get_trackable_events(trackable_id, None)?;
        Ok(derive_toggle_state(&events, on_event, off_event))
    }
}

/// The most recent event that is either `on_event` or `off_event` decides the
/// state; with neither present the state is off.
pub fn derive_toggle_state(events: &[TrackableEvent], on_event: &str, off_event: &str) -> bool {
    let mut latest: Option<&TrackableEvent> = None;
    for event in events {
        if event.event_type != on_event && event.event_type != off_event {
            continue;
        }
        let newer = match latest {
            Some(current) => (event.created_at, event.id) > (current.created_at, current.id),
            None => true,
        };
        if newer {
            latest = Some(event);
        }
    }
    latest.is_some_and(|event| event.event_type == on_event)
}

fn parse_trackable_row(row: &Row<'_>) -> rusqlite::Result<Trackable> {
    Ok(Trackable {
        id: row.get("id")?,
        kind: row.get("type")?,
        plugin_owner: row.get("plugin_owner")?,
        name: row.get("name")?,
        description: row.get("description")?,
        color: row.get("color")?,
        points: row.get("points")?,
        config_json: row.get("config_json")?,
        created_at: row.get("created_at")?,
        archived_at: row.get("archived_at")?,
    })
}

fn parse_event_row(row: &Row<'_>) -> rusqlite::Result<TrackableEvent> {
    Ok(TrackableEvent {
        id: row.get("id")?,
        trackable_id: row.get("trackable_id")?,
        event_type: row.get("event_type")?,
        value: row.get("value")?,
        note: row.get("note")?,
        data_json: row.get("data_json")?,
        created_at: row.get("created_at")?,
    })
}

fn map_foreign_key(err: rusqlite::Error, trackable_id: i64) -> Error {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        let foreign_key = failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
            || (failure.code == rusqlite::ErrorCode::ConstraintViolation
                && message
                    .as_deref()
                    .is_some_and(|text| text.contains("FOREIGN KEY")));
        if foreign_key {
            return Error::ForeignKeyViolation { trackable_id };
        }
    }
    Error::Sqlite(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_store() -> (tempfile::TempDir, TrackableStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("keeper.db"));
        db.init_schema().expect("schema");
        (dir, TrackableStore::new(db))
    }

    fn event(id: i64, event_type: &str, created_at: DateTime<Utc>) -> TrackableEvent {
        TrackableEvent {
            id,
            trackable_id: 1,
            event_type: event_type.to_string(),
            value: None,
            note: None,
            data_json: None,
            created_at,
        }
    }

    #[test]
    fn create_then_get_returns_inputs() {
        let (_dir, store) = temp_store();
        let input = NewTrackable::new("task", "core.tasks", "Write report")
            .description(Some("quarterly".to_string()))
            .color(Some("#ff8800".to_string()))
            .points(5)
            .config_json(Some(r#"{"task_date":"2024-03-01"}"#.to_string()));
        let before = Utc::now();
        let id = store.create_trackable(&input).expect("create");

        let loaded = store.get_trackable(id).expect("get").expect("present");
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.kind, "task");
        assert_eq!(loaded.plugin_owner, "core.tasks");
        assert_eq!(loaded.name, "Write report");
        assert_eq!(loaded.description.as_deref(), Some("quarterly"));
        assert_eq!(loaded.color.as_deref(), Some("#ff8800"));
        assert_eq!(loaded.points, 5);
        assert_eq!(loaded.config_json, input.config_json);
        assert!(loaded.created_at >= before - Duration::seconds(1));
        assert!(loaded.archived_at.is_none());
    }

    #[test]
    fn points_default_to_one() {
        let (_dir, store) = temp_store();
        let id = store
            .create_trackable(&NewTrackable::new("habit", "test", "Stretch"))
            .expect("create");
        let loaded = store.get_trackable(id).expect("get").expect("present");
        assert_eq!(loaded.points, 1);
        assert!(loaded.description.is_none());
    }

    #[test]
    fn get_missing_is_absent() {
        let (_dir, store) = temp_store();
        assert!(store.get_trackable(42).expect("get").is_none());
    }

    #[test]
    fn archive_is_idempotent_and_reports_missing_ids() {
        let (_dir, store) = temp_store();
        let id = store
            .create_trackable(&NewTrackable::new("task", "test", "Archive me"))
            .expect("create");

        assert!(store.archive_trackable(id).expect("first archive"));
        let first = store.get_trackable(id).unwrap().unwrap().archived_at;
        assert!(store.archive_trackable(id).expect("second archive"));
        let second = store.get_trackable(id).unwrap().unwrap().archived_at;
        assert!(first.is_some());
        assert!(second >= first);

        assert!(!store.archive_trackable(9999).expect("missing id succeeds"));
    }

    #[test]
    fn archived_filter_partitions_listing() {
        let (_dir, store) = temp_store();
        let mut ids = Vec::new();
        for name in ["a", "b", "c", "d"] {
            ids.push(
                store
                    .create_trackable(&NewTrackable::new("task", "core.tasks", name))
                    .expect("create"),
            );
        }
        store
            .create_trackable(&NewTrackable::new("habit", "core.tasks", "other type"))
            .expect("create");
        store.archive_trackable(ids[1]).expect("archive");
        store.archive_trackable(ids[3]).expect("archive");

        let base = TrackableFilter::default().kind("task").plugin_owner("core.tasks");
        let active = store.list_trackables(&base.clone().archived(false)).unwrap();
        let archived = store.list_trackables(&base.clone().archived(true)).unwrap();
        let all = store.list_trackables(&base).unwrap();

        assert!(active.iter().all(|t| t.archived_at.is_none()));
        assert!(archived.iter().all(|t| t.archived_at.is_some()));
        assert_eq!(active.len() + archived.len(), all.len());
        assert_eq!(all.len(), 4);

        let active_ids: Vec<i64> = active.iter().map(|t| t.id).collect();
        assert_eq!(active_ids, vec![ids[0], ids[2]]);
    }

    #[test]
    fn list_without_filters_returns_everything_in_insertion_order() {
        let (_dir, store) = temp_store();
        let first = store
            .create_trackable(&NewTrackable::new("task", "a", "one"))
            .unwrap();
        let second = store
            .create_trackable(&NewTrackable::new("metric", "b", "two"))
            .unwrap();

        let all = store.list_trackables(&TrackableFilter::default()).unwrap();
        let ids: Vec<i64> = all.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first, second]);

        let owned = store
            .list_trackables(&TrackableFilter::default().plugin_owner("b"))
            .unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].kind, "metric");
    }

    #[test]
    fn event_on_missing_trackable_is_foreign_key_violation() {
        let (_dir, store) = temp_store();
        let err = store
            .add_trackable_event(&NewTrackableEvent::new(77, "completed"))
            .expect_err("missing parent");
        match err {
            Error::ForeignKeyViolation { trackable_id } => assert_eq!(trackable_id, 77),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn events_are_retrievable_and_filterable() {
        let (_dir, store) = temp_store();
        let id = store
            .create_trackable(&NewTrackable::new("metric", "test", "Water"))
            .unwrap();
        let logged = store
            .add_trackable_event(
                &NewTrackableEvent::new(id, "logged")
                    .value(5.0)
                    .note(Some("glasses".to_string())),
            )
            .unwrap();
        store
            .add_trackable_event(&NewTrackableEvent::new(id, "completed"))
            .unwrap();

        let all = store.get_trackable_events(id, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, logged);
        assert_eq!(all[0].value, Some(5.0));
        assert_eq!(all[0].note.as_deref(), Some("glasses"));

        let logged_only = store.get_trackable_events(id, Some("logged")).unwrap();
        assert_eq!(logged_only.len(), 1);
        assert!(store.get_trackable_events(id, Some("nope")).unwrap().is_empty());
    }

    #[test]
    fn deleting_trackable_cascades_to_events() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("keeper.db"));
        db.init_schema().unwrap();
        let store = TrackableStore::new(db.clone());
        let id = store
            .create_trackable(&NewTrackable::new("task", "test", "Gone"))
            .unwrap();
        store
            .add_trackable_event(&NewTrackableEvent::new(id, "completed"))
            .unwrap();

        assert!(db.delete_trackable(id).unwrap());
        assert!(store.get_trackable(id).unwrap().is_none());
        assert!(store.get_trackable_events(id, None).unwrap().is_empty());
    }

    #[test]
    fn toggle_state_follows_latest_matching_event() {
        let t1 = Utc::now();
        let t2 = t1 + Duration::seconds(5);

        let undone = vec![event(1, "completed", t1), event(2, "uncompleted", t2)];
        assert!(!derive_toggle_state(&undone, "completed", "uncompleted"));

        let done = vec![event(1, "completed", t1)];
        assert!(derive_toggle_state(&done, "completed", "uncompleted"));

        assert!(!derive_toggle_state(&[], "completed", "uncompleted"));

        let with_noise = vec![event(1, "completed", t1), event(2, "logged", t2)];
        assert!(derive_toggle_state(&with_noise, "completed", "uncompleted"));
    }

    #[test]
    fn toggle_state_through_store() {
        let (_dir, store) = temp_store();
        let id = store
            .create_trackable(&NewTrackable::new("task", "test", "Toggle"))
            .unwrap();
        assert!(!store.latest_toggle_state(id, "completed", "uncompleted").unwrap());

        store
            .add_trackable_event(&NewTrackableEvent::new(id, "completed").value(1.0))
            .unwrap();
        assert!(store.latest_toggle_state(id, "completed", "uncompleted").unwrap());

        store
            .add_trackable_event(&NewTrackableEvent::new(id, "uncompleted").value(0.0))
            .unwrap();
        assert!(!store.latest_toggle_state(id, "completed", "uncompleted").unwrap());
    }

    #[test]
    fn config_payload_decodes() {
        #[derive(serde::Deserialize)]
        struct Payload {
            task_date: String,
        }

        let (_dir, store) = temp_store();
        let id = store
            .create_trackable(
                &NewTrackable::new("task", "test", "Dated")
                    .config_json(Some(r#"{"task_date":"2024-05-06"}"#.to_string())),
            )
            .unwrap();
        let loaded = store.get_trackable(id).unwrap().unwrap();
        let payload: Payload = loaded.config().unwrap().expect("payload");
        assert_eq!(payload.task_date, "2024-05-06");
    }
}
