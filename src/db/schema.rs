//! Core SQLite schema shared by every plugin.

pub const CREATE_TABLE_TRACKABLES: &str = "
CREATE TABLE IF NOT EXISTS trackables (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    plugin_owner TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    color TEXT,
    points INTEGER NOT NULL DEFAULT 1,
    config_json TEXT,
    created_at TEXT NOT NULL,
    archived_at TEXT
);";

pub const CREATE_TABLE_TRACKABLE_EVENTS: &str = "
CREATE TABLE IF NOT EXISTS trackable_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    trackable_id INTEGER NOT NULL,
    event_type TEXT NOT NULL,
    value REAL,
    note TEXT,
    data_json TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (trackable_id) REFERENCES trackables(id) ON DELETE CASCADE
);";

pub const CREATE_INDEX_EVENTS_TRACKABLE: &str =
    "CREATE INDEX IF NOT EXISTS idx_events_trackable ON trackable_events(trackable_id);";

pub const CREATE_INDEX_EVENTS_CREATED_AT: &str =
    "CREATE INDEX IF NOT EXISTS idx_events_created_at ON trackable_events(created_at);";

pub const CREATE_INDEX_TRACKABLES_PLUGIN: &str =
    "CREATE INDEX IF NOT EXISTS idx_trackables_plugin ON trackables(plugin_owner);";

/// Statements applied, in order, when the store is initialized.
pub const CORE_SCHEMA: &[&str] = &[
    CREATE_TABLE_TRACKABLES,
    CREATE_TABLE_TRACKABLE_EVENTS,
    CREATE_INDEX_EVENTS_TRACKABLE,
    CREATE_INDEX_EVENTS_CREATED_AT,
    CREATE_INDEX_TRACKABLES_PLUGIN,
];
