//! Calendar plugin: tasks bucketed by date, shown as a day or week agenda.
//!
//! A task's date comes from its `task_date` config field, falling back to the
//! UTC date it was created. Weeks start on Sunday.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::config::TasksConfig;
use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::plugin::{KeyHint, PluginCommands, PluginMigrations, PluginUi, PluginView};
use crate::plugins::tasks::{load_tasks, TaskRow};
use crate::trackables::TrackableStore;

mod commands;
mod migrations;
mod view;

pub use commands::CalendarCommands;
pub use migrations::{get_note, set_note, CalendarMigrations, NOTES_TABLE};
pub use view::AgendaView;

pub const PLUGIN_ID: &str = "calendar";
pub const OWNER: &str = "core.calendar";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// `config_json` payload written for calendar tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTaskConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgendaMode {
    Day,
    Week,
}

impl AgendaMode {
    /// Inclusive date range shown for `anchor`.
    pub fn range(self, anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            AgendaMode::Day => (anchor, anchor),
            AgendaMode::Week => {
                let start = week_start(anchor);
                (start, start + Duration::days(6))
            }
        }
    }

    /// Distance `h` / `l` move the anchor.
    pub fn step(self) -> Duration {
        match self {
            AgendaMode::Day => Duration::days(1),
            AgendaMode::Week => Duration::days(7),
        }
    }
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidArgument(format!("invalid date '{raw}' (expected YYYY-MM-DD)")))
}

/// Validate and normalize an optional `HH:MM` time.
pub fn parse_time(raw: Option<&str>) -> Result<Option<String>> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => NaiveTime::parse_from_str(value, TIME_FORMAT)
            .map(|time| Some(time.format(TIME_FORMAT).to_string()))
            .map_err(|_| Error::InvalidArgument(format!("invalid time '{value}' (expected HH:MM)"))),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Calendar-relevant view of one task.
#[derive(Debug, Clone, Serialize)]
pub struct AgendaEntry {
    #[serde(flatten)]
    pub task: TaskRow,
    pub date: NaiveDate,
    pub from_time: Option<String>,
    pub to_time: Option<String>,
}

impl AgendaEntry {
    fn from_row(task: TaskRow) -> Self {
        let config = task
            .trackable
            .config::<CalendarTaskConfig>()
            .unwrap_or_else(|err| {
                tracing::debug!(id = task.trackable.id, error = %err, "ignoring unreadable task config");
                None
            })
            .unwrap_or_default();
        let date = config
            .task_date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, DATE_FORMAT).ok())
            .unwrap_or_else(|| task.trackable.created_at.date_naive());
        Self {
            task,
            date,
            from_time: config.from_time,
            to_time: config.to_time,
        }
    }

    pub fn time_label(&self) -> Option<String> {
        match (self.from_time.as_deref(), self.to_time.as_deref()) {
            (Some(from), Some(to)) => Some(format!("{from}-{to}")),
            (Some(from), None) => Some(from.to_string()),
            (None, Some(to)) => Some(format!("until {to}")),
            (None, None) => None,
        }
    }
}

/// Active tasks grouped by date within `[start, end]`; each day sorted by
/// start time, untimed tasks last, then by id.
pub fn load_agenda(
    store: &TrackableStore,
    toggle: &TasksConfig,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BTreeMap<NaiveDate, Vec<AgendaEntry>>> {
    let mut days: BTreeMap<NaiveDate, Vec<AgendaEntry>> = BTreeMap::new();
    for row in load_tasks(store, toggle, Some(false))? {
        let entry = AgendaEntry::from_row(row);
        if entry.date < start || entry.date > end {
            continue;
        }
        days.entry(entry.date).or_default().push(entry);
    }
    for entries in days.values_mut() {
        entries.sort_by(|a, b| {
            let a_key = (a.from_time.is_none(), a.from_time.clone(), a.task.trackable.id);
            let b_key = (b.from_time.is_none(), b.from_time.clone(), b.task.trackable.id);
            a_key.cmp(&b_key)
        });
    }
    Ok(days)
}

pub struct CalendarUi;

impl PluginUi for CalendarUi {
    fn name(&self) -> &str {
        "Calendar"
    }

    fn shortcut(&self) -> Option<char> {
        Some('2')
    }

    fn create_view(&self, ctx: &AppContext) -> Result<Vec<Box<dyn PluginView>>> {
        let today = chrono::Local::now().date_naive();
        let view = AgendaView::load(ctx.db().clone(), ctx.config().tasks.clone(), today)?;
        Ok(vec![Box::new(view)])
    }

    fn keybindings(&self) -> Vec<KeyHint> {
        vec![
            KeyHint::new("h / l", "Previous / next period"),
            KeyHint::new("j / k", "Next / previous task (day) or day (week)"),
            KeyHint::new("d / w", "Day / week view"),
            KeyHint::new("t", "Jump to today"),
            KeyHint::new("n", "New task on selected date"),
            KeyHint::new("space / enter", "Toggle completed (day view)"),
        ]
    }
}

pub fn ui_provider() -> Result<Box<dyn PluginUi>> {
    Ok(Box::new(CalendarUi))
}

pub fn commands_provider() -> Result<Box<dyn PluginCommands>> {
    Ok(Box::new(CalendarCommands))
}

pub fn migrations_provider() -> Box<dyn PluginMigrations> {
    Box::new(CalendarMigrations)
}
