//! Tasks plugin: a checklist of `task` trackables with point totals.
//!
//! Completion is never stored on the trackable. It is the latest of the
//! configured on/off events (`completed` / `uncompleted` by default).

use crate::config::TasksConfig;
use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::plugin::{KeyHint, PluginCommands, PluginUi, PluginView};
use crate::trackables::{NewTrackableEvent, Trackable, TrackableFilter, TrackableStore};

mod commands;
mod view;

pub use commands::TasksCommands;
pub use view::{TaskListView, TasksHeaderView};

pub const PLUGIN_ID: &str = "tasks";
pub const OWNER: &str = "core.tasks";
pub const TASK_KIND: &str = "task";

/// A task and its derived completion state.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskRow {
    #[serde(flatten)]
    pub trackable: Trackable,
    pub completed: bool,
}

/// Points done versus points available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct PointsSummary {
    pub completed: i64,
    pub total: i64,
}

impl PointsSummary {
    pub fn of<'a>(rows: impl IntoIterator<Item = &'a TaskRow>) -> Self {
        let mut summary = Self::default();
        for row in rows {
            summary.total = summary.total.saturating_add(row.trackable.points);
            if row.completed {
                summary.completed = summary.completed.saturating_add(row.trackable.points);
            }
        }
        summary
    }
}

/// Load `task` trackables of any owner with completion resolved.
pub fn load_tasks(
    store: &TrackableStore,
    toggle: &TasksConfig,
    archived: Option<bool>,
) -> Result<Vec<TaskRow>> {
    let mut filter = TrackableFilter::default().kind(TASK_KIND);
    if let Some(archived) = archived {
        filter = filter.archived(archived);
    }
    store
        .list_trackables(&filter)?
        .into_iter()
        .map(|trackable| {
            let completed =
                store.latest_toggle_state(trackable.id, &toggle.toggle_on, &toggle.toggle_off)?;
            Ok(TaskRow {
                trackable,
                completed,
            })
        })
        .collect()
}

/// Record a completion change; `completed` picks the on or off event.
pub fn set_completed(
    store: &TrackableStore,
    toggle: &TasksConfig,
    trackable_id: i64,
    completed: bool,
) -> Result<i64> {
    let event = if completed {
        NewTrackableEvent::new(trackable_id, toggle.toggle_on.as_str()).value(1.0)
    } else {
        NewTrackableEvent::new(trackable_id, toggle.toggle_off.as_str()).value(0.0)
    };
    store.add_trackable_event(&event)
}

/// Fetch a trackable that must exist and be a task.
pub fn require_task(store: &TrackableStore, id: i64) -> Result<Trackable> {
    match store.get_trackable(id)? {
        Some(trackable) if trackable.kind == TASK_KIND => Ok(trackable),
        _ => Err(Error::TrackableNotFound(id)),
    }
}

pub struct TasksUi;

impl PluginUi for TasksUi {
    fn name(&self) -> &str {
        "Tasks"
    }

    fn shortcut(&self) -> Option<char> {
        Some('1')
    }

    fn create_view(&self, ctx: &AppContext) -> Result<Vec<Box<dyn PluginView>>> {
        let list = TaskListView::load(ctx.trackables(), ctx.config().tasks.clone())?;
        Ok(vec![Box::new(TasksHeaderView), Box::new(list)])
    }

    fn keybindings(&self) -> Vec<KeyHint> {
        vec![
            KeyHint::new("n", "New task"),
            KeyHint::new("j / k", "Move down / up"),
            KeyHint::new("space / enter", "Toggle completed"),
            KeyHint::new("D", "Archive task"),
            KeyHint::new("r", "Reload"),
        ]
    }
}

pub fn ui_provider() -> Result<Box<dyn PluginUi>> {
    Ok(Box::new(TasksUi))
}

pub fn commands_provider() -> Result<Box<dyn PluginCommands>> {
    Ok(Box::new(TasksCommands))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::trackables::NewTrackable;
    use tempfile::TempDir;

    fn store() -> (TempDir, TrackableStore) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("keeper.db"));
        db.init_schema().unwrap();
        (dir, TrackableStore::new(db))
    }

    #[test]
    fn completion_follows_latest_toggle() {
        let (_dir, store) = store();
        let toggle = TasksConfig::default();
        let id = store
            .create_trackable(&NewTrackable::new(TASK_KIND, OWNER, "Read").points(3))
            .unwrap();

        set_completed(&store, &toggle, id, true).unwrap();
        assert!(load_tasks(&store, &toggle, Some(false)).unwrap()[0].completed);

        set_completed(&store, &toggle, id, false).unwrap();
        assert!(!load_tasks(&store, &toggle, Some(false)).unwrap()[0].completed);

        let events = store.get_trackable_events(id, None).unwrap();
        assert_eq!(events[0].value, Some(1.0));
        assert_eq!(events[1].event_type, "uncompleted");
        assert_eq!(events[1].value, Some(0.0));
    }

    #[test]
    fn summary_counts_points_of_completed_rows() {
        let (_dir, store) = store();
        let toggle = TasksConfig::default();
        let a = store
            .create_trackable(&NewTrackable::new(TASK_KIND, OWNER, "A").points(2))
            .unwrap();
        store
            .create_trackable(&NewTrackable::new(TASK_KIND, OWNER, "B").points(3))
            .unwrap();
        set_completed(&store, &toggle, a, true).unwrap();

        let rows = load_tasks(&store, &toggle, Some(false)).unwrap();
        assert_eq!(
            PointsSummary::of(&rows),
            PointsSummary {
                completed: 2,
                total: 5
            }
        );
    }

    #[test]
    fn summary_saturates_on_huge_points() {
        let (_dir, store) = store();
        let toggle = TasksConfig::default();
        for name in ["A", "B"] {
            let id = store
                .create_trackable(&NewTrackable::new(TASK_KIND, OWNER, name).points(i64::MAX))
                .unwrap();
            set_completed(&store, &toggle, id, true).unwrap();
        }

        let rows = load_tasks(&store, &toggle, Some(false)).unwrap();
        let summary = PointsSummary::of(&rows);
        assert_eq!(summary.total, i64::MAX);
        assert_eq!(summary.completed, i64::MAX);
    }

    #[test]
    fn require_task_rejects_other_kinds() {
        let (_dir, store) = store();
        let habit = store
            .create_trackable(&NewTrackable::new("habit", "core.habits", "Run"))
            .unwrap();
        assert!(matches!(
            require_task(&store, habit),
            Err(Error::TrackableNotFound(id)) if id == habit
        ));
        assert!(matches!(require_task(&store, 999), Err(Error::TrackableNotFound(999))));
    }
}
