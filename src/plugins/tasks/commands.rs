use clap::{ArgMatches, Command, FromArgMatches, Subcommand};
use serde::Serialize;

use super::{load_tasks, require_task, set_completed, PointsSummary, TaskRow, OWNER, TASK_KIND};
use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::plugin::PluginCommands;
use crate::trackables::{NewTrackable, TrackableEvent, MAX_POINTS};
use crate::ui::widgets::progress_bar;

#[derive(Subcommand, Debug)]
enum TasksAction {
    /// Create a task
    Add {
        /// Task name
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Points earned on completion
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(0..=MAX_POINTS))]
        points: i64,

        #[arg(long)]
        color: Option<String>,
    },

    /// List tasks (active only by default)
    List {
        /// Only archived tasks
        #[arg(long, conflicts_with = "all")]
        archived: bool,

        /// Active and archived tasks
        #[arg(long)]
        all: bool,
    },

    /// Mark a task completed
    Done { id: i64 },

    /// Mark a task not completed
    Undo { id: i64 },

    /// Archive a task
    Archive { id: i64 },

    /// Show a task's event history
    Events {
        id: i64,

        /// Only events of this type
        #[arg(long = "type")]
        event_type: Option<String>,
    },
}

pub struct TasksCommands;

impl PluginCommands for TasksCommands {
    fn command(&self) -> Command {
        TasksAction::augment_subcommands(
            Command::new("tasks")
                .about("Manage tasks")
                .subcommand_required(true)
                .arg_required_else_help(true),
        )
    }

    fn run(&self, ctx: &AppContext, matches: &ArgMatches, output: OutputOptions) -> Result<()> {
        let action = TasksAction::from_arg_matches(matches)
            .map_err(|err| Error::InvalidArgument(err.to_string()))?;
        match action {
            TasksAction::Add {
                name,
                description,
                points,
                color,
            } => run_add(ctx, output, name, description, points, color),
            TasksAction::List { archived, all } => {
                let filter = match (archived, all) {
                    (_, true) => None,
                    (true, false) => Some(true),
                    (false, false) => Some(false),
                };
                run_list(ctx, output, filter)
            }
            TasksAction::Done { id } => run_set_completed(ctx, output, id, true),
            TasksAction::Undo { id } => run_set_completed(ctx, output, id, false),
            TasksAction::Archive { id } => run_archive(ctx, output, id),
            TasksAction::Events { id, event_type } => run_events(ctx, output, id, event_type),
        }
    }
}

#[derive(Serialize)]
struct AddOutput {
    id: i64,
    name: String,
    points: i64,
}

fn run_add(
    ctx: &AppContext,
    output: OutputOptions,
    name: String,
    description: Option<String>,
    points: i64,
    color: Option<String>,
) -> Result<()> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidArgument("task name cannot be empty".to_string()));
    }
    let id = ctx.trackables().create_trackable(
        &NewTrackable::new(TASK_KIND, OWNER, name.clone())
            .description(description)
            .color(color)
            .points(points),
    )?;

    let mut human = HumanOutput::new("Task created");
    human.push_summary("ID", id.to_string());
    human.push_summary("Name", name.clone());
    human.push_summary("Points", points.to_string());
    human.push_next_step(format!("keeper tasks done {id}"));

    emit_success(
        output,
        "tasks add",
        &AddOutput { id, name, points },
        Some(&human),
    )
}

#[derive(Serialize)]
struct ListOutput {
    tasks: Vec<TaskRow>,
    summary: PointsSummary,
}

fn run_list(ctx: &AppContext, output: OutputOptions, archived: Option<bool>) -> Result<()> {
    let tasks = load_tasks(&ctx.trackables(), &ctx.config().tasks, archived)?;
    let summary = PointsSummary::of(&tasks);

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", tasks.len().to_string());
    human.push_summary(
        "Progress",
        format!(
            "{}/{} points {}",
            summary.completed,
            summary.total,
            progress_bar(summary.completed, summary.total)
        ),
    );
    for row in &tasks {
        let check = if row.completed { "[x]" } else { "[ ]" };
        let mut line = format!(
            "{check} {} {} ({} pts)",
            row.trackable.id, row.trackable.name, row.trackable.points
        );
        if row.trackable.is_archived() {
            line.push_str(" (archived)");
        }
        human.push_detail(line);
    }
    if tasks.is_empty() {
        human.push_next_step("keeper tasks add <name>");
    }

    emit_success(output, "tasks list", &ListOutput { tasks, summary }, Some(&human))
}

#[derive(Serialize)]
struct CompletionOutput {
    id: i64,
    event_id: i64,
    completed: bool,
}

fn run_set_completed(
    ctx: &AppContext,
    output: OutputOptions,
    id: i64,
    completed: bool,
) -> Result<()> {
    let store = ctx.trackables();
    let task = require_task(&store, id)?;
    let event_id = set_completed(&store, &ctx.config().tasks, id, completed)?;

    let (command, header) = if completed {
        ("tasks done", "Task completed")
    } else {
        ("tasks undo", "Task reopened")
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", id.to_string());
    human.push_summary("Name", task.name);

    emit_success(
        output,
        command,
        &CompletionOutput {
            id,
            event_id,
            completed,
        },
        Some(&human),
    )
}

#[derive(Serialize)]
struct ArchiveOutput {
    id: i64,
    archived: bool,
}

fn run_archive(ctx: &AppContext, output: OutputOptions, id: i64) -> Result<()> {
    let store = ctx.trackables();
    let task = require_task(&store, id)?;
    if task.is_archived() {
        let mut human = HumanOutput::new("Task already archived");
        human.push_summary("ID", id.to_string());
        return emit_success(
            output,
            "tasks archive",
            &ArchiveOutput { id, archived: true },
            Some(&human),
        );
    }
    if !store.archive_trackable(id)? {
        return Err(Error::TrackableNotFound(id));
    }

    let mut human = HumanOutput::new("Task archived");
    human.push_summary("ID", id.to_string());
    human.push_summary("Name", task.name);

    emit_success(
        output,
        "tasks archive",
        &ArchiveOutput { id, archived: true },
        Some(&human),
    )
}

#[derive(Serialize)]
struct EventsOutput {
    id: i64,
    events: Vec<TrackableEvent>,
}

fn run_events(
    ctx: &AppContext,
    output: OutputOptions,
    id: i64,
    event_type: Option<String>,
) -> Result<()> {
    let store = ctx.trackables();
    let task = require_task(&store, id)?;
    let events = store.get_trackable_events(id, event_type.as_deref())?;

    let mut human = HumanOutput::new(format!("Events for '{}'", task.name));
    human.push_summary("Total", events.len().to_string());
    for event in &events {
        let mut line = format!(
            "{} {} {}",
            event.id,
            event.created_at.format("%Y-%m-%d %H:%M:%S"),
            event.event_type
        );
        if let Some(value) = event.value {
            line.push_str(&format!(" value={value}"));
        }
        if let Some(note) = event.note.as_deref() {
            line.push_str(&format!(" note={note}"));
        }
        human.push_detail(line);
    }

    emit_success(output, "tasks events", &EventsOutput { id, events }, Some(&human))
}
