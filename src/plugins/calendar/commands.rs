use clap::{ArgMatches, Command, FromArgMatches, Subcommand};
use serde::Serialize;

use super::{
    format_date, get_note, load_agenda, parse_date, parse_time, set_note, AgendaEntry, AgendaMode,
    CalendarTaskConfig, OWNER,
};
use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::plugin::PluginCommands;
use crate::plugins::tasks::{PointsSummary, TASK_KIND};
use crate::trackables::{NewTrackable, MAX_POINTS};
use crate::ui::widgets::progress_bar;

#[derive(Subcommand, Debug)]
enum CalendarAction {
    /// Schedule a task on a date
    Add {
        name: String,

        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Start time (HH:MM)
        #[arg(long)]
        from: Option<String>,

        /// End time (HH:MM)
        #[arg(long)]
        to: Option<String>,

        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(0..=MAX_POINTS))]
        points: i64,
    },

    /// Show scheduled tasks for a day (or its week)
    Agenda {
        /// Date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Show the whole week containing the date
        #[arg(long)]
        week: bool,
    },

    /// Set the note for a date
    Note { date: String, text: String },
}

pub struct CalendarCommands;

impl PluginCommands for CalendarCommands {
    fn command(&self) -> Command {
        CalendarAction::augment_subcommands(
            Command::new("calendar")
                .about("Schedule tasks and keep daily notes")
                .subcommand_required(true)
                .arg_required_else_help(true),
        )
    }

    fn run(&self, ctx: &AppContext, matches: &ArgMatches, output: OutputOptions) -> Result<()> {
        let action = CalendarAction::from_arg_matches(matches)
            .map_err(|err| Error::InvalidArgument(err.to_string()))?;
        match action {
            CalendarAction::Add {
                name,
                date,
                from,
                to,
                points,
            } => run_add(ctx, output, name, &date, from, to, points),
            CalendarAction::Agenda { date, week } => run_agenda(ctx, output, date, week),
            CalendarAction::Note { date, text } => run_note(ctx, output, &date, &text),
        }
    }
}

#[derive(Serialize)]
struct AddOutput {
    id: i64,
    name: String,
    date: String,
    from_time: Option<String>,
    to_time: Option<String>,
}

fn run_add(
    ctx: &AppContext,
    output: OutputOptions,
    name: String,
    date: &str,
    from: Option<String>,
    to: Option<String>,
    points: i64,
) -> Result<()> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidArgument("task name cannot be empty".to_string()));
    }
    let date = format_date(parse_date(date)?);
    let config = CalendarTaskConfig {
        task_date: Some(date.clone()),
        from_time: parse_time(from.as_deref())?,
        to_time: parse_time(to.as_deref())?,
    };
    let id = ctx.trackables().create_trackable(
        &NewTrackable::new(TASK_KIND, OWNER, name.clone())
            .points(points)
            .config_json(Some(serde_json::to_string(&config)?)),
    )?;

    let mut human = HumanOutput::new("Task scheduled");
    human.push_summary("ID", id.to_string());
    human.push_summary("Name", name.clone());
    human.push_summary("Date", date.clone());
    human.push_next_step(format!("keeper calendar agenda --date {date}"));

    emit_success(
        output,
        "calendar add",
        &AddOutput {
            id,
            name,
            date,
            from_time: config.from_time,
            to_time: config.to_time,
        },
        Some(&human),
    )
}

#[derive(Serialize)]
struct AgendaDay {
    date: String,
    note: Option<String>,
    tasks: Vec<AgendaEntry>,
}

#[derive(Serialize)]
struct AgendaOutput {
    mode: AgendaMode,
    start: String,
    end: String,
    days: Vec<AgendaDay>,
    summary: PointsSummary,
}

fn run_agenda(
    ctx: &AppContext,
    output: OutputOptions,
    date: Option<String>,
    week: bool,
) -> Result<()> {
    let anchor = match date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => chrono::Local::now().date_naive(),
    };
    let mode = if week { AgendaMode::Week } else { AgendaMode::Day };
    let (start, end) = mode.range(anchor);
    let mut agenda = load_agenda(&ctx.trackables(), &ctx.config().tasks, start, end)?;
    let summary = PointsSummary::of(agenda.values().flatten().map(|entry| &entry.task));

    let mut human = HumanOutput::new(match mode {
        AgendaMode::Day => format!("Agenda for {}", format_date(anchor)),
        AgendaMode::Week => format!("Week of {}", format_date(start)),
    });
    human.push_summary(
        "Points",
        format!(
            "{}/{} {}",
            summary.completed,
            summary.total,
            progress_bar(summary.completed, summary.total)
        ),
    );

    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        let tasks = agenda.remove(&day).unwrap_or_default();
        let note = get_note(ctx.db(), day)?;
        if mode == AgendaMode::Week {
            human.push_detail(day.format("%A %Y-%m-%d").to_string());
        }
        if let Some(note) = note.as_deref() {
            human.push_detail(format!("  note: {note}"));
        }
        for entry in &tasks {
            let check = if entry.task.completed { "[x]" } else { "[ ]" };
            let time = entry
                .time_label()
                .map(|label| format!("{label} "))
                .unwrap_or_default();
            human.push_detail(format!(
                "  {check} {} {time}{} ({} pts)",
                entry.task.trackable.id, entry.task.trackable.name, entry.task.trackable.points
            ));
        }
        days.push(AgendaDay {
            date: format_date(day),
            note,
            tasks,
        });
        day = day + chrono::Duration::days(1);
    }

    emit_success(
        output,
        "calendar agenda",
        &AgendaOutput {
            mode,
            start: format_date(start),
            end: format_date(end),
            days,
            summary,
        },
        Some(&human),
    )
}

#[derive(Serialize)]
struct NoteOutput {
    date: String,
    body: String,
}

fn run_note(ctx: &AppContext, output: OutputOptions, date: &str, text: &str) -> Result<()> {
    let date = parse_date(date)?;
    let body = text.trim();
    if body.is_empty() {
        return Err(Error::InvalidArgument("note text cannot be empty".to_string()));
    }
    set_note(ctx.db(), date, body)?;

    let mut human = HumanOutput::new("Note saved");
    human.push_summary("Date", format_date(date));

    emit_success(
        output,
        "calendar note",
        &NoteOutput {
            date: format_date(date),
            body: body.to_string(),
        },
        Some(&human),
    )
}
