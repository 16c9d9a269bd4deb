use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use super::{
    format_date, get_note, load_agenda, parse_time, AgendaEntry, AgendaMode, CalendarTaskConfig,
    OWNER,
};
use crate::config::TasksConfig;
use crate::db::Database;
use crate::error::Result;
use crate::plugin::{PluginView, ViewOutcome};
use crate::plugins::tasks::{set_completed, PointsSummary, TASK_KIND};
use crate::trackables::{NewTrackable, TrackableStore};
use crate::ui::widgets::{
    panel, parse_points, progress_bar, Prompt, PromptAction, COLOR_ACCENT, COLOR_INFO,
    COLOR_MUTED, COLOR_MUTED_DARK, COLOR_SUCCESS, COLOR_TEXT, COLOR_WARNING,
};

/// Day or week agenda anchored on a selected date.
pub struct AgendaView {
    db: Database,
    store: TrackableStore,
    toggle: TasksConfig,
    today: NaiveDate,
    anchor: NaiveDate,
    mode: AgendaMode,
    days: BTreeMap<NaiveDate, Vec<AgendaEntry>>,
    cursor: usize,
    note: Option<String>,
    prompt: Option<Prompt>,
}

impl AgendaView {
    pub fn load(db: Database, toggle: TasksConfig, today: NaiveDate) -> Result<Self> {
        let mut view = Self {
            store: TrackableStore::new(db.clone()),
            db,
            toggle,
            today,
            anchor: today,
            mode: AgendaMode::Day,
            days: BTreeMap::new(),
            cursor: 0,
            note: None,
            prompt: None,
        };
        view.reload()?;
        Ok(view)
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn mode(&self) -> AgendaMode {
        self.mode
    }

    /// Entries on the selected date.
    pub fn selected_day(&self) -> &[AgendaEntry] {
        self.days
            .get(&self.anchor)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn reload(&mut self) -> Result<()> {
        let (start, end) = self.mode.range(self.anchor);
        self.days = load_agenda(&self.store, &self.toggle, start, end)?;
        self.note = get_note(&self.db, self.anchor)?;
        let len = self.selected_day().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
        Ok(())
    }

    fn move_anchor(&mut self, delta: Duration) -> Result<()> {
        self.anchor += delta;
        self.cursor = 0;
        self.reload()
    }

    fn set_mode(&mut self, mode: AgendaMode) -> Result<()> {
        self.mode = mode;
        self.cursor = 0;
        self.reload()
    }

    fn move_down(&mut self, delta: isize) -> Result<()> {
        match self.mode {
            AgendaMode::Week => self.move_anchor(Duration::days(delta as i64)),
            AgendaMode::Day => {
                let len = self.selected_day().len();
                if len > 0 {
                    self.cursor = (self.cursor as isize + delta).clamp(0, len as isize - 1) as usize;
                }
                Ok(())
            }
        }
    }

    fn toggle_selected(&mut self) -> Result<Option<String>> {
        if self.mode != AgendaMode::Day {
            return Ok(Some("switch to day view (d) to toggle tasks".to_string()));
        }
        let Some(entry) = self.selected_day().get(self.cursor) else {
            return Ok(None);
        };
        let id = entry.task.trackable.id;
        let name = entry.task.trackable.name.clone();
        let completed = !entry.task.completed;
        set_completed(&self.store, &self.toggle, id, completed)?;
        self.reload()?;
        let verb = if completed { "Completed" } else { "Reopened" };
        Ok(Some(format!("{verb} '{name}'")))
    }

    fn submit_prompt(&mut self, prompt: &mut Prompt) -> Result<Option<String>> {
        let name = prompt.value(0).to_string();
        if name.is_empty() {
            prompt.set_error("name is required");
            return Ok(None);
        }
        let (from_time, to_time) = match (
            parse_time(Some(prompt.value(1))),
            parse_time(Some(prompt.value(2))),
        ) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(err), _) | (_, Err(err)) => {
                prompt.set_error(err.to_string());
                return Ok(None);
            }
        };
        let config = CalendarTaskConfig {
            task_date: Some(format_date(self.anchor)),
            from_time,
            to_time,
        };
        self.store.create_trackable(
            &NewTrackable::new(TASK_KIND, OWNER, name.clone())
                .points(parse_points(prompt.value(3)))
                .config_json(Some(serde_json::to_string(&config)?)),
        )?;
        self.reload()?;
        Ok(Some(format!(
            "Added task '{name}' on {}",
            format_date(self.anchor)
        )))
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> ViewOutcome {
        let Some(mut prompt) = self.prompt.take() else {
            return ViewOutcome::Ignored;
        };
        match prompt.handle_key(key) {
            PromptAction::None => {
                self.prompt = Some(prompt);
                ViewOutcome::Handled
            }
            PromptAction::Cancel => ViewOutcome::Status("cancelled".to_string()),
            PromptAction::Submit => match self.submit_prompt(&mut prompt) {
                Ok(Some(message)) => ViewOutcome::Status(message),
                Ok(None) => {
                    self.prompt = Some(prompt);
                    ViewOutcome::Handled
                }
                Err(err) => failed(err),
            },
        }
    }

    fn title_line(&self) -> Line<'static> {
        let title = match self.mode {
            AgendaMode::Day => self.anchor.format("%A, %B %d, %Y").to_string(),
            AgendaMode::Week => {
                let (start, _) = self.mode.range(self.anchor);
                format!("Week of {}", start.format("%B %d, %Y"))
            }
        };
        let mode = match self.mode {
            AgendaMode::Day => "(d) day  w week",
            AgendaMode::Week => "d day  (w) week",
        };
        Line::from(vec![
            Span::styled(
                title,
                Style::default().fg(COLOR_INFO).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(mode, Style::default().fg(COLOR_MUTED_DARK)),
        ])
    }

    fn entry_line(entry: &AgendaEntry, prefix: &str, highlighted: bool) -> Line<'static> {
        let check = if entry.task.completed { "[x]" } else { "[ ]" };
        let name_style = if highlighted {
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD)
        } else if entry.task.completed {
            Style::default().fg(COLOR_MUTED)
        } else {
            Style::default().fg(COLOR_TEXT)
        };
        let mut spans = vec![
            Span::raw(prefix.to_string()),
            Span::styled(
                format!("{check} "),
                if entry.task.completed {
                    Style::default().fg(COLOR_SUCCESS)
                } else {
                    Style::default().fg(COLOR_MUTED)
                },
            ),
        ];
        if let Some(time) = entry.time_label() {
            spans.push(Span::styled(
                format!("{time} "),
                Style::default().fg(COLOR_WARNING),
            ));
        }
        spans.push(Span::styled(entry.task.trackable.name.clone(), name_style));
        spans.push(Span::styled(
            format!(" ({} pts)", entry.task.trackable.points),
            Style::default().fg(COLOR_MUTED_DARK),
        ));
        Line::from(spans)
    }

    fn day_lines(&self, focused: bool) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let entries = self.selected_day();
        if let Some(note) = self.note.as_deref() {
            lines.push(Line::from(vec![
                Span::styled("Note: ", Style::default().fg(COLOR_MUTED_DARK)),
                Span::styled(note.to_string(), Style::default().fg(COLOR_TEXT)),
            ]));
            lines.push(Line::from(""));
        }
        if entries.is_empty() {
            lines.push(Line::from(Span::styled(
                "No tasks for this day.",
                Style::default().fg(COLOR_MUTED_DARK),
            )));
            return lines;
        }
        lines.push(Line::from(Span::styled(
            format!("Tasks: ({} total)", entries.len()),
            Style::default().fg(COLOR_MUTED),
        )));
        for (index, entry) in entries.iter().enumerate() {
            let selected = index == self.cursor;
            let prefix = if selected { "> " } else { "  " };
            lines.push(Self::entry_line(entry, prefix, focused && selected));
            if let Some(description) = entry.task.trackable.description.as_deref() {
                lines.push(Line::from(Span::styled(
                    format!("      {description}"),
                    Style::default().fg(COLOR_MUTED_DARK),
                )));
            }
        }
        let done = entries.iter().filter(|entry| entry.task.completed).count();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Tasks: {done}/{} completed", entries.len()),
            Style::default().fg(COLOR_MUTED),
        )));
        lines
    }

    fn week_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let (start, _) = self.mode.range(self.anchor);
        for offset in 0..7 {
            let day = start + Duration::days(offset);
            let selected = day == self.anchor;
            let label = format!(
                "{}{}{}",
                if selected { "> " } else { "  " },
                day.format("%A %m/%d"),
                if day == self.today { " (today)" } else { "" }
            );
            let style = if selected {
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD)
            } else if day == self.today {
                Style::default().fg(COLOR_WARNING)
            } else {
                Style::default().fg(COLOR_TEXT)
            };
            lines.push(Line::from(Span::styled(label, style)));
            match self.days.get(&day) {
                Some(entries) if !entries.is_empty() => {
                    for entry in entries {
                        lines.push(Self::entry_line(entry, "    ", false));
                    }
                }
                _ => lines.push(Line::from(Span::styled(
                    "    No tasks",
                    Style::default().fg(COLOR_MUTED_DARK),
                ))),
            }
        }
        lines
    }
}

impl PluginView for AgendaView {
    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let mut lines = vec![self.title_line(), Line::from("")];
        match self.mode {
            AgendaMode::Day => lines.extend(self.day_lines(focused)),
            AgendaMode::Week => lines.extend(self.week_lines()),
        }

        let summary = PointsSummary::of(self.days.values().flatten().map(|entry| &entry.task));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(
                format!("Points: {}/{} ", summary.completed, summary.total),
                Style::default().fg(COLOR_MUTED),
            ),
            Span::styled(
                progress_bar(summary.completed, summary.total),
                Style::default().fg(COLOR_SUCCESS),
            ),
        ]));

        let widget = Paragraph::new(lines)
            .block(panel(" Calendar ", focused))
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, area);

        if let Some(prompt) = self.prompt.as_ref() {
            prompt.render(frame, area);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> ViewOutcome {
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }

        let result = match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.move_anchor(-self.mode.step()),
            KeyCode::Char('l') | KeyCode::Right => self.move_anchor(self.mode.step()),
            KeyCode::Char('j') | KeyCode::Down => self.move_down(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_down(-1),
            KeyCode::Char('t') => {
                self.anchor = self.today;
                self.cursor = 0;
                self.reload()
            }
            KeyCode::Char('d') => self.set_mode(AgendaMode::Day),
            KeyCode::Char('w') => self.set_mode(AgendaMode::Week),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char(' ') | KeyCode::Enter => {
                return match self.toggle_selected() {
                    Ok(Some(message)) => ViewOutcome::Status(message),
                    Ok(None) => ViewOutcome::Handled,
                    Err(err) => failed(err),
                };
            }
            KeyCode::Char('n') => {
                self.prompt = Some(Prompt::new(
                    format!(" New Task on {} ", format_date(self.anchor)),
                    &[
                        ("Name", "required"),
                        ("From (HH:MM)", "optional"),
                        ("To (HH:MM)", "optional"),
                        ("Points", "1"),
                    ],
                ));
                Ok(())
            }
            _ => return ViewOutcome::Ignored,
        };

        match result {
            Ok(()) => ViewOutcome::Handled,
            Err(err) => failed(err),
        }
    }

    fn captures_input(&self) -> bool {
        self.prompt.is_some()
    }
}

fn failed(err: crate::error::Error) -> ViewOutcome {
    tracing::warn!(error = %err, "calendar action failed");
    ViewOutcome::Status(format!("error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::calendar::{parse_date, set_note, CalendarMigrations};
    use crate::db::{run_plugin_migrations, MigrationAction};
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::TempDir;

    fn view(today: &str) -> (TempDir, AgendaView) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("keeper.db"));
        db.init_schema().unwrap();
        run_plugin_migrations(&db, "calendar", &CalendarMigrations, MigrationAction::Create)
            .unwrap();
        let view = AgendaView::load(db, TasksConfig::default(), parse_date(today).unwrap())
            .unwrap();
        (dir, view)
    }

    fn press(view: &mut AgendaView, code: KeyCode) -> ViewOutcome {
        view.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(view: &mut AgendaView, text: &str) {
        for ch in text.chars() {
            press(view, KeyCode::Char(ch));
        }
    }

    fn rendered(view: &mut AgendaView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(70, 30)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.size();
                view.render(frame, area, true);
            })
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn navigation_moves_by_period() {
        let (_dir, mut view) = view("2024-03-13");
        press(&mut view, KeyCode::Char('l'));
        assert_eq!(view.anchor(), parse_date("2024-03-14").unwrap());

        press(&mut view, KeyCode::Char('w'));
        assert_eq!(view.mode(), AgendaMode::Week);
        press(&mut view, KeyCode::Char('h'));
        assert_eq!(view.anchor(), parse_date("2024-03-07").unwrap());
        press(&mut view, KeyCode::Char('j'));
        assert_eq!(view.anchor(), parse_date("2024-03-08").unwrap());

        press(&mut view, KeyCode::Char('t'));
        assert_eq!(view.anchor(), parse_date("2024-03-13").unwrap());
        assert!(rendered(&mut view).contains("Week of March 10, 2024"));
    }

    #[test]
    fn add_and_toggle_on_selected_day() {
        let (_dir, mut view) = view("2024-03-13");
        press(&mut view, KeyCode::Char('n'));
        assert!(view.captures_input());
        type_text(&mut view, "Dentist");
        press(&mut view, KeyCode::Enter);
        type_text(&mut view, "9:30");
        press(&mut view, KeyCode::Enter);
        press(&mut view, KeyCode::Enter);
        type_text(&mut view, "2");
        let outcome = press(&mut view, KeyCode::Enter);
        assert_eq!(
            outcome,
            ViewOutcome::Status("Added task 'Dentist' on 2024-03-13".to_string())
        );

        let entry = &view.selected_day()[0];
        assert_eq!(entry.from_time.as_deref(), Some("09:30"));
        assert_eq!(entry.task.trackable.points, 2);
        assert_eq!(entry.task.trackable.plugin_owner, OWNER);

        press(&mut view, KeyCode::Char(' '));
        assert!(view.selected_day()[0].task.completed);
        assert!(rendered(&mut view).contains("Points: 2/2"));

        press(&mut view, KeyCode::Char('w'));
        assert_eq!(
            press(&mut view, KeyCode::Char(' ')),
            ViewOutcome::Status("switch to day view (d) to toggle tasks".to_string())
        );
    }

    #[test]
    fn invalid_time_keeps_prompt_open() {
        let (_dir, mut view) = view("2024-03-13");
        press(&mut view, KeyCode::Char('n'));
        type_text(&mut view, "Run");
        press(&mut view, KeyCode::Enter);
        type_text(&mut view, "99:99");
        press(&mut view, KeyCode::Enter);
        press(&mut view, KeyCode::Enter);
        assert_eq!(press(&mut view, KeyCode::Enter), ViewOutcome::Handled);
        assert!(view.captures_input());
        assert!(view.selected_day().is_empty());
    }

    #[test]
    fn day_view_shows_note_and_placeholder() {
        let (_dir, mut view) = view("2024-03-13");
        set_note(&view.db, parse_date("2024-03-13").unwrap(), "pack bags").unwrap();
        press(&mut view, KeyCode::Char('r'));
        let screen = rendered(&mut view);
        assert!(screen.contains("Note: pack bags"));
        assert!(screen.contains("No tasks for this day."));
    }
}
