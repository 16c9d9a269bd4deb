use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use super::{load_tasks, set_completed, PointsSummary, TaskRow, OWNER, TASK_KIND};
use crate::config::TasksConfig;
use crate::error::Result;
use crate::plugin::{PluginView, ViewOutcome};
use crate::trackables::{NewTrackable, TrackableStore};
use crate::ui::widgets::{
    list_window, panel, parse_points, progress_bar, render_confirm, truncate_text, Prompt,
    PromptAction, COLOR_ACCENT, COLOR_INFO, COLOR_MUTED, COLOR_MUTED_DARK, COLOR_SUCCESS,
    COLOR_TEXT,
};

pub const EMPTY_PLACEHOLDER: &str = "No tasks yet. Press 'n' to add one.";

pub struct TasksHeaderView;

impl PluginView for TasksHeaderView {
    fn render(&mut self, frame: &mut Frame, area: Rect, _focused: bool) {
        let line = Line::from(vec![
            Span::styled(
                "Tasks",
                Style::default().fg(COLOR_INFO).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                "(n) new  (space) toggle  (D) archive  (r) reload",
                Style::default().fg(COLOR_MUTED_DARK),
            ),
        ]);
        frame.render_widget(Paragraph::new(line).block(panel("", false)), area);
    }

    fn constraint(&self) -> Constraint {
        Constraint::Length(3)
    }

    fn focusable(&self) -> bool {
        false
    }
}

/// Checklist of active tasks.
pub struct TaskListView {
    store: TrackableStore,
    toggle: TasksConfig,
    rows: Vec<TaskRow>,
    selected: usize,
    prompt: Option<Prompt>,
    archive_confirm: Option<(i64, String)>,
}

impl TaskListView {
    pub fn load(store: TrackableStore, toggle: TasksConfig) -> Result<Self> {
        let mut view = Self {
            store,
            toggle,
            rows: Vec::new(),
            selected: 0,
            prompt: None,
            archive_confirm: None,
        };
        view.reload()?;
        Ok(view)
    }

    pub fn rows(&self) -> &[TaskRow] {
        &self.rows
    }

    pub fn selected(&self) -> Option<&TaskRow> {
        self.rows.get(self.selected)
    }

    fn reload(&mut self) -> Result<()> {
        self.rows = load_tasks(&self.store, &self.toggle, Some(false))?;
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
        Ok(())
    }

    fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let max = self.rows.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, max) as usize;
    }

    fn toggle_selected(&mut self) -> Result<Option<String>> {
        let Some(row) = self.rows.get(self.selected) else {
            return Ok(None);
        };
        let id = row.trackable.id;
        let name = row.trackable.name.clone();
        let completed = !row.completed;
        set_completed(&self.store, &self.toggle, id, completed)?;
        self.reload()?;
        let verb = if completed { "Completed" } else { "Reopened" };
        Ok(Some(format!("{verb} '{name}'")))
    }

    fn submit_prompt(&mut self, prompt: &Prompt) -> Result<String> {
        let name = prompt.value(0).to_string();
        let description = Some(prompt.value(1).to_string()).filter(|d| !d.is_empty());
        let points = parse_points(prompt.value(2));
        let id = self.store.create_trackable(
            &NewTrackable::new(TASK_KIND, OWNER, name.clone())
                .description(description)
                .points(points),
        )?;
        self.reload()?;
        if let Some(pos) = self.rows.iter().position(|row| row.trackable.id == id) {
            self.selected = pos;
        }
        Ok(format!("Added task '{name}'"))
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
            PromptAction::Submit => {
                if prompt.value(0).is_empty() {
                    prompt.set_error("name is required");
                    self.prompt = Some(prompt);
                    return ViewOutcome::Handled;
                }
                outcome(self.submit_prompt(&prompt))
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> ViewOutcome {
        let Some((id, name)) = self.archive_confirm.take() else {
            return ViewOutcome::Ignored;
        };
        if key.code != KeyCode::Char('y') {
            return ViewOutcome::Status("cancelled".to_string());
        }
        let result = self.store.archive_trackable(id).and_then(|_| {
            self.reload()?;
            Ok(format!("Archived '{name}'"))
        });
        outcome(result)
    }

    fn row_line(&self, row: &TaskRow, selected: bool, width: usize) -> Line<'static> {
        let marker = if selected { ">" } else { " " };
        let check = if row.completed { "[x]" } else { "[ ]" };
        let points = format!(" ({} pts)", row.trackable.points);
        let name_width = width.saturating_sub(marker.len() + check.len() + points.len() + 2);
        let name_style = match (selected, row.completed) {
            (true, _) => Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
            (false, true) => Style::default()
                .fg(COLOR_MUTED)
                .add_modifier(Modifier::CROSSED_OUT),
            (false, false) => Style::default().fg(COLOR_TEXT),
        };
        let check_style = if row.completed {
            Style::default().fg(COLOR_SUCCESS)
        } else {
            Style::default().fg(COLOR_MUTED)
        };
        Line::from(vec![
            Span::raw(format!("{marker} ")),
            Span::styled(check.to_string(), check_style),
            Span::raw(" "),
            Span::styled(truncate_text(&row.trackable.name, name_width), name_style),
            Span::styled(points, Style::default().fg(COLOR_MUTED_DARK)),
        ])
    }
}

impl PluginView for TaskListView {
    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let width = area.width.saturating_sub(2) as usize;
        let summary = PointsSummary::of(&self.rows);
        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    format!("Progress: {}/{} points ", summary.completed, summary.total),
                    Style::default().fg(COLOR_MUTED),
                ),
                Span::styled(
                    progress_bar(summary.completed, summary.total),
                    Style::default().fg(COLOR_SUCCESS),
                ),
            ]),
            Line::from(""),
        ];

        if self.rows.is_empty() {
            lines.push(Line::from(Span::styled(
                EMPTY_PLACEHOLDER,
                Style::default().fg(COLOR_MUTED_DARK),
            )));
        } else {
            let height = (area.height.saturating_sub(2) as usize).saturating_sub(lines.len());
            let (start, end) = list_window(self.rows.len(), Some(self.selected), height);
            for (pos, row) in self.rows[start..end].iter().enumerate() {
                let selected = focused && start + pos == self.selected;
                lines.push(self.row_line(row, selected, width));
            }
        }

        let widget = Paragraph::new(lines)
            .block(panel(" Tasks ", focused))
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, area);

        if let Some(prompt) = self.prompt.as_ref() {
            prompt.render(frame, area);
        } else if let Some((_, name)) = self.archive_confirm.as_ref() {
            render_confirm(frame, area, "Archive Task", "Archive this task?", name);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> ViewOutcome {
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }
        if self.archive_confirm.is_some() {
            return self.handle_confirm_key(key);
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                ViewOutcome::Handled
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                ViewOutcome::Handled
            }
            KeyCode::Char(' ') | KeyCode::Enter => match self.toggle_selected() {
                Ok(Some(message)) => ViewOutcome::Status(message),
                Ok(None) => ViewOutcome::Handled,
                Err(err) => outcome(Err(err)),
            },
            KeyCode::Char('n') => {
                self.prompt = Some(Prompt::new(
                    " New Task ",
                    &[
                        ("Name", "required"),
                        ("Description", "optional"),
                        ("Points", "1"),
                    ],
                ));
                ViewOutcome::Handled
            }
            KeyCode::Char('D') => {
                self.archive_confirm = self
                    .selected()
                    .map(|row| (row.trackable.id, row.trackable.name.clone()));
                ViewOutcome::Handled
            }
            KeyCode::Char('r') => outcome(self.reload().map(|_| "Reloaded".to_string())),
            _ => ViewOutcome::Ignored,
        }
    }

    fn captures_input(&self) -> bool {
        self.prompt.is_some() || self.archive_confirm.is_some()
    }
}

fn outcome(result: Result<String>) -> ViewOutcome {
    match result {
        Ok(message) => ViewOutcome::Status(message),
        Err(err) => {
            tracing::warn!(error = %err, "tasks action failed");
            ViewOutcome::Status(format!("error: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::TempDir;

    fn view() -> (TempDir, TaskListView) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("keeper.db"));
        db.init_schema().unwrap();
        let view = TaskListView::load(TrackableStore::new(db), TasksConfig::default()).unwrap();
        (dir, view)
    }

    fn press(view: &mut TaskListView, code: KeyCode) -> ViewOutcome {
        view.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(view: &mut TaskListView, text: &str) {
        for ch in text.chars() {
            press(view, KeyCode::Char(ch));
        }
    }

    fn rendered(view: &mut TaskListView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
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
    fn empty_list_shows_placeholder() {
        let (_dir, mut view) = view();
        assert!(rendered(&mut view).contains(EMPTY_PLACEHOLDER));
    }

    #[test]
    fn add_toggle_and_archive_flow() {
        let (_dir, mut view) = view();

        press(&mut view, KeyCode::Char('n'));
        assert!(view.captures_input());
        type_text(&mut view, "Water plants");
        press(&mut view, KeyCode::Enter);
        press(&mut view, KeyCode::Enter);
        type_text(&mut view, "x");
        let added = press(&mut view, KeyCode::Enter);
        assert_eq!(added, ViewOutcome::Status("Added task 'Water plants'".to_string()));
        assert!(!view.captures_input());
        assert_eq!(view.rows().len(), 1);
        assert_eq!(view.rows()[0].trackable.points, 1);

        press(&mut view, KeyCode::Char(' '));
        assert!(view.rows()[0].completed);
        assert!(rendered(&mut view).contains("1/1 points"));

        press(&mut view, KeyCode::Char('D'));
        assert_eq!(
            press(&mut view, KeyCode::Char('n')),
            ViewOutcome::Status("cancelled".to_string())
        );
        assert_eq!(view.rows().len(), 1);

        press(&mut view, KeyCode::Char('D'));
        press(&mut view, KeyCode::Char('y'));
        assert!(view.rows().is_empty());
    }

    #[test]
    fn prompt_requires_a_name() {
        let (_dir, mut view) = view();
        press(&mut view, KeyCode::Char('n'));
        press(&mut view, KeyCode::Enter);
        press(&mut view, KeyCode::Enter);
        assert_eq!(press(&mut view, KeyCode::Enter), ViewOutcome::Handled);
        assert!(view.captures_input());
        assert!(view.rows().is_empty());
    }

    #[test]
    fn selection_clamps_at_both_ends() {
        let (_dir, mut view) = view();
        for name in ["a", "b"] {
            view.store
                .create_trackable(&NewTrackable::new(TASK_KIND, OWNER, name))
                .unwrap();
        }
        press(&mut view, KeyCode::Char('r'));
        press(&mut view, KeyCode::Char('k'));
        assert_eq!(view.selected().unwrap().trackable.name, "a");
        press(&mut view, KeyCode::Char('j'));
        press(&mut view, KeyCode::Char('j'));
        assert_eq!(view.selected().unwrap().trackable.name, "b");
    }
}
