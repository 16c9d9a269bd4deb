use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use super::app::{Focus, ShellState, StatusKind};
use crate::plugin::registry::guarded;
use crate::ui::widgets::{
    centered_rect, help_header, help_line, panel, COLOR_ACCENT, COLOR_ERROR, COLOR_INFO,
    COLOR_MUTED, COLOR_TEXT, COLOR_WARNING,
};

pub const STATUS_HINT: &str = "(q) quit  (tab) switch panel  (j/k) navigate  (?) keybindings";

const GLOBAL_KEYS: [(&str, &str); 8] = [
    ("q", "Quit"),
    ("?", "Toggle keybindings"),
    ("tab", "Next panel"),
    ("shift+tab", "Previous panel"),
    ("j", "Next plugin"),
    ("k", "Previous plugin"),
    ("gg", "First plugin"),
    ("G", "Last plugin"),
];

pub fn render(frame: &mut Frame, state: &mut ShellState) {
    let area = frame.size();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(state.sidebar_width()), Constraint::Min(0)].as_ref())
        .split(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(columns[1]);

    render_sidebar(frame, state, columns[0]);
    render_plugin_area(frame, state, rows[0]);
    render_status_bar(frame, state, rows[1]);

    if state.show_help() {
        render_help(frame, state, area);
    }
}

fn render_sidebar(frame: &mut Frame, state: &ShellState, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Keeper",
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Plugins", Style::default().fg(COLOR_MUTED))),
    ];
    for (label, active) in state.sidebar_entries() {
        let style = if active {
            Style::default().fg(COLOR_TEXT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(COLOR_MUTED)
        };
        lines.push(Line::from(Span::styled(label, style)));
    }
    let widget = Paragraph::new(lines).block(panel("", state.focus() == Focus::Selector));
    frame.render_widget(widget, area);
}

/// A view that fails to draw is swapped for the error placeholder, which is
/// drawn over whatever the failed view left behind.
fn render_plugin_area(frame: &mut Frame, state: &mut ShellState, area: Rect) {
    if let Err(reason) = render_views(frame, state, area) {
        state.view_failed(reason);
        frame.render_widget(Clear, area);
        if let Err(reason) = render_views(frame, state, area) {
            tracing::error!(%reason, "error placeholder failed to render");
        }
    }
}

fn render_views(
    frame: &mut Frame,
    state: &mut ShellState,
    area: Rect,
) -> std::result::Result<(), String> {
    let focus = state.focus();
    let views = state.views_mut();
    guarded(|| {
        let constraints: Vec<Constraint> = views.iter().map(|view| view.constraint()).collect();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);
        for (index, (view, chunk)) in views.iter_mut().zip(chunks.iter()).enumerate() {
            view.render(frame, *chunk, focus == Focus::View(index));
        }
        Ok(())
    })
}

fn render_status_bar(frame: &mut Frame, state: &ShellState, area: Rect) {
    let mut spans = vec![Span::styled(STATUS_HINT, Style::default().fg(COLOR_INFO))];
    if let Some((message, kind)) = state.status() {
        let style = match kind {
            StatusKind::Error => Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
            StatusKind::Info => Style::default().fg(COLOR_WARNING),
        };
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(message.to_string(), style));
    }
    let widget = Paragraph::new(Line::from(spans))
        .block(panel("", state.focus() == Focus::StatusBar));
    frame.render_widget(widget, area);
}

fn render_help(frame: &mut Frame, state: &ShellState, area: Rect) {
    let mut lines = vec![help_header("Global Keybindings")];
    for (keys, desc) in GLOBAL_KEYS {
        lines.push(help_line(keys, desc));
    }
    let plugin_keys = state.active_keybindings();
    if !plugin_keys.is_empty() {
        lines.push(Line::from(""));
        lines.push(help_header(&format!("{} Keybindings", state.active_name())));
        for hint in &plugin_keys {
            lines.push(help_line(&hint.key, &hint.description));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "esc / ? close",
        Style::default().fg(COLOR_MUTED),
    )));

    let modal = centered_rect(60, lines.len() as u16 + 2, area);
    frame.render_widget(Clear, modal);
    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Keybindings "),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, modal);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AppContext;
    use crate::paths::AppPaths;
    use crate::error::Result;
    use crate::plugin::{load_plugin_uis, LoadedPlugin, PluginUi, PluginView};
    use crate::plugins;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::TempDir;

    fn builtin_shell() -> (TempDir, ShellState) {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::init(AppPaths::at(dir.path())).unwrap();
        let loaded = load_plugin_uis(plugins::builtin(), &ctx.config().plugins)
            .into_loaded()
            .unwrap();
        let state = ShellState::new(ctx, loaded).unwrap();
        (dir, state)
    }

    fn screen(state: &mut ShellState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    struct BrokenView;

    impl PluginView for BrokenView {
        fn render(&mut self, _frame: &mut Frame, _area: Rect, _focused: bool) {
            panic!("render exploded");
        }
    }

    struct BrokenUi;

    impl PluginUi for BrokenUi {
        fn name(&self) -> &str {
            "Broken"
        }

        fn create_view(&self, _ctx: &AppContext) -> Result<Vec<Box<dyn PluginView>>> {
            Ok(vec![Box::new(BrokenView)])
        }
    }

    #[test]
    fn failing_render_stays_inside_the_plugin_area() {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::init(AppPaths::at(dir.path())).unwrap();
        let mut loaded = load_plugin_uis(plugins::builtin(), &ctx.config().plugins)
            .into_loaded()
            .unwrap();
        loaded.push(LoadedPlugin {
            id: "broken",
            provider: Box::new(BrokenUi) as Box<dyn PluginUi>,
        });
        let mut state = ShellState::new(ctx, loaded).unwrap();
        assert!(state.select(2));

        let drawn = screen(&mut state);
        assert!(drawn.contains("Broken could not be displayed."));
        assert!(drawn.contains("render exploded"));
        assert!(drawn.contains(" [1] Tasks"));
        let (message, kind) = state.status().unwrap();
        assert_eq!(kind, StatusKind::Error);
        assert!(message.contains("render exploded"));
        assert_eq!(state.focus(), Focus::Selector);

        // the placeholder keeps drawing, and other plugins still work
        assert!(screen(&mut state).contains("Broken could not be displayed."));
        state.handle_key(KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE));
        assert!(screen(&mut state).contains("No tasks yet. Press 'n' to add one."));
    }

    #[test]
    fn renders_sidebar_plugin_and_status_bar() {
        let (_dir, mut state) = builtin_shell();
        let screen = screen(&mut state);
        assert!(screen.contains("Keeper"));
        assert!(screen.contains(">[1] Tasks"));
        assert!(screen.contains(" [2] Calendar"));
        assert!(screen.contains("No tasks yet. Press 'n' to add one."));
        assert!(screen.contains(STATUS_HINT));
    }

    #[test]
    fn help_overlay_lists_global_and_plugin_keys() {
        let (_dir, mut state) = builtin_shell();
        state.handle_key(KeyEvent::new(KeyCode::Char('?'), KeyModifiers::NONE));
        let screen = screen(&mut state);
        assert!(screen.contains("Global Keybindings"));
        assert!(screen.contains("Tasks Keybindings"));
        assert!(screen.contains("shift+tab"));
    }

    #[test]
    fn switching_plugins_renders_the_new_view() {
        let (_dir, mut state) = builtin_shell();
        state.handle_key(KeyEvent::new(KeyCode::Char('2'), KeyModifiers::NONE));
        let screen = screen(&mut state);
        assert!(screen.contains(">[2] Calendar"));
        assert!(screen.contains("No tasks for this day."));
        assert!(!screen.contains("No tasks yet."));
    }
}
