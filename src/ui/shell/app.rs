use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::logging::QuietPanics;
use crate::plugin::registry::guarded;
use crate::plugin::{KeyHint, LoadedPlugin, PluginUi, PluginView, ViewOutcome};
use crate::ui::widgets::{panel, COLOR_ERROR, COLOR_MUTED_DARK};

use super::view;

const EVENT_POLL_MS: u64 = 120;
const MAX_INDEX_SHORTCUTS: usize = 9;

/// Which shell panel receives non-global keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Selector,
    View(usize),
    StatusBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// Shell state machine over the active plugin index.
pub struct ShellState {
    ctx: AppContext,
    plugins: Vec<LoadedPlugin<dyn PluginUi>>,
    active: usize,
    views: Vec<Box<dyn PluginView>>,
    focus: Focus,
    show_help: bool,
    pending_g: bool,
    status: Option<(String, StatusKind)>,
}

impl ShellState {
    /// Mount the first plugin with focus on the selector.
    pub fn new(ctx: AppContext, plugins: Vec<LoadedPlugin<dyn PluginUi>>) -> Result<Self> {
        if plugins.is_empty() {
            return Err(Error::NoPlugins { kind: "ui" });
        }
        let show_help = ctx.config().ui.help_on_start;
        let mut state = Self {
            ctx,
            plugins,
            active: 0,
            views: Vec::new(),
            focus: Focus::Selector,
            show_help,
            pending_g: false,
            status: None,
        };
        state.views = state.build_views(0);
        Ok(state)
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_id(&self) -> &'static str {
        self.plugins[self.active].id
    }

    pub fn active_name(&self) -> &str {
        self.plugins[self.active].provider.name()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn mounted_view_count(&self) -> usize {
        self.views.len()
    }

    pub fn status(&self) -> Option<(&str, StatusKind)> {
        self.status
            .as_ref()
            .map(|(message, kind)| (message.as_str(), *kind))
    }

    pub fn sidebar_width(&self) -> u16 {
        self.ctx.config().ui.sidebar_width
    }

    pub(crate) fn views_mut(&mut self) -> &mut [Box<dyn PluginView>] {
        &mut self.views
    }

    /// Sidebar rows in plugin order, e.g. `>[1] Tasks`.
    pub fn sidebar_entries(&self) -> Vec<(String, bool)> {
        self.plugins
            .iter()
            .enumerate()
            .map(|(index, plugin)| {
                let active = index == self.active;
                let marker = if active { ">" } else { " " };
                let shortcut = self
                    .shortcut_for(index)
                    .map(|key| format!("[{key}] "))
                    .unwrap_or_default();
                (
                    format!("{marker}{shortcut}{}", plugin.provider.name()),
                    active,
                )
            })
            .collect()
    }

    /// Plugin's own shortcut, else its 1-based position for the first nine.
    pub fn shortcut_for(&self, index: usize) -> Option<char> {
        let plugin = self.plugins.get(index)?;
        plugin.provider.shortcut().or_else(|| {
            if index < MAX_INDEX_SHORTCUTS {
                char::from_digit(index as u32 + 1, 10)
            } else {
                None
            }
        })
    }

    pub fn active_keybindings(&self) -> Vec<KeyHint> {
        let plugin = &self.plugins[self.active];
        guarded(|| Ok(plugin.provider.keybindings())).unwrap_or_default()
    }

    /// Switch to plugin `index`. Out-of-range indexes are rejected and change
    /// nothing. The new views are built before the old ones are dropped.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.plugins.len() {
            tracing::debug!(index, count = self.plugins.len(), "ignoring out-of-range select");
            return false;
        }
        let views = self.build_views(index);
        self.views = views;
        self.active = index;
        if matches!(self.focus, Focus::View(_)) {
            self.focus = self.first_view_focus().unwrap_or(Focus::Selector);
        }
        tracing::debug!(plugin = self.plugins[index].id, "plugin selected");
        true
    }

    fn build_views(&mut self, index: usize) -> Vec<Box<dyn PluginView>> {
        let plugin = &self.plugins[index];
        let ctx = &self.ctx;
        let result = guarded(|| plugin.provider.create_view(ctx));
        let id = plugin.id;
        let name = plugin.provider.name().to_string();
        match result {
            Ok(views) if !views.is_empty() => views,
            Ok(_) => self.error_views(&name, "plugin returned no views".to_string()),
            Err(reason) => {
                tracing::error!(plugin = id, %reason, "failed to build plugin view");
                self.error_views(&name, reason)
            }
        }
    }

    fn error_views(&mut self, name: &str, reason: String) -> Vec<Box<dyn PluginView>> {
        self.set_error(format!("{name}: {reason}"));
        vec![Box::new(ErrorView {
            plugin: name.to_string(),
            reason,
        })]
    }

    /// Selector, each focusable view, status bar.
    pub fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::Selector];
        order.extend(
            self.views
                .iter()
                .enumerate()
                .filter(|(_, view)| view.focusable())
                .map(|(index, _)| Focus::View(index)),
        );
        order.push(Focus::StatusBar);
        order
    }

    fn first_view_focus(&self) -> Option<Focus> {
        self.focus_order()
            .into_iter()
            .find(|focus| matches!(focus, Focus::View(_)))
    }

    pub fn cycle_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let len = order.len();
        let current = order.iter().position(|focus| *focus == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.focus = order[next];
        self.pending_g = false;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), StatusKind::Info));
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), StatusKind::Error));
    }

    fn focused_view_captures_input(&self) -> bool {
        match self.focus {
            Focus::View(index) => self
                .views
                .get(index)
                .is_some_and(|view| view.captures_input()),
            _ => false,
        }
    }

    /// Returns true when the shell should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')
            ) {
                self.show_help = false;
            }
            return false;
        }

        if self.focused_view_captures_input() {
            if let Focus::View(index) = self.focus {
                self.delegate(index, key);
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => {
                self.cycle_focus(true);
                return false;
            }
            KeyCode::BackTab => {
                self.cycle_focus(false);
                return false;
            }
            KeyCode::Char('?') => {
                self.toggle_help();
                return false;
            }
            _ => {}
        }

        match self.focus {
            Focus::Selector => self.handle_selector_key(key),
            Focus::View(index) => self.delegate(index, key),
            Focus::StatusBar => {}
        }
        false
    }

    fn handle_selector_key(&mut self, key: KeyEvent) {
        let pending_g = std::mem::take(&mut self.pending_g);
        let count = self.plugins.len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.select((self.active + 1) % count);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.select((self.active + count - 1) % count);
            }
            KeyCode::Char('g') => {
                if pending_g {
                    self.select(0);
                } else {
                    self.pending_g = true;
                }
            }
            KeyCode::Char('G') => {
                self.select(count - 1);
            }
            KeyCode::Char(ch) => {
                if let Some(index) = (0..count).find(|index| self.shortcut_for(*index) == Some(ch))
                {
                    self.select(index);
                }
            }
            _ => {}
        }
    }

    fn delegate(&mut self, index: usize, key: KeyEvent) {
        let Some(view) = self.views.get_mut(index) else {
            return;
        };
        match guarded(|| Ok(view.handle_key(key))) {
            Ok(ViewOutcome::Ignored) | Ok(ViewOutcome::Handled) => {}
            Ok(ViewOutcome::Status(message)) => {
                if message.starts_with("error:") {
                    self.set_error(message);
                } else {
                    self.set_info(message);
                }
            }
            Err(reason) => self.view_failed(reason),
        }
    }

    /// Replace the active plugin's views with the error placeholder after one
    /// of them failed while handling a key or drawing.
    pub(crate) fn view_failed(&mut self, reason: String) {
        let name = self.active_name().to_string();
        tracing::error!(plugin = self.active_id(), %reason, "plugin view failed");
        self.views = self.error_views(&name, reason);
        self.focus = Focus::Selector;
    }
}

/// Placeholder mounted when a plugin's view cannot be built.
struct ErrorView {
    plugin: String,
    reason: String,
}

impl PluginView for ErrorView {
    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let lines = vec![
            Line::from(Span::styled(
                format!("{} could not be displayed.", self.plugin),
                Style::default().fg(COLOR_ERROR),
            )),
            Line::from(""),
            Line::from(Span::styled(
                self.reason.clone(),
                Style::default().fg(COLOR_MUTED_DARK),
            )),
        ];
        let widget = Paragraph::new(lines)
            .block(panel(&format!(" {} ", self.plugin), focused))
            .wrap(Wrap { trim: true });
        frame.render_widget(widget, area);
    }
}

/// Run the shell over the loaded UI providers until the user quits.
///
/// A panic that escapes the loop is reported as an error once the terminal
/// has been restored; its details are in the log file.
pub fn run(ctx: AppContext, plugins: Vec<LoadedPlugin<dyn PluginUi>>) -> Result<()> {
    let mut state = ShellState::new(ctx, plugins)?;
    tracing::info!(plugins = state.plugin_count(), "shell starting");
    match panic::catch_unwind(AssertUnwindSafe(|| run_terminal(&mut state))) {
        Ok(result) => result,
        Err(_) => Err(Error::OperationFailed(
            "the shell crashed; see keeper.log for details".to_string(),
        )),
    }
}

fn run_terminal(state: &mut ShellState) -> Result<()> {
    let _session = TerminalSession::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    run_loop(&mut terminal, state)
}

/// Raw mode and the alternate screen, undone on drop even while unwinding.
struct TerminalSession {
    _quiet: QuietPanics,
}

impl TerminalSession {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let session = Self {
            _quiet: QuietPanics::new(),
        };
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            tracing::warn!(error = %err, "failed to leave raw mode");
        }
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, LeaveAlternateScreen, Show) {
            tracing::warn!(error = %err, "failed to restore the terminal");
        }
    }
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut ShellState,
) -> Result<()> {
    let mut dirty = true;
    loop {
        if dirty {
            terminal.draw(|frame| view::render(frame, state))?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if state.handle_key(key) {
                        break;
                    }
                    dirty = true;
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }
    }
    tracing::info!("shell exiting");
    Ok(())
}
