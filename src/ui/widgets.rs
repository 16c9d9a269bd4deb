//! Rendering helpers shared by the shell and plugin views.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::trackables::MAX_POINTS;

pub const COLOR_TEXT: Color = Color::Rgb(234, 236, 239);
pub const COLOR_MUTED: Color = Color::Rgb(160, 165, 172);
pub const COLOR_MUTED_DARK: Color = Color::Rgb(118, 124, 130);
pub const COLOR_INFO: Color = Color::Rgb(116, 198, 219);
pub const COLOR_WARNING: Color = Color::Rgb(244, 200, 98);
pub const COLOR_ERROR: Color = Color::Rgb(255, 107, 107);
pub const COLOR_SUCCESS: Color = Color::Rgb(126, 210, 146);
pub const COLOR_ACCENT: Color = Color::Rgb(122, 170, 255);
pub const COLOR_BORDER: Color = Color::Rgb(68, 68, 68);
pub const COLOR_BORDER_FOCUS: Color = Color::Rgb(255, 255, 255);

const HELP_KEY_WIDTH: usize = 15;
const PROGRESS_CELLS: usize = 20;

/// Bordered block; focused panels get a heavier white border.
pub fn panel(title: &str, focused: bool) -> Block<'static> {
    let (style, border_type) = if focused {
        (
            Style::default().fg(COLOR_BORDER_FOCUS),
            ratatui::widgets::BorderType::Thick,
        )
    } else {
        (
            Style::default().fg(COLOR_BORDER),
            ratatui::widgets::BorderType::Plain,
        )
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(style);
    if title.is_empty() {
        block
    } else {
        block.title(title.to_string())
    }
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

pub fn help_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(COLOR_INFO).add_modifier(Modifier::BOLD),
    ))
}

pub fn help_line(keys: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(
            format!("{keys:width$}", width = HELP_KEY_WIDTH),
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(desc.to_string(), Style::default().fg(COLOR_MUTED)),
    ])
}

/// `[████░░░░] 40%` style bar for completed over total points.
pub fn progress_bar(completed: i64, total: i64) -> String {
    if total <= 0 {
        return format!("[{}] 0%", "░".repeat(PROGRESS_CELLS));
    }
    let (completed, total) = (i128::from(completed.clamp(0, total)), i128::from(total));
    let filled = (completed * PROGRESS_CELLS as i128 / total).min(PROGRESS_CELLS as i128) as usize;
    let percentage = completed * 100 / total;
    format!(
        "[{}{}] {percentage}%",
        "█".repeat(filled),
        "░".repeat(PROGRESS_CELLS - filled)
    )
}

pub fn truncate_text(value: &str, max: usize) -> String {
    let count = value.chars().count();
    if count <= max {
        return value.to_string();
    }
    if max <= 3 {
        return value.chars().take(max).collect();
    }
    let mut out: String = value.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

/// Visible `[start, end)` slice of a list that keeps `selected` on screen.
pub fn list_window(total: usize, selected: Option<usize>, height: usize) -> (usize, usize) {
    if total == 0 || height == 0 {
        return (0, 0);
    }
    if total <= height {
        return (0, total);
    }
    let selected = selected.unwrap_or(0);
    let mut start = selected.saturating_sub(height / 2);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

/// Yes/no modal naming the item an action will touch.
pub fn render_confirm(frame: &mut Frame, area: Rect, title: &str, question: &str, subject: &str) {
    let content_width = area.width.saturating_sub(8).min(56);
    let modal = centered_rect(content_width, 7, area);
    frame.render_widget(Clear, modal);

    let lines = vec![
        Line::from(Span::styled(
            question.to_string(),
            Style::default()
                .fg(COLOR_WARNING)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            truncate_text(subject, (content_width as usize).saturating_sub(4)),
            Style::default().fg(COLOR_TEXT),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y confirm  any other key cancels",
            Style::default().fg(COLOR_MUTED_DARK),
        )),
    ];
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, modal);
}

#[derive(Debug, Clone)]
pub struct PromptField {
    pub label: &'static str,
    pub placeholder: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    None,
    Cancel,
    Submit,
}

/// Small modal form: type into the active field, enter advances, enter on the
/// last field submits, esc cancels.
#[derive(Debug, Clone)]
pub struct Prompt {
    title: String,
    fields: Vec<PromptField>,
    active: usize,
    error: Option<String>,
}

impl Prompt {
    pub fn new(title: impl Into<String>, fields: &[(&'static str, &'static str)]) -> Self {
        Self {
            title: title.into(),
            fields: fields
                .iter()
                .map(|&(label, placeholder)| PromptField {
                    label,
                    placeholder,
                    value: String::new(),
                })
                .collect(),
            active: 0,
            error: None,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|field| field.value.trim())
            .unwrap_or("")
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('u') {
            if let Some(field) = self.fields.get_mut(self.active) {
                field.value.clear();
            }
            return PromptAction::None;
        }

        match key.code {
            KeyCode::Esc => return PromptAction::Cancel,
            KeyCode::Tab | KeyCode::Down => self.move_active(1),
            KeyCode::BackTab | KeyCode::Up => self.move_active(-1),
            KeyCode::Enter => {
                if self.active + 1 >= self.fields.len() {
                    return PromptAction::Submit;
                }
                self.move_active(1);
            }
            KeyCode::Backspace => {
                if let Some(field) = self.fields.get_mut(self.active) {
                    field.value.pop();
                }
            }
            KeyCode::Char(ch) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) || ch.is_control() {
                    return PromptAction::None;
                }
                if let Some(field) = self.fields.get_mut(self.active) {
                    field.value.push(ch);
                }
            }
            _ => {}
        }

        self.error = None;
        PromptAction::None
    }

    fn move_active(&mut self, delta: isize) {
        let len = self.fields.len() as isize;
        if len == 0 {
            self.active = 0;
            return;
        }
        self.active = (self.active as isize + delta).rem_euclid(len) as usize;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let height = (self.fields.len() as u16) * 2 + 5;
        let modal = centered_rect(area.width.saturating_sub(8).min(60), height, area);
        frame.render_widget(Clear, modal);

        let mut lines = Vec::new();
        for (index, field) in self.fields.iter().enumerate() {
            let active = index == self.active;
            let label_style = if active {
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(COLOR_MUTED_DARK)
            };
            lines.push(Line::from(Span::styled(field.label.to_string(), label_style)));
            let value = if field.value.is_empty() && !active {
                Span::styled(
                    field.placeholder.to_string(),
                    Style::default().fg(COLOR_MUTED_DARK),
                )
            } else if active {
                Span::styled(format!("{}_", field.value), Style::default().fg(COLOR_TEXT))
            } else {
                Span::styled(field.value.clone(), Style::default().fg(COLOR_TEXT))
            };
            lines.push(Line::from(vec![Span::raw("  "), value]));
        }
        lines.push(Line::from(""));
        match self.error.as_deref() {
            Some(error) => lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(COLOR_ERROR),
            ))),
            None => lines.push(Line::from(Span::styled(
                "enter next/submit  tab move  esc cancel",
                Style::default().fg(COLOR_MUTED_DARK),
            ))),
        }

        let widget = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(ratatui::widgets::BorderType::Thick)
                    .title(self.title.clone()),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, modal);
    }
}

/// Parse an optional points field: blank or non-numeric falls back to 1,
/// anything above [`MAX_POINTS`] is capped.
pub fn parse_points(raw: &str) -> i64 {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|points| *points >= 0)
        .map_or(1, |points| points.min(MAX_POINTS))
}
