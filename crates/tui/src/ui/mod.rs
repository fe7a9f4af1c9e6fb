pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use engine::{Route, SearchState};

use crate::app::{AppState, Modal};

use theme::Theme;

use components::hints::{self, hint_separator, hints_to_spans, muted_hints_to_spans};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    match state.route {
        Route::Login => {
            screens::login::render(frame, area, state);
            render_bottom_bar(frame, bottom_row(area), state, &Theme::default());
        }
        Route::Categories | Route::Expenses => render_shell(frame, area, state),
    }
    components::editor::render(frame, area, &state.modals);
    components::toast::render(frame, area, state.toasts.current());
}

fn render_shell(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    components::tabs::render_tabs(frame, layout[1], state.route, &theme);

    match state.route {
        Route::Categories => screens::categories::render(frame, layout[2], state),
        _ => screens::expenses::render(frame, layout[2], state),
    }

    render_bottom_bar(frame, layout[3], state, &theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let user = state.user.as_deref().unwrap_or("-");
    let line = Line::from(vec![
        Span::styled("User", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {user}  ")),
        Span::styled("Server", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}", state.base_url)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    frame.render_widget(Paragraph::new(bottom_bar_line(state, theme)), area);
}

/// Hint groups for the topmost surface. A group flagged `false` is shown muted.
fn bottom_bar_line(state: &AppState, theme: &Theme) -> Line<'static> {
    let mut groups: Vec<(&[hints::KeyHint], bool)> = Vec::new();
    match state.modals.last() {
        Some(modal) if modal.confirming() => groups.push((hints::CONFIRM, true)),
        Some(modal) => {
            groups.push((hints::SAVE, modal.can_submit()));
            groups.push((hints::EDITOR, true));
            if matches!(modal, Modal::Expense(_)) {
                groups.push((hints::EXPENSE_EDITOR, true));
            }
        }
        None => match state.route {
            Route::Login => groups.push((hints::LOGIN, true)),
            _ if state.categories.filtering || state.expenses.list.filtering => {
                groups.push((hints::FILTER, true));
            }
            Route::Categories => {
                groups.push((hints::LIST, true));
                groups.push((hints::SESSION, true));
            }
            Route::Expenses => {
                groups.push((hints::LIST, true));
                groups.push((hints::EXPENSES, true));
                groups.push((hints::SESSION, true));
            }
        },
    }

    let mut parts = Vec::new();
    for (i, (group, active)) in groups.iter().enumerate() {
        if i > 0 {
            parts.push(hint_separator(theme));
        }
        if *active {
            parts.extend(hints_to_spans(group, theme));
        } else {
            parts.extend(muted_hints_to_spans(group, theme));
        }
    }
    Line::from(parts)
}

fn bottom_row(area: Rect) -> Rect {
    Rect {
        y: area.y + area.height.saturating_sub(1),
        height: area.height.min(1),
        ..area
    }
}

/// Header line shared by the list screens: name filter, sort, then `extra`.
fn filter_line(
    search: &SearchState,
    editing: bool,
    extra: Vec<Span<'static>>,
    theme: &Theme,
) -> Line<'static> {
    let name = search.name_input();
    let name_style = if editing {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.text)
    };
    let name = match (name.is_empty(), editing) {
        (_, true) => format!("{name}│"),
        (true, false) => "-".to_string(),
        (false, false) => name.to_string(),
    };

    let mut spans = vec![
        Span::styled("Name", Style::default().fg(theme.text_muted)),
        Span::raw(": "),
        Span::styled(name, name_style),
        Span::raw("   "),
        Span::styled("Sort", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}   ", search.sort())),
    ];
    spans.extend(extra);
    if search.deadline().is_some() {
        spans.push(Span::styled("…", Style::default().fg(theme.text_muted)));
    }
    Line::from(spans)
}

/// Rect of the given size centered in `area`.
fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}
