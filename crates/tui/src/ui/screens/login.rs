use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{
    app::{AppState, LoginField},
    ui::{centered_box, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let card_area = centered_box(36, 6, area);

    frame.render_widget(Clear, card_area);

    let block = Block::default()
        .title(" login ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));

    let inner = block.inner(card_area);
    frame.render_widget(block, card_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .margin(1)
        .split(inner);

    let login = &state.login;
    let username_focused = login.focus == LoginField::Username;
    render_input(frame, rows[0], "user", &login.username, username_focused, &theme);

    let masked = "•".repeat(login.password.chars().count());
    let password_focused = login.focus == LoginField::Password;
    render_input(frame, rows[2], "pass", &masked, password_focused, &theme);

    let below = |offset: u16| Rect {
        x: card_area.x,
        y: card_area.y.saturating_add(card_area.height + offset),
        width: card_area.width,
        height: 1,
    };

    frame.render_widget(
        Paragraph::new(Span::styled(
            state.base_url.as_str(),
            Style::default().fg(theme.text_muted),
        ))
        .alignment(Alignment::Center),
        below(0),
    );

    if let Some(message) = &login.message {
        frame.render_widget(
            Paragraph::new(Span::styled(
                message.as_str(),
                Style::default().fg(theme.error),
            ))
            .alignment(Alignment::Center),
            below(1),
        );
    }
}

fn render_input(
    frame: &mut Frame<'_>,
    area: Rect,
    label: &str,
    value: &str,
    focused: bool,
    theme: &Theme,
) {
    let cursor = if focused { "│" } else { "" };
    let style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.text_muted)
    };

    let line = ratatui::text::Line::from(vec![
        Span::styled(format!("{label:<6}"), Style::default().fg(theme.text_muted)),
        Span::styled(format!("{value}{cursor}"), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
