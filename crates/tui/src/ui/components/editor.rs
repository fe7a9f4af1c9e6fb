use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use engine::{EditorState, Form};

use crate::{
    app::{EditorModal, FormFields, Modal},
    ui::{centered_box, theme::Theme},
};

const BOX_WIDTH: u16 = 52;

/// Draws the editor stack; a nested editor sits slightly lower than its parent.
pub fn render(frame: &mut Frame<'_>, area: Rect, modals: &[Modal]) {
    let theme = Theme::default();
    for (depth, modal) in modals.iter().enumerate() {
        let offset = depth as u16 * 2;
        match modal {
            Modal::Category(modal) => render_modal(frame, area, offset, modal, &theme),
            Modal::Expense(modal) => render_modal(frame, area, offset, modal, &theme),
        }
    }
}

/// Centered box pushed down by `offset`, never past the bottom of `area`.
fn stacked_rect(area: Rect, height: u16, offset: u16) -> Rect {
    let mut rect = centered_box(BOX_WIDTH, height, area);
    let lowest = area.bottom().saturating_sub(rect.height).max(area.y);
    rect.y = rect.y.saturating_add(offset).min(lowest);
    rect
}

fn render_modal<F>(
    frame: &mut Frame<'_>,
    area: Rect,
    offset: u16,
    modal: &EditorModal<F>,
    theme: &Theme,
) where
    F: Form + FormFields,
{
    let errors = modal.editor.errors();
    let height = F::LABELS.len() as u16 + errors.len() as u16 + 4;
    let rect = stacked_rect(area, height, offset);

    frame.render_widget(Clear, rect);
    let block = Block::default()
        .title(modal.title())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.accent))
        .style(Style::default().bg(theme.panel));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let form = modal.editor.form();
    let mut lines: Vec<Line<'_>> = F::LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let focused = i == modal.focus;
            let value_style = if focused {
                Style::default().fg(theme.accent)
            } else {
                Style::default().fg(theme.text)
            };
            let cursor = if focused && modal.confirm.is_none() { "│" } else { "" };
            Line::from(vec![
                Span::styled(format!("{label:<10}"), Style::default().fg(theme.text_muted)),
                Span::styled(format!("{}{cursor}", form.display(i)), value_style),
            ])
        })
        .collect();

    lines.push(Line::raw(""));
    for error in errors {
        lines.push(Line::styled(
            error.to_string(),
            Style::default().fg(theme.error),
        ));
    }
    if modal.editor.state() == EditorState::Submitting {
        lines.push(Line::styled(
            "saving…",
            Style::default().fg(theme.text_muted),
        ));
    }

    frame.render_widget(Paragraph::new(lines), inner);

    if let Some(prompt) = &modal.confirm {
        render_confirm(frame, rect, prompt, theme);
    }
}

fn render_confirm(frame: &mut Frame<'_>, parent: Rect, prompt: &str, theme: &Theme) {
    let width = (prompt.chars().count() as u16 + 4).max(24);
    let rect = centered_box(width, 4, parent);

    frame.render_widget(Clear, rect);
    let block = Block::default()
        .title(" confirm ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.error));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);
    frame.render_widget(
        Paragraph::new(Span::styled(prompt, Style::default().fg(theme.text)))
            .alignment(Alignment::Center),
        rows[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            "y / n",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        rows[1],
    );
}
