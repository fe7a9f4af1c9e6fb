use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use api_types::expense::Expense;

use crate::{
    app::AppState,
    ui::{filter_line, screens::categories::list_footer, theme::Theme},
};

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let screen = &state.expenses;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let period = screen.period();
    let month = MONTHS
        .get(period.month() as usize - 1)
        .copied()
        .unwrap_or("?");
    let extra = vec![
        Span::styled("Category", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}   ", screen.category_filter_label())),
    ];
    let header = filter_line(screen.list.listing.search(), screen.list.filtering, extra, &theme);
    frame.render_widget(
        Paragraph::new(header).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Expenses · {month} {}", period.year())),
        ),
        layout[0],
    );

    let groups = screen.list.listing.content();
    if !groups.is_loaded() {
        let text = if screen.list.listing.loading() {
            "Loading…"
        } else {
            "Nothing loaded"
        };
        frame.render_widget(
            Paragraph::new(Line::styled(text, Style::default().fg(theme.text_muted)))
                .block(Block::default().borders(Borders::ALL)),
            layout[1],
        );
        return;
    }

    // Date headers are rows too, so the cursor index has to be shifted.
    let mut items = Vec::new();
    let mut highlighted = None;
    let mut row = 0;
    let mut total = 0.0;
    for group in groups.groups() {
        items.push(ListItem::new(Line::styled(
            group.date.format("%a %d %b").to_string(),
            Style::default()
                .fg(theme.text_muted)
                .add_modifier(Modifier::BOLD),
        )));
        for expense in &group.expenses {
            if row == screen.list.selected {
                highlighted = Some(items.len());
            }
            items.push(ListItem::new(expense_line(expense, &theme)));
            total += expense.amount;
            row += 1;
        }
    }
    let footer = format!(
        "{} total {total:.2} ",
        list_footer(row, screen.list.listing.last_page_reached()).trim_end()
    );

    let mut list_state = ListState::default();
    list_state.select(highlighted);

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title_bottom(Line::styled(footer, Style::default().fg(theme.text_muted))),
        )
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");

    frame.render_stateful_widget(list, layout[1], &mut list_state);
}

fn expense_line(expense: &Expense, theme: &Theme) -> Line<'static> {
    let category = expense
        .category
        .as_ref()
        .map(|c| format!("#{}", c.name))
        .unwrap_or_default();
    Line::from(vec![
        Span::raw(format!("  {:<28}", expense.name)),
        Span::styled(
            format!("{:>10.2}  ", expense.amount),
            Style::default().fg(theme.text),
        ),
        Span::styled(category, Style::default().fg(theme.text_muted)),
    ])
}
