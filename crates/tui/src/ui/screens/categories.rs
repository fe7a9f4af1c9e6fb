use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::{
    app::AppState,
    ui::{filter_line, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let screen = &state.categories;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let header = filter_line(
        screen.listing.search(),
        screen.filtering,
        Vec::new(),
        &theme,
    );
    frame.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("Categories")),
        layout[0],
    );

    let content = screen.listing.content();
    if !content.is_loaded() {
        let text = if screen.listing.loading() {
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

    let items: Vec<ListItem<'_>> = content
        .items()
        .iter()
        .map(|category| ListItem::new(Line::from(category.name.as_str())))
        .collect();
    let footer = list_footer(items.len(), screen.listing.last_page_reached());

    let mut list_state = ListState::default();
    if !items.is_empty() {
        list_state.select(Some(screen.selected));
    }

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

pub(crate) fn list_footer(count: usize, last_page_reached: bool) -> String {
    if last_page_reached {
        format!(" {count} shown ")
    } else {
        format!(" {count} shown, n for more ")
    }
}
