use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// A keyboard hint: the key and what it does.
#[derive(Debug, Clone, Copy)]
pub struct KeyHint {
    pub key: &'static str,
    pub action: &'static str,
}

pub const fn hint(key: &'static str, action: &'static str) -> KeyHint {
    KeyHint { key, action }
}

pub fn hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(theme.accent)));
        spans.push(Span::raw(format!(" {}", hint.action)));
    }

    spans
}

/// Same layout as [`hints_to_spans`], greyed out for keys that do nothing right now.
pub fn muted_hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let muted = Style::default().fg(theme.text_muted);
    let mut spans = Vec::new();

    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(hint.key, muted));
        spans.push(Span::styled(format!(" {}", hint.action), muted));
    }

    spans
}

pub fn hint_separator(theme: &Theme) -> Span<'static> {
    Span::styled("  │  ", Style::default().fg(theme.border))
}

pub const LOGIN: &[KeyHint] = &[
    hint("Tab", "next"),
    hint("Enter", "login"),
    hint("Ctrl+C", "quit"),
];

pub const LIST: &[KeyHint] = &[
    hint("Tab", "section"),
    hint("↑↓", "select"),
    hint("Enter", "edit"),
    hint("a", "add"),
    hint("/", "name"),
    hint("s", "sort"),
    hint("n", "more"),
    hint("r", "reload"),
];

pub const EXPENSES: &[KeyHint] = &[hint("c", "category"), hint("[ ]", "month")];

pub const SESSION: &[KeyHint] = &[hint("o", "logout"), hint("q", "quit")];

pub const FILTER: &[KeyHint] = &[hint("Enter", "done"), hint("Esc", "done")];

pub const SAVE: &[KeyHint] = &[hint("Enter", "save")];

pub const EDITOR: &[KeyHint] = &[
    hint("Tab", "next"),
    hint("Esc", "cancel"),
    hint("Ctrl+D", "delete"),
];

pub const EXPENSE_EDITOR: &[KeyHint] = &[hint("←→", "category"), hint("Ctrl+N", "new category")];

pub const CONFIRM: &[KeyHint] = &[hint("y", "yes"), hint("n", "no")];
