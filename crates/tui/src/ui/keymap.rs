use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    Cancel,
    NextField,
    Submit,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Delete,
    NewCategory,
    Input(char),
    None,
}

/// Plain characters are always `Input`: whether `q` quits or types a letter
/// depends on the focused screen.
pub fn map_key(key: KeyEvent) -> AppAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => AppAction::Quit,
            KeyCode::Char('d') => AppAction::Delete,
            KeyCode::Char('n') => AppAction::NewCategory,
            _ => AppAction::None,
        };
    }

    match key.code {
        KeyCode::Esc => AppAction::Cancel,
        KeyCode::Tab => AppAction::NextField,
        KeyCode::Enter => AppAction::Submit,
        KeyCode::Backspace => AppAction::Backspace,
        KeyCode::Up => AppAction::Up,
        KeyCode::Down => AppAction::Down,
        KeyCode::Left => AppAction::Left,
        KeyCode::Right => AppAction::Right,
        KeyCode::Char(ch) => AppAction::Input(ch),
        _ => AppAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> AppAction {
        map_key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn control_chords() {
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), AppAction::Quit);
        assert_eq!(press(KeyCode::Char('d'), KeyModifiers::CONTROL), AppAction::Delete);
        assert_eq!(
            press(KeyCode::Char('n'), KeyModifiers::CONTROL),
            AppAction::NewCategory
        );
        assert_eq!(press(KeyCode::Char('x'), KeyModifiers::CONTROL), AppAction::None);
    }

    #[test]
    fn letters_are_input() {
        assert_eq!(press(KeyCode::Char('q'), KeyModifiers::NONE), AppAction::Input('q'));
        assert_eq!(press(KeyCode::Char('D'), KeyModifiers::SHIFT), AppAction::Input('D'));
    }
}
