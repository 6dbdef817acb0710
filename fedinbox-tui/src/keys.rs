use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the inbox to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SelectPrev,
    SelectNext,
    ToggleContent,
    Archive,
    ArchiveAll,
    ToggleFavorite,
    Share,
    Refresh,
    DismissNotice,
    Quit,
}

/// Map a key press to an action. While a notice is open only dismissal and
/// Ctrl+C get through.
pub fn action_for(key: KeyEvent, notice_open: bool) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return Some(Action::Quit);
    }
    if notice_open {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc => Some(Action::DismissNotice),
            _ => None,
        };
    }
    let action = match key.code {
        KeyCode::Up | KeyCode::Char('k') => Action::SelectPrev,
        KeyCode::Down | KeyCode::Char('j') => Action::SelectNext,
        KeyCode::Enter | KeyCode::Char(' ') => Action::ToggleContent,
        KeyCode::Char('a') => Action::Archive,
        KeyCode::Char('A') => Action::ArchiveAll,
        KeyCode::Char('f') => Action::ToggleFavorite,
        KeyCode::Char('s') => Action::Share,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char('q') => Action::Quit,
        _ => return None,
    };
    Some(action)
}
