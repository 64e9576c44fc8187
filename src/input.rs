use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Result of handling a key event in a line-editing mode
#[derive(Debug, Clone, PartialEq)]
pub enum KeyResult {
    /// Keep editing
    Continue,
    /// Apply the text now and return to normal mode
    Apply(String),
    /// Drop the text and return to normal mode
    Cancel,
}

/// Check for escape key (Esc or Ctrl+[)
pub fn is_escape(key: KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('[') && key.modifiers.contains(KeyModifiers::CONTROL))
}

pub fn is_shift(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::SHIFT)
}

/// Name understood by `TableController::process_shortcut`, if any
pub fn shortcut_name(key: KeyEvent) -> Option<&'static str> {
    let shift = is_shift(key);
    match key.code {
        KeyCode::Left | KeyCode::PageUp if shift => Some("Shift+Left"),
        KeyCode::Right | KeyCode::PageDown if shift => Some("Shift+Right"),
        KeyCode::Left | KeyCode::PageUp => Some("Left"),
        KeyCode::Right | KeyCode::PageDown => Some("Right"),
        KeyCode::Home => Some("Shift+Left"),
        KeyCode::End => Some("Shift+Right"),
        _ if is_escape(key) => Some("Escape"),
        _ => None,
    }
}
