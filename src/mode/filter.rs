use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};

use crate::input::{is_escape, KeyResult};

/// Pause after the last keystroke before the typed filter is applied
pub const TYPING_DELAY: Duration = Duration::from_millis(500);

/// Line editor for the filter text. Typing applies the filter once the user
/// pauses; Enter applies it immediately.
pub struct FilterInput {
    pub buffer: String,
    /// Text most recently handed to the controller
    applied: String,
    last_edit: Option<Instant>,
}

impl FilterInput {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            applied: String::new(),
            last_edit: None,
        }
    }

    /// Start editing from the filter currently in effect
    pub fn start(&mut self, current: &str) {
        self.buffer = current.to_string();
        self.applied = current.to_string();
        self.last_edit = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> KeyResult {
        if is_escape(key) {
            self.buffer.clear();
            self.applied.clear();
            self.last_edit = None;
            return KeyResult::Cancel;
        }

        match key.code {
            KeyCode::Enter => {
                self.last_edit = None;
                self.applied = self.buffer.clone();
                KeyResult::Apply(self.buffer.clone())
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                self.last_edit = Some(now);
                KeyResult::Continue
            }
            KeyCode::Char(c) => {
                self.buffer.push(c);
                self.last_edit = Some(now);
                KeyResult::Continue
            }
            _ => KeyResult::Continue,
        }
    }

    /// Text to apply once typing has paused, if it differs from what is in
    /// effect
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let last = self.last_edit?;
        if now.duration_since(last) < TYPING_DELAY {
            return None;
        }
        self.last_edit = None;
        if self.buffer == self.applied {
            return None;
        }
        self.applied = self.buffer.clone();
        Some(self.buffer.clone())
    }
}
