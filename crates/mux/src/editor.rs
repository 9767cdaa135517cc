//! Per-keystroke line editing state machine.
//!
//! The editor holds the text typed since the last prompt and the history
//! browsing position for the active session. It consumes one key event at
//! a time, strictly in arrival order, and reports each transition as a
//! [`KeyOutcome`] that the engine applies to the display and dispatcher.
//! Edits only ever affect the tail of the buffer; there is no mid-line
//! cursor.

use crate::history::CommandHistory;

/// One key event class consumed by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A printable character with no modifier keys held.
    Char(char),
    /// Backspace.
    Backspace,
    /// The submit terminator (Enter).
    Submit,
    /// History-previous (Arrow up).
    HistoryPrev,
    /// History-next (Arrow down).
    HistoryNext,
    /// Any key pressed while control/alt/meta was held. Reserved for
    /// future shortcuts; ignored by the editor.
    Modified,
}

/// Effect of one editor transition, to be applied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Nothing happened; buffer and display are unchanged.
    Ignored,
    /// A character was appended; echo it.
    Echo(char),
    /// The last character was removed; erase the last visible character.
    EraseChar,
    /// The visible input line must be replaced with this text, atomically
    /// (one erase+write batch, no observable intermediate state).
    ReplaceLine(String),
    /// A non-empty trimmed line was submitted; echo a newline and hand the
    /// text to the dispatcher. History and buffer are already updated.
    Submit(String),
    /// An empty or all-whitespace line was submitted; echo a newline and
    /// re-show the prompt. Nothing was appended to history.
    SubmitEmpty,
}

/// Line editor state for the active session.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: String,
    // None means "not currently browsing history" (the -1 sentinel).
    history_index: Option<usize>,
}

impl LineEditor {
    /// Creates an editor with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text typed but not yet submitted.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Clears the buffer and leaves history browsing. Used when the
    /// active session changes; a new edit cycle starts from scratch.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.history_index = None;
    }

    /// Processes one key event against the shared history.
    pub fn handle_key(&mut self, event: KeyEvent, history: &mut CommandHistory) -> KeyOutcome {
        match event {
            KeyEvent::Char(c) => {
                self.buffer.push(c);
                KeyOutcome::Echo(c)
            }
            KeyEvent::Backspace => {
                if self.buffer.pop().is_some() {
                    KeyOutcome::EraseChar
                } else {
                    KeyOutcome::Ignored
                }
            }
            KeyEvent::Submit => self.submit(history),
            KeyEvent::HistoryPrev => self.history_prev(history),
            KeyEvent::HistoryNext => self.history_next(history),
            KeyEvent::Modified => KeyOutcome::Ignored,
        }
    }

    fn submit(&mut self, history: &mut CommandHistory) -> KeyOutcome {
        let trimmed = self.buffer.trim().to_string();
        self.buffer.clear();
        self.history_index = None;

        if trimmed.is_empty() {
            KeyOutcome::SubmitEmpty
        } else {
            history.push(trimmed.clone());
            KeyOutcome::Submit(trimmed)
        }
    }

    fn history_prev(&mut self, history: &CommandHistory) -> KeyOutcome {
        if history.is_empty() {
            return KeyOutcome::Ignored;
        }
        let index = match self.history_index {
            None => history.len() - 1,
            // Clamp at the oldest entry.
            Some(0) => return KeyOutcome::Ignored,
            Some(i) => i - 1,
        };
        self.replace_from(history, Some(index))
    }

    fn history_next(&mut self, history: &CommandHistory) -> KeyOutcome {
        let index = match self.history_index {
            None => return KeyOutcome::Ignored,
            Some(i) if i + 1 == history.len() => None,
            Some(i) => Some(i + 1),
        };
        self.replace_from(history, index)
    }

    fn replace_from(&mut self, history: &CommandHistory, index: Option<usize>) -> KeyOutcome {
        self.history_index = index;
        let text = index
            .and_then(|i| history.get(i))
            .unwrap_or_default()
            .to_string();
        self.buffer = text.clone();
        KeyOutcome::ReplaceLine(text)
    }
}
