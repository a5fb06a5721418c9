#![forbid(unsafe_code)]

//! Keystroke routing.
//!
//! Keystrokes extend the session's last edit command when it is an open
//! [`TypingCommand`]. Otherwise a new typing command is created, fed the
//! keystroke, and registered as the last edit command. A keystroke that
//! fails leaves neither the document nor the history changed.
//!
//! The [`TypingConfig`] window can close an open typing command before the
//! next keystroke reaches it, so one long run of typing still produces
//! several undo steps.

use std::time::Duration;

use web_time::Instant;

use crate::command::EditCommand;
use crate::config::TypingConfig;
use crate::error::EditResult;
use crate::session::EditingSession;
use crate::typing::TypingCommand;

/// A single keyboard action routed into typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keystroke<'a> {
    Text(&'a str),
    Newline,
    Delete,
}

impl Keystroke<'_> {
    fn weight(self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Newline | Self::Delete => 1,
        }
    }
}

/// Coalescing bookkeeping for the currently open typing command.
#[derive(Debug, Clone, Default)]
pub(crate) struct TypingWindow {
    last_keystroke: Option<Instant>,
    coalesced: usize,
    after_whitespace: bool,
}

impl TypingWindow {
    /// Whether `keystroke` at `now` must start a new typing command.
    pub(crate) fn should_close(&self, config: &TypingConfig, now: Instant, keystroke: Keystroke<'_>) -> bool {
        if config.max_coalesced_chars > 0
            && self.coalesced > 0
            && self.coalesced + keystroke.weight() > config.max_coalesced_chars
        {
            return true;
        }
        if config.idle_timeout_ms > 0 {
            if let Some(last) = self.last_keystroke {
                if now.duration_since(last) > Duration::from_millis(config.idle_timeout_ms) {
                    return true;
                }
            }
        }
        if config.close_on_word_boundary && self.after_whitespace {
            if let Keystroke::Text(text) = keystroke {
                return !text.starts_with(char::is_whitespace);
            }
        }
        false
    }

    pub(crate) fn record(&mut self, now: Instant, keystroke: Keystroke<'_>) {
        self.last_keystroke = Some(now);
        self.coalesced += keystroke.weight();
        self.after_whitespace = match keystroke {
            Keystroke::Text(text) => text.ends_with(char::is_whitespace),
            Keystroke::Newline => true,
            Keystroke::Delete => false,
        };
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Type `text` into the session's document.
pub fn insert_text(session: &mut EditingSession, text: &str) -> EditResult<()> {
    route(session, Keystroke::Text(text))
}

/// Insert a line break at the selection.
pub fn insert_newline(session: &mut EditingSession) -> EditResult<()> {
    route(session, Keystroke::Newline)
}

/// Backspace at the selection.
pub fn delete_key_pressed(session: &mut EditingSession) -> EditResult<()> {
    route(session, Keystroke::Delete)
}

/// Close `command` for further typing if it is an open typing command.
/// Anything else is left alone.
pub fn close_typing(command: &mut EditCommand) {
    if let Some(typing) = command.as_typing_mut() {
        typing.close_typing();
    }
}

/// True only for a typing command that still accepts keystrokes.
#[must_use]
pub fn is_open_for_more_typing_command(command: &EditCommand) -> bool {
    command
        .as_typing()
        .is_some_and(TypingCommand::open_for_more_typing)
}

fn feed(typing: &mut TypingCommand, doc: &mut domedit_dom::Document, keystroke: Keystroke<'_>) -> EditResult<()> {
    match keystroke {
        Keystroke::Text(text) => typing.insert_text(doc, text),
        Keystroke::Newline => typing.insert_newline(doc),
        Keystroke::Delete => typing.delete_key_pressed(doc),
    }
}

fn route(session: &mut EditingSession, keystroke: Keystroke<'_>) -> EditResult<()> {
    let now = Instant::now();
    if session.typing_window_expired(now, keystroke) {
        tracing::trace!(?keystroke, "typing window closed");
        session.close_typing();
    }

    if let Some((typing, doc)) = session.open_typing_parts() {
        feed(typing, doc, keystroke)?;
        session.typing_added(now, keystroke);
        tracing::trace!(?keystroke, "extended open typing command");
        return Ok(());
    }

    let doc = session.document_for_edit();
    let mut command = EditCommand::from(TypingCommand::new(doc));
    command.apply(doc)?;
    if let Some(typing) = command.as_typing_mut() {
        feed(typing, doc, keystroke)?;
    }
    session.register_applied(command);
    session.typing_added(now, keystroke);
    tracing::trace!(?keystroke, "started typing command");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domedit_dom::Document;

    fn later(start: Instant, ms: u64) -> Instant {
        start + Duration::from_millis(ms)
    }

    #[test]
    fn test_default_window_never_closes() {
        let config = TypingConfig::default();
        let mut window = TypingWindow::default();
        let start = Instant::now();
        window.record(start, Keystroke::Text("hello "));
        assert!(!window.should_close(&config, later(start, 60_000), Keystroke::Text("w")));
    }

    #[test]
    fn test_char_limit() {
        let config = TypingConfig::default().with_max_coalesced_chars(3);
        let mut window = TypingWindow::default();
        let now = Instant::now();
        assert!(!window.should_close(&config, now, Keystroke::Text("abcdef")));
        window.record(now, Keystroke::Text("ab"));
        assert!(!window.should_close(&config, now, Keystroke::Text("c")));
        assert!(window.should_close(&config, now, Keystroke::Text("cd")));
        window.record(now, Keystroke::Text("c"));
        assert!(window.should_close(&config, now, Keystroke::Delete));

        window.reset();
        assert!(!window.should_close(&config, now, Keystroke::Newline));
    }

    #[test]
    fn test_idle_timeout() {
        let config = TypingConfig::default().with_idle_timeout_ms(500);
        let mut window = TypingWindow::default();
        let start = Instant::now();
        assert!(!window.should_close(&config, later(start, 10_000), Keystroke::Text("a")));
        window.record(start, Keystroke::Text("a"));
        assert!(!window.should_close(&config, later(start, 400), Keystroke::Text("b")));
        assert!(window.should_close(&config, later(start, 501), Keystroke::Text("b")));
    }

    #[test]
    fn test_word_boundary() {
        let config = TypingConfig::default().with_word_boundaries(true);
        let mut window = TypingWindow::default();
        let now = Instant::now();
        window.record(now, Keystroke::Text("hello"));
        assert!(!window.should_close(&config, now, Keystroke::Text("!")));
        window.record(now, Keystroke::Text(" "));
        assert!(!window.should_close(&config, now, Keystroke::Text(" ")));
        assert!(!window.should_close(&config, now, Keystroke::Delete));
        assert!(window.should_close(&config, now, Keystroke::Text("w")));
    }

    #[test]
    fn test_open_for_more_typing_predicate() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.set_selection(domedit_dom::Selection::caret(root, 0));

        assert!(!is_open_for_more_typing_command(&EditCommand::Empty));
        let other = EditCommand::from(crate::InputNewlineCommand::new(&doc));
        assert!(!is_open_for_more_typing_command(&other));

        let mut typing = EditCommand::from(TypingCommand::new(&doc));
        typing.apply(&mut doc).unwrap();
        assert!(is_open_for_more_typing_command(&typing));
        close_typing(&mut typing);
        assert!(!is_open_for_more_typing_command(&typing));
    }

    #[test]
    fn test_close_typing_ignores_other_commands() {
        let doc = Document::new();
        let mut empty = EditCommand::Empty;
        close_typing(&mut empty);
        assert!(empty.is_empty());

        let mut composite = EditCommand::from(crate::CompositeEditCommand::new(&doc, "Edit"));
        close_typing(&mut composite);
        assert_eq!(composite.command_id(), crate::CommandId::Composite);
    }
}
