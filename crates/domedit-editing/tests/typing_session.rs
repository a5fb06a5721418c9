#![forbid(unsafe_code)]

//! Typing coalescing, backspace, and last-edit tracking through an
//! [`EditingSession`].
//!
//! Run:
//!   cargo test -p domedit-editing --test typing_session

use domedit_dom::{Document, NodeId, Selection};
use domedit_editing::{
    CommandId, EditCommand, EditingConfig, EditingSession, HistoryConfig, TypingConfig,
    close_typing, is_open_for_more_typing_command,
};

fn session_with_text(data: &str, caret: usize) -> (EditingSession, NodeId, NodeId) {
    let mut doc = Document::new();
    let root = doc.root();
    let text = doc.create_text(data);
    doc.append_child(root, text).unwrap();
    doc.set_selection(Selection::caret(text, caret));
    (EditingSession::new(doc), root, text)
}

fn html(session: &EditingSession, node: NodeId) -> String {
    session.document().inner_html(node).unwrap()
}

// ============================================================================
// Coalescing
// ============================================================================

#[test]
fn test_consecutive_keystrokes_form_one_undo_step() {
    let (mut session, root, _) = session_with_text("", 0);
    session.insert_text("a").unwrap();
    session.insert_text("b").unwrap();
    session.insert_text("c").unwrap();

    assert_eq!(html(&session, root), "abc");
    assert_eq!(session.history().undo_depth(), 1);
    assert_eq!(session.last_edit_command().command_id(), CommandId::Typing);
    assert!(is_open_for_more_typing_command(session.last_edit_command()));

    let typing = session.last_edit_command().as_typing().unwrap();
    assert_eq!(typing.children().len(), 1);
    assert_eq!(typing.children()[0].command_id(), CommandId::InputText);

    assert_eq!(session.undo().unwrap().unwrap(), "Typing");
    assert_eq!(html(&session, root), "");
}

#[test]
fn test_close_typing_starts_a_new_command() {
    let (mut session, root, _) = session_with_text("", 0);
    session.insert_text("abc").unwrap();
    session.close_typing();
    assert!(!session.is_typing_open());
    assert_eq!(session.last_edit_command().command_id(), CommandId::Typing);

    session.insert_text("d").unwrap();
    assert_eq!(html(&session, root), "abcd");
    assert_eq!(session.history().undo_depth(), 2);

    session.undo().unwrap().unwrap();
    assert_eq!(html(&session, root), "abc");
}

#[test]
fn test_newline_joins_the_typing_run() {
    let (mut session, root, _) = session_with_text("", 0);
    session.insert_text("hello").unwrap();
    session.insert_newline().unwrap();
    session.insert_text("world").unwrap();

    assert_eq!(html(&session, root), "hello<br>world");
    assert_eq!(session.history().undo_depth(), 1);

    session.undo().unwrap().unwrap();
    assert_eq!(html(&session, root), "");
    session.redo().unwrap().unwrap();
    assert_eq!(html(&session, root), "hello<br>world");
}

#[test]
fn test_newline_splits_existing_text() {
    let (mut session, root, _) = session_with_text("helloworld", 5);
    session.insert_newline().unwrap();
    assert_eq!(html(&session, root), "hello<br>world");

    session.insert_text("!").unwrap();
    assert_eq!(html(&session, root), "hello<br>!world");
}

#[test]
fn test_typing_replaces_selection() {
    let (mut session, root, text) = session_with_text("hello world", 0);
    session.set_selection(Selection::range(
        domedit_dom::Position::new(text, 6),
        domedit_dom::Position::new(text, 11),
    ));
    session.insert_text("there").unwrap();
    assert_eq!(html(&session, root), "hello there");

    session.undo().unwrap().unwrap();
    assert_eq!(html(&session, root), "hello world");
}

// ============================================================================
// Backspace
// ============================================================================

#[test]
fn test_backspace_eats_typed_text_then_existing_text() {
    let (mut session, root, text) = session_with_text("xy", 2);
    session.insert_text("ab").unwrap();
    assert_eq!(html(&session, root), "xyab");

    session.delete_key_pressed().unwrap();
    session.delete_key_pressed().unwrap();
    assert_eq!(html(&session, root), "xy");
    assert_eq!(session.selection(), Selection::caret(text, 2));

    session.delete_key_pressed().unwrap();
    assert_eq!(html(&session, root), "x");
    assert_eq!(session.history().undo_depth(), 1);

    session.undo().unwrap().unwrap();
    assert_eq!(html(&session, root), "xy");
    assert_eq!(session.selection(), Selection::caret(text, 2));
}

#[test]
fn test_backspace_at_document_start_is_a_no_op() {
    let (mut session, root, _) = session_with_text("abc", 0);
    session.delete_key_pressed().unwrap();
    assert_eq!(html(&session, root), "abc");
}

#[test]
fn test_backspace_removes_preceding_line_break() {
    let (mut session, root, _) = session_with_text("helloworld", 5);
    session.insert_newline().unwrap();
    session.close_typing();
    session.delete_key_pressed().unwrap();
    assert_eq!(html(&session, root), "helloworld");
}

// ============================================================================
// Last edit command
// ============================================================================

#[test]
fn test_last_edit_command_is_empty_after_undo() {
    let (mut session, _, _) = session_with_text("", 0);
    assert!(session.last_edit_command().is_empty());

    session.insert_text("a").unwrap();
    assert!(!session.last_edit_command().is_empty());

    session.undo().unwrap().unwrap();
    assert!(session.last_edit_command().is_empty());
    assert_eq!(session.last_edit_command().command_id().raw(), 0);
    assert_eq!(session.last_edit_command().description(), "");
}

#[test]
fn test_closed_typing_command_reapplies_through_history() {
    let (mut session, root, _) = session_with_text("", 0);
    session.insert_text("one").unwrap();
    session.undo().unwrap().unwrap();
    session.redo().unwrap().unwrap();
    assert_eq!(html(&session, root), "one");
    assert!(!session.is_typing_open());
}

#[test]
fn test_standalone_typing_helpers() {
    let mut command = EditCommand::Empty;
    close_typing(&mut command);
    assert!(!is_open_for_more_typing_command(&command));
}

// ============================================================================
// Configuration effects
// ============================================================================

#[test]
fn test_char_limit_splits_typing_runs() {
    let config = EditingConfig::default()
        .with_typing(TypingConfig::default().with_max_coalesced_chars(4));
    let mut doc = Document::new();
    let root = doc.root();
    doc.set_selection(Selection::caret(root, 0));
    let mut session = EditingSession::with_config(doc, config);

    for ch in ["a", "b", "c", "d", "e", "f"] {
        session.insert_text(ch).unwrap();
    }
    assert_eq!(html(&session, root), "abcdef");
    assert_eq!(session.history().undo_depth(), 2);

    session.undo().unwrap().unwrap();
    assert_eq!(html(&session, root), "abcd");
}

#[test]
fn test_word_boundary_splits_typing_runs() {
    let config =
        EditingConfig::default().with_typing(TypingConfig::default().with_word_boundaries(true));
    let mut doc = Document::new();
    let root = doc.root();
    doc.set_selection(Selection::caret(root, 0));
    let mut session = EditingSession::with_config(doc, config);

    for ch in "hi there".chars() {
        session.insert_text(&ch.to_string()).unwrap();
    }
    assert_eq!(session.history().undo_depth(), 2);
    session.undo().unwrap().unwrap();
    assert_eq!(html(&session, root), "hi ");
}

#[test]
fn test_history_depth_limit() {
    let config = EditingConfig::default().with_history(HistoryConfig::new(2, 0));
    let mut doc = Document::new();
    let root = doc.root();
    doc.set_selection(Selection::caret(root, 0));
    let mut session = EditingSession::with_config(doc, config);

    for word in ["a", "b", "c"] {
        session.insert_text(word).unwrap();
        session.close_typing();
    }
    assert_eq!(session.history().undo_depth(), 2);
    session.undo().unwrap().unwrap();
    session.undo().unwrap().unwrap();
    assert!(session.undo().is_none());
    assert_eq!(html(&session, root), "a");
}
