#![forbid(unsafe_code)]

//! Structured log output of the command protocol.
//!
//! Run:
//!   cargo test -p domedit-editing --test tracing_events

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;

use domedit_dom::{Document, Selection};
use domedit_editing::{CompositeEditCommand, EditCommand, EditingSession, InsertTextCommand};

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
}

/// A tracing Layer that records every event it sees.
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.remove("message").unwrap_or_default();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
        });
    }
}

fn with_captured_events(f: impl FnOnce()) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn doc_with_text(data: &str) -> (Document, domedit_dom::NodeId) {
    let mut doc = Document::new();
    let root = doc.root();
    let text = doc.create_text(data);
    doc.append_child(root, text).unwrap();
    doc.set_selection(Selection::caret(text, 0));
    (doc, text)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_protocol_steps_are_logged() {
    let events = with_captured_events(|| {
        let (mut doc, text) = doc_with_text("abc");
        let mut cmd = EditCommand::from(InsertTextCommand::new(&doc, text, 1, "x"));
        cmd.apply(&mut doc).unwrap();
        cmd.unapply(&mut doc).unwrap();
        cmd.reapply(&mut doc).unwrap();
    });

    let operations: Vec<&str> = events
        .iter()
        .filter(|e| e.message == "edit command")
        .map(|e| e.fields["operation"].as_str())
        .collect();
    assert_eq!(operations, ["apply", "unapply", "reapply"]);

    let first = events.iter().find(|e| e.message == "edit command").unwrap();
    assert_eq!(first.level, tracing::Level::DEBUG);
    assert_eq!(first.fields["command"], "InsertTextCommand");
    assert_eq!(first.fields["composite_step"], "false");
    assert!(first.fields.contains_key("document"));
}

#[test]
fn test_failed_step_rollback_is_logged() {
    let events = with_captured_events(|| {
        let (mut doc, text) = doc_with_text("abc");
        let composite = CompositeEditCommand::new(&doc, "Broken")
            .with(InsertTextCommand::new(&doc, text, 0, "x"))
            .with(InsertTextCommand::new(&doc, text, 42, "y"));
        let mut cmd = EditCommand::from(composite);
        assert!(cmd.apply(&mut doc).is_err());
    });

    let steps: Vec<(&str, &str)> = events
        .iter()
        .filter(|e| e.message == "edit command")
        .map(|e| (e.fields["operation"].as_str(), e.fields["composite_step"].as_str()))
        .collect();
    assert_eq!(steps, [("apply", "true"), ("unapply", "true")]);
    assert!(events.iter().all(|e| e.level != tracing::Level::ERROR));
}

#[test]
fn test_session_logs_registration_and_undo() {
    let events = with_captured_events(|| {
        let (doc, _) = doc_with_text("");
        let mut session = EditingSession::new(doc);
        session.insert_text("hi").unwrap();
        session.undo().unwrap().unwrap();
    });

    let messages: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
    assert!(messages.contains(&"editing session created"));
    assert!(messages.contains(&"registered edit"));
    assert!(messages.contains(&"started typing command"));
    let undo = events.iter().find(|e| e.message == "undo").unwrap();
    assert_eq!(undo.fields["command"], "TypingCommand");
}
