//! Tracing Layer that forwards events into a [`ProcessLogger`].
//!
//! Lets an application that already instruments with `tracing` land those
//! events in the same per-process files as its direct log calls.

use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::level::LogLevel;
use crate::writer::ProcessLogger;

/// Events from this crate's own diagnostics are never forwarded.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// A tracing Layer that writes events through a [`ProcessLogger`].
///
/// Each event goes to `process`, with the first segment of its target as the
/// category and the full target as the action. The `message` field becomes
/// the message and any other fields become the details object.
pub struct ProcessLogLayer {
    logger: Arc<ProcessLogger>,
    process: String,
}

impl ProcessLogLayer {
    pub fn new(logger: Arc<ProcessLogger>, process: impl Into<String>) -> Self {
        Self {
            logger,
            process: process.into(),
        }
    }

    pub fn process(&self) -> &str {
        &self.process
    }
}

fn map_level(level: &Level) -> LogLevel {
    match *level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warn,
        Level::INFO => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

fn is_own_target(target: &str) -> bool {
    target == OWN_TARGET
        || target
            .strip_prefix(OWN_TARGET)
            .is_some_and(|rest| rest.starts_with("::"))
}

impl<S> Layer<S> for ProcessLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        if is_own_target(target) {
            return;
        }

        let mut visitor = DetailsVisitor::default();
        event.record(&mut visitor);

        let message = visitor.message.unwrap_or_default();
        let details = if visitor.fields.is_empty() {
            None
        } else {
            Some(Value::Object(visitor.fields))
        };
        let category = target.split("::").next().unwrap_or(target);

        // Errors stay here: a layer has nobody to report them to.
        let _ = self.logger.log_to_process(
            map_level(metadata.level()),
            &self.process,
            category,
            target,
            &message,
            details.as_ref(),
        );
    }
}

/// Collects an event's `message` and turns every other field into a
/// details entry, keeping numbers, booleans and `?debug` values that read as
/// JSON typed.
#[derive(Default)]
struct DetailsVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl DetailsVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

/// `Debug` output that is itself a JSON value (`[1, 2]`, `42`, `true`) keeps
/// its shape; anything else is kept as text.
fn debug_value(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

impl Visit for DetailsVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let mut buf = String::new();
        let _ = write!(&mut buf, "{:?}", value);
        let value = if field.name() == "message" {
            Value::String(buf)
        } else {
            debug_value(buf)
        };
        self.put(field, value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.into());
    }

    fn record_i128(&mut self, field: &Field, value: i128) {
        let value = i64::try_from(value).map_or_else(|_| value.to_string().into(), Value::from);
        self.put(field, value);
    }

    fn record_u128(&mut self, field: &Field, value: u128) {
        let value = u64::try_from(value).map_or_else(|_| value.to_string().into(), Value::from);
        self.put(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON number form.
        let value = serde_json::Number::from_f64(value)
            .map_or_else(|| value.to_string().into(), Value::Number);
        self.put(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let mut text = value.to_string();
        let mut source = value.source();
        while let Some(cause) = source {
            let _ = write!(&mut text, ": {}", cause);
            source = cause.source();
        }
        self.put(field, Value::String(text));
    }
}
