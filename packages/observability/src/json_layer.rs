//! JSONL layer with credential redaction.
//!
//! Every line carries: timestamp (RFC 3339), level, service, pid, target,
//! message, structured fields and the enclosing span name.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Replacement value for credential-bearing fields.
pub const REDACTED: &str = "[redacted]";

const SENSITIVE_KEYS: [&str; 7] = [
    "token",
    "access_token",
    "signed_request",
    "authorization",
    "cookie",
    "secret",
    "password",
];

/// Returns true when a field name looks like it carries a credential.
pub fn is_sensitive_field(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    SENSITIVE_KEYS
        .iter()
        .any(|key| name == *key || name.ends_with(&format!("_{key}")))
}

/// A single structured log line.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub service: String,
    pub pid: u32,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

struct FieldVisitor {
    redact: bool,
    fields: BTreeMap<String, serde_json::Value>,
    message: Option<String>,
}

impl FieldVisitor {
    fn new(redact: bool) -> Self {
        Self {
            redact,
            fields: BTreeMap::new(),
            message: None,
        }
    }

    fn insert(&mut self, field: &Field, value: serde_json::Value) {
        let value = if self.redact && is_sensitive_field(field.name()) {
            serde_json::Value::String(REDACTED.to_string())
        } else {
            value
        };
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.insert(field, serde_json::Value::String(rendered));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.into());
    }
}

/// Layer writing one JSON object per event.
pub struct JsonLayer<W> {
    service_name: String,
    pid: u32,
    make_writer: W,
    redact: bool,
}

impl<W> JsonLayer<W> {
    pub fn new(service_name: String, make_writer: W, redact: bool) -> Self {
        Self {
            service_name,
            pid: std::process::id(),
            make_writer,
            redact,
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::new(self.redact);
        event.record(&mut visitor);

        let metadata = event.metadata();
        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            level: metadata.level().to_string(),
            service: self.service_name.clone(),
            pid: self.pid,
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            span: ctx.event_span(event).map(|s| s.name().to_string()),
        };

        if let Ok(json) = serde_json::to_string(&entry) {
            let mut writer = self.make_writer.make_writer();
            let _ = writeln!(writer, "{}", json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(redact: bool, emit: impl FnOnce()) -> serde_json::Value {
        let sink = Captured::default();
        let subscriber = tracing_subscriber::registry().with(JsonLayer::new(
            "test".to_string(),
            sink.clone(),
            redact,
        ));
        tracing::subscriber::with_default(subscriber, emit);

        let bytes = sink.0.lock().clone();
        let line = String::from_utf8(bytes).unwrap();
        serde_json::from_str(line.trim()).unwrap()
    }

    #[test]
    fn test_sensitive_field_names() {
        assert!(is_sensitive_field("access_token"));
        assert!(is_sensitive_field("ACCESS_TOKEN"));
        assert!(is_sensitive_field("fb_signed_request"));
        assert!(!is_sensitive_field("user_id"));
        assert!(!is_sensitive_field("tokenizer"));
    }

    #[test]
    fn test_access_token_is_redacted() {
        let entry = capture(true, || {
            tracing::info!(user_id = "42", access_token = "EAAB", "login exchange");
        });

        assert_eq!(entry["message"], "login exchange");
        assert_eq!(entry["service"], "test");
        assert_eq!(entry["level"], "INFO");
        assert_eq!(entry["fields"]["user_id"], "42");
        assert_eq!(entry["fields"]["access_token"], REDACTED);
    }

    #[test]
    fn test_redaction_can_be_disabled() {
        let entry = capture(false, || {
            tracing::warn!(access_token = "EAAB", "raw");
        });

        assert_eq!(entry["fields"]["access_token"], "EAAB");
    }
}
