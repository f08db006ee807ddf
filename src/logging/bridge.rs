// src/logging/bridge.rs
//! Renders `tracing` events as [`LogRecord`]s so process diagnostics share the
//! request log format. An event field named `req_id` binds the identifier.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

use super::level::Severity;
use super::logger::{Encoder, Logger};
use super::record::{ErrorPayload, LogRecord};

pub struct RecordFormat {
    encoder: Arc<Encoder>,
}

impl RecordFormat {
    /// Formats events with the same encoder as `logger`.
    pub fn for_logger(logger: &Logger) -> Self {
        Self {
            encoder: logger.encoder(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let mut visitor = RecordVisitor(LogRecord::new(Severity::from(*metadata.level())));
        event.record(&mut visitor);

        let mut record = visitor.0;
        record
            .fields
            .insert("target".to_string(), Value::from(metadata.target()));

        match self.encoder.encode(&record) {
            Some(line) => writeln!(writer, "{}", line),
            None => Ok(()),
        }
    }
}

struct RecordVisitor(LogRecord);

impl RecordVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        match (field.name(), value) {
            ("message", Value::String(msg)) => self.0.msg = Some(msg),
            ("req_id", Value::String(id)) => self.0.req_id = Some(id),
            (name, value) => self.0.insert_field(name, value),
        }
    }
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn StdError + 'static)) {
        self.0.err = Some(ErrorPayload::from_error(value));
    }
}
