// src/logging/logger.rs
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::formatter::PrettyFormatter;
use super::level::Severity;
use super::record::{ErrorPayload, HttpRequestMeta, HttpResponseMeta, LogRecord};
use super::sink::{LogSink, StdoutSink};
use crate::config::{Environment, LoggingConfig};

/// Binding key that carries the request identifier.
pub const REQUEST_ID_KEY: &str = "reqId";

/// Console encoding of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub(crate) enum Encoder {
    Pretty(PrettyFormatter),
    Json,
}

impl Encoder {
    pub(crate) fn from_config(cfg: &LoggingConfig, environment: Environment) -> Self {
        match cfg.format {
            OutputFormat::Pretty => Encoder::Pretty(PrettyFormatter::from_config(cfg, environment)),
            OutputFormat::Json => Encoder::Json,
        }
    }

    pub(crate) fn encode(&self, record: &LogRecord) -> Option<String> {
        match self {
            Encoder::Pretty(formatter) => formatter.format(record),
            Encoder::Json => serde_json::to_string(record).ok(),
        }
    }

    fn pretty(&self) -> Option<&PrettyFormatter> {
        match self {
            Encoder::Pretty(formatter) => Some(formatter),
            Encoder::Json => None,
        }
    }
}

/// Configuration shared by a root logger and every logger derived from it.
struct Shared {
    min_level: Severity,
    encoder: Arc<Encoder>,
    sink: Arc<dyn LogSink>,
}

/// Fields attached to every record a logger emits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(Map<String, Value>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_id(id: impl Into<String>) -> Self {
        Self::new().with(REQUEST_ID_KEY, id.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// What a single log call carries besides its level.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    msg: Option<String>,
    err: Option<ErrorPayload>,
    req: Option<HttpRequestMeta>,
    res: Option<HttpResponseMeta>,
    response_time: Option<f64>,
    fields: Map<String, Value>,
}

impl Entry {
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::default().with_msg(msg)
    }

    pub fn error<E: StdError + ?Sized>(err: &E) -> Self {
        Self::default().with_error(err)
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn with_error<E: StdError + ?Sized>(mut self, err: &E) -> Self {
        self.err = Some(ErrorPayload::from_error(err));
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Turns the entry into an access record.
    pub fn http(mut self, req: HttpRequestMeta, res: HttpResponseMeta, response_time: f64) -> Self {
        self.req = Some(req);
        self.res = Some(res);
        self.response_time = Some(response_time);
        self
    }
}

impl From<&str> for Entry {
    fn from(msg: &str) -> Self {
        Entry::msg(msg)
    }
}

impl From<String> for Entry {
    fn from(msg: String) -> Self {
        Entry::msg(msg)
    }
}

/// Handle for emitting records. Cloning is cheap; children share the
/// configuration of their root and only add bindings.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    bindings: Arc<Bindings>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.shared.min_level)
            .field("encoder", &self.shared.encoder)
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl Logger {
    /// Root logger writing to stdout.
    pub fn root(cfg: &LoggingConfig, environment: Environment) -> Self {
        Self::with_sink(cfg, environment, Arc::new(StdoutSink))
    }

    pub fn with_sink(cfg: &LoggingConfig, environment: Environment, sink: Arc<dyn LogSink>) -> Self {
        Self {
            shared: Arc::new(Shared {
                min_level: cfg.level,
                encoder: Arc::new(Encoder::from_config(cfg, environment)),
                sink,
            }),
            bindings: Arc::new(Bindings::new()),
        }
    }

    /// New logger with this logger's bindings plus `bindings`. The parent is
    /// left untouched.
    pub fn child(&self, bindings: Bindings) -> Self {
        let mut merged = self.bindings.as_ref().clone();
        merged.0.extend(bindings.0);

        Self {
            shared: Arc::clone(&self.shared),
            bindings: Arc::new(merged),
        }
    }

    /// The encoder shared by this logger tree, for rendering records that
    /// arrive from elsewhere in the same format.
    pub(crate) fn encoder(&self) -> Arc<Encoder> {
        Arc::clone(&self.shared.encoder)
    }

    /// The pretty formatter lines are rendered with, unless the tree writes JSON.
    pub fn pretty_formatter(&self) -> Option<&PrettyFormatter> {
        self.shared.encoder.pretty()
    }

    /// Warns about configured exclusion patterns that were skipped. Called
    /// once diagnostics have somewhere to go.
    pub fn report_rejected_patterns(&self) {
        if let Some(formatter) = self.pretty_formatter() {
            formatter.report_rejected_patterns();
        }
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn request_id(&self) -> Option<String> {
        self.bindings.get(REQUEST_ID_KEY).map(|value| match value {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        })
    }

    pub fn is_enabled(&self, severity: Severity) -> bool {
        severity >= self.shared.min_level
    }

    pub fn log(&self, severity: Severity, entry: impl Into<Entry>) {
        if !self.is_enabled(severity) {
            return;
        }
        let record = self.record(severity, entry.into());
        self.emit(&record);
    }

    /// Writes an already-built record, applying only the level threshold.
    pub fn emit(&self, record: &LogRecord) {
        if let Some(severity) = record.level.severity() {
            if !self.is_enabled(severity) {
                return;
            }
        }
        if let Some(line) = self.shared.encoder.encode(record) {
            self.shared.sink.write_line(&line);
        }
    }

    pub fn trace(&self, entry: impl Into<Entry>) {
        self.log(Severity::Trace, entry)
    }

    pub fn debug(&self, entry: impl Into<Entry>) {
        self.log(Severity::Debug, entry)
    }

    pub fn info(&self, entry: impl Into<Entry>) {
        self.log(Severity::Info, entry)
    }

    pub fn warn(&self, entry: impl Into<Entry>) {
        self.log(Severity::Warn, entry)
    }

    pub fn error(&self, entry: impl Into<Entry>) {
        self.log(Severity::Error, entry)
    }

    pub fn fatal(&self, entry: impl Into<Entry>) {
        self.log(Severity::Fatal, entry)
    }

    fn record(&self, severity: Severity, entry: Entry) -> LogRecord {
        let mut record = LogRecord {
            msg: entry.msg,
            err: entry.err,
            req: entry.req,
            res: entry.res,
            response_time: entry.response_time,
            req_id: self.request_id(),
            ..LogRecord::new(severity)
        };

        let bound = self
            .bindings
            .0
            .iter()
            .filter(|(key, _)| key.as_str() != REQUEST_ID_KEY)
            .map(|(key, value)| (key.clone(), value.clone()));
        for (key, value) in bound.chain(entry.fields) {
            record.insert_field(key, value);
        }
        record
    }
}
