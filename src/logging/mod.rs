//! Request-scoped structured logging.
//!
//! A [`Logger`] turns log calls into [`LogRecord`]s and writes them through
//! either the [`PrettyFormatter`] or as JSON lines. Child loggers share the
//! root configuration and only add bindings such as the request identifier.

pub mod bridge;
pub mod filter;
pub mod formatter;
pub mod level;
pub mod logger;
pub mod record;
pub mod sink;

pub use formatter::{FormatError, PrettyFormatter};
pub use level::{Level, Severity};
pub use logger::{Bindings, Entry, Logger, OutputFormat, REQUEST_ID_KEY};
pub use record::LogRecord;
pub use sink::{LogSink, MemorySink, StdoutSink};
