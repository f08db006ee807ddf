// src/logging/formatter.rs
use std::fmt::Display;

use chrono::Local;
use nu_ansi_term::Style;

use super::filter::{ExclusionPattern, NoiseFilter, RejectedPattern};
use super::level::default_style;
use super::record::{HttpLine, LogRecord};
use crate::config::{Environment, LoggingConfig};

const TIME_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("record carries no request identifier")]
    MissingRequestId,
}

/// Renders records as single human-readable lines:
///
/// ```text
/// [10/16/2026, 3:04:05 PM 1b4e28ba] GET 200 http://localhost:3000/ - 4ms
/// [10/16/2026, 3:04:05 PM 1b4e28ba] WARN cache miss
/// ```
#[derive(Debug, Clone)]
pub struct PrettyFormatter {
    colorize: bool,
    /// Only set outside production.
    noise: Option<NoiseFilter>,
}

impl PrettyFormatter {
    pub fn new(colorize: bool, environment: Environment, exclusions: &[ExclusionPattern]) -> Self {
        let noise = (!environment.is_production()).then(|| NoiseFilter::new(exclusions));
        Self { colorize, noise }
    }

    pub fn from_config(cfg: &LoggingConfig, environment: Environment) -> Self {
        Self::new(cfg.colorize, environment, &cfg.exclude)
    }

    /// Exclusion patterns that failed to compile. Always empty in production,
    /// where no filter is built.
    pub fn rejected_patterns(&self) -> &[RejectedPattern] {
        match &self.noise {
            Some(filter) => filter.rejected(),
            None => &[],
        }
    }

    pub fn report_rejected_patterns(&self) {
        for rejected in self.rejected_patterns() {
            tracing::warn!(pattern = ?rejected.pattern, error = %rejected.error, "ignoring exclusion pattern");
        }
    }

    /// Whether the noise filter drops this record.
    pub fn suppresses(&self, record: &LogRecord) -> bool {
        match (&self.noise, record.request_url()) {
            (Some(filter), Some(url)) => filter.excludes(url),
            _ => false,
        }
    }

    /// Like [`format`](Self::format) but reports a record without any request
    /// identifier instead of rendering it without one.
    pub fn try_format(&self, record: &LogRecord) -> Result<Option<String>, FormatError> {
        if self.suppresses(record) {
            return Ok(None);
        }
        let id = short_id(record)?;
        Ok(Some(self.render(record, Some(id))))
    }

    /// Renders the record, or `None` when the line is suppressed. Never fails.
    pub fn format(&self, record: &LogRecord) -> Option<String> {
        match self.try_format(record) {
            Ok(line) => line,
            Err(FormatError::MissingRequestId) => Some(self.render(record, None)),
        }
    }

    fn render(&self, record: &LogRecord, id: Option<&str>) -> String {
        let time = record.time.with_timezone(&Local).format(TIME_FORMAT);
        let prefix = match id {
            Some(id) => self.paint(default_style(), format!("[{} {}]", time, id)),
            None => self.paint(default_style(), format!("[{}]", time)),
        };
        let style = record.level.style();

        match record.http_line() {
            Some(HttpLine {
                method,
                url,
                host,
                status,
                response_time,
            }) => {
                let full_url = match host {
                    Some(host) => format!("http://{}{}", host, url),
                    None => url.to_string(),
                };
                format!(
                    "{} {} {} {} - {}ms",
                    prefix,
                    method,
                    self.paint(style, status),
                    full_url,
                    response_time
                )
            }
            None => format!(
                "{} {} {}",
                prefix,
                self.paint(style, record.level.label()),
                record.message()
            ),
        }
    }

    fn paint(&self, style: Style, text: impl Display) -> String {
        let text = text.to_string();
        if self.colorize {
            style.paint(text).to_string()
        } else {
            text
        }
    }
}

/// First `-`-separated segment of the record's request identifier. An empty
/// first segment (`""`, `"-abc"`) counts as no identifier, so such lines
/// render as `[<timestamp>]`.
pub fn short_id(record: &LogRecord) -> Result<&str, FormatError> {
    record
        .request_id()
        .and_then(|id| id.split('-').next())
        .filter(|short| !short.is_empty())
        .ok_or(FormatError::MissingRequestId)
}
