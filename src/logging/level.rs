// src/logging/level.rs
use std::fmt;
use std::str::FromStr;

use nu_ansi_term::{Color, Style};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered log severities. Numeric values follow the pino convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    pub fn value(&self) -> u64 {
        match self {
            Severity::Trace => 10,
            Severity::Debug => 20,
            Severity::Info => 30,
            Severity::Warn => 40,
            Severity::Error => 50,
            Severity::Fatal => 60,
        }
    }

    pub fn from_value(value: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.value() == value)
    }

    /// Terminal style used for the level label (and the status code of HTTP lines).
    pub fn style(&self) -> Style {
        match self {
            Severity::Trace => Style::new().fg(Color::DarkGray),
            Severity::Debug => Style::new().fg(Color::Blue),
            Severity::Info => Style::new().fg(Color::Green),
            Severity::Warn => Style::new().fg(Color::Yellow),
            Severity::Error => Style::new().fg(Color::Red).bold(),
            Severity::Fatal => Style::new().on(Color::Red).bold(),
        }
    }

    /// Access-log level for a response status, the way pino-http picks it.
    pub fn for_status(status: u16) -> Self {
        match status {
            500..=u16::MAX => Severity::Error,
            400..=499 => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(ParseSeverityError(other.to_string())),
        }
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Severity::Trace,
            tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Level as carried by a record. Records read back from foreign JSON may
/// carry a level outside the known table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level {
    Known(Severity),
    Unknown(String),
}

/// Style for levels that are not in the table.
pub fn default_style() -> Style {
    Style::new().fg(Color::White)
}

impl Level {
    pub fn severity(&self) -> Option<Severity> {
        match self {
            Level::Known(s) => Some(*s),
            Level::Unknown(_) => None,
        }
    }

    pub fn style(&self) -> Style {
        match self {
            Level::Known(s) => s.style(),
            Level::Unknown(_) => default_style(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Level::Known(s) => s.as_str().to_ascii_uppercase(),
            Level::Unknown(raw) => raw.to_ascii_uppercase(),
        }
    }
}

impl From<Severity> for Level {
    fn from(s: Severity) -> Self {
        Level::Known(s)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevel {
    Number(u64),
    Name(String),
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Level::Known(s) => serializer.serialize_u64(s.value()),
            Level::Unknown(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawLevel::deserialize(deserializer)? {
            RawLevel::Number(n) => Severity::from_value(n)
                .map(Level::Known)
                .unwrap_or_else(|| Level::Unknown(n.to_string())),
            RawLevel::Name(name) => name
                .parse()
                .map(Level::Known)
                .unwrap_or(Level::Unknown(name)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_are_ordered() {
        assert!(Severity::Trace < Severity::Debug);
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("INFO".parse::<Severity>().unwrap(), Severity::Info);
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warn);
        assert!("verbose".parse::<Severity>().is_err());
    }

    #[test]
    fn level_reads_numbers_and_names() {
        let l: Level = serde_json::from_str("50").unwrap();
        assert_eq!(l, Level::Known(Severity::Error));

        let l: Level = serde_json::from_str("\"fatal\"").unwrap();
        assert_eq!(l, Level::Known(Severity::Fatal));

        let l: Level = serde_json::from_str("35").unwrap();
        assert_eq!(l, Level::Unknown("35".into()));

        let l: Level = serde_json::from_str("\"audit\"").unwrap();
        assert_eq!(l.label(), "AUDIT");
        assert_eq!(l.style(), default_style());
    }

    #[test]
    fn status_picks_access_level() {
        assert_eq!(Severity::for_status(200), Severity::Info);
        assert_eq!(Severity::for_status(304), Severity::Info);
        assert_eq!(Severity::for_status(404), Severity::Warn);
        assert_eq!(Severity::for_status(503), Severity::Error);
    }
}
