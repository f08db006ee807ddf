// src/logging/record.rs
use std::error::Error as StdError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use super::level::Level;

/// JSON keys owned by [`LogRecord`]'s own fields. They never appear in
/// [`LogRecord::fields`].
pub const RESERVED_KEYS: [&str; 8] = [
    "level",
    "time",
    "msg",
    "err",
    "req",
    "res",
    "responseTime",
    "reqId",
];

/// One structured log record. Field names match pino's JSON output so the
/// same records can be written as JSON lines and read back by `ssrgate pretty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: Level,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<ErrorPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub req: Option<HttpRequestMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub res: Option<HttpResponseMeta>,
    #[serde(
        rename = "responseTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub response_time: Option<f64>,
    #[serde(rename = "reqId", default, skip_serializing_if = "Option::is_none")]
    pub req_id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorPayload {
    pub fn from_error<E: StdError + ?Sized>(err: &E) -> Self {
        let kind = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("Error")
            .to_string();

        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        Self {
            kind,
            message: err.to_string(),
            stack: (!causes.is_empty()).then(|| causes.join("\n")),
        }
    }
}

/// Request metadata as pino-http serializes it. Its default `genReqId`
/// produces numeric ids, so `id` accepts numbers too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpRequestMeta {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "RequestHeaders::is_empty")]
    pub headers: RequestHeaders,
}

impl HttpRequestMeta {
    pub fn host(&self) -> Option<&str> {
        self.headers.host.as_deref()
    }
}

/// The request headers a record keeps. Anything else pino-http logs is
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestHeaders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl RequestHeaders {
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(Number),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    }))
}

/// Identifier text of a JSON value; `null` means no identifier.
fn id_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(id) => Some(id),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpResponseMeta {
    #[serde(
        rename = "statusCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<u16>,
}

/// Borrowed view of a record that has everything an access line needs.
#[derive(Debug, Clone, Copy)]
pub struct HttpLine<'a> {
    pub method: &'a str,
    pub url: &'a str,
    pub host: Option<&'a str>,
    pub status: u16,
    pub response_time: f64,
}

impl LogRecord {
    pub fn new(level: impl Into<Level>) -> Self {
        Self {
            level: level.into(),
            time: Utc::now(),
            msg: None,
            err: None,
            req: None,
            res: None,
            response_time: None,
            req_id: None,
            fields: Map::new(),
        }
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn with_req_id(mut self, id: impl Into<String>) -> Self {
        self.req_id = Some(id.into());
        self
    }

    /// Adds a structured field. Keys in [`RESERVED_KEYS`] are routed instead
    /// of stored: `reqId` replaces the identifier, `msg` fills in a missing
    /// message and the rest are dropped.
    pub fn insert_field(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match key.as_str() {
            "reqId" => self.req_id = id_text(value),
            "msg" => {
                if self.msg.is_none() {
                    self.msg = id_text(value);
                }
            }
            reserved if RESERVED_KEYS.contains(&reserved) => {}
            _ => {
                self.fields.insert(key, value);
            }
        }
    }

    /// The bound identifier if there is one, otherwise the one supplied by
    /// the HTTP layer.
    pub fn request_id(&self) -> Option<&str> {
        match self.req_id.as_deref() {
            Some(id) => Some(id),
            None => self.req.as_ref().and_then(|req| req.id.as_deref()),
        }
    }

    pub fn request_url(&self) -> Option<&str> {
        self.req.as_ref().and_then(|req| req.url.as_deref())
    }

    /// Message text, falling back to the error payload's message.
    pub fn message(&self) -> &str {
        self.msg
            .as_deref()
            .or_else(|| self.err.as_ref().map(|e| e.message.as_str()))
            .unwrap_or("")
    }

    /// `None` unless the record carries complete request and response metadata.
    pub fn http_line(&self) -> Option<HttpLine<'_>> {
        let req = self.req.as_ref()?;
        let res = self.res.as_ref()?;
        Some(HttpLine {
            method: req.method.as_deref()?,
            url: req.url.as_deref()?,
            host: req.host(),
            status: res.status_code?,
            response_time: self.response_time?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::level::Severity;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    #[derive(Debug, thiserror::Error)]
    #[error("fetch failed")]
    struct FetchFailed(#[source] Refused);

    #[test]
    fn bound_id_wins_over_http_id() {
        let mut record = LogRecord::new(Severity::Info).with_req_id("bound-1");
        record.req = Some(HttpRequestMeta {
            id: Some("http-2".into()),
            ..Default::default()
        });
        assert_eq!(record.request_id(), Some("bound-1"));

        record.req_id = None;
        assert_eq!(record.request_id(), Some("http-2"));
    }

    #[test]
    fn http_line_requires_response() {
        let mut record = LogRecord::new(Severity::Info);
        record.req = Some(HttpRequestMeta {
            method: Some("GET".into()),
            url: Some("/".into()),
            ..Default::default()
        });
        record.response_time = Some(1.0);
        assert!(record.http_line().is_none());

        record.res = Some(HttpResponseMeta {
            status_code: Some(200),
        });
        let line = record.http_line().unwrap();
        assert_eq!(line.status, 200);
        assert_eq!(line.host, None);
    }

    #[test]
    fn error_payload_keeps_source_chain() {
        let payload = ErrorPayload::from_error(&FetchFailed(Refused));
        assert_eq!(payload.kind, "FetchFailed");
        assert_eq!(payload.message, "fetch failed");
        assert_eq!(payload.stack.as_deref(), Some("caused by: connection refused"));

        let record = LogRecord {
            err: Some(payload),
            ..LogRecord::new(Severity::Error)
        };
        assert_eq!(record.message(), "fetch failed");
    }

    #[test]
    fn reads_pino_json() {
        let line = json!({
            "level": 30,
            "time": 1_700_000_000_000i64,
            "pid": 42,
            "reqId": "abc-def",
            "msg": "testing"
        });
        let record: LogRecord = serde_json::from_value(line).unwrap();
        assert_eq!(record.level, Level::Known(Severity::Info));
        assert_eq!(record.req_id.as_deref(), Some("abc-def"));
        assert_eq!(record.fields.get("pid"), Some(&json!(42)));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["level"], json!(30));
        assert_eq!(back["reqId"], json!("abc-def"));
    }

    #[test]
    fn reads_pino_http_access_line() {
        let line = r#"{"level":30,"time":1700000000000,"pid":4242,"hostname":"web-1","req":{"id":1,"method":"GET","url":"/test","query":{},"params":{},"headers":{"host":"localhost:3000","user-agent":"curl/8.4.0","accept":"*/*"},"remoteAddress":"::1","remotePort":51234},"res":{"statusCode":200,"headers":{"x-powered-by":"Express"}},"responseTime":4,"msg":"request completed"}"#;
        let record: LogRecord = serde_json::from_str(line).unwrap();

        assert_eq!(record.request_id(), Some("1"));
        let http = record.http_line().unwrap();
        assert_eq!(http.host, Some("localhost:3000"));
        assert_eq!(http.url, "/test");
        assert_eq!(http.status, 200);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["req"]["headers"]["host"], json!("localhost:3000"));
    }

    #[test]
    fn reserved_field_names_are_routed() {
        let mut record = LogRecord::new(Severity::Info).with_msg("x").with_req_id("a-1");
        record.insert_field("reqId", json!("b-2"));
        record.insert_field("msg", json!("y"));
        record.insert_field("level", json!("debug"));
        record.insert_field("responseTime", json!(9));
        record.insert_field("route", json!("/test"));

        assert_eq!(record.req_id.as_deref(), Some("b-2"));
        assert_eq!(record.msg.as_deref(), Some("x"));
        assert_eq!(record.response_time, None);
        assert_eq!(record.fields.len(), 1);

        let line = serde_json::to_string(&record).unwrap();
        let back: LogRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back.req_id.as_deref(), Some("b-2"));
        assert_eq!(back.msg.as_deref(), Some("x"));
        assert_eq!(back.fields, record.fields);
    }
}
