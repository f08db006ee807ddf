// src/context.rs
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::logging::{Bindings, Logger};

/// Per-request capabilities handed to route handlers.
#[derive(Debug, Clone)]
pub struct LoadContext {
    pub logger: Logger,
}

/// Child of `root` bound to the request identifier, or an unbound child when
/// the identifier is missing.
pub fn build_load_context(root: &Logger, request_id: Option<&str>) -> LoadContext {
    let bindings = match request_id {
        Some(id) => Bindings::request_id(id),
        None => Bindings::new(),
    };
    LoadContext {
        logger: root.child(bindings),
    }
}

impl<S> FromRequestParts<S> for LoadContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<LoadContext>()
            .cloned()
            .ok_or(AppError::MissingLoadContext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Environment, LoggingConfig};
    use crate::logging::{LogRecord, MemorySink, OutputFormat};
    use std::sync::Arc;

    fn root(sink: &MemorySink) -> Logger {
        let cfg = LoggingConfig {
            format: OutputFormat::Json,
            ..LoggingConfig::default()
        };
        Logger::with_sink(&cfg, Environment::Production, Arc::new(sink.clone()))
    }

    #[test]
    fn every_record_carries_the_request_id() {
        let sink = MemorySink::new();
        let ctx = build_load_context(&root(&sink), Some("0f3a-77"));

        ctx.logger.info("testing");
        ctx.logger.warn("warn");
        ctx.logger.fatal("shutting down");

        let lines = sink.lines();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let record: LogRecord = serde_json::from_str(&line).unwrap();
            assert_eq!(record.req_id.as_deref(), Some("0f3a-77"));
        }
    }

    #[test]
    fn missing_id_gives_unbound_logger() {
        let sink = MemorySink::new();
        let ctx = build_load_context(&root(&sink), None);
        assert_eq!(ctx.logger.request_id(), None);

        ctx.logger.info("still logs");
        let record: LogRecord = serde_json::from_str(&sink.lines()[0]).unwrap();
        assert_eq!(record.req_id, None);
        assert_eq!(record.msg.as_deref(), Some("still logs"));
    }

    #[test]
    fn contexts_do_not_leak_between_requests() {
        let sink = MemorySink::new();
        let root = root(&sink);
        let a = build_load_context(&root, Some("a-1"));
        let b = build_load_context(&root, Some("b-2"));

        b.logger.info("b");
        a.logger.info("a");

        let ids: Vec<Option<String>> = sink
            .lines()
            .iter()
            .map(|l| serde_json::from_str::<LogRecord>(l).unwrap().req_id)
            .collect();
        assert_eq!(ids, vec![Some("b-2".into()), Some("a-1".into())]);
        assert_eq!(root.request_id(), None);
    }
}
