// src/middleware/logging.rs
use std::time::Instant;

use axum::{
    extract::Request,
    http::header::HOST,
    middleware::Next,
    response::Response,
};

use super::request_id::request_id_of;
use crate::context::LoadContext;
use crate::logging::record::{HttpRequestMeta, HttpResponseMeta, RequestHeaders};
use crate::logging::{Entry, Severity};

/// Access logging through the request's own logger, one record per request.
pub async fn request_logger(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let ctx = req.extensions().get::<LoadContext>().cloned();
    let meta = request_meta(&req);

    let response = next.run(req).await;

    match ctx {
        Some(ctx) => {
            let status = response.status().as_u16();
            let entry = Entry::msg("request completed").http(
                meta,
                HttpResponseMeta {
                    status_code: Some(status),
                },
                start.elapsed().as_millis() as f64,
            );
            ctx.logger.log(Severity::for_status(status), entry);
        }
        None => tracing::debug!(url = ?meta.url, "no load context, access line skipped"),
    }

    response
}

fn request_meta(req: &Request) -> HttpRequestMeta {
    let uri = req.uri();
    let host = req
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned)
        .or_else(|| uri.authority().map(|a| a.to_string()));

    HttpRequestMeta {
        id: request_id_of(req),
        method: Some(req.method().to_string()),
        url: Some(
            uri.path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| uri.path().to_string()),
        ),
        headers: RequestHeaders { host },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;

    #[test]
    fn meta_uses_path_query_and_host() {
        let req = http::Request::get("/test?x=1")
            .header(HOST, "localhost:3000")
            .body(Body::empty())
            .unwrap();
        let meta = request_meta(&req);
        assert_eq!(meta.method.as_deref(), Some("GET"));
        assert_eq!(meta.url.as_deref(), Some("/test?x=1"));
        assert_eq!(meta.host(), Some("localhost:3000"));
        assert_eq!(meta.id, None);
    }

    #[test]
    fn meta_falls_back_to_uri_authority() {
        let req = http::Request::post("http://example.com/form")
            .body(Body::empty())
            .unwrap();
        let meta = request_meta(&req);
        assert_eq!(meta.host(), Some("example.com"));
        assert_eq!(meta.url.as_deref(), Some("/form"));
    }
}
