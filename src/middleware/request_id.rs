// src/middleware/request_id.rs
use axum::http::Request;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

/// Assigns a UUID v4 to requests that arrive without an `x-request-id`
/// header. Must wrap every logging-aware middleware.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// The identifier assigned by [`set_request_id_layer`]. Empty or non UTF-8
/// values count as absent.
pub fn request_id_of<B>(req: &Request<B>) -> Option<String> {
    req.extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::Request as AxumRequest, routing::get, Router};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|req: AxumRequest| async move { request_id_of(&req).unwrap_or_default() }),
            )
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    async fn call(req: Request<Body>) -> (Option<String>, String) {
        let response = app().oneshot(req).await.unwrap();
        let header = response
            .headers()
            .get("x-request-id")
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (header, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn assigns_fresh_uuid() {
        let (header, seen) = call(Request::get("/").body(Body::empty()).unwrap()).await;
        let header = header.expect("response carries the id");
        assert_eq!(header, seen);
        assert!(Uuid::parse_str(&seen).is_ok());
    }

    #[tokio::test]
    async fn ids_differ_between_requests() {
        let (_, first) = call(Request::get("/").body(Body::empty()).unwrap()).await;
        let (_, second) = call(Request::get("/").body(Body::empty()).unwrap()).await;
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn keeps_inbound_id() {
        let req = Request::get("/")
            .header("x-request-id", "edge-42")
            .body(Body::empty())
            .unwrap();
        let (header, seen) = call(req).await;
        assert_eq!(seen, "edge-42");
        assert_eq!(header.as_deref(), Some("edge-42"));
    }

    #[test]
    fn absent_without_layer() {
        let req = Request::get("/").body(()).unwrap();
        assert_eq!(request_id_of(&req), None);
    }
}
