// src/middleware/load_context.rs
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::request_id::request_id_of;
use crate::context::build_load_context;
use crate::server::AppState;

/// Builds the request's [`LoadContext`](crate::context::LoadContext) once,
/// after the id layer and before any handler.
pub async fn load_context(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let request_id = request_id_of(&req);
    let ctx = build_load_context(&state.logger, request_id.as_deref());
    req.extensions_mut().insert(ctx);

    next.run(req).await
}
