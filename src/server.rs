// src/server.rs
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    handler::Handler,
    http::{header::CACHE_CONTROL, HeaderValue},
    middleware::{from_fn, from_fn_with_state, map_response},
    response::Response,
    routing::get,
    Router,
};
use nu_ansi_term::{Color, Style};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, services::ServeDir};

use crate::config::{Config, Environment};
use crate::handlers::{document::render_document, health::health_check};
use crate::logging::Logger;
use crate::middleware::{
    load_context::load_context,
    logging::request_logger,
    request_id::{propagate_request_id_layer, set_request_id_layer},
};

const IMMUTABLE: &str = "public, max-age=31536000, immutable";
const ONE_HOUR: &str = "public, max-age=3600";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Root logger; every request gets a child of it.
    pub logger: Logger,
}

impl AppState {
    pub fn new(config: Config, logger: Logger) -> Self {
        Self {
            config: Arc::new(config),
            logger,
        }
    }
}

async fn immutable_cache<B>(mut response: Response<B>) -> Response<B> {
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static(IMMUTABLE));
    }
    response
}

async fn one_hour_cache<B>(mut response: Response<B>) -> Response<B> {
    if response.status().is_success() && !response.headers().contains_key(CACHE_CONTROL) {
        response
            .headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static(ONE_HOUR));
    }
    response
}

/// Build application router
pub fn router(state: AppState) -> Router {
    let server = &state.config.server;

    let files = Router::new()
        .fallback_service(
            ServeDir::new(&server.static_dir)
                .call_fallback_on_method_not_allowed(true)
                .fallback(render_document.with_state(())),
        )
        .layer(map_response(one_hour_cache));

    let mut app = Router::new().route("/healthz", get(health_check));
    if state.config.environment.is_production() {
        app = app.nest_service(
            "/assets",
            ServiceBuilder::new()
                .layer(map_response(immutable_cache))
                .service(ServeDir::new(&server.assets_dir)),
        );
    }

    app.merge(files).layer(
        ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(propagate_request_id_layer())
            .layer(CompressionLayer::new())
            .layer(from_fn_with_state(state.clone(), load_context))
            .layer(from_fn(request_logger)),
    )
}

/// What gets printed once the listener is up.
pub fn startup_banner(environment: Environment, port: u16, elapsed: Duration) -> String {
    let url = format!("http://localhost:{}", port);
    if environment.is_production() {
        return url;
    }

    let bold = Style::new().bold();
    format!(
        "  {} {} ready in {} ms\n\n  {}  {}   {}\n",
        Color::LightGreen.bold().paint(env!("CARGO_PKG_NAME")),
        Color::Green.paint(format!("v{}", env!("CARGO_PKG_VERSION"))),
        bold.paint(elapsed.as_millis().to_string()),
        Color::LightGreen.bold().paint("➜"),
        bold.paint("Local:"),
        Color::Cyan.paint(url),
    )
}

/// Bind, serve and wait for Ctrl+C / SIGTERM.
pub async fn serve(state: AppState, started: Instant) -> anyhow::Result<()> {
    let server = &state.config.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;
    let port = server.port;
    let environment = state.config.environment;
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server running");
    println!("{}", startup_banner(environment, port, started.elapsed()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install terminate signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    tracing::info!("shutdown signal received");
}
