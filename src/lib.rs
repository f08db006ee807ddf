pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod pretty;
pub mod server;
