pub mod load_context;
pub mod logging;
pub mod request_id;
