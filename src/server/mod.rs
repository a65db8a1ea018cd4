//! HTTP front end

pub mod api;

pub use api::{router, run_server, AppState};
