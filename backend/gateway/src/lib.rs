//! HTTP gateway for the screenshot → to-do pipeline.

pub mod process;
pub mod server;

pub use server::{start_server, AppState};
