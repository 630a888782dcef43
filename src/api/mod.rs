//! REST facade over the canonical operations

pub mod rest;
pub mod server;

pub use rest::AppState;
pub use server::{ApiServer, ApiServerConfig};
