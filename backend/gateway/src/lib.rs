//! framewise HTTP gateway.
//!
//! Chat and upload endpoints, per-session conversation history, health, and
//! static hosting of the browser client.

pub mod attachments;
pub mod control_ui;
pub mod error;
pub mod handlers;
pub mod health_api;
pub mod response;
pub mod server;
pub mod session_registry;

pub use error::ApiError;
pub use server::{build_pipeline, build_router, start_server, GatewayState};
pub use session_registry::SessionRegistry;
