//! HTTP server for DFS.
//!
//! Exposes a local file store over three endpoints: multipart upload,
//! download by name, and listing. The handlers are a thin adapter: they
//! move bytes between the connection and the store, run blocking store
//! calls off the async executor, and translate store outcomes into status
//! codes.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::DfsServer;
pub use state::AppState;
