use dfs_store::LocalStore;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// DFS file server.
pub struct DfsServer {
    config: ServerConfig,
    state: AppState,
}

impl DfsServer {
    /// Open the store under `config.root_dir` and prepare the server.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = LocalStore::open(&config.root_dir, config.store.clone())?;
        Ok(Self {
            config,
            state: AppState::new(store),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.config.max_upload_size)
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(self, listener: TcpListener) -> ServerResult<()> {
        let app = self.router();
        tracing::info!(
            addr = %listener.local_addr()?,
            root = %self.state.store.root().display(),
            "DFS server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
