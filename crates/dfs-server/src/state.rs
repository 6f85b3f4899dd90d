use std::sync::Arc;

use dfs_store::LocalStore;

/// Shared state handed to every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Arc<LocalStore>,
}

impl AppState {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
