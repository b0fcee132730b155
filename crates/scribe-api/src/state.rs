use std::sync::Arc;

use tracing::error;

use scribe_db::BlogStore;

use crate::config::Config;
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn BlogStore>,
    pub config: Config,
}

impl AppStateInner {
    pub fn new(store: Arc<dyn BlogStore>, config: Config) -> AppState {
        Arc::new(Self { store, config })
    }

    /// Run blocking store work off the async runtime.
    pub async fn with_store<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&dyn BlogStore) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal(e.into())
            })?
            .map_err(ApiError::from)
    }
}
