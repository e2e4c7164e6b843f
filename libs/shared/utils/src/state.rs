use std::sync::Arc;

use tracing::info;

use shared_config::AppConfig;
use shared_database::{InMemoryStore, SchedulingStore, SupabaseStore};

/// State shared by every handler: configuration plus the injected store handle.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn SchedulingStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn SchedulingStore>) -> Self {
        Self { config, store }
    }

    /// Supabase-backed state when configured, in-memory otherwise.
    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn SchedulingStore> = if config.is_configured() {
            info!("Using Supabase scheduling store at {}", config.supabase_url);
            Arc::new(SupabaseStore::new(&config))
        } else {
            info!("Using in-memory scheduling store");
            Arc::new(InMemoryStore::new())
        };

        Self::new(config, store)
    }
}
