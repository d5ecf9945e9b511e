use std::sync::Arc;

use quotebox::{
    config::Config,
    remote::{self, RemoteSource},
    storage::{MemoryStore, SqliteStore},
    sync::{spawn_sync_task, SyncHandle},
    QuoteStore, StoreOptions,
};

fn init_remote(config: &Config) -> anyhow::Result<Option<Arc<dyn RemoteSource>>> {
    match &config.remote {
        Some(remote_config) => {
            tracing::info!(url = %remote_config.url, kind = ?remote_config.kind, "using remote quote source");
            Ok(Some(remote::from_config(remote_config)?))
        }
        None => {
            tracing::debug!("no remote url found. quotes will not be synced.");
            Ok(None)
        }
    }
}

/// opens durable storage and loads the quote store described by `config`.
pub async fn init_store(config: &Config) -> anyhow::Result<Arc<QuoteStore>> {
    let durable = SqliteStore::connect(&config.database_url).await?;
    let session = MemoryStore::new();

    let options = StoreOptions {
        quotes_key: config.quotes_key.clone(),
        seed_defaults: config.seed_defaults,
        sync_strategy: config.sync_strategy,
        push_on_save: config.push_on_save,
    };

    let mut store = QuoteStore::open(Arc::new(durable), Arc::new(session), options).await?;

    if let Some(remote) = init_remote(config)? {
        store = store.with_remote(remote);
    }

    Ok(Arc::new(store))
}

/// starts the periodic sync when a remote is configured.
pub fn spawn_background_tasks(store: &Arc<QuoteStore>, config: &Config) -> Option<SyncHandle> {
    if !store.has_remote() {
        tracing::warn!("no remote configured. periodic sync is disabled.");
        return None;
    }

    Some(spawn_sync_task(Arc::clone(store), config.sync_interval))
}
