//! the quote store: the owned collection of quotes and everything done to it.

use std::{
    collections::HashSet,
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex as StdMutex, PoisonError,
    },
};

use rand::seq::SliceRandom;
use tokio::{sync::Mutex, task::JoinSet};
use tracing::Instrument;

use crate::{
    constants::{LAST_CATEGORY_KEY, LAST_VIEWED_QUOTE_KEY, QUOTES_KEY},
    error::{Error, Result},
    models::{
        quotes::{
            backfill_ids, categories, filter_by_category, next_id, now_millis, parse_quotes,
            seed_quotes, to_export_json, to_stored_json, Quote, ALL_CATEGORIES,
        },
        remote::PushResponse,
    },
    remote::RemoteSource,
    storage::KeyValueStore,
    sync::{merge, SyncReport, SyncStrategy},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportMode {
    /// the file contents become the whole collection.
    Replace,
    /// the file contents are added after the existing quotes.
    Append,
}

#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// durable key holding the collection.
    pub quotes_key: String,
    /// whether an empty store starts out with the built-in quotes.
    pub seed_defaults: bool,
    pub sync_strategy: SyncStrategy,
    /// whether every save also sends the collection to the remote.
    pub push_on_save: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            quotes_key: QUOTES_KEY.to_string(),
            seed_defaults: true,
            sync_strategy: SyncStrategy::default(),
            push_on_save: true,
        }
    }
}

/// reads the collection stored under `key`.
///
/// a missing or unreadable value yields the seed quotes when `seed` is set, an
/// empty list otherwise. ids are backfilled and quotes missing text or category
/// are dropped.
#[tracing::instrument(skip(storage))]
pub async fn load_quotes(storage: &dyn KeyValueStore, key: &str, seed: bool) -> Result<Vec<Quote>> {
    let stored = storage.get(key).await?;

    let parsed = stored.as_deref().and_then(|text| {
        parse_quotes(text)
            .inspect_err(
                |e| tracing::warn!(err = ?e, "stored quotes are malformed, starting over"),
            )
            .ok()
    });

    let mut quotes = match parsed {
        Some(quotes) => quotes,
        None if seed => seed_quotes(),
        None => vec![],
    };

    let total = quotes.len();
    quotes.retain(Quote::is_valid);
    if quotes.len() != total {
        tracing::warn!(
            dropped = total - quotes.len(),
            "dropped stored quotes without text or category"
        );
    }

    let filled = backfill_ids(&mut quotes);
    if filled > 0 {
        tracing::info!(filled, "assigned ids to stored quotes");
    }

    Ok(quotes)
}

/// parses an import file and checks every entry before anything is applied.
fn parse_import(contents: &str) -> Result<Vec<Quote>> {
    let quotes = parse_quotes(contents).map_err(Error::Import)?;

    if let Some(index) = quotes.iter().position(|quote| !quote.is_valid()) {
        return Err(Error::InvalidQuote { index });
    }

    Ok(quotes)
}

pub struct QuoteStore {
    quotes: Mutex<Vec<Quote>>,
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    remote: Option<Arc<dyn RemoteSource>>,
    pushes: StdMutex<JoinSet<()>>,
    /// sequence number of the newest snapshot handed to a push.
    push_seq: AtomicU64,
    /// sequence number of the last snapshot sent. holding the lock serializes pushes.
    last_pushed: Arc<Mutex<u64>>,
    options: StoreOptions,
}

impl QuoteStore {
    /// loads the collection from `durable` and takes ownership of it.
    pub async fn open(
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        options: StoreOptions,
    ) -> Result<Self> {
        let quotes = load_quotes(durable.as_ref(), &options.quotes_key, options.seed_defaults).await?;

        tracing::info!(count = quotes.len(), key = %options.quotes_key, "loaded quotes");

        Ok(QuoteStore {
            quotes: Mutex::new(quotes),
            durable,
            session,
            remote: None,
            pushes: StdMutex::new(JoinSet::new()),
            push_seq: AtomicU64::new(0),
            last_pushed: Arc::new(Mutex::new(0)),
            options,
        })
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// a snapshot of the current collection.
    pub async fn quotes(&self) -> Vec<Quote> {
        self.quotes.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.quotes.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.quotes.lock().await.is_empty()
    }

    /// writes `quotes` to durable storage and, if enabled, pushes them in the background.
    async fn persist(&self, quotes: &[Quote]) -> Result<()> {
        let serialized = to_stored_json(quotes)?;
        self.durable
            .set(&self.options.quotes_key, &serialized)
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when saving quotes"))?;

        if self.options.push_on_save {
            self.spawn_push(quotes.to_vec());
        }

        Ok(())
    }

    /// callers hold the collection lock, so sequence numbers follow mutation order.
    fn next_push_seq(&self) -> u64 {
        self.push_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn spawn_push(&self, snapshot: Vec<Quote>) {
        let Some(remote) = self.remote.clone() else {
            return;
        };

        let seq = self.next_push_seq();
        let last_pushed = Arc::clone(&self.last_pushed);

        let mut pushes = self.pushes.lock().unwrap_or_else(PoisonError::into_inner);
        while pushes.try_join_next().is_some() {}

        pushes.spawn(
            async move {
                let mut last = last_pushed.lock().await;
                if *last >= seq {
                    tracing::debug!(seq, "skipping push of a superseded snapshot");
                    return;
                }
                *last = seq;

                match remote.push_quotes(&snapshot).await {
                    Ok(resp) => {
                        tracing::info!(count = snapshot.len(), message = %resp.message, "pushed quotes to remote")
                    }
                    Err(e) => {
                        tracing::error!(err = ?e, "an error occurred when pushing quotes to remote")
                    }
                }
            }
            .in_current_span(),
        );
    }

    /// waits for background pushes started by earlier saves.
    pub async fn wait_for_pushes(&self) {
        let mut pending = std::mem::take(
            &mut *self.pushes.lock().unwrap_or_else(PoisonError::into_inner),
        );

        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                tracing::error!(err = ?e, "push task ended abnormally");
            }
        }
    }

    /// persists the current collection, overwriting what was stored.
    #[tracing::instrument(skip_all)]
    pub async fn save(&self) -> Result<()> {
        let quotes = self.quotes.lock().await;
        self.persist(&quotes).await
    }

    /// validates, appends and persists a new quote.
    #[tracing::instrument(skip(self))]
    pub async fn add(&self, text: &str, category: &str) -> Result<Quote> {
        let text = text.trim();
        let category = category.trim();

        if text.is_empty() || category.is_empty() {
            tracing::warn!("refusing to add a quote without text or category");
            return Err(Error::Validation);
        }

        let mut quotes = self.quotes.lock().await;

        let quote = Quote {
            id: Some(next_id(&quotes)),
            text: text.to_string(),
            category: category.to_string(),
            updated_at: Some(now_millis()),
        };

        let mut next = quotes.clone();
        next.push(quote.clone());
        self.persist(&next).await?;
        *quotes = next;

        tracing::info!(id = ?quote.id, "added quote");

        Ok(quote)
    }

    pub async fn filter_by_category(&self, category: &str) -> Vec<Quote> {
        filter_by_category(&self.quotes.lock().await, category)
    }

    pub async fn categories(&self) -> Vec<String> {
        categories(&self.quotes.lock().await)
    }

    /// draws a quote uniformly from `category` and remembers it for the session.
    ///
    /// returns `None` when there is nothing to draw from.
    #[tracing::instrument(skip(self))]
    pub async fn random_quote(&self, category: &str) -> Result<Option<Quote>> {
        let picked = {
            let quotes = self.quotes.lock().await;
            let candidates = filter_by_category(&quotes, category);
            candidates.choose(&mut rand::thread_rng()).cloned()
        };

        let Some(quote) = picked else {
            tracing::debug!("no quotes available");
            return Ok(None);
        };

        self.session
            .set(LAST_VIEWED_QUOTE_KEY, &serde_json::to_string(&quote)?)
            .await
            .inspect_err(
                |e| tracing::error!(err = ?e, "an error occurred when saving last viewed quote"),
            )?;

        Ok(Some(quote))
    }

    /// the quote most recently drawn in this session.
    pub async fn last_viewed(&self) -> Result<Option<Quote>> {
        let Some(stored) = self.session.get(LAST_VIEWED_QUOTE_KEY).await? else {
            return Ok(None);
        };

        Ok(serde_json::from_str(&stored)
            .inspect_err(|e| tracing::warn!(err = ?e, "last viewed quote is malformed"))
            .ok())
    }

    pub async fn select_category(&self, category: &str) -> Result<()> {
        self.durable.set(LAST_CATEGORY_KEY, category).await
    }

    /// the last selected category filter, `all` if none was chosen.
    pub async fn selected_category(&self) -> Result<String> {
        Ok(self
            .durable
            .get(LAST_CATEGORY_KEY)
            .await?
            .filter(|category| !category.is_empty())
            .unwrap_or_else(|| ALL_CATEGORIES.to_string()))
    }

    pub async fn export_json(&self) -> Result<String> {
        Ok(to_export_json(&self.quotes.lock().await)?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn export_to_file(&self, path: &Path) -> Result<usize> {
        let (json, count) = {
            let quotes = self.quotes.lock().await;
            (to_export_json(&quotes)?, quotes.len())
        };

        tokio::fs::write(path, json)
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when writing export file"))?;

        tracing::info!(count, "exported quotes");

        Ok(count)
    }

    /// replaces the whole collection with the quotes in `contents`.
    #[tracing::instrument(skip_all)]
    pub async fn import_replace(&self, contents: &str) -> Result<usize> {
        let mut imported = parse_import(contents)?;
        backfill_ids(&mut imported);
        let count = imported.len();

        let mut quotes = self.quotes.lock().await;
        self.persist(&imported).await?;
        *quotes = imported;

        tracing::info!(count, "replaced quotes from import");

        Ok(count)
    }

    /// appends the quotes in `contents` to the collection.
    #[tracing::instrument(skip_all)]
    pub async fn import_append(&self, contents: &str) -> Result<usize> {
        let imported = parse_import(contents)?;
        let count = imported.len();

        let mut quotes = self.quotes.lock().await;
        let taken: HashSet<i64> = quotes.iter().filter_map(|quote| quote.id).collect();

        let mut next = quotes.clone();
        // colliding ids are dropped here and reassigned by the backfill below.
        next.extend(imported.into_iter().map(|quote| Quote {
            id: quote.id.filter(|id| !taken.contains(id)),
            ..quote
        }));
        backfill_ids(&mut next);
        self.persist(&next).await?;
        *quotes = next;

        tracing::info!(count, "appended quotes from import");

        Ok(count)
    }

    pub async fn import_file(&self, path: &Path, mode: ImportMode) -> Result<usize> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when reading import file"))?;

        match mode {
            ImportMode::Replace => self.import_replace(&contents).await,
            ImportMode::Append => self.import_append(&contents).await,
        }
    }

    /// fetches the remote collection and merges it into the local one.
    ///
    /// on failure the local collection is left as it was.
    #[tracing::instrument(skip_all, fields(strategy = %self.options.sync_strategy))]
    pub async fn sync_with_remote(&self) -> Result<SyncReport> {
        let remote = self.remote.as_ref().ok_or(Error::NoRemote)?;

        let fetched = remote.fetch_quotes().await.inspect_err(
            |e| tracing::error!(err = ?e, "an error occurred when syncing with remote"),
        )?;

        let mut quotes = self.quotes.lock().await;
        let outcome = merge(&quotes, fetched.clone(), self.options.sync_strategy);

        let serialized = to_stored_json(&outcome.quotes)?;
        self.durable
            .set(&self.options.quotes_key, &serialized)
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when saving synced quotes"))?;

        let pushed = outcome.needs_push();
        if pushed {
            self.spawn_push(outcome.quotes.clone());
        }

        let report = SyncReport {
            fetched: fetched.len(),
            added: outcome.added,
            updated: outcome.updated,
            local_ahead: outcome.local_ahead,
            rejected: outcome.rejected,
            pushed,
        };
        *quotes = outcome.quotes;

        tracing::info!(?report, "synced quotes with remote");

        Ok(report)
    }

    /// sends the full collection to the remote and waits for the acknowledgement.
    #[tracing::instrument(skip_all)]
    pub async fn push_to_remote(&self) -> Result<PushResponse> {
        let remote = self.remote.as_ref().ok_or(Error::NoRemote)?;

        let mut last = self.last_pushed.lock().await;
        let snapshot = {
            let quotes = self.quotes.lock().await;
            *last = self.next_push_seq();
            quotes.clone()
        };

        let resp = remote.push_quotes(&snapshot).await?;
        tracing::info!(count = snapshot.len(), message = %resp.message, "pushed quotes to remote");

        Ok(resp)
    }
}
