//! reconciliation between the local collection and a remote source.

use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use futures::StreamExt;
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::Instrument;

use crate::{
    error::{Error, Result},
    models::quotes::{backfill_ids, Quote},
    store::QuoteStore,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncStrategy {
    /// the local collection is replaced with whatever the remote returned.
    RemoteWins,
    /// matching quotes keep the most recently written side, nothing local is dropped.
    #[default]
    LastWriteWins,
}

impl FromStr for SyncStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote-wins" | "remote_wins" => Ok(SyncStrategy::RemoteWins),
            "last-write-wins" | "last_write_wins" | "lww" => Ok(SyncStrategy::LastWriteWins),
            other => Err(Error::Config(format!("unknown sync strategy \"{other}\""))),
        }
    }
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStrategy::RemoteWins => f.write_str("remote-wins"),
            SyncStrategy::LastWriteWins => f.write_str("last-write-wins"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub quotes: Vec<Quote>,
    /// remote quotes that had no local counterpart.
    pub added: usize,
    /// local quotes replaced by a different remote version.
    pub updated: usize,
    /// local quotes the remote does not have yet, or has an older version of.
    pub local_ahead: usize,
    /// remote entries dropped for missing text or category.
    pub rejected: usize,
}

impl MergeOutcome {
    pub fn needs_push(&self) -> bool {
        self.local_ahead > 0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub added: usize,
    pub updated: usize,
    pub local_ahead: usize,
    pub rejected: usize,
    pub pushed: bool,
}

fn same_quote(local: &Quote, remote: &Quote) -> bool {
    match (local.id, remote.id) {
        (Some(local_id), Some(remote_id)) => local_id == remote_id,
        _ => local.same_content(remote),
    }
}

/// merges `remote` into `local` according to `strategy`.
pub fn merge(local: &[Quote], remote: Vec<Quote>, strategy: SyncStrategy) -> MergeOutcome {
    let total = remote.len();
    let mut remote: Vec<Quote> = remote.into_iter().filter(Quote::is_valid).collect();
    let rejected = total - remote.len();

    if strategy == SyncStrategy::RemoteWins {
        backfill_ids(&mut remote);
        let added = remote
            .iter()
            .filter(|quote| !local.iter().any(|existing| same_quote(existing, quote)))
            .count();

        return MergeOutcome {
            updated: remote.len() - added,
            added,
            quotes: remote,
            local_ahead: 0,
            rejected,
        };
    }

    let mut remaining: Vec<Option<Quote>> = remote.into_iter().map(Some).collect();
    let mut outcome = MergeOutcome {
        rejected,
        ..Default::default()
    };

    for quote in local {
        let counterpart = remaining
            .iter_mut()
            .find(|slot| matches!(slot, Some(remote) if same_quote(quote, remote)))
            .and_then(Option::take);

        match counterpart {
            Some(remote) => {
                let local_stamp = quote.updated_at.unwrap_or(0);
                let remote_stamp = remote.updated_at.unwrap_or(0);

                if local_stamp > remote_stamp {
                    outcome.local_ahead += 1;
                    outcome.quotes.push(quote.clone());
                } else {
                    if !remote.same_content(quote) {
                        outcome.updated += 1;
                    }
                    outcome.quotes.push(Quote {
                        id: remote.id.or(quote.id),
                        ..remote
                    });
                }
            }
            None => {
                outcome.local_ahead += 1;
                outcome.quotes.push(quote.clone());
            }
        }
    }

    let start = outcome.quotes.len();
    outcome.quotes.extend(remaining.into_iter().flatten());
    outcome.added = outcome.quotes.len() - start;
    backfill_ids(&mut outcome.quotes);

    outcome
}

/// controls a running periodic sync task.
///
/// dropping the handle signals the task to stop after its current tick.
pub struct SyncHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// stops the task and waits for an in-flight sync to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(err = ?e, "sync task ended abnormally");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// runs [`QuoteStore::sync_with_remote`] every `period`, starting immediately.
pub fn spawn_sync_task(store: Arc<QuoteStore>, period: Duration) -> SyncHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(
        async move {
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let ticks = futures::stream::unfold(interval, |mut interval| async move {
                interval.tick().await;

                Some(((), interval))
            });

            ticks
                .take_until(shutdown_rx)
                .for_each(|_| {
                    let store = Arc::clone(&store);

                    async move {
                        // failures are logged inside, the next tick retries.
                        let _ = store.sync_with_remote().await;
                    }
                })
                .await;

            tracing::info!("sync task stopped");
        }
        .in_current_span(),
    );

    tracing::info!(period_secs = period.as_secs(), "initialized sync task!");

    SyncHandle {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(id: i64, text: &str, category: &str, updated_at: Option<i64>) -> Quote {
        Quote {
            id: Some(id),
            text: text.to_string(),
            category: category.to_string(),
            updated_at,
        }
    }

    #[test]
    fn test_strategy_parse_and_display() {
        assert_eq!(
            "remote-wins".parse::<SyncStrategy>().unwrap(),
            SyncStrategy::RemoteWins
        );
        assert_eq!(
            "LWW".parse::<SyncStrategy>().unwrap(),
            SyncStrategy::LastWriteWins
        );
        assert!("merge-everything".parse::<SyncStrategy>().is_err());
        assert_eq!(SyncStrategy::LastWriteWins.to_string(), "last-write-wins");
    }

    #[test]
    fn test_remote_wins_replaces_everything() {
        let local = vec![quote(1, "A", "X", Some(50)), quote(9, "Z", "Z", None)];
        let remote = vec![quote(1, "A2", "X", None), quote(2, "B", "Y", None)];

        let outcome = merge(&local, remote.clone(), SyncStrategy::RemoteWins);

        assert_eq!(outcome.quotes, remote);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.updated, 1);
        assert!(!outcome.needs_push());
    }

    #[test]
    fn test_last_write_wins_prefers_newer_side() {
        let local = vec![
            quote(1, "local newer", "X", Some(200)),
            quote(2, "local older", "Y", Some(100)),
        ];
        let remote = vec![
            quote(1, "remote older", "X", Some(150)),
            quote(2, "remote newer", "Y", Some(300)),
        ];

        let outcome = merge(&local, remote, SyncStrategy::LastWriteWins);

        assert_eq!(
            outcome.quotes,
            vec![
                quote(1, "local newer", "X", Some(200)),
                quote(2, "remote newer", "Y", Some(300)),
            ]
        );
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.local_ahead, 1);
        assert!(outcome.needs_push());
    }

    #[test]
    fn test_last_write_wins_ties_go_to_remote() {
        let local = vec![quote(1, "local", "X", None)];
        let remote = vec![quote(1, "remote", "X", None)];

        let outcome = merge(&local, remote, SyncStrategy::LastWriteWins);

        assert_eq!(outcome.quotes, vec![quote(1, "remote", "X", None)]);
        assert!(!outcome.needs_push());
    }

    #[test]
    fn test_last_write_wins_keeps_local_only_and_appends_remote_only() {
        let local = vec![quote(10, "mine", "X", Some(5))];
        let remote = vec![quote(1, "theirs", "Y", None)];

        let outcome = merge(&local, remote, SyncStrategy::LastWriteWins);

        assert_eq!(
            outcome.quotes,
            vec![quote(10, "mine", "X", Some(5)), quote(1, "theirs", "Y", None)]
        );
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.local_ahead, 1);
    }

    #[test]
    fn test_quotes_without_ids_match_on_content() {
        let local = vec![quote(4, "same", "X", None)];
        let remote = vec![Quote::new("same", "X")];

        let outcome = merge(&local, remote, SyncStrategy::LastWriteWins);

        assert_eq!(outcome.quotes, vec![quote(4, "same", "X", None)]);
        assert_eq!(outcome.added, 0);
        assert_eq!(outcome.updated, 0);
    }

    #[test]
    fn test_invalid_remote_entries_are_rejected() {
        let remote = vec![Quote::new("", "X"), Quote::new("ok", "Y")];

        let outcome = merge(&[], remote, SyncStrategy::RemoteWins);

        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.quotes.len(), 1);
        assert!(outcome.quotes[0].id.is_some());
    }
}
