use std::sync::Arc;

use quotebox::{config::Config, sync::SyncReport, Error, QuoteStore};

use crate::init::spawn_background_tasks;

fn print_report(report: &SyncReport) {
    println!(
        "Synced with server: {} fetched, {} new, {} updated, {} kept locally.",
        report.fetched, report.added, report.updated, report.local_ahead
    );

    if report.rejected > 0 {
        println!("Skipped {} remote quotes without text or category.", report.rejected);
    }

    if report.pushed {
        println!("Local changes were sent back to the server.");
    }
}

pub async fn sync(store: &QuoteStore) -> anyhow::Result<()> {
    let report = store.sync_with_remote().await?;
    print_report(&report);

    Ok(())
}

pub async fn push(store: &QuoteStore) -> anyhow::Result<()> {
    let resp = store.push_to_remote().await?;
    println!("Server: {}", resp.message);

    Ok(())
}

/// syncs on the configured interval until ctrl-c.
pub async fn watch(store: &Arc<QuoteStore>, config: &Config) -> anyhow::Result<()> {
    let Some(handle) = spawn_background_tasks(store, config) else {
        return Err(Error::NoRemote.into());
    };

    println!(
        "Syncing every {} seconds, press ctrl-c to stop.",
        config.sync_interval.as_secs()
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!("stopping sync...");
    handle.stop().await;

    Ok(())
}
