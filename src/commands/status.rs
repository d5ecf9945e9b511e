use quotebox::{config::Config, constants::version::get_version, QuoteStore};

#[tracing::instrument(skip_all)]
pub async fn run(store: &QuoteStore, config: &Config) -> anyhow::Result<()> {
    let quotes = store.len().await;
    let categories = store.categories().await;
    let selected = store.selected_category().await?;

    println!("quotebox {}", get_version());
    println!("rust:       {}", rustc_version_runtime::version());
    println!("database:   {}", config.database_url);
    println!("quotes:     {} in {} categories", quotes, categories.len());
    println!("filter:     {}", selected);

    match &config.remote {
        Some(remote) => {
            println!("remote:     {} ({:?})", remote.url, remote.kind);
            println!(
                "sync:       every {}s, {}",
                config.sync_interval.as_secs(),
                config.sync_strategy
            );
        }
        None => println!("remote:     not configured"),
    }

    Ok(())
}
