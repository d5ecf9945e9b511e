use std::path::Path;

use quotebox::{ImportMode, QuoteStore};

#[tracing::instrument(skip(store))]
pub async fn export(store: &QuoteStore, output: &Path) -> anyhow::Result<()> {
    let count = store.export_to_file(output).await?;

    println!("Exported {} quotes to {}", count, output.display());

    Ok(())
}

#[tracing::instrument(skip(store))]
pub async fn import(store: &QuoteStore, file: &Path, mode: ImportMode) -> anyhow::Result<()> {
    let count = store.import_file(file, mode).await?;

    match mode {
        ImportMode::Replace => println!("Quotes imported successfully! ({} quotes)", count),
        ImportMode::Append => println!("Quotes imported successfully! ({} quotes added)", count),
    }

    Ok(())
}
