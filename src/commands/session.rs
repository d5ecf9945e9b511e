use std::{path::Path, sync::Arc};

use quotebox::{
    config::Config,
    constants::{EXPORT_FILE_NAME, NO_QUOTES_MESSAGE},
    ImportMode, QuoteStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::init::spawn_background_tasks;

const HELP: &str = "\
commands:
  new                       show a random quote from the current category
  add <text> | <category>   add a quote
  filter <category>         change the category filter (\"all\" for every quote)
  categories                list categories
  last                      show the last quote shown in this session
  export [path]             write quotes to a file (default quotes.json)
  import <path>             replace quotes with the ones in a file
  append <path>             add the quotes in a file
  sync                      sync with the remote now
  help                      show this message
  quit                      leave the session";

async fn show_random(store: &QuoteStore, category: &str) -> anyhow::Result<()> {
    match store.random_quote(category).await? {
        Some(quote) => println!("{}", quote),
        None => println!("{}", NO_QUOTES_MESSAGE),
    }

    Ok(())
}

/// runs one session command, returning `false` when the session should end.
async fn handle_line(store: &QuoteStore, category: &mut String, line: &str) -> anyhow::Result<bool> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "new" => show_random(store, category).await?,
        "add" => {
            let (text, quote_category) = rest.split_once('|').unwrap_or((rest, ""));
            let quote = store.add(text, quote_category).await?;
            println!("Quote added successfully! {}", quote);
        }
        "filter" => {
            let selected = if rest.is_empty() { "all" } else { rest };
            store.select_category(selected).await?;
            *category = selected.to_string();
            show_random(store, category).await?;
        }
        "categories" => {
            for name in store.categories().await {
                println!("  {}", name);
            }
        }
        "last" => match store.last_viewed().await? {
            Some(quote) => println!("{}", quote),
            None => println!("Nothing shown yet."),
        },
        "export" => {
            let path = if rest.is_empty() { EXPORT_FILE_NAME } else { rest };
            let count = store.export_to_file(Path::new(path)).await?;
            println!("Exported {} quotes to {}", count, path);
        }
        "import" | "append" => {
            let mode = if command == "import" {
                ImportMode::Replace
            } else {
                ImportMode::Append
            };
            let count = store.import_file(Path::new(rest), mode).await?;
            println!("Quotes imported successfully! ({} quotes)", count);
            show_random(store, category).await?;
        }
        "sync" => {
            let report = store.sync_with_remote().await?;
            println!(
                "Quotes synced with server! ({} fetched, {} new)",
                report.fetched, report.added
            );
        }
        "help" => println!("{}", HELP),
        "quit" | "exit" => return Ok(false),
        other => println!("unknown command \"{}\", try \"help\".", other),
    }

    Ok(true)
}

/// an interactive session on stdin, syncing in the background while it lasts.
#[tracing::instrument(skip_all)]
pub async fn run(store: &Arc<QuoteStore>, config: &Config) -> anyhow::Result<()> {
    let sync_handle = spawn_background_tasks(store, config);

    let mut category = store.selected_category().await?;

    match store.last_viewed().await? {
        Some(quote) => println!("{}", quote),
        None => show_random(store, &category).await?,
    }
    println!("type \"help\" for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match handle_line(store, &mut category, line.trim()).await {
            Ok(true) => {}
            Ok(false) => break,
            // a failed command does not end the session.
            Err(e) => println!("{}", e),
        }
    }

    if let Some(handle) = sync_handle {
        handle.stop().await;
    }

    Ok(())
}
