use quotebox::{constants::NO_QUOTES_MESSAGE, models::quotes::ALL_CATEGORIES, QuoteStore};

/// shows a random quote, from `category` if given or else from the last selected one.
#[tracing::instrument(skip(store))]
pub async fn show(store: &QuoteStore, category: Option<String>) -> anyhow::Result<()> {
    let category = match category {
        Some(category) => {
            store.select_category(&category).await?;
            category
        }
        None => store.selected_category().await?,
    };

    match store.random_quote(&category).await? {
        Some(quote) => println!("{}", quote),
        None => println!("{}", NO_QUOTES_MESSAGE),
    }

    Ok(())
}

#[tracing::instrument(skip(store))]
pub async fn add(store: &QuoteStore, text: &str, category: &str) -> anyhow::Result<()> {
    let quote = store.add(text, category).await?;

    println!("Quote added successfully!");
    println!("  {}", quote);

    Ok(())
}

#[tracing::instrument(skip(store))]
pub async fn list(store: &QuoteStore, category: &str) -> anyhow::Result<()> {
    let quotes = store.filter_by_category(category).await;

    if quotes.is_empty() {
        println!("{}", NO_QUOTES_MESSAGE);
        return Ok(());
    }

    for (idx, quote) in quotes.iter().enumerate() {
        match quote.id {
            Some(id) => println!("{}. {} [#{}]", idx + 1, quote, id),
            None => println!("{}. {}", idx + 1, quote),
        }
    }

    Ok(())
}

#[tracing::instrument(skip_all)]
pub async fn categories(store: &QuoteStore) -> anyhow::Result<()> {
    let selected = store.selected_category().await?;

    let categories = store.categories().await;
    for category in std::iter::once(ALL_CATEGORIES.to_string()).chain(categories) {
        if category == selected {
            println!("* {}", category);
        } else {
            println!("  {}", category);
        }
    }

    Ok(())
}
