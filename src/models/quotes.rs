use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// current layout of the stored quotes document.
pub const SCHEMA_VERSION: u32 = 1;

/// category filter value that matches every quote.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub text: String,
    pub category: String,
    /// milliseconds since the unix epoch of the last local write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Quote {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Quote {
            id: None,
            text: text.into(),
            category: category.into(),
            updated_at: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.text.trim().is_empty() && !self.category.trim().is_empty()
    }

    pub fn same_content(&self, other: &Quote) -> bool {
        self.text == other.text && self.category == other.category
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.text, self.category)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QuoteCollection {
    pub version: u32,
    pub quotes: Vec<Quote>,
}

#[derive(Serialize)]
struct QuoteCollectionRef<'a> {
    version: u32,
    quotes: &'a [Quote],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuotesDocument {
    Versioned(QuoteCollection),
    Legacy(Vec<Quote>),
}

/// parses either the versioned document or a bare array of quotes.
pub fn parse_quotes(text: &str) -> Result<Vec<Quote>, serde_json::Error> {
    let document: QuotesDocument = serde_json::from_str(text)?;

    Ok(match document {
        QuotesDocument::Versioned(collection) => collection.quotes,
        QuotesDocument::Legacy(quotes) => quotes,
    })
}

pub fn to_stored_json(quotes: &[Quote]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&QuoteCollectionRef {
        version: SCHEMA_VERSION,
        quotes,
    })
}

/// pretty-printed bare array, the interchange format of `quotes.json`.
pub fn to_export_json(quotes: &[Quote]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(quotes)
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// the next creation-timestamp id that does not collide with `quotes`.
///
/// once `i64::MAX` is taken the smallest unused positive id is handed out instead.
pub fn next_id(quotes: &[Quote]) -> i64 {
    let now = now_millis();

    match quotes.iter().filter_map(|quote| quote.id).max() {
        Some(max) => match max.checked_add(1) {
            Some(next) => now.max(next),
            None => smallest_unused_id(quotes),
        },
        None => now,
    }
}

fn smallest_unused_id(quotes: &[Quote]) -> i64 {
    let taken: BTreeSet<i64> = quotes
        .iter()
        .filter_map(|quote| quote.id)
        .filter(|id| *id > 0)
        .collect();

    let mut candidate = 1;
    for id in taken {
        if id != candidate {
            break;
        }
        candidate = candidate.saturating_add(1);
    }

    candidate
}

/// assigns ids to quotes that lack one, returning how many were filled in.
pub fn backfill_ids(quotes: &mut [Quote]) -> usize {
    let mut next = next_id(quotes);
    // past the largest id, counting up never collides.
    let mut exhausted = quotes.iter().any(|quote| quote.id == Some(i64::MAX));
    let mut filled = 0;

    for idx in 0..quotes.len() {
        if quotes[idx].id.is_some() {
            continue;
        }

        quotes[idx].id = Some(next);
        filled += 1;

        next = match next.checked_add(1) {
            Some(following) if !exhausted => following,
            _ => {
                exhausted = true;
                smallest_unused_id(quotes)
            }
        };
    }

    filled
}

pub fn filter_by_category(quotes: &[Quote], category: &str) -> Vec<Quote> {
    if category == ALL_CATEGORIES {
        return quotes.to_vec();
    }

    quotes
        .iter()
        .filter(|quote| quote.category == category)
        .cloned()
        .collect()
}

/// distinct category names in sorted order.
pub fn categories(quotes: &[Quote]) -> Vec<String> {
    quotes
        .iter()
        .map(|quote| quote.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn seed_quotes() -> Vec<Quote> {
    vec![
        Quote::new(
            "The best way to predict the future is to invent it.",
            "Inspiration",
        ),
        Quote::new(
            "Life is what happens when you're busy making other plans.",
            "Life",
        ),
        Quote::new("Do or do not. There is no try.", "Motivation"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(id: i64, text: &str, category: &str) -> Quote {
        Quote {
            id: Some(id),
            ..Quote::new(text, category)
        }
    }

    #[test]
    fn test_filter_all_returns_everything_in_order() {
        let quotes = vec![quote(1, "a", "X"), quote(2, "b", "Y"), quote(3, "c", "X")];

        assert_eq!(filter_by_category(&quotes, ALL_CATEGORIES), quotes);
    }

    #[test]
    fn test_filter_is_exact_and_case_sensitive() {
        let quotes = vec![
            quote(1, "a", "X"),
            quote(2, "b", "x"),
            quote(3, "c", "X"),
            quote(4, "d", "Xy"),
        ];

        let filtered = filter_by_category(&quotes, "X");

        assert_eq!(filtered, vec![quote(1, "a", "X"), quote(3, "c", "X")]);
    }

    #[test]
    fn test_filter_unknown_category_is_empty() {
        let quotes = vec![quote(1, "a", "X")];

        assert!(filter_by_category(&quotes, "Nope").is_empty());
    }

    #[test]
    fn test_categories_are_deduplicated() {
        let quotes = vec![quote(1, "a", "Life"), quote(2, "b", "Art"), quote(3, "c", "Life")];

        assert_eq!(categories(&quotes), vec!["Art", "Life"]);
    }

    #[test]
    fn test_parse_legacy_array() {
        let quotes = parse_quotes(r#"[{"text":"A","category":"X"}]"#).unwrap();

        assert_eq!(quotes, vec![Quote::new("A", "X")]);
    }

    #[test]
    fn test_parse_versioned_document() {
        let quotes =
            parse_quotes(r#"{"version":1,"quotes":[{"id":7,"text":"A","category":"X"}]}"#)
                .unwrap();

        assert_eq!(quotes, vec![quote(7, "A", "X")]);
    }

    #[test]
    fn test_stored_json_parses_back() {
        let quotes = vec![quote(1, "a", "X")];
        let stored = to_stored_json(&quotes).unwrap();

        assert!(stored.starts_with(r#"{"version":1,"#));
        assert_eq!(parse_quotes(&stored).unwrap(), quotes);
    }

    #[test]
    fn test_export_json_is_indented_array() {
        let exported = to_export_json(&[quote(1, "a", "X")]).unwrap();

        assert!(exported.starts_with("[\n  {\n    \"id\": 1,"));
        assert!(!exported.contains("updatedAt"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_quotes("not json").is_err());
        assert!(parse_quotes(r#"{"text":"A"}"#).is_err());
    }

    #[test]
    fn test_backfill_ids_are_unique_and_keep_existing() {
        let mut quotes = vec![Quote::new("a", "X"), quote(5, "b", "Y"), Quote::new("c", "Z")];

        let filled = backfill_ids(&mut quotes);

        assert_eq!(filled, 2);
        assert_eq!(quotes[1].id, Some(5));
        let first = quotes[0].id.unwrap();
        let third = quotes[2].id.unwrap();
        assert_ne!(first, third);
        assert!(first > 5);
    }

    #[test]
    fn test_next_id_skips_past_future_ids() {
        let far_future = now_millis() + 1_000_000;
        let quotes = vec![quote(far_future, "a", "X")];

        assert_eq!(next_id(&quotes), far_future + 1);
    }

    #[test]
    fn test_is_valid_trims_whitespace() {
        assert!(Quote::new("a", "b").is_valid());
        assert!(!Quote::new("   ", "b").is_valid());
        assert!(!Quote::new("a", "").is_valid());
    }

    #[test]
    fn test_display() {
        assert_eq!(Quote::new("Do.", "Motivation").to_string(), "Do. - Motivation");
    }

    #[test]
    fn test_ids_after_max_id_do_not_overflow() {
        let mut quotes = vec![
            quote(i64::MAX, "a", "X"),
            quote(1, "b", "Y"),
            quote(3, "c", "Y"),
        ];

        assert_eq!(next_id(&quotes), 2);

        quotes.extend([Quote::new("d", "Z"), Quote::new("e", "Z")]);
        assert_eq!(backfill_ids(&mut quotes), 2);
        assert_eq!(quotes[3].id, Some(2));
        assert_eq!(quotes[4].id, Some(4));
    }

    #[test]
    fn test_backfill_reaching_max_id_switches_to_unused_ids() {
        let mut quotes = vec![
            quote(i64::MAX - 1, "a", "X"),
            Quote::new("b", "Y"),
            Quote::new("c", "Z"),
        ];

        backfill_ids(&mut quotes);

        assert_eq!(quotes[1].id, Some(i64::MAX));
        assert_eq!(quotes[2].id, Some(1));
    }
}
