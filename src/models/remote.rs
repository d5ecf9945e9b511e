use serde::{Deserialize, Serialize};

use super::quotes::Quote;

/// acknowledgement returned by the quote server after a push.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PushResponse {
    pub message: String,
}

/// a post from the public placeholder api, its `title` is reused as quote text.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderPost {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub user_id: i64,
}

impl PlaceholderPost {
    pub fn into_quote(self, category: &str) -> Quote {
        Quote {
            id: Some(self.id),
            text: self.title,
            category: category.to_string(),
            updated_at: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlaceholderCreated {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_becomes_quote_with_fixed_category() {
        let post: PlaceholderPost = serde_json::from_str(
            r#"{"userId":1,"id":3,"title":"ea molestias quasi","body":"et iusto sed"}"#,
        )
        .unwrap();

        let quote = post.into_quote("Remote");

        assert_eq!(quote.id, Some(3));
        assert_eq!(quote.text, "ea molestias quasi");
        assert_eq!(quote.category, "Remote");
    }
}
