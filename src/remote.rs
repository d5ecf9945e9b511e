use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;

use crate::{
    config::{RemoteConfig, RemoteKind},
    error::{Error, Result},
    models::{
        quotes::Quote,
        remote::{PlaceholderCreated, PlaceholderPost, PushResponse},
    },
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// a remote collection of quotes the store reconciles with.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>>;

    /// sends the full local collection.
    async fn push_quotes(&self, quotes: &[Quote]) -> Result<PushResponse>;
}

pub fn from_config(config: &RemoteConfig) -> Result<Arc<dyn RemoteSource>> {
    let client = build_http_client()?;

    Ok(match config.kind {
        RemoteKind::Server => Arc::new(QuoteServerClient::with_client(client, &config.url)),
        RemoteKind::Placeholder => Arc::new(PlaceholderClient::with_client(
            client,
            &config.url,
            &config.category,
        )),
    })
}

fn build_http_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("quotebox/", env!("CARGO_PKG_VERSION"))),
    );

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    Ok(client)
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        tracing::error!(status = %status, "remote answered with an error status");
        return Err(Error::RemoteStatus { status });
    }

    let text = resp.text().await.inspect_err(
        |e| tracing::error!(err = ?e, "an error occurred when receiving response text"),
    )?;

    let body = serde_json::from_str(&text).inspect_err(
        |e| tracing::error!(err = ?e, text = %text, "an error occurred when parsing response body"),
    )?;

    Ok(body)
}

#[derive(Clone)]
pub struct QuoteServerClient {
    client: reqwest::Client,
    base_url: String,
}

impl QuoteServerClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self::with_client(build_http_client()?, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        QuoteServerClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn quotes_url(&self) -> String {
        format!("{}/quotes", self.base_url)
    }
}

#[async_trait]
impl RemoteSource for QuoteServerClient {
    #[tracing::instrument(skip_all, fields(url = %self.base_url))]
    async fn fetch_quotes(&self) -> Result<Vec<Quote>> {
        let resp = self
            .client
            .get(self.quotes_url())
            .send()
            .await
            .inspect_err(
                |e| tracing::error!(err = ?e, "an error occurred when fetching quotes from server"),
            )?;

        read_json(resp).await
    }

    #[tracing::instrument(skip_all, fields(url = %self.base_url, count = quotes.len()))]
    async fn push_quotes(&self, quotes: &[Quote]) -> Result<PushResponse> {
        let resp = self
            .client
            .post(self.quotes_url())
            .json(quotes)
            .send()
            .await
            .inspect_err(
                |e| tracing::error!(err = ?e, "an error occurred when pushing quotes to server"),
            )?;

        read_json(resp).await
    }
}

/// reads posts from the placeholder api, treating each title as a quote.
#[derive(Clone)]
pub struct PlaceholderClient {
    client: reqwest::Client,
    url: String,
    category: String,
}

impl PlaceholderClient {
    pub fn new(url: &str, category: &str) -> Result<Self> {
        Ok(Self::with_client(build_http_client()?, url, category))
    }

    pub fn with_client(client: reqwest::Client, url: &str, category: &str) -> Self {
        PlaceholderClient {
            client,
            url: url.to_string(),
            category: category.to_string(),
        }
    }
}

#[async_trait]
impl RemoteSource for PlaceholderClient {
    #[tracing::instrument(skip_all, fields(url = %self.url))]
    async fn fetch_quotes(&self) -> Result<Vec<Quote>> {
        let resp = self.client.get(&self.url).send().await.inspect_err(
            |e| tracing::error!(err = ?e, "an error occurred when fetching posts"),
        )?;

        let posts: Vec<PlaceholderPost> = read_json(resp).await?;

        Ok(posts
            .into_iter()
            .map(|post| post.into_quote(&self.category))
            .collect())
    }

    #[tracing::instrument(skip_all, fields(url = %self.url, count = quotes.len()))]
    async fn push_quotes(&self, quotes: &[Quote]) -> Result<PushResponse> {
        let resp = self
            .client
            .post(&self.url)
            .json(quotes)
            .send()
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when posting quotes"))?;

        let created: PlaceholderCreated = read_json(resp).await?;

        Ok(PushResponse {
            message: format!("created {}", created.id),
        })
    }
}
