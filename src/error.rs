use thiserror::Error;

/// Errors surfaced by the quote store and its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    #[error("please enter both quote text and category.")]
    Validation,

    #[error("quote #{index} is missing its text or category")]
    InvalidQuote { index: usize },

    #[error("could not read quotes file: {0}")]
    Import(#[source] serde_json::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("remote request failed: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("remote answered with status {status}")]
    RemoteStatus { status: reqwest::StatusCode },

    #[error("no remote source is configured")]
    NoRemote,

    #[error("file operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
