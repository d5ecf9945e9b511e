pub mod version;

pub const QUOTES_KEY: &str = "quotes";
pub const LAST_CATEGORY_KEY: &str = "lastCategory";
pub const LAST_VIEWED_QUOTE_KEY: &str = "lastViewedQuote";

pub const EXPORT_FILE_NAME: &str = "quotes.json";
pub const NO_QUOTES_MESSAGE: &str = "No quotes available.";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://quotes.db";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_REMOTE_CATEGORY: &str = "Remote";
pub const PLACEHOLDER_POSTS_URL: &str = "https://jsonplaceholder.typicode.com/posts";
