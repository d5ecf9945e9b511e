//! a random quote generator: a persisted collection of quotes with category
//! filtering, json import/export and periodic sync against a remote source.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod remote;
pub mod server;
pub mod storage;
pub mod store;
pub mod sync;
pub mod telemetry;

pub use error::{Error, Result};
pub use models::quotes::Quote;
pub use store::{ImportMode, QuoteStore, StoreOptions};
