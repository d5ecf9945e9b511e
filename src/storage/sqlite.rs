use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};

use super::KeyValueStore;
use crate::error::Result;

#[derive(Clone)]
pub struct SqliteStore {
    db: Pool<Sqlite>,
}

impl SqliteStore {
    /// opens (creating if needed) the database at `db_url` and runs migrations.
    #[tracing::instrument]
    pub async fn connect(db_url: &str) -> Result<Self> {
        tracing::info!("initializing database connection...");
        let opts = SqliteConnectOptions::from_str(db_url)
            .inspect_err(|e| tracing::error!(err = ?e, "invalid database url"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        tracing::info!("running migrations...");
        sqlx::migrate!("./migrations").run(&db).await?;
        tracing::info!("finished running migrations!");

        Ok(SqliteStore { db })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.db
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            r#"
                SELECT value
                FROM kv_store
                WHERE key = $1;
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .inspect_err(
            |e| tracing::error!(err = ?e, key = %key, "an error occurred when reading from storage"),
        )?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
                INSERT INTO
                    kv_store (key, value)
                VALUES
                    ($1, $2)
                ON CONFLICT (key)
                DO UPDATE SET
                    value = excluded.value,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now');
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await
        .inspect_err(
            |e| tracing::error!(err = ?e, key = %key, "an error occurred when writing to storage"),
        )?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query(
            r#"
                DELETE FROM kv_store
                WHERE key = $1;
            "#,
        )
        .bind(key)
        .execute(&self.db)
        .await
        .inspect_err(
            |e| tracing::error!(err = ?e, key = %key, "an error occurred when deleting from storage"),
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store(dir: &tempfile::TempDir) -> SqliteStore {
        let url = format!("sqlite://{}", dir.path().join("quotes.db").display());
        SqliteStore::connect(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_get_overwrite_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;

        assert_eq!(store.get("quotes").await.unwrap(), None);

        store.set("quotes", "[]").await.unwrap();
        store.set("quotes", "[1]").await.unwrap();
        assert_eq!(store.get("quotes").await.unwrap().as_deref(), Some("[1]"));

        store.remove("quotes").await.unwrap();
        assert_eq!(store.get("quotes").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_reconnect() {
        let dir = tempfile::tempdir().unwrap();

        temp_store(&dir)
            .await
            .set("lastCategory", "Life")
            .await
            .unwrap();

        let reopened = temp_store(&dir).await;
        assert_eq!(
            reopened.get("lastCategory").await.unwrap().as_deref(),
            Some("Life")
        );
    }
}
