mod migration;

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;

use async_trait::async_trait;
use eyre::{Context, Result};
use tokio_rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use super::KeyValueStore;
use migration::MIGRATION;

pub struct Sqlite {
    conn: Connection,
}

impl Sqlite {
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(path) => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
            )
            .await
            .wrap_err(format!("opening database path: {}", path))?,
            None => Connection::open_in_memory()
                .await
                .wrap_err("opening in-memory database")?,
        };

        let ret = Self { conn };
        ret.run_migration().await.wrap_err("running migration")?;
        Ok(ret)
    }

    async fn run_migration(&self) -> Result<()> {
        self.conn
            .call(|conn| conn.execute_batch(MIGRATION))
            .await
            .wrap_err("executing migration")?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for Sqlite {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        let value = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT value FROM kv_store WHERE key = ?",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()
            })
            .await
            .wrap_err("reading item")?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        let now = chrono::Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![key, value, now],
                )
            })
            .await
            .wrap_err("writing item")?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM kv_store WHERE key = ?", params![key])
            })
            .await
            .wrap_err("removing item")?;
        Ok(())
    }
}
