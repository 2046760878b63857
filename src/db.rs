use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::storage::KvStore;

/// Postgres-backed key-value store over the `kv_entries` table.
#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;

        // Run migrations if present
        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        Ok(Self { db })
    }
}

/// Escapes LIKE wildcards so a prefix matches literally.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl KvStore for PgStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value
              FROM kv_entries
             WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("get kv entry {key}"))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE
               SET value = EXCLUDED.value,
                   updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await
        .with_context(|| format!("set kv entry {key}"))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM kv_entries WHERE key = $1"#)
            .bind(key)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete kv entry {key}"))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT key
              FROM kv_entries
             WHERE key LIKE $1 ESCAPE '\'
             ORDER BY key ASC
            "#,
        )
        .bind(like_prefix(prefix))
        .fetch_all(&self.db)
        .await
        .with_context(|| format!("list kv entries under {prefix}"))?;
        Ok(keys)
    }
}

#[cfg(test)]
mod db_tests {
    use super::like_prefix;

    #[test]
    fn like_prefix_escapes_wildcards() {
        assert_eq!(like_prefix("template:"), "template:%");
        assert_eq!(like_prefix("a_b%c"), "a\\_b\\%c%");
        assert_eq!(like_prefix(r"x\y"), r"x\\y%");
    }
}
