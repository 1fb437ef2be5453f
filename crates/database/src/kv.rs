//! Key/value blob storage.

use sqlx::SqlitePool;

use crate::error::DatabaseError;
use crate::models::KvEntry;
use crate::Result;

/// Create or replace the value stored under a key.
pub async fn upsert_value(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = datetime('now')
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the entry stored under a key, if any.
pub async fn get_entry(pool: &SqlitePool, key: &str) -> Result<Option<KvEntry>> {
    let record = sqlx::query_as::<_, KvEntry>(
        r#"
        SELECT key, value, updated_at
        FROM kv_store
        WHERE key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Get the value stored under a key, failing if it does not exist.
pub async fn require_value(pool: &SqlitePool, key: &str) -> Result<String> {
    get_entry(pool, key)
        .await?
        .map(|entry| entry.value)
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "kv entry",
            id: key.to_string(),
        })
}

/// Delete the value stored under a key.
pub async fn delete_value(pool: &SqlitePool, key: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM kv_store
        WHERE key = ?
        "#,
    )
    .bind(key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List all stored keys.
pub async fn list_keys(pool: &SqlitePool) -> Result<Vec<String>> {
    let keys = sqlx::query_scalar::<_, String>(
        r#"
        SELECT key
        FROM kv_store
        ORDER BY key
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(keys)
}
