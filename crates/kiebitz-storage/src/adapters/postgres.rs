//! PostgreSQL adapter: `Database`, `LockManager` and `BookingGateway` over
//! `sqlx`, following the service's relational schema.
//!
//! The booking recipe runs as one transaction: insert into `used_token`
//! (unique key, duplicate signals `TokenUsed`),
//! select one open slot `FOR UPDATE`, update it, commit. Locks use Postgres
//! session-level advisory locks, keyed by the `i64` hash of the lock name,
//! so `Lock::Appointment::<id>` acquisition composes with the same
//! transaction that performs the booking write when callers choose to.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::domain::DbError;
use crate::ports::{BookedSlot, BookingGateway, Database, LockGuard, LockManager};

/// A pool-backed adapter implementing every storage port over one
/// PostgreSQL database.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect using the given connection string; the pool is built once
    /// and shared rather than opened per request.
    pub async fn connect(connection_string: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect(connection_string)
            .await
            .map_err(|e| DbError::Internal(format!("connect: {e}")))?;
        Ok(Self { pool })
    }

    /// Wrap an already-constructed pool (tests, or a pool shared with other
    /// subsystems).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded schema migrations. Idempotent.
    pub async fn migrate(&self) -> Result<(), DbError> {
        sqlx::query(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::Internal(format!("migrate: {e}")))?;
        Ok(())
    }
}

/// The service's relational tables. `kv_entry` and `counter` are a thin
/// generic substrate the repository layer addresses by collection name;
/// `slot` is the one table the booking recipe needs direct SQL control
/// over (it can't go through the generic KV surface and still support
/// `SELECT ... FOR UPDATE`).
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS kv_entry (
    collection TEXT NOT NULL,
    key TEXT NOT NULL,
    value BYTEA NOT NULL,
    PRIMARY KEY (collection, key)
);

CREATE TABLE IF NOT EXISTS counter (
    name TEXT PRIMARY KEY,
    value BIGINT NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS used_token (
    token BYTEA PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS slot (
    id BYTEA PRIMARY KEY,
    appointment_id BYTEA NOT NULL,
    token BYTEA,
    public_key BYTEA,
    encrypted_data BYTEA
);

CREATE INDEX IF NOT EXISTS slot_appointment_idx ON slot (appointment_id);
"#;

/// Maps a lock name to the `bigint` key `pg_advisory_lock` takes.
fn advisory_key(name: &str) -> i64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish() as i64
}

#[async_trait]
impl Database for PostgresStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>, DbError> {
        let row = sqlx::query("SELECT value FROM kv_entry WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;
        Ok(row.map(|r| r.get::<Vec<u8>, _>("value")))
    }

    async fn put(&self, collection: &str, key: &str, value: Vec<u8>) -> Result<(), DbError> {
        sqlx::query(
            r#"INSERT INTO kv_entry (collection, key, value) VALUES ($1, $2, $3)
               ON CONFLICT (collection, key) DO UPDATE SET value = EXCLUDED.value"#,
        )
        .bind(collection)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM kv_entry WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn scan_prefix(
        &self,
        collection: &str,
        prefix: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, DbError> {
        let like_pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
        let rows = sqlx::query(
            "SELECT key, value FROM kv_entry WHERE collection = $1 AND key LIKE $2",
        )
        .bind(collection)
        .bind(like_pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|r| (r.get::<String, _>("key"), r.get::<Vec<u8>, _>("value")))
            .collect())
    }

    async fn increment_counter(&self, counter: &str) -> Result<i64, DbError> {
        let row = sqlx::query(
            r#"INSERT INTO counter (name, value) VALUES ($1, 1)
               ON CONFLICT (name) DO UPDATE SET value = counter.value + 1
               RETURNING value"#,
        )
        .bind(counter)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;
        Ok(row.get::<i64, _>("value"))
    }

    async fn decrement_counter(&self, counter: &str) -> Result<i64, DbError> {
        let row = sqlx::query(
            r#"INSERT INTO counter (name, value) VALUES ($1, -1)
               ON CONFLICT (name) DO UPDATE SET value = counter.value - 1
               RETURNING value"#,
        )
        .bind(counter)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;
        Ok(row.get::<i64, _>("value"))
    }

    async fn insert_used_token(&self, token: &[u8]) -> Result<(), DbError> {
        let result = sqlx::query("INSERT INTO used_token (token) VALUES ($1)")
            .bind(token)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(DbError::TokenUsed)
            }
            Err(e) => Err(DbError::Internal(e.to_string())),
        }
    }

    async fn remove_used_token(&self, token: &[u8]) -> Result<(), DbError> {
        sqlx::query("DELETE FROM used_token WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn is_token_used(&self, token: &[u8]) -> Result<bool, DbError> {
        let row = sqlx::query("SELECT 1 FROM used_token WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl LockManager for PostgresStore {
    async fn acquire(
        &self,
        name: &str,
        _ttl: Duration,
        timeout: Duration,
    ) -> Result<LockGuard, DbError> {
        let key = advisory_key(name);
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let acquired = tokio::time::timeout(timeout, async {
            loop {
                let row = sqlx::query("SELECT pg_try_advisory_lock($1) AS locked")
                    .bind(key)
                    .fetch_one(&mut *conn)
                    .await?;
                if row.get::<bool, _>("locked") {
                    return Ok::<(), sqlx::Error>(());
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;

        match acquired {
            Ok(Ok(())) => {
                let pool = self.pool.clone();
                Ok(LockGuard::new(move || {
                    tokio::spawn(async move {
                        let _ = sqlx::query("SELECT pg_advisory_unlock($1)")
                            .bind(key)
                            .execute(&pool)
                            .await;
                    });
                }))
            }
            Ok(Err(e)) => Err(DbError::Internal(e.to_string())),
            Err(_) => Err(DbError::LockTimeout(name.to_string())),
        }
    }
}

#[async_trait]
impl BookingGateway for PostgresStore {
    async fn book_slot(
        &self,
        appointment_id: kiebitz_types::Id,
        token: &[u8],
        public_key: &[u8],
        encrypted_data: &[u8],
    ) -> Result<BookedSlot, DbError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let insert = sqlx::query("INSERT INTO used_token (token) VALUES ($1)")
            .bind(token)
            .execute(&mut *tx)
            .await;
        match insert {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tx.rollback().await.ok();
                return Err(DbError::TokenUsed);
            }
            Err(e) => {
                tx.rollback().await.ok();
                return Err(DbError::Internal(e.to_string()));
            }
        }

        let open_slot = sqlx::query(
            r#"SELECT id FROM slot
               WHERE appointment_id = $1 AND token IS NULL
               ORDER BY id LIMIT 1 FOR UPDATE"#,
        )
        .bind(appointment_id.as_slice())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

        let Some(row) = open_slot else {
            tx.rollback().await.ok();
            return Err(DbError::NotFound);
        };
        let slot_id: Vec<u8> = row.get("id");

        sqlx::query(
            "UPDATE slot SET token = $1, public_key = $2, encrypted_data = $3 WHERE id = $4",
        )
        .bind(token)
        .bind(public_key)
        .bind(encrypted_data)
        .bind(&slot_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

        tx.commit().await.map_err(|e| DbError::Internal(e.to_string()))?;

        let mut id = [0u8; 32];
        let len = slot_id.len().min(32);
        id[..len].copy_from_slice(&slot_id[..len]);
        Ok(BookedSlot { slot_id: id })
    }

    async fn cancel_booking(&self, token: &[u8]) -> Result<(), DbError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE slot SET token = NULL, public_key = NULL, encrypted_data = NULL WHERE token = $1",
        )
        .bind(token)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

        if result.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Err(DbError::NotFound);
        }

        sqlx::query("DELETE FROM used_token WHERE token = $1")
            .bind(token)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;

        tx.commit().await.map_err(|e| DbError::Internal(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::advisory_key;

    #[test]
    fn advisory_key_is_stable_for_same_name() {
        assert_eq!(advisory_key("appointment:abc"), advisory_key("appointment:abc"));
    }

    #[test]
    fn advisory_key_differs_across_lock_classes() {
        assert_ne!(advisory_key("appointment:abc"), advisory_key("provider:abc"));
    }
}
