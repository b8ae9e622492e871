//! Relay side of the PostgreSQL outbox.
//!
//! Entries are written by [`super::PgUnitOfWork`] inside the saga transaction
//! and read here in insertion order (`sequence`).

use super::rows::OutboxRow;
use async_trait::async_trait;
use saga_engine_core::outbox::{OutboxEntry, OutboxRepository};
use sqlx::postgres::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgOutboxRepository {
    pool: PgPool,
}

impl PgOutboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxRepository for PgOutboxRepository {
    type Error = sqlx::Error;

    async fn get_unprocessed(&self, batch_size: usize) -> Result<Vec<OutboxEntry>, Self::Error> {
        let rows: Vec<OutboxRow> = sqlx::query_as(
            r#"
            SELECT id, topic, partition_key, payload, occurred_at, processed_at
            FROM outbox
            WHERE processed_at IS NULL
            ORDER BY sequence
            LIMIT $1
            "#,
        )
        .bind(batch_size as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OutboxEntry::from).collect())
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), Self::Error> {
        let result = sqlx::query("UPDATE outbox SET processed_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    async fn unprocessed_count(&self) -> Result<u64, Self::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM outbox WHERE processed_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
