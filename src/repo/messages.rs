use uuid::Uuid;

use chrono::Utc;

use sqlx::{Executor, SqliteExecutor};

use crate::model::{Message, MessageStatus, NewMessage};

/// Per-subscriber message tallies for status and admin views
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct MessageCounts {
    pub total: i64,
    pub scheduled: i64,
    pub sent: i64,
}

/// Message repository trait, implemented per database backend.
///
/// Records are append-only: rows are never deleted, only status-transitioned,
/// and every transition here leaves `scheduled` exactly once.
#[async_trait::async_trait]
pub trait MessageRepo {
    type DB: sqlx::Database;

    /// Persist one message record with its submission outcome already decided
    async fn insert<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        new_message: &NewMessage,
    ) -> sqlx::Result<Uuid>;

    /// All messages for one subscriber, in curriculum order
    async fn fetch_for_subscriber<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        subscriber_id: Uuid,
    ) -> sqlx::Result<Vec<Message>>;

    /// Provider-side ids of this subscriber's messages that are still
    /// cancellable (scheduled, and actually submitted)
    async fn fetch_cancellable_delivery_ids<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        subscriber_id: Uuid,
    ) -> sqlx::Result<Vec<String>>;

    /// Apply a delivery outcome to whichever `scheduled` records carry the
    /// given provider id. Returns the number of rows transitioned; zero is
    /// not an error (late or repeated events match nothing).
    async fn reconcile_by_delivery_id<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        external_delivery_id: &str,
        status: MessageStatus,
    ) -> sqlx::Result<u64>;

    /// Transition every `scheduled` message for a subscriber to `cancelled`
    async fn cancel_scheduled<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        subscriber_id: Uuid,
    ) -> sqlx::Result<u64>;

    async fn counts_for_subscriber<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        subscriber_id: Uuid,
    ) -> sqlx::Result<MessageCounts>;

    async fn count<'con>(executor: impl Executor<'con, Database = Self::DB>) -> sqlx::Result<i64>;
}

/// SQLite Message Repository
#[derive(Debug)]
pub struct SqliteMessageRepo;

#[async_trait::async_trait]
impl MessageRepo for SqliteMessageRepo {
    type DB = sqlx::Sqlite;

    #[tracing::instrument(name = "Insert message", skip(executor, new_message))]
    async fn insert<'con>(
        executor: impl SqliteExecutor<'con>,
        new_message: &NewMessage,
    ) -> sqlx::Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "insert into messages
             (id, subscriber_id, external_delivery_id, day_offset, phase_id,
              subject, scheduled_for, status, created_at, updated_at)
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(id)
        .bind(new_message.subscriber_id)
        .bind(&new_message.external_delivery_id)
        .bind(new_message.day_offset as i64)
        .bind(&new_message.phase_id)
        .bind(&new_message.subject)
        .bind(new_message.scheduled_for)
        .bind(new_message.status)
        .bind(now)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(id)
    }

    #[tracing::instrument(name = "Fetch subscriber messages", skip(executor))]
    async fn fetch_for_subscriber<'con>(
        executor: impl SqliteExecutor<'con>,
        subscriber_id: Uuid,
    ) -> sqlx::Result<Vec<Message>> {
        sqlx::query_as("select * from messages where subscriber_id = $1 order by day_offset")
            .bind(subscriber_id)
            .fetch_all(executor)
            .await
    }

    #[tracing::instrument(name = "Fetch cancellable delivery ids", skip(executor))]
    async fn fetch_cancellable_delivery_ids<'con>(
        executor: impl SqliteExecutor<'con>,
        subscriber_id: Uuid,
    ) -> sqlx::Result<Vec<String>> {
        sqlx::query_scalar(
            "select external_delivery_id from messages
             where subscriber_id = $1
               and status = $2
               and external_delivery_id is not null
             order by day_offset",
        )
        .bind(subscriber_id)
        .bind(MessageStatus::Scheduled)
        .fetch_all(executor)
        .await
    }

    #[tracing::instrument(name = "Reconcile delivery outcome", skip(executor))]
    async fn reconcile_by_delivery_id<'con>(
        executor: impl SqliteExecutor<'con>,
        external_delivery_id: &str,
        status: MessageStatus,
    ) -> sqlx::Result<u64> {
        // Only `scheduled` rows may transition; terminal states stay put
        let result = sqlx::query(
            "update messages set status = $2, updated_at = $3
             where external_delivery_id = $1 and status = $4",
        )
        .bind(external_delivery_id)
        .bind(status)
        .bind(Utc::now())
        .bind(MessageStatus::Scheduled)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "Cancel scheduled messages", skip(executor))]
    async fn cancel_scheduled<'con>(
        executor: impl SqliteExecutor<'con>,
        subscriber_id: Uuid,
    ) -> sqlx::Result<u64> {
        let result = sqlx::query(
            "update messages set status = $2, updated_at = $3
             where subscriber_id = $1 and status = $4",
        )
        .bind(subscriber_id)
        .bind(MessageStatus::Cancelled)
        .bind(Utc::now())
        .bind(MessageStatus::Scheduled)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "Count subscriber messages", skip(executor))]
    async fn counts_for_subscriber<'con>(
        executor: impl SqliteExecutor<'con>,
        subscriber_id: Uuid,
    ) -> sqlx::Result<MessageCounts> {
        sqlx::query_as(
            "select count(*) as total,
                    coalesce(sum(status = 'scheduled'), 0) as scheduled,
                    coalesce(sum(status = 'sent'), 0) as sent
             from messages where subscriber_id = $1",
        )
        .bind(subscriber_id)
        .fetch_one(executor)
        .await
    }

    #[tracing::instrument(name = "Count messages", skip(executor))]
    async fn count<'con>(executor: impl SqliteExecutor<'con>) -> sqlx::Result<i64> {
        sqlx::query_scalar("select count(*) from messages")
            .fetch_one(executor)
            .await
    }
}
