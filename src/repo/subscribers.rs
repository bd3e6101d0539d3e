use uuid::Uuid;

use chrono::Utc;

use sqlx::{Executor, SqliteExecutor};

use crate::model::{NewSubscriber, Subscriber, SubscriberStatus};

/// Subscriber repository trait, implemented per database backend.
/// NOTE: Intended to facilitate easier testing/mocking
#[async_trait::async_trait]
pub trait SubscriberRepo {
    type DB: sqlx::Database;

    /// Insert a newly enrolled subscriber with status `active`
    async fn insert<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        new_subscriber: &NewSubscriber,
    ) -> sqlx::Result<Uuid>;

    /// Look a subscriber up by (normalized) email address
    async fn fetch_by_email<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        email: &str,
    ) -> sqlx::Result<Option<Subscriber>>;

    /// All subscribers, oldest enrollment first
    async fn fetch_all<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
    ) -> sqlx::Result<Vec<Subscriber>>;

    /// Transition a subscriber to a new status
    async fn set_status<'con>(
        executor: impl Executor<'con, Database = Self::DB>,
        id: Uuid,
        status: SubscriberStatus,
    ) -> sqlx::Result<()>;

    async fn count<'con>(executor: impl Executor<'con, Database = Self::DB>) -> sqlx::Result<i64>;
}

/// SQLite Subscriber Repository
#[derive(Debug)]
pub struct SqliteSubscriberRepo;

#[async_trait::async_trait]
impl SubscriberRepo for SqliteSubscriberRepo {
    type DB = sqlx::Sqlite;

    #[tracing::instrument(name = "Insert subscriber", skip(executor, new_subscriber))]
    async fn insert<'con>(
        executor: impl SqliteExecutor<'con>,
        new_subscriber: &NewSubscriber,
    ) -> sqlx::Result<Uuid> {
        let id = Uuid::new_v4();
        let enrolled_at = Utc::now();

        sqlx::query(
            "insert into subscribers (id, email, role_description, enrolled_at, status)
             values ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(new_subscriber.email.as_ref())
        .bind(new_subscriber.role_description.as_ref())
        .bind(enrolled_at)
        .bind(SubscriberStatus::Active)
        .execute(executor)
        .await?;

        Ok(id)
    }

    #[tracing::instrument(name = "Fetch subscriber by email", skip(executor))]
    async fn fetch_by_email<'con>(
        executor: impl SqliteExecutor<'con>,
        email: &str,
    ) -> sqlx::Result<Option<Subscriber>> {
        sqlx::query_as("select * from subscribers where email = $1")
            .bind(email)
            .fetch_optional(executor)
            .await
    }

    #[tracing::instrument(name = "Fetch all subscribers", skip(executor))]
    async fn fetch_all<'con>(
        executor: impl SqliteExecutor<'con>,
    ) -> sqlx::Result<Vec<Subscriber>> {
        sqlx::query_as("select * from subscribers order by enrolled_at")
            .fetch_all(executor)
            .await
    }

    #[tracing::instrument(name = "Set subscriber status", skip(executor))]
    async fn set_status<'con>(
        executor: impl SqliteExecutor<'con>,
        id: Uuid,
        status: SubscriberStatus,
    ) -> sqlx::Result<()> {
        sqlx::query("update subscribers set status = $2 where id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Count subscribers", skip(executor))]
    async fn count<'con>(executor: impl SqliteExecutor<'con>) -> sqlx::Result<i64> {
        sqlx::query_scalar("select count(*) from subscribers")
            .fetch_one(executor)
            .await
    }
}
