use actix_web::dev::HttpServiceFactory;
use actix_web::{get, web, HttpResponse, Responder};

use serde::Serialize;

use sqlx::SqlitePool;

use crate::auth::Administrator;
use crate::error::Result;
use crate::model::SubscriberStatus;
use crate::repo::{MessageRepo, SqliteMessageRepo, SqliteSubscriberRepo, SubscriberRepo};

#[derive(Debug, Serialize)]
struct SubscriberSummary {
    email: String,
    enrolled_at: chrono::DateTime<chrono::Utc>,
    status: SubscriberStatus,
    messages_total: i64,
    messages_sent: i64,
}

#[derive(Debug, Serialize)]
struct SubscriberList {
    total: usize,
    subscribers: Vec<SubscriberSummary>,
}

#[tracing::instrument(name = "List subscribers", skip(_admin, pool))]
#[get("/subscribers")]
async fn list_subscribers(
    _admin: Administrator,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder> {
    let subscribers = SqliteSubscriberRepo::fetch_all(pool.get_ref()).await?;

    let mut summaries = Vec::with_capacity(subscribers.len());
    for subscriber in subscribers {
        let counts =
            SqliteMessageRepo::counts_for_subscriber(pool.get_ref(), subscriber.id).await?;

        summaries.push(SubscriberSummary {
            email: subscriber.email,
            enrolled_at: subscriber.enrolled_at,
            status: subscriber.status,
            messages_total: counts.total,
            messages_sent: counts.sent,
        });
    }

    Ok(HttpResponse::Ok().json(SubscriberList {
        total: summaries.len(),
        subscribers: summaries,
    }))
}

/// Administrative API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/admin").service(list_subscribers)
}
