use actix_web::dev::HttpServiceFactory;
use actix_web::{get, post, web, HttpResponse, Responder};

use serde::{Deserialize, Serialize};

use serde_json::json;

use sqlx::SqlitePool;

use crate::domain::EmailAddress;
use crate::error::{Error, Result};
use crate::model::{NewSubscriber, SubscriberStatus};
use crate::programme::ProgrammeRunner;
use crate::repo::{MessageRepo, SqliteMessageRepo, SqliteSubscriberRepo, SubscriberRepo};

#[derive(Debug, Deserialize)]
pub struct EnrollBody {
    email: String,
    role_description: String,
}

impl TryFrom<EnrollBody> for NewSubscriber {
    type Error = String;

    fn try_from(body: EnrollBody) -> std::result::Result<Self, Self::Error> {
        let email = body.email.parse()?;
        let role_description = body.role_description.parse()?;

        Ok(NewSubscriber {
            email,
            role_description,
        })
    }
}

/// Create the subscriber, acknowledge immediately, generate in the
/// background. The duplicate-email check here is the sole guard against two
/// runs for one subscriber.
#[tracing::instrument(name = "Enroll a subscriber", skip(body, pool, runner))]
#[post("")]
async fn enroll(
    body: web::Json<EnrollBody>,
    pool: web::Data<SqlitePool>,
    runner: web::Data<ProgrammeRunner>,
) -> Result<impl Responder> {
    let new_subscriber: NewSubscriber = body.into_inner().try_into().map_err(Error::Validation)?;

    let existing =
        SqliteSubscriberRepo::fetch_by_email(pool.get_ref(), new_subscriber.email.as_ref())
            .await?;
    if let Some(existing) = existing {
        let reason = match existing.status {
            SubscriberStatus::Unsubscribed => "Email previously unsubscribed",
            SubscriberStatus::Active => "Already enrolled",
        };
        return Err(Error::Conflict(reason.into()));
    }

    let subscriber_id = SqliteSubscriberRepo::insert(pool.get_ref(), &new_subscriber).await?;

    runner.spawn(
        subscriber_id,
        new_subscriber.email.clone(),
        new_subscriber.role_description.to_string(),
    );

    Ok(HttpResponse::Accepted().json(json!({
        "subscriber_id": subscriber_id,
        "message": "Enrolled! Your 100-day programme is being generated.",
        "note": "Your Day 1 email arrives within a few minutes.",
    })))
}

#[derive(Debug, Serialize)]
struct ProgrammeStatus {
    subscriber: SubscriberView,
    programme: ProgrammeCounts,
}

#[derive(Debug, Serialize)]
struct SubscriberView {
    email: String,
    enrolled_at: chrono::DateTime<chrono::Utc>,
    status: SubscriberStatus,
}

#[derive(Debug, Serialize)]
struct ProgrammeCounts {
    total: i64,
    scheduled: i64,
    sent: i64,
}

#[tracing::instrument(name = "Get programme status", skip(pool))]
#[get("/{email}")]
async fn status(path: web::Path<String>, pool: web::Data<SqlitePool>) -> Result<impl Responder> {
    let email: EmailAddress = path.into_inner().parse().map_err(Error::Validation)?;

    let subscriber = SqliteSubscriberRepo::fetch_by_email(pool.get_ref(), email.as_ref())
        .await?
        .ok_or_else(|| Error::NotFound("No subscriber with that email".into()))?;

    let counts = SqliteMessageRepo::counts_for_subscriber(pool.get_ref(), subscriber.id).await?;

    Ok(HttpResponse::Ok().json(ProgrammeStatus {
        subscriber: SubscriberView {
            email: subscriber.email,
            enrolled_at: subscriber.enrolled_at,
            status: subscriber.status,
        },
        programme: ProgrammeCounts {
            total: counts.total,
            scheduled: counts.scheduled,
            sent: counts.sent,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeBody {
    email: String,
}

/// Cancel pending deliveries best-effort, then cancel store-side
/// unconditionally. Provider refusals are counted out but never block the
/// store transitions.
#[tracing::instrument(name = "Unsubscribe", skip(body, pool, runner))]
#[post("/unsubscribe")]
async fn unsubscribe(
    body: web::Json<UnsubscribeBody>,
    pool: web::Data<SqlitePool>,
    runner: web::Data<ProgrammeRunner>,
) -> Result<impl Responder> {
    let email: EmailAddress = body.email.parse().map_err(Error::Validation)?;

    let subscriber = SqliteSubscriberRepo::fetch_by_email(pool.get_ref(), email.as_ref())
        .await?
        .ok_or_else(|| Error::NotFound("No subscriber with that email".into()))?;

    if subscriber.status == SubscriberStatus::Unsubscribed {
        return Err(Error::Conflict("Already unsubscribed".into()));
    }

    let delivery_ids =
        SqliteMessageRepo::fetch_cancellable_delivery_ids(pool.get_ref(), subscriber.id).await?;

    let mut cancelled = 0;
    for delivery_id in &delivery_ids {
        match runner.delivery_client().cancel(delivery_id).await {
            Ok(()) => cancelled += 1,
            Err(error) => {
                tracing::warn!(%delivery_id, "Provider-side cancel failed: {:?}", error);
            }
        }
    }

    SqliteMessageRepo::cancel_scheduled(pool.get_ref(), subscriber.id).await?;
    SqliteSubscriberRepo::set_status(pool.get_ref(), subscriber.id, SubscriberStatus::Unsubscribed)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Unsubscribed",
        "deliveries_cancelled": cancelled,
    })))
}

/// Subscription API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/subscriptions")
        .service(enroll)
        .service(unsubscribe)
        .service(status)
}
