use actix_web::dev::HttpServiceFactory;
use actix_web::{post, web, HttpResponse, Responder};

use serde::Deserialize;

use serde_json::json;

use sqlx::SqlitePool;

use crate::error::Result;
use crate::model::MessageStatus;
use crate::repo::{MessageRepo, SqliteMessageRepo};

/// Asynchronous delivery outcome pushed by the provider. The event kind is
/// a closed enum: anything else fails deserialization and the call is
/// rejected without touching the store.
#[derive(Debug, Deserialize)]
pub struct DeliveryEvent {
    #[serde(rename = "type")]
    kind: DeliveryEventKind,
    data: DeliveryEventData,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum DeliveryEventKind {
    #[serde(rename = "email.delivered")]
    Delivered,
    #[serde(rename = "email.bounced")]
    Bounced,
}

#[derive(Debug, Deserialize)]
struct DeliveryEventData {
    email_id: String,
}

impl From<DeliveryEventKind> for MessageStatus {
    fn from(kind: DeliveryEventKind) -> Self {
        match kind {
            DeliveryEventKind::Delivered => MessageStatus::Sent,
            DeliveryEventKind::Bounced => MessageStatus::Failed,
        }
    }
}

#[tracing::instrument(name = "Apply delivery event", skip(pool))]
#[post("/delivery")]
async fn delivery(
    event: web::Json<DeliveryEvent>,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder> {
    let event = event.into_inner();

    let updated = SqliteMessageRepo::reconcile_by_delivery_id(
        pool.get_ref(),
        &event.data.email_id,
        event.kind.into(),
    )
    .await?;

    if updated == 0 {
        // Late, repeated or unknown id; nothing to correct
        tracing::warn!(
            email_id = %event.data.email_id,
            "Delivery event matched no scheduled message"
        );
    }

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// Delivery-provider webhook endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/webhooks").service(delivery)
}
