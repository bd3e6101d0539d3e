use uuid::Uuid;

use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use crate::domain::{EmailAddress, RoleDescription};

/// Enrollment request, parsed at the boundary
#[derive(Debug)]
pub struct NewSubscriber {
    pub email: EmailAddress,
    pub role_description: RoleDescription,
}

/// Stored subscriber record
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub role_description: String,
    /// Set at enrollment, immutable
    pub enrolled_at: DateTime<Utc>,
    pub status: SubscriberStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Active,
    /// Terminal; re-enrollment with the same email is rejected
    Unsubscribed,
}

/// One generated email as the provider returns it, before any scheduling
/// metadata is computed
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftMessage {
    pub day: u32,
    pub subject: String,
    pub preview: String,
    pub theme: String,
    pub plain_text: String,
}

/// A draft plus its computed delivery time and both body representations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub scheduled_for: DateTime<Utc>,
    pub text_body: String,
    pub html_body: String,
}

/// New message record; exactly one is persisted per draft, whatever the
/// submission outcome
#[derive(Debug)]
pub struct NewMessage {
    pub subscriber_id: Uuid,
    pub external_delivery_id: Option<String>,
    pub day_offset: u32,
    pub phase_id: String,
    pub subject: String,
    pub scheduled_for: DateTime<Utc>,
    pub status: MessageStatus,
}

/// Stored message record
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    /// Provider-side id; absent when submission failed
    pub external_delivery_id: Option<String>,
    pub day_offset: i64,
    pub phase_id: String,
    pub subject: String,
    /// Derived once at render time, never recomputed
    pub scheduled_for: DateTime<Utc>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Message lifecycle. All transitions are one-way out of `Scheduled`; the
/// other three states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Scheduled,
    Sent,
    Failed,
    Cancelled,
}
