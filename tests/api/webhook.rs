use reqwest::StatusCode;

use serde_json::json;

use sqlx::SqlitePool;

use coachmail::model::MessageStatus;
use coachmail::repo::{MessageRepo, SqliteMessageRepo, SqliteSubscriberRepo, SubscriberRepo};

use crate::helpers::TestApp;

async fn first_delivery_id(pool: &SqlitePool, email: &str) -> String {
    let subscriber = SqliteSubscriberRepo::fetch_by_email(pool, email)
        .await
        .expect("Failed to fetch subscriber")
        .expect("Subscriber missing");

    SqliteMessageRepo::fetch_cancellable_delivery_ids(pool, subscriber.id)
        .await
        .expect("Failed to fetch delivery ids")
        .into_iter()
        .next()
        .expect("No scheduled message with a delivery id")
}

#[sqlx::test(migrations = "./migrations")]
async fn bounce_marks_only_the_matching_message_failed(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    app.enroll_and_run("alice@example.com").await;
    let delivery_id = first_delivery_id(&pool, "alice@example.com").await;

    let res = app
        .delivery_event(&json!({
            "type": "email.bounced",
            "data": { "email_id": delivery_id.clone() },
        }))
        .await
        .expect("Failed to execute request");
    assert!(res.status().is_success());

    let subscriber = SqliteSubscriberRepo::fetch_by_email(&pool, "alice@example.com")
        .await?
        .expect("Subscriber missing");
    let messages = SqliteMessageRepo::fetch_for_subscriber(&pool, subscriber.id).await?;

    let failed: Vec<_> = messages
        .iter()
        .filter(|m| m.status == MessageStatus::Failed)
        .collect();
    assert_eq!(1, failed.len());
    assert_eq!(Some(delivery_id), failed[0].external_delivery_id);
    assert_eq!(
        27,
        messages
            .iter()
            .filter(|m| m.status == MessageStatus::Scheduled)
            .count()
    );

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn delivered_marks_message_sent(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    app.enroll_and_run("alice@example.com").await;
    let delivery_id = first_delivery_id(&pool, "alice@example.com").await;

    let res = app
        .delivery_event(&json!({
            "type": "email.delivered",
            "data": { "email_id": delivery_id },
        }))
        .await
        .expect("Failed to execute request");
    assert!(res.status().is_success());

    let res = app
        .programme_status("alice@example.com")
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = res.json().await.expect("Failed to decode body");
    assert_eq!(1, body["programme"]["sent"]);
    assert_eq!(27, body["programme"]["scheduled"]);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn repeated_event_leaves_status_correct(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    app.enroll_and_run("alice@example.com").await;
    let delivery_id = first_delivery_id(&pool, "alice@example.com").await;

    let event = json!({
        "type": "email.delivered",
        "data": { "email_id": delivery_id },
    });

    for _ in 0..2 {
        let res = app
            .delivery_event(&event)
            .await
            .expect("Failed to execute request");
        assert!(res.status().is_success());
    }

    let res = app
        .programme_status("alice@example.com")
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = res.json().await.expect("Failed to decode body");
    assert_eq!(1, body["programme"]["sent"]);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn malformed_events_are_rejected_without_mutation(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    app.enroll_and_run("alice@example.com").await;

    let test_cases = vec![
        ("unknown kind", json!({ "type": "email.opened", "data": { "email_id": "ext-0" } })),
        ("missing data", json!({ "type": "email.delivered" })),
        ("missing id", json!({ "type": "email.delivered", "data": {} })),
        ("no shape at all", json!({ "hello": "world" })),
    ];

    for (desc, event) in test_cases {
        let res = app
            .delivery_event(&event)
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not reject event payload: {}",
            desc
        );
    }

    let res = app
        .programme_status("alice@example.com")
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = res.json().await.expect("Failed to decode body");
    assert_eq!(28, body["programme"]["scheduled"]);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn unknown_delivery_id_is_acknowledged(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .delivery_event(&json!({
            "type": "email.delivered",
            "data": { "email_id": "ext-unknown" },
        }))
        .await
        .expect("Failed to execute request");

    assert!(res.status().is_success());

    Ok(())
}
