use std::time::Duration;

use reqwest::StatusCode;

use serde_json::json;

use sqlx::SqlitePool;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use coachmail::model::MessageStatus;
use coachmail::repo::{MessageRepo, SqliteMessageRepo, SqliteSubscriberRepo, SubscriberRepo};

use crate::helpers::{NewEnrollment, TestApp};

#[sqlx::test(migrations = "./migrations")]
async fn enroll_returns_accepted_before_any_message_exists(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    // Slow generator: the acknowledgment must not wait for it
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(500)))
        .mount(&app.generator_server)
        .await;

    let mut completions = app.runner.completions();

    let res = app
        .enroll(&NewEnrollment::valid("alice@example.com"))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::ACCEPTED, res.status());

    let subscriber = SqliteSubscriberRepo::fetch_by_email(&pool, "alice@example.com")
        .await?
        .expect("Subscriber not created");
    assert_eq!(0, SqliteMessageRepo::count(&pool).await?);

    let body: serde_json::Value = res.json().await.expect("Failed to decode body");
    assert_eq!(subscriber.id.to_string(), body["subscriber_id"]);

    app.await_run(&mut completions).await;

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn enroll_returns_bad_request_for_invalid_data(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let test_cases = vec![
        (
            "missing email",
            NewEnrollment {
                email: None,
                role_description: Some(crate::helpers::VALID_ROLE.into()),
            },
        ),
        (
            "missing role description",
            NewEnrollment {
                email: Some("alice@example.com".into()),
                role_description: None,
            },
        ),
        (
            "malformed email",
            NewEnrollment {
                email: Some("not an address".into()),
                role_description: Some(crate::helpers::VALID_ROLE.into()),
            },
        ),
        (
            "role description under 30 characters",
            NewEnrollment {
                email: Some("alice@example.com".into()),
                role_description: Some("accountant".into()),
            },
        ),
    ];

    for (desc, enrollment) in test_cases {
        let res = app
            .enroll(&enrollment)
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not fail when payload was {}",
            desc
        );
    }

    assert_eq!(0, SqliteSubscriberRepo::count(&pool).await?);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn enroll_rejects_duplicate_active_subscriber(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    app.enroll_and_run("alice@example.com").await;

    let res = app
        .enroll(&NewEnrollment::valid("alice@example.com"))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::CONFLICT, res.status());
    assert_eq!(1, SqliteSubscriberRepo::count(&pool).await?);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn full_run_schedules_every_curriculum_entry(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let summary = app.enroll_and_run("alice@example.com").await;
    assert_eq!(28, summary.scheduled);

    let res = app
        .programme_status("alice@example.com")
        .await
        .expect("Failed to execute request");
    assert!(res.status().is_success());

    let body: serde_json::Value = res.json().await.expect("Failed to decode body");
    assert_eq!("active", body["subscriber"]["status"]);
    assert_eq!(28, body["programme"]["total"]);
    assert_eq!(28, body["programme"]["scheduled"]);
    assert_eq!(0, body["programme"]["sent"]);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn status_returns_not_found_for_unknown_email(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .programme_status("nobody@example.com")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn unsubscribe_cancels_pending_deliveries(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    app.enroll_and_run("alice@example.com").await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/emails/[^/]+/cancel$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(28)
        .mount(&app.delivery_server)
        .await;

    let res = app
        .unsubscribe("alice@example.com")
        .await
        .expect("Failed to execute request");
    assert!(res.status().is_success());

    let body: serde_json::Value = res.json().await.expect("Failed to decode body");
    assert_eq!(28, body["deliveries_cancelled"]);

    let subscriber = SqliteSubscriberRepo::fetch_by_email(&pool, "alice@example.com")
        .await?
        .expect("Subscriber missing");
    let messages = SqliteMessageRepo::fetch_for_subscriber(&pool, subscriber.id).await?;
    assert!(messages
        .iter()
        .all(|m| m.status == MessageStatus::Cancelled));

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn unsubscribe_cancels_store_side_even_if_provider_refuses(
    pool: SqlitePool,
) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    app.enroll_and_run("alice@example.com").await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/emails/[^/]+/cancel$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.delivery_server)
        .await;

    let res = app
        .unsubscribe("alice@example.com")
        .await
        .expect("Failed to execute request");
    assert!(res.status().is_success());

    let body: serde_json::Value = res.json().await.expect("Failed to decode body");
    assert_eq!(0, body["deliveries_cancelled"]);

    // Store-side cancellation is unconditional
    let subscriber = SqliteSubscriberRepo::fetch_by_email(&pool, "alice@example.com")
        .await?
        .expect("Subscriber missing");
    let messages = SqliteMessageRepo::fetch_for_subscriber(&pool, subscriber.id).await?;
    assert!(messages
        .iter()
        .all(|m| m.status == MessageStatus::Cancelled));

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn unsubscribed_email_cannot_re_enroll(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    app.enroll_and_run("alice@example.com").await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/emails/[^/]+/cancel$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&app.delivery_server)
        .await;

    app.unsubscribe("alice@example.com")
        .await
        .expect("Failed to execute request");

    // Re-enrollment is rejected, as is a second unsubscribe
    let res = app
        .enroll(&NewEnrollment::valid("alice@example.com"))
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::CONFLICT, res.status());

    let res = app
        .unsubscribe("alice@example.com")
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::CONFLICT, res.status());

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn unsubscribe_returns_not_found_for_unknown_email(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .unsubscribe("nobody@example.com")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());

    Ok(())
}
