use sqlx::SqlitePool;

use crate::helpers::TestApp;

#[sqlx::test(migrations = "./migrations")]
async fn is_present(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app.health_check().await.expect("Failed to execute request");

    assert!(res.status().is_success());

    let body: serde_json::Value = res.json().await.expect("Failed to decode body");
    assert_eq!("ok", body["status"]);
    assert_eq!(0, body["subscribers"]);
    assert_eq!(0, body["messages"]);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn reports_store_totals(pool: SqlitePool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    app.enroll_and_run("alice@example.com").await;

    let res = app.health_check().await.expect("Failed to execute request");

    let body: serde_json::Value = res.json().await.expect("Failed to decode body");
    assert_eq!(1, body["subscribers"]);
    assert_eq!(28, body["messages"]);

    Ok(())
}
