use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};

use secrecy::Secret;

use serde_json::json;

use sqlx::SqlitePool;

use tracing_actix_web::TracingLogger;

use crate::auth::AdminKey;
use crate::controller::{admin, subscriptions, webhook};
use crate::error::Result;
use crate::programme::ProgrammeRunner;
use crate::repo::{MessageRepo, SqliteMessageRepo, SqliteSubscriberRepo, SubscriberRepo};

/// Health-check endpoint with store totals
#[tracing::instrument(name = "Health check", skip(pool))]
#[get("/health_check")]
async fn health_check(pool: web::Data<SqlitePool>) -> Result<impl Responder> {
    let subscribers = SqliteSubscriberRepo::count(pool.get_ref()).await?;
    let messages = SqliteMessageRepo::count(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "subscribers": subscribers,
        "messages": messages,
    })))
}

/// Run the application on a specified TCP listener
pub fn run(
    listener: TcpListener,
    pool: SqlitePool,
    runner: ProgrammeRunner,
    admin_key: Secret<String>,
) -> anyhow::Result<Server> {
    // Wrap application data
    let pool = web::Data::new(pool);
    let runner = web::Data::new(runner);
    let admin_key = web::Data::new(AdminKey::from(admin_key));

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(pool.clone())
            .app_data(runner.clone())
            .app_data(admin_key.clone())
            .service(health_check)
            .service(subscriptions::scope())
            .service(webhook::scope())
            .service(admin::scope())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
