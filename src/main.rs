use std::net::TcpListener;

use anyhow::Context;

use coachmail::app;
use coachmail::client::{DeliveryClient, GeneratorClient};
use coachmail::programme::ProgrammeRunner;
use coachmail::settings::Settings;
use coachmail::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::create_subscriber("info".into(), std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let settings = Settings::load().expect("Failed to load settings");

    let pool = settings.database.connect().await?;

    let generator = GeneratorClient::new(
        settings.generator.api_timeout(),
        settings.generator.api_base_url(),
        settings.generator.api_auth_token(),
        settings.generator.model().into(),
    )?;

    let delivery = DeliveryClient::new(
        settings.delivery.sender(),
        settings.delivery.api_timeout(),
        settings.delivery.api_base_url(),
        settings.delivery.api_auth_token(),
    )?;

    let runner = ProgrammeRunner::new(pool.clone(), generator, delivery);

    let listener = TcpListener::bind(settings.app.addr())?;

    app::run(listener, pool, runner, settings.app.admin_key().clone())?
        .await
        .context("Failed to run app")
}
