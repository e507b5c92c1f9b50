use anyhow::Context;
use std::net::TcpListener;
use template_service::configuration::get_configuration;
use template_service::providers::{authentication, storage};
use template_service::services::{ClientOptionsBuilder, TemplateService};
use template_service::startup::run;
use template_service::telemetry::{get_subscriber, init_subscriber};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("template-service".into(), "info".into());
    init_subscriber(subscriber);

    let settings = get_configuration().context("Failed to read configuration.")?;

    let storage_provider = storage::init(&settings)
        .await
        .context("Failed to initialize storage provider.")?;
    let authentication_provider = authentication::init(&settings.auth)
        .context("Failed to initialize authentication provider.")?;

    let options = ClientOptionsBuilder::default()
        .storage_provider(storage_provider)
        .authentication_provider(authentication_provider)
        .owner_identity(settings.service.owner_identity)
        .user_deletion(settings.service.user_deletion)
        .build()?;
    let service = TemplateService::init(options);

    let address = format!("{}:{}", settings.app_host, settings.app_port);
    tracing::info!("Start server at {:?}", &address);
    let listener =
        TcpListener::bind(&address).with_context(|| format!("failed to bind to {}", address))?;

    run(listener, service, settings).await?.await?;

    Ok(())
}
