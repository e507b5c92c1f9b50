#![allow(dead_code)]

use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::Arc;
use template_service::configuration::{get_configuration, AuthKind, DatabaseSettings, Settings};
use template_service::providers::storage::{MemoryStorage, PostgresStorage};
use template_service::providers::{authentication, AuthenticationProvider, StorageProvider};
use template_service::services::{ClientOptionsBuilder, TemplateService};

pub const ALICE: &str = "Bearer alice-token";
pub const BOB: &str = "Bearer bob-token";

pub struct TestApp {
    pub address: String,
    pub storage: Arc<dyn StorageProvider>,
    pub db_pool: Option<PgPool>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Configuration with static tokens for alice and bob.
pub fn test_configuration() -> Settings {
    let mut configuration = get_configuration().expect("Failed to get configuration");
    configuration.auth.provider = AuthKind::Static;
    configuration.auth.issuer = None;
    configuration.auth.static_tokens = HashMap::from([
        ("alice-token".to_string(), "alice".to_string()),
        ("bob-token".to_string(), "bob".to_string()),
    ]);
    configuration
}

pub async fn spawn_app_with(
    configuration: Settings,
    storage: Arc<dyn StorageProvider>,
    authentication: Arc<dyn AuthenticationProvider>,
) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let options = ClientOptionsBuilder::default()
        .storage_provider(storage.clone())
        .authentication_provider(authentication)
        .owner_identity(configuration.service.owner_identity)
        .user_deletion(configuration.service.user_deletion)
        .build()
        .expect("Failed to build client options");

    let server = template_service::startup::run(listener, TemplateService::init(options), configuration)
        .await
        .expect("Failed to bind address.");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        storage,
        db_pool: None,
    }
}

pub async fn spawn_app_with_configuration(configuration: Settings) -> TestApp {
    let authentication =
        authentication::init(&configuration.auth).expect("Failed to build authentication provider");
    spawn_app_with(configuration, Arc::new(MemoryStorage::new()), authentication).await
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_configuration(test_configuration()).await
}

/// Same app backed by a fresh Postgres database; `None` when Postgres is unreachable.
pub async fn spawn_postgres_app() -> Option<TestApp> {
    let mut configuration = test_configuration();
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();

    let connection_pool = match configure_database(&configuration.database).await {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("Skipping tests: failed to connect to postgres: {}", err);
            return None;
        }
    };

    let authentication =
        authentication::init(&configuration.auth).expect("Failed to build authentication provider");
    let storage = Arc::new(PostgresStorage::new(connection_pool.clone()));
    let mut app = spawn_app_with(configuration, storage, authentication).await;
    app.db_pool = Some(connection_pool);

    Some(app)
}

pub async fn configure_database(config: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let mut connection = PgConnection::connect(&config.connection_string_without_db()).await?;

    connection
        .execute(format!(r#"CREATE DATABASE "{}""#, config.database_name).as_str())
        .await?;

    let connection_pool = PgPool::connect(&config.connection_string()).await?;

    sqlx::migrate!("./migrations").run(&connection_pool).await?;

    Ok(connection_pool)
}
