use std::net::TcpListener;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use authgate::auth::TokenCodec;
use authgate::configuration::get_configuration;
use authgate::startup::run;
use authgate::store::{PgStore, SharedStore};
use authgate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // Secrets are validated here, before anything is served.
    let codec = match TokenCodec::from_settings(&configuration.tokens) {
        Ok(codec) => Arc::new(codec),
        Err(e) => {
            tracing::error!("Invalid token configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Token configuration error",
            ));
        }
    };

    let connection_string = configuration.database.connection_string();
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    let store: SharedStore = Arc::new(PgStore::new(pool));

    let address = format!("127.0.0.1:{}", configuration.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, store, codec)?;
    server.await
}
