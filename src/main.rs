use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::time::Duration;

use rideauth::configuration::{get_configuration, DatabaseSettings};
use rideauth::startup::run;
use rideauth::store::{prune_expired_revocations, Stores};
use rideauth::telemetry::init_telemetry;

const LEDGER_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

async fn connect_stores(database: &DatabaseSettings) -> std::io::Result<Stores> {
    if database.in_memory {
        tracing::warn!("Using in-memory store; data is lost on restart");
        return Ok(Stores::in_memory());
    }

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to migrate the database: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
        })?;

    tracing::info!("Database connection pool created successfully");
    Ok(Stores::postgres(pool))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = init_telemetry("info") {
        eprintln!("Failed to initialise telemetry: {}", e);
    }

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

    let stores = connect_stores(&configuration.database).await?;

    let ledger = stores.ledger.clone();
    let token_expiry = configuration.jwt.token_expiry;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LEDGER_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = prune_expired_revocations(ledger.as_ref(), token_expiry).await {
                tracing::warn!(error = %e, "Revocation ledger pruning failed");
            }
        }
    });

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(
        listener,
        stores,
        configuration.jwt.clone(),
        configuration.application.clone(),
    )?;
    tracing::info!("Server started successfully");

    server.await
}
