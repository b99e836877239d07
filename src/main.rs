use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use chirpy::auth::{CredentialHasher, SessionPolicy, SessionService};
use chirpy::chirps::ChirpService;
use chirpy::configuration::get_configuration;
use chirpy::metrics::HitCounter;
use chirpy::startup::{run, AppState};
use chirpy::storage::{PgChirpStore, PgRefreshTokenRepository, PgUserDirectory};
use chirpy::telemetry::init_telemetry;

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

    // No secret, no server.
    let secret = configuration.auth.signing_secret().map_err(|e| {
        tracing::error!("Refusing to start: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
    })?;

    tracing::info!("Database ready");

    let sessions = SessionService::new(
        Arc::new(PgUserDirectory::new(pool.clone())),
        Arc::new(PgRefreshTokenRepository::new(pool.clone())),
        secret,
        CredentialHasher::new(configuration.auth.password_hash_cost),
        SessionPolicy {
            rotate_refresh_tokens: configuration.auth.rotate_refresh_tokens,
        },
    );

    if configuration.auth.rotate_refresh_tokens {
        tracing::info!("Refresh token rotation enabled");
    }

    let chirps = ChirpService::new(Arc::new(PgChirpStore::new(pool)));

    let state = AppState {
        sessions: Arc::new(sessions),
        chirps: Arc::new(chirps),
        hits: Arc::new(HitCounter::new()),
        platform: configuration.application.platform,
    };

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!(platform = ?state.platform, "Server listening on: {}", address);

    run(listener, state)?.await
}
