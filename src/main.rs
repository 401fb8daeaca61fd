use colorsplash::{
    app,
    config::{
        database::{self, Connection, DatabaseConfig},
        server::ServerConfig,
    },
    AppState,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_config = DatabaseConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;

    let connection = match database::bootstrap(&db_config).await {
        Ok(bootstrap) if db_config.require_connection => bootstrap.require_connected()?,
        Ok(bootstrap) => {
            if !bootstrap.liveness.is_connected() {
                warn!("Continuing without a verified MongoDB connection; requests will fail until it is reachable");
            }
            bootstrap.connection
        }
        Err(e) if db_config.require_connection => return Err(e.into()),
        Err(e) => {
            warn!("Continuing with detached MongoDB handles; requests fail until the connection string is fixed");
            Connection::detached(&db_config, e.to_string())?
        }
    };

    let addr = server_config.address()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app(AppState::new(connection))).await?;

    Ok(())
}
