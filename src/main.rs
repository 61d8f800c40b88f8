use planetmap::config::{ConfigError, ServerConfig};
use planetmap::routes;
use planetmap::state::AppState;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to bind port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },
    #[error("server failed: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env()?;
    let port = config.port;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        base_url = %config.public_base_url,
        "configuration loaded"
    );

    let app = routes::app(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|source| StartupError::Bind { port, source })?;

    tracing::info!(%port, "planetmap listening");
    axum::serve(listener, app).await.map_err(StartupError::Serve)
}
