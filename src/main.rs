//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crm_backend::config::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let bind_address = config.bind_address;

    let app_state = AppState::new(config).await?;
    let app = crm_backend::router(app_state);

    let listener = TcpListener::bind(bind_address).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
