use anyhow::Context;
use tracing_subscriber::EnvFilter;

use wellhead::routes::{router, AppState};
use wellhead::store::MemoryCredentialStore;
use wellhead::{AuthConfig, AuthService, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wellhead=info,tower_http=info")),
        )
        .json()
        .init();

    let auth_config = AuthConfig::from_env();
    let server_config = ServerConfig::from_env();

    let service = AuthService::new(MemoryCredentialStore::new(), auth_config)
        .context("initializing authentication service")?;
    service
        .seed_admin(&server_config.admin_username, &server_config.admin_password)
        .await
        .map_err(|e| anyhow::anyhow!("seeding bootstrap administrator: {e}"))?;

    let app = router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&server_config.bind)
        .await
        .with_context(|| format!("binding {}", server_config.bind))?;
    tracing::info!(addr = %server_config.bind, "wellhead listening");

    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
