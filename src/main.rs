use anyhow::Context;
use jwt_service::keystore::KeyStoreLoader;
use jwt_service::tracing_config::{init_tracing, TracingConfig};
use jwt_service::{Config, TokenAuthority, TokenService};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    init_tracing(&TracingConfig::from_config(&config)).context("initializing tracing")?;

    info!(
        key_store = %config.key_store_path.display(),
        cache = config.cache.name(),
        fail_mode = ?config.fail_mode,
        "Starting JWT service"
    );

    let loader = KeyStoreLoader::new(&config.key_store_path);
    let registry = loader.get_or_load().context("loading key store")?;

    let cache = config.build_cache();
    cache
        .initialize()
        .await
        .context("connecting to revocation cache")?;

    let authority = Arc::new(
        TokenAuthority::new(registry, cache, config.token_lifetime_minutes)
            .with_fail_mode(config.fail_mode),
    );
    let service = TokenService::new(authority.clone());

    info!(
        clients = ?service.authority().registry().client_ids(),
        token_lifetime_secs = authority.token_lifetime().as_secs(),
        "JWT service ready"
    );

    let cause = shutdown_signal().await;
    info!(cause, "Shutting down");

    authority.close().await;
    info!("JWT service stopped");
    Ok(())
}

async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    }
}
