use std::sync::Arc;

use anyhow::{Context, Result};
use customers_api::{
    build_router,
    config::AppConfig,
    listeners::{register_listeners, CUSTOMERS_MAP},
    models::Customer,
    state::AppState,
};
use grid_map::{NamedMap, Session};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("failed to load application configuration")?;

    // Without the backing map there is nothing to serve: fail startup.
    let session = Session::connect_with_timeout(
        config.grid_address.clone(),
        config.grid_connect_timeout,
    )
    .await
    .with_context(|| format!("failed to connect to grid server at {}", config.grid_address))?;
    info!(address = %session.address(), "connected to grid server");

    let customers: Arc<dyn NamedMap<i64, Customer>> =
        Arc::new(session.get_map::<i64, Customer>(CUSTOMERS_MAP));

    let registrations = register_listeners(customers.as_ref())
        .await
        .context("failed to register customer listeners")?;

    let app = build_router(AppState::new(Arc::clone(&customers)));

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "customers api started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Err(err) = registrations.deregister(customers.as_ref()).await {
        warn!(error = %err, "failed to remove customer listeners");
    }
    session.close();
    info!("customers api stopped");

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("customers_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
