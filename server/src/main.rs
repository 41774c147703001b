use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;

use grid_server::{grpc, storage, BIND_ENV, DEFAULT_BIND_ADDRESS};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let addr: SocketAddr = std::env::var(BIND_ENV)
        .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string())
        .parse()?;

    let storage = Arc::new(storage::Storage::new());
    let server = grpc::create_server(storage);

    tracing::info!(%addr, "grid server listening");
    Server::builder()
        .add_service(server)
        .serve_with_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "unable to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("grid server stopped");
    Ok(())
}
