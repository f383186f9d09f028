use crate::backend::DetectionBackend;
use crate::client::DetectionClient;
use crate::config::Config;
use crate::server::HttpServer;

use std::{error::Error, sync::Arc};
use tokio::{
    signal::{self, unix::SignalKind},
    sync::broadcast,
};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let client = match DetectionClient::new(&config.backend) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to initialize detection client: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let status = client.test_connection().await;
    tracing::info!(
        "Detection backend at {} is {}: {}",
        client.base_url(),
        status.status.as_str(),
        status.message
    );

    let backend: Arc<dyn DetectionBackend> = Arc::new(client);
    let server = HttpServer::new(backend, &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    let received = shutdown_signal().await;
    tracing::info!("{} received, draining requests before exit", received);

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    Ok(())
}

/// Resolves with the name of the signal that asked the app to stop.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl+C: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Cannot listen for SIGTERM: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
