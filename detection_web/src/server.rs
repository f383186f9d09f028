use crate::{
    backend::DetectionBackend, config::Config, router::RouteTable, routes::api_routes,
    telemetry::Metrics,
};
use axum::{extract::DefaultBodyLimit, Router};
use axum_otel_metrics::HttpMetricsLayerBuilder;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};

#[derive(Clone)]
pub struct SharedState {
    pub backend: Arc<dyn DetectionBackend>,
    pub routes: Arc<RouteTable>,
    pub metrics: Arc<Metrics>,
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(backend: Arc<dyn DetectionBackend>, config: &Config) -> anyhow::Result<Self> {
        config.router.validate().map_err(anyhow::Error::msg)?;
        let addr = config.server.get_address();

        let metrics = Arc::new(Metrics::new()?);
        let metrics_layer = HttpMetricsLayerBuilder::new().build();
        let routes = Arc::new(RouteTable::new(&config.router.base_path));

        let app_state = SharedState {
            backend,
            routes: routes.clone(),
            metrics,
        };

        let router = Router::new()
            .merge(
                routes
                    .mount()
                    .layer(DefaultBodyLimit::max(config.server.max_upload_bytes)),
            )
            .merge(api_routes())
            .with_state(app_state)
            .layer(metrics_layer);

        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(
        self,
        shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("Starting app on {}", self.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let mut shutdown_rx = shutdown_rx.resubscribe();
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await.ok();
                })
                .await?;
            tracing::info!("Server stopped");
            Ok(())
        });

        Ok(server_handle)
    }
}
