use std::{net::SocketAddr, sync::Arc};

use axum::{Router, routing::get};
use modelgraph_core::{DynStore, ModelRegistry, RegistryError, StaticRegistry, StoreError};
use modelgraph_db_memory::InMemoryStore;
use modelgraph_graphql::{GraphQLState, SchemaError, build_schema, graphql_router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppConfig, handlers};

/// Failures while assembling the server. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("model registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("graphql schema: {0}")]
    Schema(#[from] SchemaError),
    #[error("fixtures: {0}")]
    Fixtures(#[from] StoreError),
}

pub struct ModelgraphServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(cfg: &AppConfig, graphql: GraphQLState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .merge(graphql_router(graphql))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ServerBuilder {
    config: AppConfig,
    registry: Option<Arc<dyn ModelRegistry>>,
    store: Option<DynStore>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            registry: None,
            store: None,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    /// Uses `registry` instead of reading `models.manifest`.
    pub fn with_registry(mut self, registry: Arc<dyn ModelRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Uses `store` instead of an in-memory store seeded from `models.fixtures`.
    pub fn with_store(mut self, store: DynStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Loads the registry, seeds the store and builds the schema.
    pub fn build(self) -> Result<ModelgraphServer, StartupError> {
        let cfg = self.config;
        let namespace = cfg.graphql.namespace.clone();

        let registry = match self.registry {
            Some(registry) => registry,
            None => {
                let registry = StaticRegistry::from_manifest_path(&cfg.models.manifest)?;
                tracing::info!(
                    manifest = %cfg.models.manifest.display(),
                    apps = ?registry.apps(),
                    "Model manifest loaded"
                );
                Arc::new(registry)
            }
        };

        let store = match self.store {
            Some(store) => store,
            None => {
                let models = registry.list_models(&namespace)?;
                let store = InMemoryStore::with_models(&models);
                if let Some(path) = &cfg.models.fixtures {
                    let loaded = store.load_fixtures_path(&models, path)?;
                    tracing::info!(path = %path.display(), records = loaded, "Store seeded");
                }
                Arc::new(store) as DynStore
            }
        };

        let schema = build_schema(registry, cfg.graphql.to_schema_builder_config())?;
        let app = build_app(&cfg, GraphQLState::new(schema, store));

        Ok(ModelgraphServer {
            addr: cfg.addr(),
            app,
        })
    }
}

impl ModelgraphServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the router, for serving on a custom listener.
    pub fn into_router(self) -> Router {
        self.app
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
