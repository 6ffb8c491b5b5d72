use crate::config::ShowcaseConfig;
use crate::error::AppError;
use crate::handlers;
use crate::services::annotator::{Annotator, GeminiAnnotator, GeminiConfig};
use crate::services::{MongoDb, ProductCatalog};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state. Clients are constructed once at startup and
/// injected here rather than held as process globals.
#[derive(Clone)]
pub struct AppState {
    pub config: ShowcaseConfig,
    pub db: MongoDb,
    pub annotator: Arc<dyn Annotator>,
    pub catalog: Arc<ProductCatalog>,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the Gemini annotator.
    pub async fn build(config: ShowcaseConfig) -> Result<Self, AppError> {
        let gemini_config = GeminiConfig {
            api_key: config.google.api_key.clone(),
            model: config.google.model.clone(),
        };
        let annotator: Arc<dyn Annotator> = Arc::new(GeminiAnnotator::new(gemini_config));
        tracing::info!(model = %config.google.model, "Initialized Gemini annotator");

        Self::build_with_annotator(config, annotator).await
    }

    /// Build with an externally supplied annotator; tests inject a double
    /// through this seam.
    pub async fn build_with_annotator(
        config: ShowcaseConfig,
        annotator: Arc<dyn Annotator>,
    ) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;

        let catalog = Arc::new(ProductCatalog::load(&config.catalog.path).await.map_err(
            |e| {
                tracing::error!(
                    "Failed to load product catalog from {}: {}",
                    config.catalog.path,
                    e
                );
                e
            },
        )?);

        let state = AppState {
            config: config.clone(),
            db,
            annotator,
            catalog,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Server running on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn db(&self) -> &MongoDb {
        &self.state.db
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/upload", post(handlers::upload))
            .route("/upload-creation", post(handlers::upload_creation))
            .route("/leaderboard", get(handlers::leaderboard))
            // Uploads carry whole images in memory; no size cap is enforced.
            .layer(DefaultBodyLimit::disable())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        axum::serve(self.listener, app).await
    }
}
