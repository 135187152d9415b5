use crate::config::InvoiceConfig;
use crate::handlers;
use crate::services::MongoDb;
use axum::{
    routing::{get, patch, post},
    Router,
};
use service_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: InvoiceConfig,
    pub db: MongoDb,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: InvoiceConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let state = AppState {
            config: config.clone(),
            db: db.clone(),
        };

        // The second segment is dynamic for default-type routes (it carries
        // the invoice id) and for the payment/status routes (it carries the
        // type selector); the static `hotel` segment takes precedence over
        // the capture, which is why both route families can coexist.
        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .route(
                "/invoices",
                get(handlers::list_general_invoices).post(handlers::create_general_invoice),
            )
            .route(
                "/invoices/hotel",
                get(handlers::list_hotel_invoices).post(handlers::create_hotel_invoice),
            )
            .route(
                "/invoices/:selector",
                get(handlers::get_general_invoice).delete(handlers::delete_general_invoice),
            )
            .route(
                "/invoices/hotel/:id",
                get(handlers::get_hotel_invoice).delete(handlers::delete_hotel_invoice),
            )
            .route("/invoices/:selector/:id/payment", post(handlers::add_payment))
            .route("/invoices/:selector/:id/status", patch(handlers::set_status))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn db(&self) -> &MongoDb {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
