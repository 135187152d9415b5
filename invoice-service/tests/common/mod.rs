use invoice_service::config::InvoiceConfig;
use invoice_service::services::MongoDb;
use invoice_service::startup::Application;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: MongoDb,
    pub db_name: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        std::env::set_var("MONGODB_URI", "mongodb://localhost:27017");

        let db_name = format!("invoice_test_{}", Uuid::new_v4());

        let mut config = InvoiceConfig::load().expect("Failed to load configuration");
        config.common.port = 0; // Random port for testing
        config.mongodb.database = db_name.clone();

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            db_name,
        }
    }

    /// Cleanup test resources (drops the per-test database).
    pub async fn cleanup(&self) {
        let _ = self.db.client().database(&self.db_name).drop(None).await;
    }
}

/// POST an invoice and return the creation response body; asserts 201.
pub async fn create_invoice(app: &TestApp, base: &str, body: serde_json::Value) -> serde_json::Value {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}{}", app.address, base))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(reqwest::StatusCode::CREATED, response.status());
    response.json().await.expect("Failed to parse JSON")
}

/// Fetch a single invoice by path and return the body; asserts 200.
pub async fn get_invoice(app: &TestApp, path: &str) -> serde_json::Value {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}{}", app.address, path))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(reqwest::StatusCode::OK, response.status());
    response.json().await.expect("Failed to parse JSON")
}

/// Invoice-number prefix expected for invoices created right now.
pub fn current_month_prefix(kind_prefix: &str) -> String {
    use chrono::{Datelike, Utc};
    let now = Utc::now();
    format!("{}/{}/{:02}/", kind_prefix, now.year(), now.month())
}
