use showcase_service::config::ShowcaseConfig;
use showcase_service::services::annotator::{Annotator, MockAnnotator};
use showcase_service::services::MongoDb;
use showcase_service::startup::Application;
use std::sync::Arc;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub db: MongoDb,
    pub db_name: String,
    pub staging_dir: String,
}

impl TestApp {
    /// Spawn with a succeeding mock annotator; the returned handle exposes
    /// the call counter.
    pub async fn spawn() -> (Self, Arc<MockAnnotator>) {
        let annotator = Arc::new(MockAnnotator::new());
        let app = Self::spawn_with_annotator(annotator.clone()).await;
        (app, annotator)
    }

    /// Spawn with a mock annotator that fails every call.
    pub async fn spawn_failing() -> (Self, Arc<MockAnnotator>) {
        let annotator = Arc::new(MockAnnotator::failing());
        let app = Self::spawn_with_annotator(annotator.clone()).await;
        (app, annotator)
    }

    pub async fn spawn_with_annotator(annotator: Arc<dyn Annotator>) -> Self {
        let db_name = format!("showcase_test_{}", Uuid::new_v4());
        Self::spawn_in_database(db_name, annotator).await
    }

    /// Spawn against a caller-chosen database; used when a test double needs
    /// its own handle on the same collection the app writes.
    pub async fn spawn_in_database(db_name: String, annotator: Arc<dyn Annotator>) -> Self {
        std::env::set_var("MONGODB_URI", "mongodb://localhost:27017");
        std::env::set_var("GOOGLE_API_KEY", "test-api-key");

        let staging_dir = format!("target/test-staging-{}", Uuid::new_v4());

        let mut config = ShowcaseConfig::load().expect("Failed to load configuration");
        config.common.port = 0; // Random port for testing
        config.mongodb.database = db_name.clone();
        config.staging.dir = staging_dir.clone();

        let app = Application::build_with_annotator(config, annotator)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint.
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
            db,
            db_name,
            staging_dir,
        }
    }

    /// Multipart form with both required fields.
    pub fn submission_form(email: &str, bytes: Vec<u8>, mime: &str) -> reqwest::multipart::Form {
        reqwest::multipart::Form::new()
            .text("email", email.to_string())
            .part(
                "image",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name("can.jpg")
                    .mime_str(mime)
                    .unwrap(),
            )
    }

    /// True when no staged file is left behind.
    pub fn staging_dir_is_empty(&self) -> bool {
        match std::fs::read_dir(&self.staging_dir) {
            Ok(entries) => entries.count() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => panic!("failed to read staging dir: {}", e),
        }
    }

    /// Cleanup test resources (database and staging directory).
    pub async fn cleanup(&self) {
        let _ = self.db.client().database(&self.db_name).drop(None).await;
        let _ = tokio::fs::remove_dir_all(&self.staging_dir).await;
    }
}
