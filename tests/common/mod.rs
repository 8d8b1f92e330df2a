use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use marketplace_api::{
    cart::InMemoryCartStore,
    config::AppConfig,
    db,
    entities::{product, ProductType},
    events::{self, EventSender},
    handlers::AppServices,
    notifications::LogSink,
    AppState,
};

/// Helper harness for spinning up an application state backed by a
/// throwaway SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: tempfile::TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("marketplace_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "redis://127.0.0.1:6379".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.download_root = db_dir.path().join("downloads").display().to_string();
        std::fs::create_dir_all(&cfg.download_root).expect("create test download root");

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let config = Arc::new(cfg);
        let services = AppServices::new(
            db_arc.clone(),
            event_sender.clone(),
            config.clone(),
            Arc::new(InMemoryCartStore::new(None)),
            Arc::new(LogSink),
        );

        let state = AppState {
            db: db_arc,
            config,
            event_sender,
            services,
            redis: None,
        };

        let router = Router::new()
            .nest("/api/v1", marketplace_api::api_v1_routes())
            .nest("/health", marketplace_api::handlers::health::health_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Directory download files resolve under for this app instance.
    #[allow(dead_code)]
    pub fn download_root(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.state.config.download_root)
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    /// Send a JSON request with extra headers (session id, customer id).
    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Insert a catalogue product directly, bypassing the API surface.
    #[allow(dead_code)]
    pub async fn seed_product(
        &self,
        title: &str,
        product_type: ProductType,
        price: Decimal,
        physical: bool,
        download_file: Option<&str>,
    ) -> product::Model {
        let slug = title.to_lowercase().replace(' ', "-");
        product::ActiveModel {
            title: Set(title.to_string()),
            slug: Set(slug),
            product_type: Set(product_type),
            price: Set(Some(price)),
            download_file: Set(download_file.map(str::to_string)),
            is_physical: Set(physical),
            is_downloadable: Set(download_file.is_some()),
            requires_demo: Set(false),
            is_active: Set(true),
            is_featured: Set(false),
            display_order: Set(0),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Parse a serialized money field. Values compare by magnitude because the
/// SQLite round-trip does not preserve decimal scale.
#[allow(dead_code)]
pub fn money(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("money fields serialize as strings")
        .parse()
        .expect("money fields hold valid decimals")
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body should be json")
}

/// Read a response body as raw bytes.
#[allow(dead_code)]
pub async fn read_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body")
        .to_vec()
}
