use std::{net::SocketAddr, sync::Arc};

use axum::{routing::get, Router};
use http::HeaderValue;
use tokio::{signal, sync::mpsc};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use marketplace_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);
    api::handlers::health::init_start_time();

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db_arc = Arc::new(db_pool);

    // Init Redis client only when a backend asks for it (construction only;
    // connection checked in health)
    let needs_redis = cfg.cart_backend.eq_ignore_ascii_case("redis")
        || cfg.notification_backend.eq_ignore_ascii_case("redis");
    let redis_client = if needs_redis {
        Some(Arc::new(redis::Client::open(cfg.redis_url.clone())?))
    } else {
        None
    };

    // Init events
    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_sender = Arc::new(api::events::EventSender::new(event_tx));
    tokio::spawn(api::events::process_events(event_rx));

    // Session cart storage
    let cart_store: Arc<dyn api::cart::CartStore> = match (
        cfg.cart_backend.to_ascii_lowercase().as_str(),
        redis_client.as_ref(),
    ) {
        ("redis", Some(client)) => {
            info!("Using Redis-backed session carts");
            Arc::new(api::cart::RedisCartStore::new(
                client.clone(),
                cfg.cart_ttl_secs,
            ))
        }
        _ => {
            info!(
                "Using in-memory session carts (ttl {}s)",
                cfg.cart_ttl_secs
            );
            Arc::new(api::cart::InMemoryCartStore::new(Some(cfg.cart_ttl())))
        }
    };

    // Notification delivery
    let notifier: Arc<dyn api::notifications::NotificationSink> = match (
        cfg.notification_backend.to_ascii_lowercase().as_str(),
        redis_client.as_ref(),
    ) {
        ("redis", Some(client)) => {
            info!("Queueing notifications on Redis list {}", cfg.notification_queue);
            Arc::new(api::notifications::RedisSink::new(
                client.clone(),
                cfg.notification_queue.clone(),
            ))
        }
        _ => Arc::new(api::notifications::LogSink),
    };

    let config = Arc::new(cfg.clone());

    // Aggregate app services used by HTTP handlers
    let services = api::handlers::AppServices::new(
        db_arc.clone(),
        event_sender.clone(),
        config.clone(),
        cart_store,
        notifier,
    );

    // Compose shared app state
    let app_state = api::AppState {
        db: db_arc,
        config,
        event_sender,
        services,
        redis: redis_client,
    };

    // Build CORS layer from config
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(cfg.cors_allow_credentials)
    } else if cfg.should_allow_permissive_cors() {
        info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        error!("Missing CORS configuration detected; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
        return Err("Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true".into());
    };

    // Build router: root + health + full v1 API + Swagger UI
    let app = Router::<api::AppState>::new()
        .route("/", get(|| async { "marketplace-api up" }))
        .nest("/api/v1", api::api_v1_routes())
        .nest("/health", api::handlers::health::health_routes())
        .merge(api::openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(app_state);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    info!("🚀 marketplace-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
