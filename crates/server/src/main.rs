//! socialdist server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sea_orm::DatabaseConnection;
use socialdist_api::AppState;
use socialdist_common::{AppError, Config, PeerConfig};
use socialdist_core::{NodeService, RegisterNodeInput, Representer};
use socialdist_federation::{AdapterRegistry, HttpTransport, RemoteResolver};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    map_response_body::MapResponseBodyLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "socialdist=debug,tower_http=debug".into());

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

/// Register configured peers that are not known yet.
async fn seed_peers(db: Arc<DatabaseConnection>, registry: Arc<AdapterRegistry>, peers: &[PeerConfig]) {
    let nodes = NodeService::new(
        socialdist_db::repositories::NodeRepository::new(db),
        registry,
    );

    for peer in peers {
        let input = RegisterNodeInput {
            host: peer.host.clone(),
            display_name: peer.display_name.clone(),
            prefix: peer.prefix.clone(),
            auth_username: peer.auth_username.clone(),
            auth_password: peer.auth_password.clone(),
            node_username: peer.node_username.clone(),
            node_password: peer.node_password.clone(),
            adapter: peer.adapter.clone(),
        };
        match nodes.register(input).await {
            Ok(node) => info!(node = %node.id, host = %node.host, "Registered peer from config"),
            Err(AppError::Conflict(reason)) => {
                info!(host = %peer.host, reason = %reason, "Peer already registered");
            }
            Err(e) => warn!(host = %peer.host, error = %e, "Skipping configured peer"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(config.logging.json);

    info!("Starting socialdist server...");

    let db = Arc::new(socialdist_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    socialdist_db::migrate(&db).await?;
    info!("Migrations completed");

    let registry = Arc::new(AdapterRegistry::builtin());
    let transport = Arc::new(HttpTransport::new(&config.federation, config.base_url())?);
    let resolver = RemoteResolver::new(db.clone(), registry.clone(), transport)
        .with_enabled(config.federation.enabled);
    if !config.federation.enabled {
        warn!("Federation is disabled; remote lookups will miss");
    }

    seed_peers(db.clone(), registry.clone(), &config.federation.peers).await;

    let state = AppState::new(
        db,
        registry,
        resolver,
        Representer::from_config(&config),
    );

    let app: Router = socialdist_api::app(state, &config.federation.api_prefix).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.federation.request_timeout_secs * 2,
            )))
            .layer(MapResponseBodyLayer::new(axum::body::Body::new))
            .layer(RequestBodyLimitLayer::new(BODY_LIMIT)),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
