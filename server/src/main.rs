mod config;
mod database;
mod user_store;

use axum::{
    extract::Request,
    middleware,
    response::Html,
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use socialgate_auth::views::home_page_html;
use socialgate_auth::{auth_routes, require_auth, AuthService, AuthState, MemoryUserStore, User, UserStore};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use user_store::SqliteUserStore;

/// How often expired sessions and abandoned logins are swept
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

fn build_router(auth_state: AuthState) -> Router {
    let protected = Router::new()
        .route("/", get(home))
        .route_layer(middleware::from_fn_with_state(auth_state.clone(), require_auth));

    Router::new()
        .nest("/auth", auth_routes())
        .merge(protected)
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(auth_state)
}

async fn home(request: Request) -> Html<String> {
    // require_auth leaves no user behind when authentication is disabled
    match request.extensions().get::<User>() {
        Some(user) => Html(home_page_html(user)),
        None => Html("<h1>SocialGate</h1><p>Authentication is disabled.</p>".to_string()),
    }
}

async fn health_check() -> &'static str {
    "OK"
}

fn bind_addr(config: &config::ServerConfig, port: u16) -> SocketAddr {
    let ip_addr = config.host.parse::<std::net::IpAddr>().unwrap_or_else(|e| {
        tracing::warn!("Failed to parse host '{}': {}. Using 0.0.0.0", config.host, e);
        [0, 0, 0, 0].into()
    });
    SocketAddr::from((ip_addr, port))
}

async fn http_server(config: config::ServerConfig, app: Router) -> std::io::Result<()> {
    let addr = bind_addr(&config, config.http_port);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
}

async fn https_server(config: config::ServerConfig, app: Router) -> std::io::Result<()> {
    let cert_path = config.ssl_cert_path.as_deref().unwrap_or("server.crt");
    let key_path = config.ssl_key_path.as_deref().unwrap_or("server.key");

    let rustls_config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to load SSL certificates (cert: '{}', key: '{}'): {}",
                cert_path,
                key_path,
                e
            );
            e
        })?;

    let addr = bind_addr(&config, config.https_port);

    tracing::info!("HTTPS server listening on {}", addr);
    axum_server::bind_rustls(addr, rustls_config)
        .serve(app.into_make_service())
        .await
}

fn open_user_store(config: &config::DatabaseConfig) -> Result<Arc<dyn UserStore>, rusqlite::Error> {
    match &config.path {
        Some(path) => {
            tracing::info!("Using SQLite user store at {}", path);
            let db = database::init_database(Path::new(path))?;
            Ok(Arc::new(SqliteUserStore::new(db)))
        }
        None => {
            tracing::warn!("No database path configured, users are kept in memory");
            Ok(Arc::new(MemoryUserStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = config::Config::load_or_default();

    tracing_subscriber::fmt()
        .with_max_level(config.logging.max_level())
        .init();

    tracing::info!("Starting SocialGate Server");
    tracing::info!("Configuration loaded:");
    tracing::info!("  HTTP enabled: {}, port: {}", config.server.enable_http, config.server.http_port);
    tracing::info!("  HTTPS enabled: {}, port: {}", config.server.enable_https, config.server.https_port);
    tracing::info!("  Host: {}", config.server.host);
    tracing::info!("  Log level: {}", config.logging.level);
    tracing::info!("  Authentication enabled: {}", config.auth.enable_auth);
    tracing::info!("  Google: {}", config.auth.oauth.enable_google);
    tracing::info!("  Facebook: {}", config.auth.oauth.enable_facebook);

    if config.server.enable_https
        && rustls::crypto::ring::default_provider().install_default().is_err()
    {
        tracing::warn!("A rustls crypto provider was already installed");
    }

    let store = open_user_store(&config.database)?;
    let auth_service = Arc::new(AuthService::new(config.auth.clone(), store).await?);
    if auth_service.is_enabled() && !auth_service.has_enabled_providers() {
        tracing::warn!("Authentication is enabled but no providers are configured; nobody can sign in");
    }

    {
        let auth_service = auth_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                auth_service.cleanup_expired().await;
                tracing::debug!("Session cleanup done, {} active", auth_service.session_count().await);
            }
        });
    }

    let app = build_router(AuthState::new(auth_service));

    let mut tasks = Vec::new();

    if config.server.enable_http {
        let http_config = config.server.clone();
        let app = app.clone();
        tasks.push(tokio::spawn(async move { http_server(http_config, app).await }));
    } else {
        tracing::info!("HTTP server disabled in configuration");
    }

    if config.server.enable_https {
        let https_config = config.server.clone();
        let app = app.clone();
        tasks.push(tokio::spawn(async move { https_server(https_config, app).await }));
    } else {
        tracing::info!("HTTPS server disabled in configuration");
    }

    if tasks.is_empty() {
        tracing::error!("No servers enabled! Please enable at least one server (HTTP or HTTPS) in the configuration.");
        return Err("No servers enabled".into());
    }

    // Servers only return on error
    for task in tasks {
        task.await??;
    }

    Ok(())
}
