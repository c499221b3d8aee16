use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::{
    auth::require_auth,
    config::Config,
    error::Result,
    routes::{
        admin_dashboard, admin_sync_drive, admin_sync_youtube, change_password, create_news,
        create_sermon, create_user, get_login, get_members, get_news, get_sermons, home, logout,
        members_page, news_page, post_login, sermons_page, sync_drive_endpoint,
        sync_youtube_endpoint, update_member_role,
    },
    Storage, Uploads,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Storage,
    pub uploads: Uploads,
    pub http: reqwest::Client,
}

/// Build and run the Axum server
pub async fn run(config: Config) -> Result<()> {
    tracing::info!("Starting church-rust server");
    tracing::info!("Host: {}:{}", config.host, config.port);
    tracing::info!("Base URL: {}", config.base_url);

    // Initialize storage (connects to database, runs migrations)
    let database_url = config.database_url();
    tracing::info!("Connecting to database: {}", database_url);
    let storage = Storage::new(&database_url).await?;
    tracing::info!("Database initialized at {}", config.db_path.display());

    // Uploads directory, served under /uploads
    tokio::fs::create_dir_all(&config.upload_path).await?;
    let uploads = Uploads::new(config.upload_path.clone());

    // Shared HTTP client for the external catalog APIs
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .build()?;

    let upload_dir = config.upload_path.clone();
    let addr = format!("{}:{}", config.host, config.port);

    // Create application state
    let app_state = AppState {
        config: Arc::new(config),
        storage: storage.clone(),
        uploads,
        http,
    };

    // Create session store (uses same database)
    let session_store = SqliteStore::new(storage.pool().clone());
    session_store
        .migrate()
        .await
        .map_err(|e| crate::error::Error::Internal(format!("Session migration failed: {}", e)))?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(time::Duration::days(7)));

    // Build router
    let app = Router::new()
        // Public pages
        .route("/", get(home))
        .route("/news", get(news_page))
        .route("/sermons", get(sermons_page))
        .route("/login", get(get_login).post(post_login))
        .route("/logout", get(logout))
        // Static files and uploaded blobs
        .nest_service("/static", ServeDir::new("static"))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        // Public API
        .route("/api/news", get(get_news))
        .route("/api/sermons", get(get_sermons))
        // User API (session required)
        .route("/api/user/change-password", post(change_password))
        // Admin pages (session + admin role)
        .route("/admin", get(admin_dashboard))
        .route("/admin/members", get(members_page))
        // Admin API
        .route("/api/admin/members", get(get_members).post(create_user))
        .route("/api/admin/members/:id", patch(update_member_role))
        .route("/api/admin/news", post(create_news))
        .route("/api/admin/sermons", post(create_sermon))
        .route("/api/admin/sync/youtube", post(admin_sync_youtube))
        .route("/api/admin/sync/drive", post(admin_sync_drive))
        // Externally-invoked sync endpoints (bearer token, CORS preflight)
        .route("/api/sync/youtube", post(sync_youtube_endpoint))
        .route("/api/sync/drive", post(sync_drive_endpoint))
        // Add state and middleware
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ))
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
