use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use lokok_backend::{
    config::{get_config, init_config},
    config::StorageBackend,
    database::pool::create_pool,
    middleware::auth::{require_admin, require_auth, require_manager_or_admin},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool).await?;

    if let (Some(email), Some(password)) = (
        &config.bootstrap_admin_email,
        &config.bootstrap_admin_password,
    ) {
        app_state.user_service.bootstrap_admin(email, password).await?;
    }

    // On the Excel backend, a missing workbook file is fetched once at startup
    // when remote sources are configured. Failure is not fatal; the store just
    // starts empty and an admin can refresh later.
    if config.storage_backend == StorageBackend::Excel
        && !config.workbook_urls.is_empty()
        && tokio::fs::metadata(&config.workbook_path).await.is_err()
    {
        info!("Workbook file missing, fetching from configured sources...");
        match app_state.workbook_service.refresh().await {
            Ok(source) => info!(?source, "workbook fetched"),
            Err(e) => warn!(error = %e, "startup workbook fetch failed"),
        }
    }

    let public_api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/auth/login", post(routes::auth::login))
        .layer(axum::middleware::from_fn_with_state(
            lokok_backend::middleware::rate_limit::new_rps_state(config.public_rps),
            lokok_backend::middleware::rate_limit::rps_middleware,
        ));

    let session_api = Router::new()
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/suppliers",
            get(routes::suppliers::list_suppliers)
                .post(routes::suppliers::create_supplier)
                .patch(routes::suppliers::update_supplier)
                .delete(routes::suppliers::delete_supplier),
        )
        .route(
            "/api/suppliers/export",
            get(routes::transfer::export_suppliers),
        )
        .route("/api/dashboard/stats", get(routes::dashboard::stats))
        .route(
            "/api/approvals",
            get(routes::approvals::list_approvals).post(routes::approvals::submit_approval),
        )
        .route("/api/approvals/:id", get(routes::approvals::get_approval))
        .route(
            "/api/approvals/:id/task",
            axum::routing::patch(routes::approvals::update_task),
        )
        .layer(axum::middleware::from_fn(require_auth));

    let manager_api = Router::new()
        .route(
            "/api/approvals/:id/approve",
            post(routes::approvals::approve),
        )
        .route("/api/approvals/:id/reject", post(routes::approvals::reject))
        .route(
            "/api/suppliers/import",
            post(routes::transfer::import_suppliers),
        )
        .layer(axum::middleware::from_fn(require_manager_or_admin));

    let admin_api = Router::new()
        .route(
            "/api/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/api/users/:id",
            get(routes::users::get_user)
                .patch(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route(
            "/api/suppliers/dedup",
            post(routes::suppliers::dedup_suppliers),
        )
        .route(
            "/api/suppliers/refresh",
            post(routes::transfer::refresh_workbook),
        )
        .layer(axum::middleware::from_fn(require_admin));

    let authed_api = session_api
        .merge(manager_api)
        .merge(admin_api)
        .layer(axum::middleware::from_fn_with_state(
            lokok_backend::middleware::rate_limit::new_rps_state(config.api_rps),
            lokok_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = public_api
        .merge(authed_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
