//! facility-admin server entry point.

use axum::{Router, middleware};
use facility_admin_api::{AppState, middleware::metrics_middleware, router as api_router};
use facility_admin_common::{Config, config::LogFormat};
use facility_admin_core::{CommentService, CommunityStatsService, PostService, ReportService};
use facility_admin_db::repositories::{
    CommentRepository, LikeRepository, PostRepository, ReportRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "facility_admin=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let db = facility_admin_db::init(config)?;

    let comment_repo = CommentRepository::new(db.clone());
    let like_repo = LikeRepository::new(db.clone());
    let report_repo = ReportRepository::new(db.clone());
    let post_repo = PostRepository::new(db.clone());
    let user_repo = UserRepository::new(db, config.datastore.user_table.clone());

    Ok(AppState {
        comment_service: CommentService::new(comment_repo.clone(), like_repo),
        post_service: PostService::new(post_repo.clone()),
        report_service: ReportService::new(
            report_repo.clone(),
            user_repo,
            comment_repo,
            post_repo.clone(),
        ),
        stats_service: CommunityStatsService::new(post_repo, report_repo),
        community: config.community.clone(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(config.logging.format);

    info!("Starting facility-admin server...");

    let state = build_state(&config)?;

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
