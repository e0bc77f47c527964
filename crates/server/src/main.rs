use server::config;
use server::db;
use server::routes;
use server::sessions::SessionRegistry;

use std::time::Duration;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::pool::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running migrations...");
    db::pool::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!(
        list_scope = ?config.list_scope,
        delete_policy = ?config.delete_policy,
        timer_tick_ms = config.timer_tick_ms,
        session_idle_minutes = config.session_idle_minutes,
        "Recorder policy"
    );
    let sessions = SessionRegistry::new(pool.clone(), config.recorder(), config.session_idle_ttl());

    // Evict idle sessions once a minute
    tokio::spawn(sessions.clone().run_sweeper(Duration::from_secs(60)));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Specific routes before parameterized ones
    let app = Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        // Session (record / replay screens)
        .route("/api/session", get(routes::session::get_session))
        .route("/api/session/recording", post(routes::session::start_recording))
        .route("/api/session/recording/stop", post(routes::session::stop_recording))
        .route("/api/session/recording/pause", post(routes::session::pause_timer))
        .route("/api/session/recording/resume", post(routes::session::resume_timer))
        .route("/api/session/recording/save", post(routes::session::save_recording))
        .route("/api/session/moves", post(routes::session::make_move))
        .route("/api/session/replay/next", post(routes::session::replay_next))
        .route("/api/session/replay/prev", post(routes::session::replay_prev))
        .route("/api/session/replay/seek", post(routes::session::replay_seek))
        .route("/api/session/replay/{game_id}", post(routes::session::open_replay))
        .route("/api/session/back", post(routes::session::back))
        // Saved recordings
        .route("/api/recordings", get(routes::recordings::list_recordings))
        .route(
            "/api/recordings/{id}",
            get(routes::recordings::get_recording).delete(routes::recordings::delete_recording),
        )
        .route("/api/recordings/{id}/pgn", get(routes::recordings::get_recording_pgn))
        .route("/api/recordings/{id}/position", get(routes::recordings::get_position))
        // Shared state
        .layer(Extension(pool))
        .layer(Extension(config.clone()))
        .layer(Extension(sessions))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
