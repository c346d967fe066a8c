use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sat_practice::{app, config::AppConfig, db, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sat_practice=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = AppConfig::load();

  let pool = match db::init_db(&config.database_path) {
    Ok(pool) => pool,
    Err(e) => {
      tracing::error!("Failed to initialize database {}: {}", config.database_path.display(), e);
      return;
    }
  };

  match db::try_lock(&pool).map(|conn| sat_practice::auth::db::cleanup_expired_sessions(&conn)) {
    Ok(Ok(removed)) if removed > 0 => tracing::info!("Removed {} expired auth sessions", removed),
    Ok(Err(e)) => tracing::warn!("Failed to clean up auth sessions: {}", e),
    _ => {}
  }

  let bind_addr = config.bind_addr();
  let port = config.port;
  let app = app(AppState::new(pool, config));

  let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
    Ok(listener) => listener,
    Err(e) => {
      tracing::error!("Failed to bind to {}: {}", bind_addr, e);
      return;
    }
  };

  tracing::info!("Server running on http://localhost:{}", port);

  if let Err(e) = axum::serve(listener, app).await {
    tracing::error!("Server error: {}", e);
  }
}
