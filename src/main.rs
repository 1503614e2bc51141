use std::sync::Arc;

use anyhow::Context;
use axum::{http::HeaderValue, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_api::{auth::TokenKeys, config::Config, db, route::create_router, AppState};

// Entry point of the application
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv::dotenv().is_err() {
        eprintln!(".env file not found, using system environment variables");
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr = config.socket_addr()?;
    let frontend_origin: HeaderValue = config
        .frontend_origin
        .parse()
        .with_context(|| format!("invalid FRONTEND_ORIGIN {:?}", config.frontend_origin))?;

    let pool = db::connect(&config.database_url, config.database_max_connections)
        .await
        .context("failed to connect to the database")?;
    db::migrate(&pool).await.context("failed to migrate the database")?;

    let app_state = Arc::new(AppState::new(
        pool,
        TokenKeys::new(&config.jwt_secret, config.jwt_expiration_hours),
    ));
    let app = create_router(app_state, frontend_origin);

    tracing::info!("Server starting at http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("   POST   /api/register    - Register a new user");
    tracing::info!("   POST   /api/login       - Login and get JWT token");
    tracing::info!("   GET    /api/todos       - List your todos (auth required)");
    tracing::info!("   POST   /api/todos       - Create a todo (auth required)");
    tracing::info!("   PUT    /api/todos/:id   - Update a todo (auth required)");
    tracing::info!("   DELETE /api/todos/:id   - Delete a todo (auth required)");

    Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("server error")?;

    Ok(())
}
