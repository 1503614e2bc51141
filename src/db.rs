use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};

// Schema is created on startup if missing; there is no versioned history.
const CREATE_USERS_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    username VARCHAR(50) NOT NULL UNIQUE,
    password TEXT NOT NULL
);"#;

const CREATE_TODOS_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    title TEXT NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT 0,
    user_id INTEGER NOT NULL REFERENCES users(id)
);"#;

const CREATE_TODOS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_todos_user_id ON todos (user_id);";

/// Opens the pool, creating the database file first if it doesn't exist.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        tracing::info!("Creating database {}", database_url);
        Sqlite::create_database(database_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    tracing::info!("Connection to the database is successful");
    Ok(pool)
}

/// A single-connection in-memory database. Every new in-memory connection
/// is a fresh, empty database, so the pool must never open a second one.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in [CREATE_USERS_TABLE, CREATE_TODOS_TABLE, CREATE_TODOS_USER_INDEX] {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("users and todos tables are up to date");
    Ok(())
}
