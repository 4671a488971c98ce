use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{InMemoryUserRepository, PgUserRepository, UserRepository};
use crate::config::{DatabaseConfig, StoreConfig};
use crate::todos::{InMemoryTodoRepository, PgTodoRepository, TodoRepository};

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Errors raised by the record stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("unique constraint violated")]
    UniqueViolation,

    /// Any other database failure
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Store unavailable or failed outside the database driver
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

// Not a blanket `From`: every conversion has to go through the classifier.
impl StoreError {
    /// Classify a sqlx error, separating unique violations from everything else
    pub fn from_sqlx(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation;
            }
        }
        StoreError::Database(error)
    }
}

/// Creates and configures a PostgreSQL connection pool
///
/// # Example
/// ```no_run
/// # async fn run(config: todo_api::config::DatabaseConfig) -> Result<(), sqlx::Error> {
/// let pool = todo_api::db::create_pool(&config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    tracing::debug!(
        "Creating database connection pool (max_connections={})",
        config.max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Migrations completed successfully");
    Ok(())
}

/// Record stores handed to the services
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub todos: Arc<dyn TodoRepository>,
}

/// Open the configured backend, migrating PostgreSQL before use
pub async fn open_stores(config: &StoreConfig) -> Result<Stores, StoreError> {
    match config {
        StoreConfig::Postgres(database) => {
            let pool = create_pool(database).await.map_err(StoreError::from_sqlx)?;
            run_migrations(&pool)
                .await
                .map_err(|e| StoreError::Unavailable(format!("migration failed: {}", e)))?;

            Ok(Stores {
                users: Arc::new(PgUserRepository::new(pool.clone())),
                todos: Arc::new(PgTodoRepository::new(pool)),
            })
        }
        StoreConfig::InMemory => {
            tracing::warn!("Using in-memory store; all data is lost on shutdown");
            Ok(Stores {
                users: Arc::new(InMemoryUserRepository::new()),
                todos: Arc::new(InMemoryTodoRepository::new()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todos::{NewTodo, TodoCriteria};

    #[tokio::test]
    async fn test_in_memory_stores_are_usable() {
        let stores = open_stores(&StoreConfig::InMemory).await.unwrap();

        let user = stores.users.create_user("alice", "hash").await.unwrap();
        let todo = stores
            .todos
            .create(NewTodo {
                user_id: user.id,
                name: "buy milk".to_string(),
            })
            .await
            .unwrap();

        let found = stores
            .todos
            .find_owned(TodoCriteria {
                id: todo.id,
                user_id: user.id,
            })
            .await
            .unwrap();
        assert_eq!(found, Some(todo));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_store_error() {
        let config = StoreConfig::Postgres(DatabaseConfig {
            url: "postgres://todo:pw@127.0.0.1:1/todos".to_string(),
            max_connections: 1,
        });

        let result = open_stores(&config).await;
        assert!(matches!(result, Err(StoreError::Database(_))));
    }
}
