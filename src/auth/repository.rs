// User record store

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::models::User;
use crate::db::StoreError;

/// Persistence operations for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with `StoreError::UniqueViolation` on a taken username.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Find a user by exact username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }
}

#[derive(Default)]
struct UserTable {
    rows: Vec<User>,
    next_id: i32,
}

/// In-process user repository
///
/// Same contract as the PostgreSQL one: monotonic ids, unique usernames.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    table: Arc<RwLock<UserTable>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut table = self.table.write().await;
        if table.rows.iter().any(|u| u.username == username) {
            return Err(StoreError::UniqueViolation);
        }

        table.next_id += 1;
        let user = User {
            id: table.next_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        table.rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|u| u.username == username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_ids_are_monotonic() {
        let repo = InMemoryUserRepository::new();
        let a = repo.create_user("alice", "h1").await.unwrap();
        let b = repo.create_user("bob", "h2").await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn test_in_memory_rejects_duplicate_username() {
        let repo = InMemoryUserRepository::new();
        repo.create_user("alice", "h1").await.unwrap();
        let err = repo.create_user("alice", "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));
    }

    #[tokio::test]
    async fn test_in_memory_lookup_is_exact() {
        let repo = InMemoryUserRepository::new();
        repo.create_user("alice", "h1").await.unwrap();

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "h1");
        assert!(repo.find_by_username("Alice").await.unwrap().is_none());
        assert!(repo.find_by_username("carol").await.unwrap().is_none());
    }

    async fn create_test_pool() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set for database tests");
        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    fn unique_username(prefix: &str) -> String {
        format!("{}_{}", prefix, Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_pg_create_and_find_user() {
        let repo = PgUserRepository::new(create_test_pool().await);
        let username = unique_username("pg_user");

        let created = repo.create_user(&username, "hash").await.unwrap();
        let found = repo.find_by_username(&username).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash, "hash");
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_pg_duplicate_username_is_unique_violation() {
        let repo = PgUserRepository::new(create_test_pool().await);
        let username = unique_username("pg_dup");

        repo.create_user(&username, "hash").await.unwrap();
        let err = repo.create_user(&username, "hash").await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));
    }
}
