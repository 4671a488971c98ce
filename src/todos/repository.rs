use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::db::StoreError;
use crate::todos::models::{NewTodo, Todo, TodoCriteria, TodoPatch};

/// Persistence operations for todos
///
/// Every lookup and write is scoped by owner through `TodoCriteria`.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// All todos of `user_id`, oldest first
    async fn list_for_owner(&self, user_id: i32) -> Result<Vec<Todo>, StoreError>;

    /// Insert a new todo
    async fn create(&self, new_todo: NewTodo) -> Result<Todo, StoreError>;

    /// Fetch one todo matching id and owner
    async fn find_owned(&self, criteria: TodoCriteria) -> Result<Option<Todo>, StoreError>;

    /// Apply `patch` to the row matching `criteria` and return the new value
    async fn update(
        &self,
        criteria: TodoCriteria,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, StoreError>;
}

/// PostgreSQL-backed todo repository
#[derive(Clone)]
pub struct PgTodoRepository {
    pool: PgPool,
}

impl PgTodoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn list_for_owner(&self, user_id: i32) -> Result<Vec<Todo>, StoreError> {
        sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, name, done_date, created_at, updated_at
            FROM todos
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn create(&self, new_todo: NewTodo) -> Result<Todo, StoreError> {
        sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (user_id, name)
            VALUES ($1, $2)
            RETURNING id, user_id, name, done_date, created_at, updated_at
            "#,
        )
        .bind(new_todo.user_id)
        .bind(&new_todo.name)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn find_owned(&self, criteria: TodoCriteria) -> Result<Option<Todo>, StoreError> {
        sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, name, done_date, created_at, updated_at
            FROM todos
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(criteria.id)
        .bind(criteria.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn update(
        &self,
        criteria: TodoCriteria,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, StoreError> {
        sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET done_date = $1, updated_at = NOW()
            WHERE id = $2 AND user_id = $3
            RETURNING id, user_id, name, done_date, created_at, updated_at
            "#,
        )
        .bind(patch.done_date)
        .bind(criteria.id)
        .bind(criteria.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }
}

#[derive(Default)]
struct TodoTable {
    rows: Vec<Todo>,
    next_id: i32,
}

/// In-process todo repository
///
/// Rows are kept in insertion order, which is also id order.
#[derive(Clone, Default)]
pub struct InMemoryTodoRepository {
    table: Arc<RwLock<TodoTable>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows across all owners
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn selects(todo: &Todo, criteria: TodoCriteria) -> bool {
    todo.id == criteria.id && todo.user_id == criteria.user_id
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn list_for_owner(&self, user_id: i32) -> Result<Vec<Todo>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, new_todo: NewTodo) -> Result<Todo, StoreError> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let now = Utc::now();
        let todo = Todo {
            id: table.next_id,
            user_id: new_todo.user_id,
            name: new_todo.name,
            done_date: None,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(todo.clone());
        Ok(todo)
    }

    async fn find_owned(&self, criteria: TodoCriteria) -> Result<Option<Todo>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|t| selects(t, criteria)).cloned())
    }

    async fn update(
        &self,
        criteria: TodoCriteria,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, StoreError> {
        let mut table = self.table.write().await;
        Ok(table
            .rows
            .iter_mut()
            .find(|t| selects(t, criteria))
            .map(|todo| {
                todo.done_date = patch.done_date;
                todo.updated_at = Utc::now();
                todo.clone()
            }))
    }
}
