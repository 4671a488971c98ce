use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::todos::{
    CreateTodoRequest, NewTodo, Todo, TodoCriteria, TodoPatch, TodoRepository,
};

/// Service layer for todo business logic
///
/// Every method takes the authenticated owner; nothing here can reach
/// another user's rows.
#[derive(Clone)]
pub struct TodoService {
    repository: Arc<dyn TodoRepository>,
}

impl TodoService {
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self { repository }
    }

    /// All todos owned by `user_id`, in creation order
    pub async fn list(&self, user_id: i32) -> Result<Vec<Todo>, ApiError> {
        Ok(self.repository.list_for_owner(user_id).await?)
    }

    /// Validate and store a new todo owned by `user_id`
    ///
    /// Invalid input never reaches the store.
    pub async fn create(&self, user_id: i32, request: CreateTodoRequest) -> Result<Todo, ApiError> {
        request.validate()?;

        let todo = self
            .repository
            .create(NewTodo {
                user_id,
                name: request.name,
            })
            .await?;

        tracing::info!("Created todo id={} for user_id={}", todo.id, user_id);
        Ok(todo)
    }

    /// Set the completion date to now
    pub async fn mark_done(&self, id: i32, user_id: i32) -> Result<Todo, ApiError> {
        self.apply(TodoCriteria { id, user_id }, TodoPatch::mark_done(Utc::now()))
            .await
    }

    /// Clear the completion date
    pub async fn mark_undone(&self, id: i32, user_id: i32) -> Result<Todo, ApiError> {
        self.apply(TodoCriteria { id, user_id }, TodoPatch::mark_undone())
            .await
    }

    // Find then update, not wrapped in a transaction: concurrent toggles of
    // one row resolve as last write wins.
    async fn apply(&self, criteria: TodoCriteria, patch: TodoPatch) -> Result<Todo, ApiError> {
        let not_found = || ApiError::NotFound { resource: "Todo" };

        self.repository
            .find_owned(criteria)
            .await?
            .ok_or_else(not_found)?;

        let updated = self
            .repository
            .update(criteria, patch)
            .await?
            .ok_or_else(not_found)?;

        tracing::debug!(
            "Todo id={} done_date={:?}",
            updated.id,
            updated.done_date
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;
    use crate::todos::InMemoryTodoRepository;
    use async_trait::async_trait;

    fn service() -> (TodoService, InMemoryTodoRepository) {
        let repo = InMemoryTodoRepository::new();
        (TodoService::new(Arc::new(repo.clone())), repo)
    }

    fn request(name: &str) -> CreateTodoRequest {
        CreateTodoRequest {
            name: name.to_string(),
        }
    }

    /// Reads work, writes to existing rows fail
    struct FailingUpdates(InMemoryTodoRepository);

    #[async_trait]
    impl TodoRepository for FailingUpdates {
        async fn list_for_owner(&self, user_id: i32) -> Result<Vec<Todo>, StoreError> {
            self.0.list_for_owner(user_id).await
        }

        async fn create(&self, new_todo: NewTodo) -> Result<Todo, StoreError> {
            self.0.create(new_todo).await
        }

        async fn find_owned(&self, criteria: TodoCriteria) -> Result<Option<Todo>, StoreError> {
            self.0.find_owned(criteria).await
        }

        async fn update(&self, _: TodoCriteria, _: TodoPatch) -> Result<Option<Todo>, StoreError> {
            Err(StoreError::Unavailable("DB error".into()))
        }
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_names_without_writing() {
        let (service, repo) = service();

        for name in [String::new(), "x".repeat(256)] {
            let err = service.create(1, request(&name)).await.unwrap_err();
            assert!(matches!(err, ApiError::ValidationError(_)));
        }
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_done_then_undone_keeps_identity() {
        let (service, _) = service();
        let todo = service.create(1, request("buy milk")).await.unwrap();
        assert_eq!(todo.done_date, None);

        let done = service.mark_done(todo.id, 1).await.unwrap();
        assert!(done.done_date.is_some());

        let undone = service.mark_undone(todo.id, 1).await.unwrap();
        assert_eq!(undone.done_date, None);

        for t in [&done, &undone] {
            assert_eq!(t.id, todo.id);
            assert_eq!(t.name, todo.name);
            assert_eq!(t.user_id, todo.user_id);
        }
    }

    #[tokio::test]
    async fn test_other_users_todo_is_not_found() {
        let (service, _) = service();
        let todo = service.create(1, request("mine")).await.unwrap();

        assert!(matches!(
            service.mark_done(todo.id, 2).await.unwrap_err(),
            ApiError::NotFound { .. }
        ));
        assert!(matches!(
            service.mark_undone(todo.id, 2).await.unwrap_err(),
            ApiError::NotFound { .. }
        ));
        assert!(service.list(2).await.unwrap().is_empty());
        assert_eq!(service.list(1).await.unwrap(), vec![todo]);
    }

    #[tokio::test]
    async fn test_missing_todo_is_not_found() {
        let (service, _) = service();
        assert!(matches!(
            service.mark_done(999, 1).await.unwrap_err(),
            ApiError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_store_failure_on_update_is_internal() {
        let repo = InMemoryTodoRepository::new();
        let service = TodoService::new(Arc::new(FailingUpdates(repo)));
        let todo = service.create(1, request("t")).await.unwrap();

        let err = service.mark_done(todo.id, 1).await.unwrap_err();
        assert!(matches!(err, ApiError::Store(_)));
        let err = service.mark_undone(todo.id, 1).await.unwrap_err();
        assert!(matches!(err, ApiError::Store(_)));
    }
}
