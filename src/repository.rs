//! SQL access for users and todos.
//!
//! Every todo statement carries `user_id = ?` and `deleted_at IS NULL` in
//! its WHERE clause, so a caller can only ever see or touch its own rows.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, Result},
    model::{Todo, User, UserInfo},
};

const TODO_COLUMNS: &str = "id, title, completed, user_id, created_at, updated_at";

pub async fn insert_user(pool: &SqlitePool, username: &str, password_hash: &str) -> Result<UserInfo> {
    let now = Utc::now();
    let result = sqlx::query_as::<_, UserInfo>(
        "INSERT INTO users (username, password, created_at, updated_at) VALUES (?, ?, ?, ?) \
         RETURNING id, username, created_at, updated_at",
    )
    .bind(username)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await;

    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AppError::Conflict("username already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn find_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password, created_at, updated_at FROM users \
         WHERE username = ? AND deleted_at IS NULL",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn list_todos(pool: &SqlitePool, user_id: i64) -> Result<Vec<Todo>> {
    let todos = sqlx::query_as::<_, Todo>(&format!(
        "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = ? AND deleted_at IS NULL ORDER BY id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(todos)
}

pub async fn create_todo(pool: &SqlitePool, user_id: i64, title: &str, completed: bool) -> Result<Todo> {
    let now = Utc::now();
    let todo = sqlx::query_as::<_, Todo>(&format!(
        "INSERT INTO todos (title, completed, user_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?) \
         RETURNING {TODO_COLUMNS}"
    ))
    .bind(title)
    .bind(completed)
    .bind(user_id)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await;

    match todo {
        Ok(todo) => Ok(todo),
        // A validly signed token whose user no longer exists.
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
            Err(AppError::Auth("invalid or expired token".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Applies the supplied fields; `None` keeps the stored value. Returns
/// `None` when the todo doesn't exist or belongs to someone else.
pub async fn update_todo(
    pool: &SqlitePool,
    user_id: i64,
    todo_id: i64,
    title: Option<&str>,
    completed: Option<bool>,
) -> Result<Option<Todo>> {
    let todo = sqlx::query_as::<_, Todo>(&format!(
        "UPDATE todos SET title = COALESCE(?, title), completed = COALESCE(?, completed), updated_at = ? \
         WHERE id = ? AND user_id = ? AND deleted_at IS NULL \
         RETURNING {TODO_COLUMNS}"
    ))
    .bind(title)
    .bind(completed)
    .bind(Utc::now())
    .bind(todo_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(todo)
}

/// Soft-deletes the todo. Returns `false` if there was nothing of the
/// caller's to delete.
pub async fn delete_todo(pool: &SqlitePool, user_id: i64, todo_id: i64) -> Result<bool> {
    let rows_affected = sqlx::query(
        "UPDATE todos SET deleted_at = ? WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
    )
    .bind(Utc::now())
    .bind(todo_id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn test_pool() -> SqlitePool {
        let pool = db::connect_in_memory().await.unwrap();
        db::migrate(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let pool = test_pool().await;
        insert_user(&pool, "alice", "hash-1").await.unwrap();
        let err = insert_user(&pool, "alice", "hash-2").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn lookup_returns_stored_hash() {
        let pool = test_pool().await;
        let created = insert_user(&pool, "alice", "hash-1").await.unwrap();

        let found = find_user_by_username(&pool, "alice").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password, "hash-1");
        assert!(find_user_by_username(&pool, "bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_update_keeps_unsupplied_fields() {
        let pool = test_pool().await;
        let owner = insert_user(&pool, "alice", "hash").await.unwrap();
        let todo = create_todo(&pool, owner.id, "x", false).await.unwrap();

        let done = update_todo(&pool, owner.id, todo.id, None, Some(true)).await.unwrap().unwrap();
        assert_eq!((done.title.as_str(), done.completed), ("x", true));

        let renamed = update_todo(&pool, owner.id, todo.id, Some("y"), None).await.unwrap().unwrap();
        assert_eq!((renamed.title.as_str(), renamed.completed), ("y", true));

        let reopened = update_todo(&pool, owner.id, todo.id, Some(""), Some(false)).await.unwrap().unwrap();
        assert_eq!((reopened.title.as_str(), reopened.completed), ("", false));
    }

    #[tokio::test]
    async fn other_users_rows_are_invisible() {
        let pool = test_pool().await;
        let alice = insert_user(&pool, "alice", "hash").await.unwrap();
        let bob = insert_user(&pool, "bob", "hash").await.unwrap();
        let todo = create_todo(&pool, bob.id, "bob's", false).await.unwrap();

        assert!(list_todos(&pool, alice.id).await.unwrap().is_empty());
        assert!(update_todo(&pool, alice.id, todo.id, Some("mine"), None).await.unwrap().is_none());
        assert!(!delete_todo(&pool, alice.id, todo.id).await.unwrap());

        let bobs = list_todos(&pool, bob.id).await.unwrap();
        assert_eq!(bobs, vec![todo]);
    }

    #[tokio::test]
    async fn create_for_unknown_owner_is_an_auth_error() {
        let pool = test_pool().await;
        let err = create_todo(&pool, 999, "orphan", false).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
        assert!(list_todos(&pool, 999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_todos_stay_gone() {
        let pool = test_pool().await;
        let owner = insert_user(&pool, "alice", "hash").await.unwrap();
        let todo = create_todo(&pool, owner.id, "temp", false).await.unwrap();

        assert!(delete_todo(&pool, owner.id, todo.id).await.unwrap());
        assert!(!delete_todo(&pool, owner.id, todo.id).await.unwrap());
        assert!(list_todos(&pool, owner.id).await.unwrap().is_empty());
        assert!(update_todo(&pool, owner.id, todo.id, None, Some(true)).await.unwrap().is_none());

        // The row is kept, only marked.
        let (marked,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM todos WHERE id = ? AND deleted_at IS NOT NULL")
                .bind(todo.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(marked, 1);
    }
}
