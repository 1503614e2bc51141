use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    auth,
    error::{AppError, Result},
    model::{CurrentUser, Todo, UserInfo},
    repository,
    schema::{
        CreateTodoSchema, CredentialsSchema, LoginResponse, UpdateTodoSchema, PASSWORD_MAX_BYTES,
    },
    AppState,
};

// Handler for the health checker route
pub async fn health_checker_handler() -> impl IntoResponse {
    const MESSAGE: &str = "Multi-user todo API with Rust, SQLx, SQLite, and Axum";

    Json(json!({
        "status": "success",
        "message": MESSAGE
    }))
}

// Malformed or mistyped JSON is a validation failure like any other.
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

// An id that can't be parsed can't belong to the caller either.
fn todo_id(id: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    id.map(|Path(id)| id).map_err(|_| AppError::todo_not_found())
}

pub async fn register(
    State(data): State<Arc<AppState>>,
    payload: std::result::Result<Json<CredentialsSchema>, JsonRejection>,
) -> Result<(StatusCode, Json<UserInfo>)> {
    let credentials = body(payload)?;
    credentials.validate()?;

    let password_hash = auth::hash_password(credentials.password, data.password_cost).await?;
    let user = repository::insert_user(&data.db, &credentials.username, &password_hash).await?;

    tracing::info!(user_id = user.id, "registered user {}", user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(data): State<Arc<AppState>>,
    payload: std::result::Result<Json<CredentialsSchema>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let credentials = body(payload)?;

    // bcrypt only looks at the first 72 bytes; a longer password could
    // match a stored one it isn't equal to.
    if credentials.password.len() > PASSWORD_MAX_BYTES {
        return Err(AppError::invalid_credentials());
    }

    // Unknown user and wrong password must look the same to the caller,
    // in content and in timing.
    let user = match repository::find_user_by_username(&data.db, &credentials.username).await? {
        Some(user) => user,
        None => {
            let dummy = data.dummy_hash().await?.to_string();
            auth::verify_password(credentials.password, dummy).await?;
            return Err(AppError::invalid_credentials());
        }
    };

    if !auth::verify_password(credentials.password, user.password.clone()).await? {
        return Err(AppError::invalid_credentials());
    }

    let token = data.tokens.issue(user.id)?;
    Ok(Json(LoginResponse {
        token,
        username: user.username,
    }))
}

// Handler for getting all of the caller's Todo items
pub async fn get_todos(
    State(data): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<Todo>>> {
    let todos = repository::list_todos(&data.db, user.id).await?;
    Ok(Json(todos))
}

// Handler for creating a new Todo
pub async fn create_todo(
    State(data): State<Arc<AppState>>,
    user: CurrentUser,
    payload: std::result::Result<Json<CreateTodoSchema>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>)> {
    let new_todo = body(payload)?;
    new_todo.validate()?;

    let todo =
        repository::create_todo(&data.db, user.id, &new_todo.title, new_todo.completed).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

// Handler for updating a Todo by ID
pub async fn update_todo(
    State(data): State<Arc<AppState>>,
    user: CurrentUser,
    id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<UpdateTodoSchema>, JsonRejection>,
) -> Result<Json<Todo>> {
    let id = todo_id(id)?;
    let changes = body(payload)?;

    repository::update_todo(
        &data.db,
        user.id,
        id,
        changes.title.as_deref(),
        changes.completed,
    )
    .await?
    .map(Json)
    .ok_or_else(AppError::todo_not_found)
}

// Handler for deleting a Todo by ID
pub async fn delete_todo(
    State(data): State<Arc<AppState>>,
    user: CurrentUser,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let id = todo_id(id)?;

    if !repository::delete_todo(&data.db, user.id, id).await? {
        return Err(AppError::todo_not_found());
    }

    Ok(Json(json!({ "message": "Todo deleted successfully" })))
}
