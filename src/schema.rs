use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const USERNAME_MAX_CHARS: usize = 50;
// bcrypt ignores everything past this many bytes.
pub const PASSWORD_MAX_BYTES: usize = 72;

// Request body for both registration and login
#[derive(Debug, Deserialize)]
pub struct CredentialsSchema {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl CredentialsSchema {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() {
            return Err(AppError::Validation("username is required".to_string()));
        }
        if self.username.chars().count() > USERNAME_MAX_CHARS {
            return Err(AppError::Validation(format!(
                "username must be at most {} characters",
                USERNAME_MAX_CHARS
            )));
        }
        if self.password.is_empty() {
            return Err(AppError::Validation("password is required".to_string()));
        }
        if self.password.len() > PASSWORD_MAX_BYTES {
            return Err(AppError::Validation(format!(
                "password must be at most {} bytes",
                PASSWORD_MAX_BYTES
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

// Struct representing the request body for creating a new Todo
#[derive(Debug, Deserialize)]
pub struct CreateTodoSchema {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl CreateTodoSchema {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        Ok(())
    }
}

/// Request body for updating a Todo. A field that is absent or `null`
/// leaves the stored value alone; anything else, including `false` and
/// `""`, overwrites it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoSchema {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}
