use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const MAX_TEXT_LENGTH: usize = 500;

/// Checked on the trimmed text, which is what gets stored.
fn valid_text(text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("blank").with_message("Text cannot be empty".into()));
    }
    if trimmed.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::new("too_long").with_message("Text too long".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(custom(function = "valid_text"))]
    pub text: String,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(custom(function = "valid_text"))]
    pub text: String,
    pub completed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
