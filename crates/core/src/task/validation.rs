//! Field validation for tasks
//!
//! Runs before any write reaches the store.

use thiserror::Error;

use super::model::{Task, TaskDraft};

/// A field that failed validation and why
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Titles must contain something other than whitespace
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::new("title", "Title cannot be empty"));
    }
    Ok(())
}

impl TaskDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)
    }
}

impl Task {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_title_is_valid() {
        assert!(validate_title("Buy milk").is_ok());
    }

    #[test]
    fn test_empty_title_names_field() {
        let err = validate_title("").unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn test_whitespace_title_is_rejected() {
        assert!(validate_title("   \t").is_err());
    }

    #[test]
    fn test_description_is_unconstrained() {
        let draft = TaskDraft::new("Buy milk").with_description("");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_task_validation_checks_title() {
        let mut task = TaskDraft::new("Buy milk").into_task(1);
        task.title.clear();
        assert_eq!(
            task.validate(),
            Err(ValidationError::new("title", "Title cannot be empty"))
        );
    }
}
