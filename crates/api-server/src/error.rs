//! Mapping of repository outcomes to HTTP responses

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use task_core::task::{TaskId, ValidationError};
use task_core::Error;

/// Non-standard status for a request the client abandoned
const CLIENT_CLOSED_REQUEST: u16 = 499;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A failed repository call plus the context needed to log it
#[derive(Debug)]
pub struct ApiError {
    operation: &'static str,
    task_id: Option<TaskId>,
    error: Error,
}

impl ApiError {
    pub fn new(operation: &'static str, task_id: Option<TaskId>, error: impl Into<Error>) -> Self {
        Self {
            operation,
            task_id,
            error: error.into(),
        }
    }

    /// Input axum could not extract; reported like any other validation failure
    fn rejected(part: &'static str, reason: String) -> Self {
        Self::new("read_request", None, ValidationError::new(part, reason))
    }

    pub fn status(&self) -> StatusCode {
        match &self.error {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Cancelled => StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
                .unwrap_or(StatusCode::REQUEST_TIMEOUT),
            Error::Storage(_) | Error::Database(_) | Error::Migration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the client; store internals stay in the log
    fn public_message(&self) -> String {
        match &self.error {
            Error::Validation(e) => e.to_string(),
            Error::NotFound(id) => format!("Task {} not found", id),
            Error::Conflict(_) => format!(
                "Unable to {} because of a concurrent change. Please retry.",
                self.operation.replace('_', " ")
            ),
            _ => format!(
                "An error occurred while trying to {}.",
                self.operation.replace('_', " ")
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let operation = self.operation;
        let task_id = self.task_id;

        match &self.error {
            Error::Cancelled => {
                tracing::debug!(operation, ?task_id, "Request cancelled");
                return status.into_response();
            }
            Error::Validation(e) => {
                tracing::debug!(operation, ?task_id, "Rejected invalid input: {}", e);
            }
            Error::NotFound(_) => {}
            Error::Conflict(e) => {
                tracing::warn!(operation, ?task_id, "Write conflict: {}", e);
            }
            e => {
                tracing::error!(operation, ?task_id, error = %e, "Unexpected failure");
            }
        }

        (
            status,
            Json(ErrorResponse {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected("body", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected("id", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected("query", rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_of(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                Error::Validation(ValidationError::new("title", "empty")),
                StatusCode::BAD_REQUEST,
            ),
            (Error::NotFound(1), StatusCode::NOT_FOUND),
            (Error::Conflict("stale".to_string()), StatusCode::CONFLICT),
            (
                Error::Storage("disk".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::new("update_task", Some(1), error).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_cancelled_has_empty_body() {
        let response = ApiError::new("list_tasks", None, Error::Cancelled).into_response();
        assert_eq!(response.status().as_u16(), CLIENT_CLOSED_REQUEST);
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_store_error_does_not_leak_details() {
        let response = ApiError::new(
            "create_task",
            None,
            Error::Storage("/var/db/tasks.sqlite: disk I/O error".to_string()),
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert!(body.contains("create task"));
        assert!(!body.contains("sqlite"));
    }
}
