use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rail_core::{CoreError, StoreError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    Core(CoreError),
    Anyhow(anyhow::Error),
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::AuthenticationError(_) => (StatusCode::UNAUTHORIZED, "authentication"),
            AppError::AuthorizationError(_) => (StatusCode::FORBIDDEN, "authorization"),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation"),
            AppError::Core(err) => {
                let status = match err {
                    CoreError::ValidationError(_) => StatusCode::BAD_REQUEST,
                    CoreError::NotFoundError(_) => StatusCode::NOT_FOUND,
                    CoreError::InsufficientCapacityError { .. } => StatusCode::BAD_REQUEST,
                    CoreError::ConflictError { .. } => StatusCode::CONFLICT,
                    CoreError::TimeoutError(_) => StatusCode::SERVICE_UNAVAILABLE,
                    CoreError::StoreError(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
                    CoreError::StoreError(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
                    CoreError::StoreError(StoreError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.kind())
            }
            AppError::Anyhow(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let error_message = match self {
            AppError::AuthenticationError(msg)
            | AppError::AuthorizationError(msg)
            | AppError::ValidationError(msg) => msg,
            AppError::Core(err) if status.is_server_error() => {
                tracing::error!(kind, "Request failed: {}", err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    "Internal Server Error".to_string()
                } else {
                    err.to_string()
                }
            }
            AppError::Core(err) => err.to_string(),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                "Internal Server Error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Core(CoreError::StoreError(err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::ValidationError(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn test_core_errors_map_to_distinct_statuses() {
        let train_id = Uuid::new_v4();
        let cases = [
            (CoreError::NotFoundError(train_id), StatusCode::NOT_FOUND),
            (CoreError::InsufficientCapacityError { requested: 3, available: 1 }, StatusCode::BAD_REQUEST),
            (CoreError::ConflictError { train_id, attempts: 3 }, StatusCode::CONFLICT),
            (CoreError::TimeoutError(Duration::from_secs(5)), StatusCode::SERVICE_UNAVAILABLE),
            (CoreError::StoreError(StoreError::Backend("boom".into())), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }
}
