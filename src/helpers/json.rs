use actix_web::{error::ResponseError, http::StatusCode, Error, HttpResponse};
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Error codes carried in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApiError {
    InvalidAuthenticationToken,
    TemplateNotFound,
    InvalidTemplate,
    UserNotFound,
    UnauthorizedUser,
    UserHasTemplates,
    NotImplemented,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: ApiError,
    pub message: String,
}

/// Renders as `{"error": {"code": .., "message": ..}}`.
#[derive(Debug)]
pub struct JsonError {
    status: StatusCode,
    body: ErrorBody,
}

impl JsonError {
    pub fn new(status: StatusCode, code: ApiError, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.body.code, self.body.message)
    }
}

impl ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(json!({ "error": self.body }))
    }
}

pub struct JsonResponse<T> {
    item: Option<T>,
    list: Option<Vec<T>>,
}

impl<T> JsonResponse<T> {
    pub fn build() -> Self {
        Self {
            item: None,
            list: None,
        }
    }

    pub fn set_item(mut self, item: T) -> Self {
        self.item = Some(item);
        self
    }

    pub fn set_list(mut self, list: Vec<T>) -> Self {
        self.list = Some(list);
        self
    }

    fn error(self, status: StatusCode, code: ApiError, message: impl Into<String>) -> Error {
        let message = message.into();
        tracing::debug!(status = status.as_u16(), ?code, %message, "Responding with error");
        JsonError::new(status, code, message).into()
    }

    pub fn unauthorized(self, message: impl Into<String>) -> Error {
        self.error(
            StatusCode::UNAUTHORIZED,
            ApiError::InvalidAuthenticationToken,
            message,
        )
    }

    pub fn forbidden(self, message: impl Into<String>) -> Error {
        self.error(StatusCode::FORBIDDEN, ApiError::UnauthorizedUser, message)
    }

    pub fn bad_request(self, code: ApiError, message: impl Into<String>) -> Error {
        self.error(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(self, code: ApiError, message: impl Into<String>) -> Error {
        self.error(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(self, code: ApiError, message: impl Into<String>) -> Error {
        self.error(StatusCode::CONFLICT, code, message)
    }

    pub fn not_implemented(self, message: impl Into<String>) -> Error {
        self.error(
            StatusCode::NOT_IMPLEMENTED,
            ApiError::NotImplemented,
            message,
        )
    }

    pub fn internal_server_error(self, message: impl Into<String>) -> Error {
        self.error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError,
            message,
        )
    }
}

impl<T: Serialize> JsonResponse<T> {
    /// 200 with the list (or the item when no list was set) under `key`.
    pub fn ok(self, key: &str) -> HttpResponse {
        let value = match (self.list, self.item) {
            (Some(list), _) => json!(list),
            (None, item) => json!(item),
        };
        HttpResponse::Ok().json(json!({ key: value }))
    }

    /// 201 with the bare item as body.
    pub fn created(self) -> HttpResponse {
        HttpResponse::Created().json(self.item)
    }
}
