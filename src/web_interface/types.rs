use std::fmt;
use std::sync::Arc;

use log::error;
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};

use crate::configuration::Paging;
use crate::error_handling::types::{StorageError, ValidationError};
use crate::storage::storage_trait::Storage;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub paging: Paging,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, paging: Paging) -> Self {
        Self { storage, paging }
    }
}

/// `?skip=&limit=` of the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Body returned by the delete endpoints.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub detail: String,
}

/// API error payload
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Error returned to HTTP clients, rendered as `ErrorBody` JSON.
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    /// A record looked up by identity does not exist; holds the entity name.
    NotFound(&'static str),
    RouteNotFound,
    Conflict(String),
    BadRequest(String),
    MethodNotAllowed,
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound(_) | ApiError::RouteNotFound => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(e) => write!(f, "{}", e),
            ApiError::NotFound(entity) => write!(f, "{} not found", entity),
            ApiError::RouteNotFound => write!(f, "Not Found"),
            ApiError::Conflict(e) => write!(f, "{}", e),
            ApiError::BadRequest(e) => write!(f, "{}", e),
            ApiError::MethodNotAllowed => write!(f, "Method not allowed"),
            ApiError::Internal => write!(f, "an internal error occurred"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::MissingOwner(_) => ApiError::NotFound("Owner"),
            StorageError::ConstraintViolation(msg) => ApiError::Conflict(msg),
            other => {
                error!("Storage error while serving request: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl Reply for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        reply::with_status(reply::json(&body), status).into_response()
    }
}
