// Error taxonomy for the API: client errors (400), auth (401),
// missing records (404), storage/internal failures (500).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::accounts::BankAccountStatus;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("account holder not found: {0}")]
    HolderNotFound(String),

    #[error("bank account not found: {0}")]
    AccountNotFound(String),

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: f64, requested: f64 },

    #[error("account is {0}, operation requires an ACTIVE account")]
    NotActive(BankAccountStatus),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: BankAccountStatus,
        to: BankAccountStatus,
    },

    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::HolderNotFound(_) | ApiError::AccountNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NonPositiveAmount
            | ApiError::InsufficientFunds { .. }
            | ApiError::NotActive(_)
            | ApiError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body returned to clients: `{ "message": "..." }`
#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {self}");
        }
        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
