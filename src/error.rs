// src/error.rs

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Error de negocio expuesto al cliente como `{success: false, message}`.
#[derive(Debug, Error)]
pub enum ShopError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Error interno del servidor")]
    Db(#[from] sqlx::Error),

    #[error("Error interno del servidor")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Error interno del servidor")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl ResponseError for ShopError {
    fn status_code(&self) -> StatusCode {
        match self {
            ShopError::Validation(_) => StatusCode::BAD_REQUEST,
            ShopError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ShopError::Forbidden(_) => StatusCode::FORBIDDEN,
            ShopError::NotFound(_) => StatusCode::NOT_FOUND,
            ShopError::Conflict(_) => StatusCode::CONFLICT,
            ShopError::Db(_) | ShopError::Hash(_) | ShopError::Jwt(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ShopError::Db(e) => log::error!("db error: {e}"),
            ShopError::Hash(e) => log::error!("bcrypt error: {e}"),
            ShopError::Jwt(e) => log::error!("jwt error: {e}"),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}
