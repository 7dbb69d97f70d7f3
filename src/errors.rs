use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Unified error response body
#[derive(Serialize)]
pub struct ErrorResponse<'a> {
    pub code: &'a str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Validation(String),

    #[error("Profile not found")]
    ProfileMissing,

    #[error("Tenant resolution failed: {0}")]
    TenantResolution(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            // Zero-row matches on scoped mutations map to 400, not 404: the
            // response must not distinguish "missing" from "other tenant".
            AppError::Validation(_)
            | AppError::ProfileMissing
            | AppError::TenantResolution(_)
            | AppError::NotFound(_)
            | AppError::Db(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.code();
        let message = self.to_string();
        // trace_id can be wired through the request-id middleware later (correlation)
        let body = ErrorResponse { code, message, details: None, trace_id: None };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(_) => "UNAUTHENTICATED",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::ProfileMissing => "PROFILE_MISSING",
            AppError::TenantResolution(_) => "TENANT_RESOLUTION_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Db(_) => "STORAGE_ERROR",
        }
    }
}
