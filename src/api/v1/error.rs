use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::{Serialize, Serializer};
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some()
        || err.find::<reject::MissingHeader>().is_some()
        || err.find::<reject::InvalidHeader>().is_some()
        || err.find::<reject::LengthRequired>().is_some()
        || err.find::<reject::PayloadTooLarge>().is_some()
        || err.find::<reject::UnsupportedMediaType>().is_some()
    {
        ApiErrorCode::InvalidRequest
    } else {
        ApiErrorCode::internal(format!("unhandled rejection: {:?}", err))
    };
    Ok(error_reply(code))
}

pub fn error_reply(code: ApiErrorCode) -> WithStatus<Json> {
    let status = code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(code.clone(), code.to_string()));
    warp::reply::with_status(json, status)
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Token reissue failed: {0}")]
    ReissueFailed(ReissueFailure),
    #[error("Logout failed, please try again")]
    LogoutFailed,
    #[error("Withdrawal failed, please try again")]
    WithdrawalFailed,
    #[error("Member not found")]
    NotFoundMember,
    #[error("Member already withdrawn")]
    AlreadyWithdrawn,
    #[error("Email already registered")]
    DuplicatedEmail,
    #[error("Invalid {0} format")]
    InvalidFormat(String),
    #[error("Malformed request")]
    InvalidRequest,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Service temporarily unavailable")]
    StoreUnavailable,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiErrorCode::InvalidToken => "INVALID_TOKEN",
            ApiErrorCode::Unauthorized => "UNAUTHORIZED",
            ApiErrorCode::ReissueFailed(_) => "REISSUE_FAILED",
            ApiErrorCode::LogoutFailed => "LOGOUT_FAILED",
            ApiErrorCode::WithdrawalFailed => "WITHDRAWAL_FAILED",
            ApiErrorCode::NotFoundMember => "NOT_FOUND_MEMBER",
            ApiErrorCode::AlreadyWithdrawn => "ALREADY_WITHDRAWN",
            ApiErrorCode::DuplicatedEmail => "DUPLICATED_EMAIL",
            ApiErrorCode::InvalidFormat(_) => "INVALID_FORMAT",
            ApiErrorCode::InvalidRequest => "INVALID_REQUEST",
            ApiErrorCode::NotFound => "NOT_FOUND",
            ApiErrorCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ApiErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ApiErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidCredentials
            | ApiErrorCode::InvalidToken
            | ApiErrorCode::Unauthorized
            | ApiErrorCode::ReissueFailed(_) => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotFoundMember | ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::AlreadyWithdrawn | ApiErrorCode::DuplicatedEmail => StatusCode::CONFLICT,
            ApiErrorCode::InvalidFormat(_) | ApiErrorCode::InvalidRequest => {
                StatusCode::BAD_REQUEST
            }
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::LogoutFailed
            | ApiErrorCode::WithdrawalFailed
            | ApiErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Serialize for ApiErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::MalformedToken | AuthError::InvalidToken => ApiErrorCode::InvalidToken,
            AuthError::ReissueFailed(reason) => ApiErrorCode::ReissueFailed(reason),
            AuthError::LogoutFailed => ApiErrorCode::LogoutFailed,
            AuthError::WithdrawalFailed => ApiErrorCode::WithdrawalFailed,
            AuthError::NotFoundIdentity => ApiErrorCode::NotFoundMember,
            AuthError::AlreadyWithdrawn => ApiErrorCode::AlreadyWithdrawn,
            AuthError::DuplicatedEmail => ApiErrorCode::DuplicatedEmail,
            AuthError::InvalidFormat(field) => ApiErrorCode::InvalidFormat(field),
            AuthError::Store(e) => {
                warn!("Store error: {}", e);
                ApiErrorCode::StoreUnavailable
            }
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}
