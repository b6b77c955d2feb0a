use super::cookie::*;
use super::error::*;
use crate::application_port::*;
use crate::domain_model::MemberId;
use crate::logger::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::http::header::SET_COOKIE;
use warp::reply::Response;
use warp::{Reply, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Renders the outcome, then attaches the refresh cookie removal whether or
/// not the operation succeeded.
fn with_cookie_cleanup<T: Serialize>(outcome: Result<T, ApiErrorCode>) -> Response {
    let reply = match outcome {
        Ok(data) => {
            warp::reply::with_status(warp::reply::json(&ApiResponse::ok(data)), StatusCode::OK)
        }
        Err(code) => error_reply(code),
    };
    warp::reply::with_header(reply, SET_COOKIE, expired_refresh_cookie()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
struct SignupResponse {
    member_id: MemberId,
}

pub async fn signup(
    request: SignupRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let member_id = auth_service
        .signup(SignupInput {
            email: request.email,
            password: request.password,
            name: request.name,
            phone_number: request.phone_number,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(SignupResponse { member_id })),
        StatusCode::CREATED,
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    member_id: MemberId,
    access_token: String,
    access_token_expires_at: DateTime<Utc>,
}

pub async fn login(
    request: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = auth_service
        .login(LoginInput {
            email: request.email,
            password: request.password,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let cookie = refresh_cookie(&result.refresh_token, result.refresh_ttl_secs);
    let response = LoginResponse {
        member_id: result.member_id,
        access_token: result.access_token,
        access_token_expires_at: result.access_token_expires_at,
    };
    Ok(warp::reply::with_header(
        warp::reply::json(&ApiResponse::ok(response)),
        SET_COOKIE,
        cookie,
    ))
}

pub async fn logout(
    authorization: Option<String>,
    auth_service: Arc<dyn AuthService>,
) -> Result<Response, warp::Rejection> {
    let outcome = match authorization.as_deref().and_then(bearer_token) {
        Some(token) => auth_service
            .logout(token)
            .await
            .map_err(ApiErrorCode::from),
        None => Err(ApiErrorCode::InvalidToken),
    };
    Ok(with_cookie_cleanup(outcome))
}

pub async fn reissue(
    authorization: Option<String>,
    refresh_token: Option<String>,
    auth_service: Arc<dyn AuthService>,
) -> Result<Response, warp::Rejection> {
    let request = ReissueInput {
        access_token: authorization
            .as_deref()
            .and_then(bearer_token)
            .map(str::to_string),
        refresh_token: refresh_token.filter(|token| !token.is_empty()),
    };

    match auth_service.reissue(request).await {
        Ok(result) => Ok(warp::reply::json(&ApiResponse::ok(result)).into_response()),
        Err(AuthError::ReissueFailed(reason)) if reason.ends_session() => {
            debug!(%reason, "reissue refused, clearing refresh cookie");
            Ok(with_cookie_cleanup::<()>(Err(ApiErrorCode::ReissueFailed(
                reason,
            ))))
        }
        Err(e) => Err(reject::custom(ApiErrorCode::from(e))),
    }
}

pub async fn withdraw(
    member: AuthenticatedMember,
    auth_service: Arc<dyn AuthService>,
) -> Result<Response, warp::Rejection> {
    let outcome = auth_service
        .withdraw(&member.access_token, member.member_id)
        .await
        .map_err(ApiErrorCode::from);
    Ok(with_cookie_cleanup(outcome))
}

#[derive(Debug, Deserialize)]
pub struct InquiryEmailRequest {
    pub name: String,
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
struct InquiryEmailResponse {
    email: String,
}

pub async fn inquire_email(
    request: InquiryEmailRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let email = auth_service
        .inquire_email(InquiryEmailInput {
            name: request.name,
            phone_number: request.phone_number,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(InquiryEmailResponse {
        email,
    })))
}

#[derive(Debug, Deserialize)]
pub struct InquiryPasswordRequest {
    pub email: String,
    pub name: String,
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
struct InquiryPasswordResponse {
    temporary_password: String,
}

pub async fn issue_temporary_password(
    request: InquiryPasswordRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let temporary_password = auth_service
        .issue_temporary_password(InquiryPasswordInput {
            email: request.email,
            name: request.name,
            phone_number: request.phone_number,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(
        InquiryPasswordResponse { temporary_password },
    )))
}

pub async fn me(member: AuthenticatedMember) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(member)))
}
