use super::cookie::REFRESH_COOKIE;
use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let signup = warp::path("signup")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::signup);

    let login = warp::path("login")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let logout = warp::path("logout")
        .and(warp::path::end())
        .and(warp::post())
        .and(authorization())
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let reissue = warp::path("reissue")
        .and(warp::path::end())
        .and(warp::post())
        .and(authorization())
        .and(warp::cookie::optional::<String>(REFRESH_COOKIE))
        .and(with(server.auth_service.clone()))
        .and_then(handler::reissue);

    let withdrawal = warp::path("withdrawal")
        .and(warp::path::end())
        .and(warp::post())
        .and(require_identity(server.auth_gate.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::withdraw);

    let inquiry_email = warp::path!("inquiry" / "email")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::inquire_email);

    let inquiry_password = warp::path!("inquiry" / "password")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::issue_temporary_password);

    let me = warp::path!("members" / "me")
        .and(warp::get())
        .and(require_identity(server.auth_gate.clone()))
        .and_then(handler::me);

    signup
        .or(login)
        .or(logout)
        .or(reissue)
        .or(withdrawal)
        .or(inquiry_email)
        .or(inquiry_password)
        .or(me)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn authorization() -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_str())
}

/// Resolves the caller, or `None` for an anonymous request. Never rejects on
/// a bad token.
fn with_identity(
    auth_gate: Arc<dyn AuthGate>,
) -> impl Filter<Extract = (Option<AuthenticatedMember>,), Error = warp::Rejection> + Clone {
    authorization().then(move |authorization: Option<String>| {
        let auth_gate = auth_gate.clone();
        async move { auth_gate.authenticate(authorization.as_deref()).await }
    })
}

fn require_identity(
    auth_gate: Arc<dyn AuthGate>,
) -> impl Filter<Extract = (AuthenticatedMember,), Error = warp::Rejection> + Clone {
    with_identity(auth_gate).and_then(|member: Option<AuthenticatedMember>| async move {
        member.ok_or_else(|| reject::custom(ApiErrorCode::Unauthorized))
    })
}
