use crate::domain_model::{IdentityClaims, MemberId};
use crate::domain_port::StoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token malformed")]
    MalformedToken,
    #[error("token invalid")]
    InvalidToken,
    #[error("reissue failed: {0}")]
    ReissueFailed(ReissueFailure),
    #[error("logout failed, please try again")]
    LogoutFailed,
    #[error("withdrawal failed, please try again")]
    WithdrawalFailed,
    #[error("member not found")]
    NotFoundIdentity,
    #[error("member already withdrawn")]
    AlreadyWithdrawn,
    #[error("email already registered")]
    DuplicatedEmail,
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Store(err.to_string())
    }
}

/// Why a reissue was refused. Every variant means the client has to log in again.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum ReissueFailure {
    MissingAccessToken,
    MalformedAccessToken,
    MissingRefreshToken,
    ExpiredRefreshToken,
    NoSession,
    Mismatch,
}

impl ReissueFailure {
    /// The stored session (or the presented refresh token) is dead, so the
    /// client's refresh cookie is worthless.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            ReissueFailure::ExpiredRefreshToken | ReissueFailure::NoSession | ReissueFailure::Mismatch
        )
    }
}

impl fmt::Display for ReissueFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ReissueFailure::MissingAccessToken => "access token is empty",
            ReissueFailure::MalformedAccessToken => "access token is malformed",
            ReissueFailure::MissingRefreshToken => "no refresh token supplied, login again",
            ReissueFailure::ExpiredRefreshToken => "refresh token is expired, login again",
            ReissueFailure::NoSession => "no session on record, login again",
            ReissueFailure::Mismatch => "refresh token did not match, re-authenticate",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MintedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Claims recovered from a token whose signature checked out, expired or not.
#[derive(Debug, Clone)]
pub struct TokenInspection {
    pub claims: IdentityClaims,
    pub expires_at: DateTime<Utc>,
}

pub trait TokenCodec: Send + Sync {
    fn mint(&self, claims: &IdentityClaims, kind: TokenKind) -> Result<MintedToken, AuthError>;

    /// Checks signature and expiry. Fails with `InvalidToken`.
    fn validate(&self, token: &str, kind: TokenKind) -> Result<IdentityClaims, AuthError>;

    /// Checks the signature only. Fails with `MalformedToken`.
    fn inspect_ignoring_expiry(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<TokenInspection, AuthError>;

    fn extract_claims_ignoring_expiry(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<IdentityClaims, AuthError> {
        self.inspect_ignoring_expiry(token, kind)
            .map(|inspection| inspection.claims)
    }
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub member_id: MemberId,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_ttl_secs: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ReissueInput {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReissueResult {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct InquiryEmailInput {
    pub name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone)]
pub struct InquiryPasswordInput {
    pub email: String,
    pub name: String,
    pub phone_number: String,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<MemberId, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    async fn logout(&self, access_token: &str) -> Result<(), AuthError>;
    async fn reissue(&self, request: ReissueInput) -> Result<ReissueResult, AuthError>;
    async fn withdraw(&self, access_token: &str, member_id: MemberId) -> Result<(), AuthError>;
    async fn inquire_email(&self, request: InquiryEmailInput) -> Result<String, AuthError>;
    async fn issue_temporary_password(
        &self,
        request: InquiryPasswordInput,
    ) -> Result<String, AuthError>;
}
