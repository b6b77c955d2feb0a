use crate::domain_model::{MemberId, Role};
use serde::Serialize;

/// Identity established for the rest of a request.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedMember {
    pub member_id: MemberId,
    pub email: String,
    pub role: Role,
    #[serde(skip)]
    pub access_token: String,
}

#[async_trait::async_trait]
pub trait AuthGate: Send + Sync {
    /// Never fails: anything short of a valid, trusted bearer token is anonymous.
    async fn authenticate(&self, authorization: Option<&str>) -> Option<AuthenticatedMember>;
}

pub fn bearer_token(authorization: &str) -> Option<&str> {
    authorization
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
