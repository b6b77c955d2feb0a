use crate::application_port::AuthError;
use crate::domain_model::Member;

/// Dependent domain that must clean up after a member withdraws.
#[async_trait::async_trait]
pub trait WithdrawalListener: Send + Sync {
    async fn on_member_withdrawn(&self, member: &Member) -> Result<(), AuthError>;
}
