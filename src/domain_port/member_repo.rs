use crate::application_port::AuthError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait MemberRepo: Send + Sync {
    async fn create(&self, member: NewMember) -> Result<MemberId, AuthError>;

    async fn find_by_id(&self, member_id: MemberId) -> Result<Option<Member>, AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, AuthError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError>;

    async fn find_by_name_and_phone(
        &self,
        name: &str,
        phone_number: &str,
    ) -> Result<Option<Member>, AuthError>;

    async fn find_by_email_name_phone(
        &self,
        email: &str,
        name: &str,
        phone_number: &str,
    ) -> Result<Option<Member>, AuthError>;

    /// Overwrite the mutable columns (password, deletion flag) of an existing member.
    async fn save(&self, member: &Member) -> Result<(), AuthError>;
}
