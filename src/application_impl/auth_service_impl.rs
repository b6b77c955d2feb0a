use super::credential_policy::CredentialPolicy;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct RealAuthService {
    member_repo: Arc<dyn MemberRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    revocation_store: Arc<dyn RevocationStore>,
    withdrawal_listeners: Vec<Arc<dyn WithdrawalListener>>,
    credential_policy: Arc<CredentialPolicy>,
}

impl RealAuthService {
    pub fn new(
        member_repo: Arc<dyn MemberRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        revocation_store: Arc<dyn RevocationStore>,
        withdrawal_listeners: Vec<Arc<dyn WithdrawalListener>>,
        credential_policy: Arc<CredentialPolicy>,
    ) -> Self {
        Self {
            member_repo,
            credential_hasher,
            token_codec,
            revocation_store,
            withdrawal_listeners,
            credential_policy,
        }
    }

    fn ttl_secs(until: DateTime<Utc>) -> u64 {
        let now = Utc::now();
        let secs = (until - now).num_seconds();
        if secs <= 0 { 1 } else { secs as u64 }
    }

    /// Puts the access token on the denylist for exactly as long as it would
    /// otherwise stay valid. A token past its expiry needs no entry.
    async fn denylist(
        &self,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if expires_at.timestamp() < Utc::now().timestamp() {
            debug!("access token already expired, nothing to denylist");
            return Ok(());
        }
        let ttl_secs = Self::ttl_secs(expires_at);
        self.revocation_store
            .put(&denylist_key(access_token), DENYLIST_MARKER, ttl_secs)
            .await
    }

    /// Session teardown after the denylist entry is in place. The token is
    /// already untrusted at this point, so a failure here is only logged.
    async fn drop_refresh_record(&self, email: &str) {
        if let Err(e) = self.revocation_store.delete(&refresh_key(email)).await {
            warn!(error = %e, "could not drop refresh token record");
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<MemberId, AuthError> {
        let SignupInput {
            email,
            password,
            name,
            phone_number,
        } = request;
        info!("signup started");

        self.credential_policy
            .check_signup(&email, &phone_number, &password)?;

        if self.member_repo.exists_by_email(&email).await? {
            return Err(AuthError::DuplicatedEmail);
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let member_id = self
            .member_repo
            .create(NewMember {
                email,
                password_hash,
                name,
                phone_number,
                role: Role::User,
            })
            .await?;

        info!(%member_id, "signup finished");
        Ok(member_id)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let member = self
            .member_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if member.is_deleted {
            return Err(AuthError::InvalidCredentials);
        }

        let ok = self
            .credential_hasher
            .verify_password(&password, &member.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let claims = IdentityClaims::from(&member);
        let access = self.token_codec.mint(&claims, TokenKind::Access)?;
        let refresh = self.token_codec.mint(&claims, TokenKind::Refresh)?;

        // Overwrites whatever an earlier login left behind: one live refresh
        // token per member.
        let refresh_ttl_secs = Self::ttl_secs(refresh.expires_at);
        self.revocation_store
            .put(&refresh_key(&member.email), &refresh.token, refresh_ttl_secs)
            .await
            .map_err(|e| {
                error!(member_id = %member.id, error = %e, "failed to save refresh token");
                AuthError::from(e)
            })?;

        info!(member_id = %member.id, "login succeeded");
        Ok(LoginResult {
            member_id: member.id,
            access_token: access.token,
            access_token_expires_at: access.expires_at,
            refresh_token: refresh.token,
            refresh_ttl_secs,
        })
    }

    async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let inspection = self
            .token_codec
            .inspect_ignoring_expiry(access_token, TokenKind::Access)
            .map_err(|_| AuthError::InvalidToken)?;
        let member_id = inspection.claims.member_id;
        // An expired token may be an old leaked one; it must not end the
        // member's current session.
        if inspection.expires_at <= Utc::now() {
            info!(%member_id, "logout with an expired access token, session left intact");
            return Ok(());
        }
        info!(%member_id, "logout: denylisting access token");

        self.denylist(access_token, inspection.expires_at)
            .await
            .map_err(|e| {
                error!(%member_id, error = %e, "logout: denylist write failed");
                AuthError::LogoutFailed
            })?;
        self.drop_refresh_record(&inspection.claims.email).await;

        info!(%member_id, "logout finished");
        Ok(())
    }

    async fn reissue(&self, request: ReissueInput) -> Result<ReissueResult, AuthError> {
        let ReissueInput {
            access_token,
            refresh_token,
        } = request;

        let access_token = access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::ReissueFailed(ReissueFailure::MissingAccessToken))?;
        let claims = self
            .token_codec
            .extract_claims_ignoring_expiry(&access_token, TokenKind::Access)
            .map_err(|_| AuthError::ReissueFailed(ReissueFailure::MalformedAccessToken))?;
        info!(member_id = %claims.member_id, "reissue started");

        let refresh_token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::ReissueFailed(ReissueFailure::MissingRefreshToken))?;

        self.token_codec
            .validate(&refresh_token, TokenKind::Refresh)
            .map_err(|_| AuthError::ReissueFailed(ReissueFailure::ExpiredRefreshToken))?;

        if self
            .revocation_store
            .get(&denylist_key(&access_token))
            .await?
            .is_some()
        {
            info!(member_id = %claims.member_id, "reissue refused for a logged-out token");
            return Err(AuthError::ReissueFailed(ReissueFailure::NoSession));
        }

        let key = refresh_key(&claims.email);
        let stored = self
            .revocation_store
            .get(&key)
            .await?
            .ok_or(AuthError::ReissueFailed(ReissueFailure::NoSession))?;

        if stored != refresh_token {
            // Someone holds a refresh token we no longer hand out: kill the session.
            warn!(member_id = %claims.member_id, "refresh token mismatch, session dropped");
            self.revocation_store.delete(&key).await?;
            return Err(AuthError::ReissueFailed(ReissueFailure::Mismatch));
        }

        let access = self.token_codec.mint(&claims, TokenKind::Access)?;
        info!(member_id = %claims.member_id, "access token reissued");
        Ok(ReissueResult {
            access_token: access.token,
            access_token_expires_at: access.expires_at,
        })
    }

    async fn withdraw(&self, access_token: &str, member_id: MemberId) -> Result<(), AuthError> {
        let inspection = self
            .token_codec
            .inspect_ignoring_expiry(access_token, TokenKind::Access)
            .map_err(|_| AuthError::InvalidToken)?;
        if inspection.claims.member_id != member_id {
            return Err(AuthError::InvalidToken);
        }

        // Nothing about the account changes unless the token is denylisted first.
        self.denylist(access_token, inspection.expires_at)
            .await
            .map_err(|e| {
                error!(%member_id, error = %e, "withdrawal: denylist write failed");
                AuthError::WithdrawalFailed
            })?;

        let mut member = self
            .member_repo
            .find_by_id(member_id)
            .await?
            .ok_or(AuthError::NotFoundIdentity)?;
        if member.is_deleted {
            return Err(AuthError::AlreadyWithdrawn);
        }

        member.withdraw();
        self.member_repo.save(&member).await?;
        self.drop_refresh_record(&member.email).await;

        // Listeners only hear about a withdrawal that is already persisted. One
        // failing listener must not keep the others from running.
        for listener in &self.withdrawal_listeners {
            if let Err(e) = listener.on_member_withdrawn(&member).await {
                error!(%member_id, error = %e, "withdrawal listener failed");
            }
        }

        info!(%member_id, "member withdrawn");
        Ok(())
    }

    async fn inquire_email(&self, request: InquiryEmailInput) -> Result<String, AuthError> {
        let member = self
            .member_repo
            .find_by_name_and_phone(&request.name, &request.phone_number)
            .await?
            .filter(|m| !m.is_deleted)
            .ok_or(AuthError::NotFoundIdentity)?;
        Ok(member.email)
    }

    async fn issue_temporary_password(
        &self,
        request: InquiryPasswordInput,
    ) -> Result<String, AuthError> {
        let mut member = self
            .member_repo
            .find_by_email_name_phone(&request.email, &request.name, &request.phone_number)
            .await?
            .filter(|m| !m.is_deleted)
            .ok_or(AuthError::NotFoundIdentity)?;

        let temp_password = self.credential_policy.generate_temporary_password()?;
        let password_hash = self.credential_hasher.hash_password(&temp_password).await?;
        member.update_password(password_hash);
        self.member_repo.save(&member).await?;

        info!(member_id = %member.id, "temporary password issued");
        Ok(temp_password)
    }
}
