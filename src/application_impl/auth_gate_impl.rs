use crate::application_port::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

pub struct RealAuthGate {
    member_repo: Arc<dyn MemberRepo>,
    token_codec: Arc<dyn TokenCodec>,
    revocation_store: Arc<dyn RevocationStore>,
    check_denylist: bool,
}

impl RealAuthGate {
    pub fn new(
        member_repo: Arc<dyn MemberRepo>,
        token_codec: Arc<dyn TokenCodec>,
        revocation_store: Arc<dyn RevocationStore>,
        check_denylist: bool,
    ) -> Self {
        Self {
            member_repo,
            token_codec,
            revocation_store,
            check_denylist,
        }
    }

    async fn is_denylisted(&self, token: &str) -> bool {
        match self.revocation_store.get(&denylist_key(token)).await {
            Ok(entry) => entry.is_some(),
            Err(e) => {
                // can't prove the token is still trusted
                warn!(error = %e, "denylist lookup failed, treating caller as anonymous");
                true
            }
        }
    }
}

#[async_trait::async_trait]
impl AuthGate for RealAuthGate {
    async fn authenticate(&self, authorization: Option<&str>) -> Option<AuthenticatedMember> {
        let token = bearer_token(authorization?)?;

        let claims = match self.token_codec.validate(token, TokenKind::Access) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "bearer token rejected");
                return None;
            }
        };

        if self.check_denylist && self.is_denylisted(token).await {
            debug!(member_id = %claims.member_id, "bearer token is denylisted");
            return None;
        }

        let member = match self.member_repo.find_by_id(claims.member_id).await {
            Ok(Some(member)) if !member.is_deleted => member,
            Ok(_) => {
                debug!(member_id = %claims.member_id, "token names no active member");
                return None;
            }
            Err(e) => {
                warn!(member_id = %claims.member_id, error = %e, "member lookup failed");
                return None;
            }
        };

        Some(AuthenticatedMember {
            member_id: member.id,
            email: member.email,
            role: member.role,
            access_token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{JwtConfig, JwtHs256Codec};
    use crate::domain_model::*;
    use crate::infra_memory::{MemoryMemberRepo, MemoryRevocationStore};
    use chrono::Utc;
    use std::time::Duration;

    struct Fixture {
        codec: Arc<JwtHs256Codec>,
        store: Arc<MemoryRevocationStore>,
        members: Arc<MemoryMemberRepo>,
    }

    impl Fixture {
        fn new() -> Self {
            let codec = Arc::new(JwtHs256Codec::new(JwtConfig {
                issuer: "tokenkeeper.test".to_string(),
                audience: "tokenkeeper-client".to_string(),
                access_ttl: Duration::from_secs(900),
                refresh_ttl: Duration::from_secs(3600),
                signing_key: b"gate-key".to_vec(),
            }));
            let members = Arc::new(MemoryMemberRepo::new());
            members.insert(Member {
                id: MemberId(7),
                email: "gate@b.com".to_string(),
                password_hash: String::new(),
                name: "Park".to_string(),
                phone_number: "010-0000-0000".to_string(),
                role: Role::Admin,
                is_deleted: false,
                created_at: Utc::now(),
            });
            Fixture {
                codec,
                store: Arc::new(MemoryRevocationStore::new()),
                members,
            }
        }

        fn gate(&self, check_denylist: bool) -> RealAuthGate {
            RealAuthGate::new(
                self.members.clone(),
                self.codec.clone(),
                self.store.clone(),
                check_denylist,
            )
        }

        fn bearer(&self, kind: TokenKind) -> (String, String) {
            let claims = IdentityClaims {
                member_id: MemberId(7),
                email: "gate@b.com".to_string(),
                role: Role::Admin,
            };
            let token = self.codec.mint(&claims, kind).unwrap().token;
            (format!("Bearer {token}"), token)
        }
    }

    #[tokio::test]
    async fn valid_bearer_establishes_identity() {
        let f = Fixture::new();
        let (header, token) = f.bearer(TokenKind::Access);

        let member = f.gate(true).authenticate(Some(&header)).await.unwrap();
        assert_eq!(member.member_id, MemberId(7));
        assert_eq!(member.role, Role::Admin);
        assert_eq!(member.access_token, token);
    }

    #[tokio::test]
    async fn anything_else_is_anonymous() {
        let f = Fixture::new();
        let gate = f.gate(true);
        let (refresh_header, _) = f.bearer(TokenKind::Refresh);
        let (_, access) = f.bearer(TokenKind::Access);

        assert!(gate.authenticate(None).await.is_none());
        assert!(gate.authenticate(Some("Bearer ")).await.is_none());
        assert!(gate.authenticate(Some("Basic abc")).await.is_none());
        assert!(gate.authenticate(Some("Bearer junk")).await.is_none());
        assert!(gate.authenticate(Some(&refresh_header)).await.is_none());
        assert!(gate.authenticate(Some(&access)).await.is_none());
    }

    #[tokio::test]
    async fn denylisted_token_is_anonymous_only_when_checking() {
        let f = Fixture::new();
        let (header, token) = f.bearer(TokenKind::Access);
        f.store
            .put(&denylist_key(&token), DENYLIST_MARKER, 60)
            .await
            .unwrap();

        assert!(f.gate(true).authenticate(Some(&header)).await.is_none());
        assert!(f.gate(false).authenticate(Some(&header)).await.is_some());
    }

    #[tokio::test]
    async fn withdrawn_member_is_anonymous() {
        let f = Fixture::new();
        let (header, _) = f.bearer(TokenKind::Access);
        let mut member = f.members.find_by_id(MemberId(7)).await.unwrap().unwrap();
        member.withdraw();
        f.members.save(&member).await.unwrap();

        assert!(f.gate(true).authenticate(Some(&header)).await.is_none());
    }
}
