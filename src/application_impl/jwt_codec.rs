use crate::application_port::{AuthError, MintedToken, TokenCodec, TokenInspection, TokenKind};
use crate::domain_model::{IdentityClaims, MemberId, Role};
use crate::logger::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub signing_key: Vec<u8>,
}

impl JwtConfig {
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String, // member id as string
    email: String,
    role: Role,
    typ: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String, // keeps two tokens minted in the same second distinct
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(&cfg.signing_key);
        let decoding_key = DecodingKey::from_secret(&cfg.signing_key);
        JwtHs256Codec {
            cfg,
            encoding_key,
            decoding_key,
        }
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub(crate) fn mint_expiring_at(
        &self,
        claims: &IdentityClaims,
        kind: TokenKind,
        iat_dt: DateTime<Utc>,
        exp_dt: DateTime<Utc>,
    ) -> Result<MintedToken, AuthError> {
        let session_claims = SessionClaims {
            sub: claims.member_id.to_string(),
            email: claims.email.clone(),
            role: claims.role,
            typ: kind.as_str().to_string(),
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti: Self::gen_jti(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &session_claims,
            &self.encoding_key,
        )
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok(MintedToken {
            token,
            expires_at: exp_dt,
        })
    }

    /// Signature, issuer and audience are always checked; expiry only when asked.
    fn decode_claims(
        &self,
        token: &str,
        check_expiry: bool,
    ) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = check_expiry;
        v.leeway = 0;
        v.set_audience(&[self.cfg.audience.as_str()]);
        v.set_issuer(&[self.cfg.issuer.as_str()]);
        let data = decode::<SessionClaims>(token, &self.decoding_key, &v)?;
        Ok(data.claims)
    }

    fn identity_of(claims: &SessionClaims, kind: TokenKind) -> Option<IdentityClaims> {
        if claims.typ != kind.as_str() {
            return None;
        }
        let member_id = claims.sub.parse::<MemberId>().ok()?;
        Some(IdentityClaims {
            member_id,
            email: claims.email.clone(),
            role: claims.role,
        })
    }
}

impl TokenCodec for JwtHs256Codec {
    fn mint(&self, claims: &IdentityClaims, kind: TokenKind) -> Result<MintedToken, AuthError> {
        let iat_dt = Utc::now();
        let exp_dt = iat_dt + self.cfg.ttl(kind);
        self.mint_expiring_at(claims, kind, iat_dt, exp_dt)
    }

    fn validate(&self, token: &str, kind: TokenKind) -> Result<IdentityClaims, AuthError> {
        let claims = self.decode_claims(token, true).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => debug!("token expired"),
                other => debug!(?other, "token rejected"),
            }
            AuthError::InvalidToken
        })?;
        Self::identity_of(&claims, kind).ok_or(AuthError::InvalidToken)
    }

    fn inspect_ignoring_expiry(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<TokenInspection, AuthError> {
        let claims = self
            .decode_claims(token, false)
            .map_err(|_| AuthError::MalformedToken)?;
        let identity = Self::identity_of(&claims, kind).ok_or(AuthError::MalformedToken)?;
        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::MalformedToken)?;
        Ok(TokenInspection {
            claims: identity,
            expires_at,
        })
    }
}
