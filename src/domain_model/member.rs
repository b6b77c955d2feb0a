use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct MemberId(pub i64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MemberId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(MemberId)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Member {
    pub id: MemberId,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone_number: String,
    pub role: Role,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn withdraw(&mut self) {
        self.is_deleted = true;
    }

    pub fn update_password(&mut self, password_hash: String) {
        self.password_hash = password_hash;
    }
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone_number: String,
    pub role: Role,
}

/// Identity carried inside every signed token. It is the only source of
/// "who is calling" until the next token is minted.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IdentityClaims {
    pub member_id: MemberId,
    pub email: String,
    pub role: Role,
}

impl From<&Member> for IdentityClaims {
    fn from(member: &Member) -> Self {
        IdentityClaims {
            member_id: member.id,
            email: member.email.clone(),
            role: member.role,
        }
    }
}
