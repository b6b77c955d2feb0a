use super::util::is_dup_key;
use crate::application_port::AuthError;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

const MEMBER_COLUMNS: &str =
    "id, email, password, name, phone_number, role, is_deleted, created_at";

pub struct MySqlMemberRepo {
    pool: MySqlPool,
}

impl MySqlMemberRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlMemberRepo { pool }
    }

    fn row_to_member(row: MySqlRow) -> Result<Member, AuthError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let password_hash: String = row
            .try_get("password")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let name: String = row
            .try_get("name")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let phone_number: String = row
            .try_get("phone_number")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let role: String = row
            .try_get("role")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let role = role
            .parse::<Role>()
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let is_deleted: bool = row
            .try_get("is_deleted")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(Member {
            id: MemberId(id),
            email,
            password_hash,
            name,
            phone_number,
            role,
            is_deleted,
            created_at,
        })
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        binds: &[&str],
    ) -> Result<Option<Member>, AuthError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM member WHERE {condition}");
        let mut query = sqlx::query(&sql);
        for value in binds {
            query = query.bind(*value);
        }
        let row_opt: Option<MySqlRow> = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_member).transpose()
    }
}

#[async_trait::async_trait]
impl MemberRepo for MySqlMemberRepo {
    async fn create(&self, member: NewMember) -> Result<MemberId, AuthError> {
        let result = sqlx::query(
            r#"
INSERT INTO member (email, password, name, phone_number, role, is_deleted)
VALUES (?, ?, ?, ?, ?, 0)
"#,
        )
        .bind(&member.email)
        .bind(&member.password_hash)
        .bind(&member.name)
        .bind(&member.phone_number)
        .bind(member.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::DuplicatedEmail
            } else {
                AuthError::Store(e.to_string())
            }
        })?;

        Ok(MemberId(result.last_insert_id() as i64))
    }

    async fn find_by_id(&self, member_id: MemberId) -> Result<Option<Member>, AuthError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM member WHERE id = ?");
        let row_opt: Option<MySqlRow> = sqlx::query(&sql)
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_member).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, AuthError> {
        self.fetch_one_where("email = ?", &[email]).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM member WHERE email = ?) AS found")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let found: i64 = row
            .try_get("found")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(found != 0)
    }

    async fn find_by_name_and_phone(
        &self,
        name: &str,
        phone_number: &str,
    ) -> Result<Option<Member>, AuthError> {
        self.fetch_one_where("name = ? AND phone_number = ?", &[name, phone_number])
            .await
    }

    async fn find_by_email_name_phone(
        &self,
        email: &str,
        name: &str,
        phone_number: &str,
    ) -> Result<Option<Member>, AuthError> {
        self.fetch_one_where(
            "email = ? AND name = ? AND phone_number = ?",
            &[email, name, phone_number],
        )
        .await
    }

    async fn save(&self, member: &Member) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
UPDATE member
SET password = ?, name = ?, phone_number = ?, is_deleted = ?
WHERE id = ?
"#,
        )
        .bind(&member.password_hash)
        .bind(&member.name)
        .bind(&member.phone_number)
        .bind(member.is_deleted)
        .bind(member.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFoundIdentity);
        }
        Ok(())
    }
}
