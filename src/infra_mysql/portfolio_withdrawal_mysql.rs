use crate::application_port::AuthError;
use crate::domain_model::Member;
use crate::domain_port::WithdrawalListener;
use crate::logger::*;
use sqlx::MySqlPool;

/// Drops the withdrawn member's portfolio entries.
pub struct MySqlPortfolioWithdrawal {
    pool: MySqlPool,
}

impl MySqlPortfolioWithdrawal {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlPortfolioWithdrawal { pool }
    }
}

#[async_trait::async_trait]
impl WithdrawalListener for MySqlPortfolioWithdrawal {
    async fn on_member_withdrawn(&self, member: &Member) -> Result<(), AuthError> {
        let result = sqlx::query("DELETE FROM portfolio WHERE member_id = ?")
            .bind(member.id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("delete portfolio: {e}")))?;

        info!(
            member_id = %member.id,
            removed = result.rows_affected(),
            "portfolio cleared for withdrawn member"
        );
        Ok(())
    }
}
