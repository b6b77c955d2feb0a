mod member_repo_mysql;
mod portfolio_withdrawal_mysql;

pub use member_repo_mysql::*;
pub use portfolio_withdrawal_mysql::*;

mod util;
