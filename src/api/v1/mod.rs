mod cookie;
mod error;
mod handler;
mod router;

pub use cookie::{REFRESH_COOKIE, expired_refresh_cookie, refresh_cookie};
pub use error::{ApiErrorCode, recover_error};
pub use handler::ApiResponse;
pub use router::routes;

#[cfg(test)]
mod tests;
