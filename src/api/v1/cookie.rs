pub const REFRESH_COOKIE: &str = "refresh_token";

pub fn refresh_cookie(refresh_token: &str, max_age_secs: u64) -> String {
    format!("{REFRESH_COOKIE}={refresh_token}; Max-Age={max_age_secs}; Path=/; Secure; HttpOnly")
}

pub fn expired_refresh_cookie() -> String {
    format!("{REFRESH_COOKIE}=; Max-Age=0; Path=/; Secure; HttpOnly")
}
