//! Double-submit CSRF tokens.
//!
//! `/api/v1/csrf-token` binds a random token to the client through a cookie.
//! State-changing requests must echo it back in a header or a form field,
//! and the movie form validator compares the two.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use cookie::{Cookie, SameSite};

pub const COOKIE_NAME: &str = "csrf_token";
pub const HEADER_NAMES: [&str; 2] = ["x-csrftoken", "x-csrf-token"];

/// Returns the session's token, minting and setting a fresh one if needed.
pub fn issue(jar: CookieJar, max_age_secs: i64) -> (CookieJar, String) {
    let token = match session_token(&jar) {
        Some(existing) => existing.to_string(),
        None => uuid::Uuid::new_v4().simple().to_string(),
    };

    let cookie = Cookie::build((COOKIE_NAME, token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs));

    (jar.add(cookie), token)
}

pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(COOKIE_NAME).map(|c| c.value()).filter(|v| !v.is_empty())
}

pub fn header_token(headers: &HeaderMap) -> Option<String> {
    HEADER_NAMES
        .iter()
        .filter_map(|name| headers.get(*name))
        .find_map(|value| value.to_str().ok())
        .map(str::to_owned)
}
