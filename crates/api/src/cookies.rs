//! Token cookies: reading them off requests and rendering `Set-Cookie` values.

use axum::http::{header, HeaderMap};
use tracing::debug;

use shopdesk_auth::{IssuedToken, TokenSlot};

/// Attributes shared by every token cookie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CookiePolicy {
    /// Adds `Secure` (HTTPS deployments).
    pub secure: bool,
}

impl CookiePolicy {
    /// `Set-Cookie` value carrying `token` in `slot`, living as long as the token.
    pub fn token_cookie(&self, slot: TokenSlot, token: &IssuedToken) -> String {
        self.render(slot.cookie_name(), &token.token, token.max_age_secs())
    }

    /// `Set-Cookie` value that removes `slot` from the client.
    pub fn clear_cookie(&self, slot: TokenSlot) -> String {
        self.render(slot.cookie_name(), "", 0)
    }

    fn render(&self, name: &str, value: &str, max_age: i64) -> String {
        let mut cookie = format!("{name}={value}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Lax");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Value of the named cookie, if the request carries one.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let found = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        });

    if found.is_none() {
        debug!(cookie = name, "cookie not present");
    }
    found
}
