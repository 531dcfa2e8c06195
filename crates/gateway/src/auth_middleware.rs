use std::convert::Infallible;

use {
    axum::{
        extract::FromRequestParts,
        http::{HeaderMap, header::COOKIE, request::Parts},
    },
    tracing::warn,
};

use crate::{
    nonce::NonceAction,
    server::AppState,
    state::GatewayState,
    users::{Capability, User},
};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "clawpress_session";

/// A signed-in user together with the session they arrived on.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user: User,
    pub session_token: String,
}

impl Viewer {
    pub fn can(&self, capability: Capability) -> bool {
        self.user.can(capability)
    }

    /// Token for `action`, bound to this user and session.
    pub fn nonce(&self, gw: &GatewayState, action: NonceAction) -> String {
        gw.nonces.create(action, self.user.id, &self.session_token)
    }

    pub fn verify_nonce(&self, gw: &GatewayState, token: &str, action: NonceAction) -> bool {
        gw.nonces
            .verify(token, action, self.user.id, &self.session_token)
            .is_some()
    }
}

/// Axum extractor resolving the session cookie to a [`Viewer`]. Never
/// rejects: anonymous requests yield `CurrentUser(None)` and each handler
/// decides what that means.
pub struct CurrentUser(pub Option<Viewer>);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_viewer(&state.gateway, &parts.headers).await))
    }
}

async fn resolve_viewer(gw: &GatewayState, headers: &HeaderMap) -> Option<Viewer> {
    let token = session_token(headers)?;
    let user_id = match gw.sessions.validate(token).await {
        Ok(Some(id)) => id,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "session lookup failed");
            return None;
        },
    };
    match gw.users.get(user_id).await {
        Ok(Some(user)) => Some(Viewer {
            user,
            session_token: token.to_owned(),
        }),
        Ok(None) => None,
        Err(e) => {
            warn!(user_id, error = %e, "user lookup failed");
            None
        },
    }
}

/// Raw session token from the request's cookies.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let cookie_header = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    parse_cookie(cookie_header, SESSION_COOKIE).filter(|t| !t.is_empty())
}

/// Parse a specific cookie value from a Cookie header string.
pub fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(name)
            && let Some(value) = value.strip_prefix('=')
        {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_parse_cookie() {
        assert_eq!(
            parse_cookie("clawpress_session=abc123; other=def", "clawpress_session"),
            Some("abc123")
        );
        assert_eq!(
            parse_cookie("other=def; clawpress_session=xyz", "clawpress_session"),
            Some("xyz")
        );
        assert_eq!(parse_cookie("other=def", "clawpress_session"), None);
        assert_eq!(parse_cookie("", "clawpress_session"), None);
    }

    #[test]
    fn empty_cookie_is_no_session() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("clawpress_session="));
        assert_eq!(session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("clawpress_session=t0k"));
        assert_eq!(session_token(&headers), Some("t0k"));
    }
}
