//! Config schema types: server, site facts, auth and database.

use std::path::PathBuf;

use {
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClawpressConfig {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8787,
        }
    }
}

/// Facts about the site the assistant is created for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub tagline: String,
    /// Public base URL of the site. Used for deep links and the
    /// connection-config snippet.
    pub home_url: String,
    /// Inline "about" text. Takes precedence over `about_path`.
    pub about: Option<String>,
    /// File holding the "about" page body (HTML or plain text).
    pub about_path: Option<PathBuf>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            tagline: String::new(),
            home_url: "http://localhost:8787".into(),
            about: None,
            about_path: None,
        }
    }
}

impl SiteConfig {
    /// The home URL with any trailing slash removed.
    ///
    /// Falls back to the raw string when it does not parse as a URL.
    pub fn base_url(&self) -> String {
        let raw = self.home_url.trim();
        match url::Url::parse(raw) {
            Ok(parsed) => parsed.as_str().trim_end_matches('/').to_owned(),
            Err(_) => raw.trim_end_matches('/').to_owned(),
        }
    }

    /// Raw "about" text: the inline value, or the contents of `about_path`.
    ///
    /// A missing or unreadable file yields an empty string.
    pub fn about_raw(&self) -> String {
        if let Some(about) = self.about.as_deref() {
            return about.to_owned();
        }
        match self.about_path.as_deref() {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read about page");
                    String::new()
                },
            },
            None => String::new(),
        }
    }
}

/// Anti-forgery tokens and admin sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Key for signing action tokens. A random key is generated per process
    /// when unset, which invalidates outstanding tokens on restart.
    #[serde(skip_serializing)]
    pub nonce_secret: Option<Secret<String>>,
    /// How long an action token stays valid, in seconds.
    pub nonce_lifetime_secs: u64,
    /// How long a signed-in admin session lasts, in seconds.
    pub session_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            nonce_secret: None,
            nonce_lifetime_secs: 86_400,
            session_ttl_secs: 14 * 86_400,
        }
    }
}

/// SQLite database location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Defaults to `<data dir>/clawpress.db`.
    pub path: Option<PathBuf>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_strips_trailing_slash() {
        let site = SiteConfig {
            home_url: "https://example.com/".into(),
            ..Default::default()
        };
        assert_eq!(site.base_url(), "https://example.com");
    }

    #[test]
    fn base_url_keeps_subdirectory() {
        let site = SiteConfig {
            home_url: "https://example.com/blog/".into(),
            ..Default::default()
        };
        assert_eq!(site.base_url(), "https://example.com/blog");
    }

    #[test]
    fn about_prefers_inline_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("about.html");
        std::fs::write(&path, "<p>from file</p>").unwrap();

        let mut site = SiteConfig {
            about: Some("inline".into()),
            about_path: Some(path),
            ..Default::default()
        };
        assert_eq!(site.about_raw(), "inline");

        site.about = None;
        assert_eq!(site.about_raw(), "<p>from file</p>");
    }

    #[test]
    fn missing_about_file_is_empty() {
        let site = SiteConfig {
            about_path: Some(PathBuf::from("/nonexistent/clawpress/about.html")),
            ..Default::default()
        };
        assert_eq!(site.about_raw(), "");
    }
}
