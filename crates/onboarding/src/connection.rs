//! Connection snippet handed to an external agent so it can act as the
//! assistant user.

use serde::Serialize;

/// Role every assistant account carries.
pub const ASSISTANT_ROLE: &str = "ai_assistant";

const HANDSHAKE_PATH: &str = "/wp-json/clawpress/v1/handshake";
const MANIFEST_PATH: &str = "/wp-json/clawpress/v1/manifest";

/// Field order is part of the format: site, assistant, role, handshake,
/// manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionConfig {
    pub site: String,
    pub assistant: String,
    pub role: &'static str,
    pub handshake: String,
    pub manifest: String,
}

impl ConnectionConfig {
    pub fn new(site_url: &str, assistant: &str) -> Self {
        let site = site_url.trim().trim_end_matches('/').to_owned();
        Self {
            handshake: format!("{site}{HANDSHAKE_PATH}"),
            manifest: format!("{site}{MANIFEST_PATH}"),
            assistant: assistant.to_owned(),
            role: ASSISTANT_ROLE,
            site,
        }
    }

    /// Indented form shown to the operator for copy/paste.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
