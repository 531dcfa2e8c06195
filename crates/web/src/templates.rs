//! Page templates and rendering.

use {
    askama::Template,
    axum::{
        http::{HeaderValue, StatusCode, header},
        response::{Html, IntoResponse, Response},
    },
    clawpress_gateway::{
        auth_middleware::Viewer,
        state::GatewayState,
        users::User,
    },
    clawpress_onboarding::{AssistantContext, SiteFacts},
    serde::Serialize,
    tracing::warn,
};

use crate::{
    admin::{AdminScreen, MenuItem, Notice, admin_menu},
    assets::{asset_content_hash, is_dev_assets},
    error::Result,
    profile::AssistantSection,
};

// ── Chrome ───────────────────────────────────────────────────────────────────

/// Everything the shared layout needs.
pub(crate) struct Chrome {
    pub(crate) page_title: String,
    pub(crate) site_title: String,
    pub(crate) asset_prefix: String,
    /// Per-response CSP nonce for inline scripts.
    pub(crate) nonce: String,
    pub(crate) menu: Vec<MenuItem>,
    pub(crate) viewer_name: Option<String>,
}

impl Chrome {
    pub(crate) fn new(
        gw: &GatewayState,
        screen: AdminScreen,
        page_title: impl Into<String>,
        viewer: Option<&Viewer>,
        assistant: Option<&User>,
    ) -> Self {
        let site_title = if gw.site.title.is_empty() {
            "ClawPress".to_owned()
        } else {
            gw.site.title.clone()
        };
        Self {
            page_title: page_title.into(),
            site_title,
            asset_prefix: asset_prefix(),
            nonce: uuid::Uuid::new_v4().to_string(),
            menu: admin_menu(screen, assistant),
            viewer_name: viewer.map(|v| v.user.display_name.clone()),
        }
    }
}

fn asset_prefix() -> String {
    if is_dev_assets() {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        format!("/assets/v/{ts}/")
    } else {
        static HASH: std::sync::LazyLock<String> = std::sync::LazyLock::new(asset_content_hash);
        format!("/assets/v/{}/", *HASH)
    }
}

// ── Templates ────────────────────────────────────────────────────────────────

pub(crate) struct RosterRow {
    pub(crate) id: i64,
    pub(crate) avatar_html: String,
    pub(crate) display_name: String,
    pub(crate) login: String,
    pub(crate) email: String,
    pub(crate) roles: String,
}

#[derive(Template)]
#[template(path = "users.html", escape = "html")]
pub(crate) struct UsersTemplate<'a> {
    pub(crate) chrome: &'a Chrome,
    pub(crate) notice: Option<Notice>,
    pub(crate) rows: &'a [RosterRow],
}

#[derive(Template)]
#[template(path = "profile.html", escape = "html")]
pub(crate) struct ProfileTemplate<'a> {
    pub(crate) chrome: &'a Chrome,
    pub(crate) user: &'a User,
    pub(crate) avatar_html: &'a str,
    pub(crate) roles: String,
    pub(crate) section: Option<AssistantSection>,
}

pub(crate) struct VibeOption {
    pub(crate) value: &'static str,
    pub(crate) text: &'static str,
}

#[derive(Template)]
#[template(path = "setup.html", escape = "html")]
pub(crate) struct SetupTemplate<'a> {
    pub(crate) chrome: &'a Chrome,
    pub(crate) site: &'a SiteFacts,
    pub(crate) about_preview: String,
    pub(crate) palette: &'a [&'static str],
    pub(crate) vibes: Vec<VibeOption>,
    pub(crate) bootstrap_json: String,
}

pub(crate) struct ChatHeader {
    pub(crate) avatar: String,
    pub(crate) name: String,
}

#[derive(Template)]
#[template(path = "chat.html", escape = "html")]
pub(crate) struct ChatTemplate<'a> {
    pub(crate) chrome: &'a Chrome,
    pub(crate) header: Option<ChatHeader>,
    pub(crate) bootstrap_json: String,
}

#[derive(Template)]
#[template(path = "login.html", escape = "html")]
pub(crate) struct LoginTemplate<'a> {
    pub(crate) chrome: &'a Chrome,
    pub(crate) error: Option<&'a str>,
    pub(crate) login: &'a str,
}

// ── Client bootstrap data ────────────────────────────────────────────────────

/// Injected as `window.ClawPressSetup` on the setup page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupBootstrap<'a> {
    pub ajax_url: &'a str,
    pub nonce: String,
    pub site_url: String,
    pub site: &'a SiteFacts,
    pub default_avatar: &'static str,
}

/// Injected as `window.ClawPressChat` on the chat page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBootstrap {
    pub name: String,
    pub avatar: String,
    pub context: AssistantContext,
    pub ajax_url: String,
    pub nonce: String,
    pub user_id: i64,
    pub site_title: String,
}

/// JSON safe to place inside an inline `<script>`.
pub(crate) fn script_safe_json<T: Serialize>(value: &T) -> String {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to serialize bootstrap data for html template");
            "{}".to_owned()
        },
    };
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

// ── Rendering ────────────────────────────────────────────────────────────────

/// Render `template` into an HTML response whose CSP admits only inline
/// scripts carrying `chrome.nonce`.
pub(crate) fn render_page<T: Template>(
    template: &T,
    chrome: &Chrome,
    status: StatusCode,
) -> Result<Response> {
    let body = template.render()?;
    let nonce = &chrome.nonce;
    let csp = format!(
        "default-src 'self'; \
         script-src 'self' 'nonce-{nonce}'; \
         style-src 'self' 'unsafe-inline'; \
         img-src 'self' data: https://www.gravatar.com; \
         font-src 'self'; \
         connect-src 'self'; \
         frame-ancestors 'none'; \
         form-action 'self'; \
         base-uri 'self'; \
         object-src 'none'"
    );

    let mut response = (status, Html(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store"),
    );
    if let Ok(val) = csp.parse() {
        headers.insert(header::CONTENT_SECURITY_POLICY, val);
    }
    Ok(response)
}
