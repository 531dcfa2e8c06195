//! The creation contract: what the wizard submits, how it is validated, and
//! the collaborator that turns it into an assistant account.

use {async_trait::async_trait, serde::Deserialize, tracing::debug};

use crate::{
    avatar::avatar_or_default,
    context::{ABOUT_MAX_CHARS, AssistantContext, Vibe},
    sanitize::{sanitize_text_field, sanitize_textarea_field, truncate_chars},
};

/// Admin page hosting the setup wizard.
pub const SETUP_PAGE_PATH: &str = "/admin/assistant/setup";

/// Admin page hosting the chat surface.
pub const CHAT_PAGE_PATH: &str = "/admin/assistant/chat";

pub const NAME_REQUIRED: &str = "Name is required.";

/// Deep link to the chat page under the given site base URL.
pub fn chat_url(base_url: &str) -> String {
    format!("{}{CHAT_PAGE_PATH}", base_url.trim_end_matches('/'))
}

/// Raw fields posted by the wizard. Everything is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateAssistantRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub vibe: Option<String>,
    pub goals: Option<String>,
    pub extra: Option<String>,
    pub site_title: Option<String>,
    pub site_tagline: Option<String>,
    pub about_content: Option<String>,
}

/// A submission that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

/// Errors from the creation collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CreateAssistantError {
    /// The collaborator refused, e.g. the name is taken. The message is shown
    /// to the operator as-is.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A sanitized, validated assistant ready to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssistant {
    pub name: String,
    pub avatar: String,
    pub context: AssistantContext,
}

impl NewAssistant {
    pub fn from_request(req: &CreateAssistantRequest) -> Result<Self, ValidationError> {
        let text = |v: &Option<String>| sanitize_text_field(v.as_deref().unwrap_or_default());
        let multiline =
            |v: &Option<String>| sanitize_textarea_field(v.as_deref().unwrap_or_default());

        let name = text(&req.name);
        if name.is_empty() {
            return Err(ValidationError(NAME_REQUIRED));
        }

        let avatar = avatar_or_default(Some(&text(&req.avatar))).to_owned();

        let raw_vibe = text(&req.vibe);
        let vibe = if raw_vibe.is_empty() {
            None
        } else {
            match raw_vibe.parse::<Vibe>() {
                Ok(vibe) => Some(vibe),
                Err(e) => {
                    debug!(error = %e, "dropping unknown vibe");
                    None
                },
            }
        };

        let context = AssistantContext {
            vibe,
            goals: multiline(&req.goals),
            extra: multiline(&req.extra),
            site_title: text(&req.site_title),
            site_tagline: text(&req.site_tagline),
            about_content: truncate_chars(&multiline(&req.about_content), ABOUT_MAX_CHARS),
        };

        Ok(Self {
            name,
            avatar,
            context,
        })
    }
}

/// Creates the assistant account and stores its avatar and context.
///
/// Implementations decide what counts as a collision; nothing here enforces
/// a single assistant per site.
#[async_trait]
pub trait AssistantCreator: Send + Sync {
    /// Returns the new account's identifier.
    async fn create_assistant(&self, assistant: &NewAssistant) -> Result<i64, CreateAssistantError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::avatar::DEFAULT_AVATAR;

    fn request(name: &str) -> CreateAssistantRequest {
        CreateAssistantRequest {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_or_blank_name_is_rejected() {
        for name in ["", "   ", "<b></b>", "\n\t"] {
            assert_eq!(
                NewAssistant::from_request(&request(name)),
                Err(ValidationError(NAME_REQUIRED))
            );
        }
        assert_eq!(
            NewAssistant::from_request(&CreateAssistantRequest::default()),
            Err(ValidationError(NAME_REQUIRED))
        );
    }

    #[test]
    fn avatar_defaults_to_robot() {
        let a = NewAssistant::from_request(&request("Scout")).unwrap();
        assert_eq!(a.avatar, DEFAULT_AVATAR);

        let mut req = request("Scout");
        req.avatar = Some("  ".into());
        assert_eq!(NewAssistant::from_request(&req).unwrap().avatar, DEFAULT_AVATAR);
    }

    #[test]
    fn fields_are_sanitized() {
        let req = CreateAssistantRequest {
            name: Some("  <em>Sage</em> ".into()),
            avatar: Some("\u{1f989}".into()),
            vibe: Some("playful".into()),
            goals: Some("writing posts\nand SEO".into()),
            extra: Some("<script>x</script>no spoilers".into()),
            site_title: Some("My\nBlog".into()),
            site_tagline: Some("Thoughts on things".into()),
            about_content: Some("b".repeat(900)),
        };
        let a = NewAssistant::from_request(&req).unwrap();
        assert_eq!(a.name, "Sage");
        assert_eq!(a.avatar, "\u{1f989}");
        assert_eq!(a.context.vibe, Some(Vibe::Playful));
        assert_eq!(a.context.goals, "writing posts\nand SEO");
        assert_eq!(a.context.extra, "no spoilers");
        assert_eq!(a.context.site_title, "My Blog");
        assert_eq!(a.context.about_content.chars().count(), ABOUT_MAX_CHARS);
    }

    #[test]
    fn unknown_vibe_is_dropped() {
        let mut req = request("Sage");
        req.vibe = Some("chaotic".into());
        assert_eq!(NewAssistant::from_request(&req).unwrap().context.vibe, None);
    }

    #[test]
    fn chat_url_joins_base() {
        assert_eq!(
            chat_url("https://example.com/"),
            "https://example.com/admin/assistant/chat"
        );
    }
}
