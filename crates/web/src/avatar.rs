//! Avatar rendering with the assistant override.
//!
//! Every avatar on the admin pages goes through [`emoji_avatar`]: assistant
//! accounts get a round badge with their glyph, everyone else keeps the
//! original markup.

use {
    clawpress_gateway::users::{User, UserStore, is_ai_assistant},
    sha2::{Digest, Sha256},
    tracing::warn,
};

/// CSS class on the assistant badge.
pub const BADGE_CLASS: &str = "clawpress-emoji-avatar";

/// Avatar edge length in pixels.
pub const AVATAR_SIZE: u32 = 32;

/// Whatever an avatar lookup was keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarSubject {
    Id(i64),
    /// An object that may carry a user id, like a comment.
    Object { user_id: Option<i64> },
    Email(String),
}

impl AvatarSubject {
    /// All digits is an id; anything else is treated as an email address.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.is_empty()
            && raw.bytes().all(|b| b.is_ascii_digit())
            && let Ok(id) = raw.parse()
        {
            return Self::Id(id);
        }
        Self::Email(raw.to_owned())
    }

    async fn resolve(&self, store: &dyn UserStore) -> anyhow::Result<Option<User>> {
        match self {
            Self::Id(id) | Self::Object { user_id: Some(id) } if *id > 0 => store.get(*id).await,
            Self::Email(email) if email.contains('@') => store.get_by_email(email).await,
            _ => Ok(None),
        }
    }
}

/// Replace `original` with the glyph badge when `subject` is an assistant.
/// Lookup failures leave `original` untouched.
pub async fn emoji_avatar(store: &dyn UserStore, original: String, subject: &AvatarSubject) -> String {
    let user = match subject.resolve(store).await {
        Ok(Some(user)) if is_ai_assistant(&user) => user,
        Ok(_) => return original,
        Err(e) => {
            warn!(?subject, error = %e, "avatar lookup failed");
            return original;
        },
    };
    match store.avatar_glyph(user.id).await {
        Ok(glyph) => emoji_badge(&glyph),
        Err(e) => {
            warn!(user_id = user.id, error = %e, "avatar glyph lookup failed");
            original
        },
    }
}

/// Default avatar for `user`, passed through the override.
pub async fn user_avatar(store: &dyn UserStore, user: &User) -> String {
    emoji_avatar(
        store,
        gravatar_img(&user.email, AVATAR_SIZE),
        &AvatarSubject::Id(user.id),
    )
    .await
}

/// Fixed-size circular badge showing `glyph`.
pub fn emoji_badge(glyph: &str) -> String {
    format!(
        "<span class=\"{BADGE_CLASS}\" style=\"display:inline-flex;align-items:center;justify-content:center;width:{AVATAR_SIZE}px;height:{AVATAR_SIZE}px;font-size:24px;border-radius:50%;background:#f0f0f1;\">{}</span>",
        escape_html(glyph)
    )
}

/// Gravatar image keyed by the SHA-256 of the normalized address.
pub fn gravatar_img(email: &str, size: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    format!(
        "<img alt=\"\" src=\"https://www.gravatar.com/avatar/{hash}?s={size}&amp;d=mp\" class=\"avatar\" width=\"{size}\" height=\"{size}\" />"
    )
}

/// Escape HTML special characters.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
