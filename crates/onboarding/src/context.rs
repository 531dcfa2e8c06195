//! The context mapping attached to an assistant, and the site facts the
//! wizard previews in its context step.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::sanitize::{strip_all_tags, truncate_chars};

/// Longest "about" text kept when collecting site facts.
pub const ABOUT_MAX_CHARS: usize = 500;

/// Length of the "about" preview shown in the wizard.
pub const ABOUT_PREVIEW_CHARS: usize = 120;

/// Tone the assistant should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    Casual,
    Professional,
    Playful,
    Minimal,
}

impl Vibe {
    pub const ALL: [Vibe; 4] = [
        Self::Casual,
        Self::Professional,
        Self::Playful,
        Self::Minimal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Professional => "professional",
            Self::Playful => "playful",
            Self::Minimal => "minimal",
        }
    }

    /// Capitalized form used on the profile page.
    pub fn label(self) -> &'static str {
        match self {
            Self::Casual => "Casual",
            Self::Professional => "Professional",
            Self::Playful => "Playful",
            Self::Minimal => "Minimal",
        }
    }

    /// Option text in the wizard's vibe picker.
    pub fn choice_text(self) -> &'static str {
        match self {
            Self::Casual => "Casual & friendly",
            Self::Professional => "Professional & polished",
            Self::Playful => "Playful & creative",
            Self::Minimal => "Minimal & efficient",
        }
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vibe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown vibe: {s}"))
    }
}

/// Owner- and site-supplied facts stored on the assistant profile.
///
/// Serialized as a JSON object; empty fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibe: Option<Vibe>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub goals: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub extra: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub site_title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub site_tagline: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub about_content: String,
}

impl AssistantContext {
    /// "Knows about" line: the site title, with the tagline appended after an
    /// em dash when present. `None` without a title.
    pub fn knows_about(&self) -> Option<String> {
        if self.site_title.is_empty() {
            return None;
        }
        if self.site_tagline.is_empty() {
            Some(self.site_title.clone())
        } else {
            Some(format!("{} \u{2014} {}", self.site_title, self.site_tagline))
        }
    }
}

/// Read-only site facts shown in the wizard's context step and sent along
/// with the creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteFacts {
    pub title: String,
    pub tagline: String,
    /// Tag-stripped "about" text, at most [`ABOUT_MAX_CHARS`] characters.
    pub about: String,
}

impl SiteFacts {
    pub fn from_config(site: &clawpress_config::SiteConfig) -> Self {
        Self::new(&site.title, &site.tagline, &site.about_raw())
    }

    pub fn new(title: &str, tagline: &str, about_raw: &str) -> Self {
        Self {
            title: title.trim().to_owned(),
            tagline: tagline.trim().to_owned(),
            about: truncate_chars(&strip_all_tags(about_raw), ABOUT_MAX_CHARS),
        }
    }

    /// The preview box is only shown when there is a title or tagline.
    pub fn has_preview(&self) -> bool {
        !self.title.is_empty() || !self.tagline.is_empty()
    }

    pub fn about_preview(&self) -> String {
        truncate_chars(&self.about, ABOUT_PREVIEW_CHARS)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn vibe_parses_case_insensitively() {
        assert_eq!("Playful".parse::<Vibe>(), Ok(Vibe::Playful));
        assert_eq!(" minimal ".parse::<Vibe>(), Ok(Vibe::Minimal));
        assert!("loud".parse::<Vibe>().is_err());
        assert!("".parse::<Vibe>().is_err());
    }

    #[test]
    fn context_json_omits_empty_fields() {
        let ctx = AssistantContext {
            vibe: Some(Vibe::Casual),
            goals: "writing posts".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"vibe": "casual", "goals": "writing posts"})
        );

        let back: AssistantContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, ctx);
    }

    #[test]
    fn knows_about_joins_tagline() {
        let mut ctx = AssistantContext {
            site_title: "My Blog".into(),
            site_tagline: "Thoughts on things".into(),
            ..Default::default()
        };
        assert_eq!(
            ctx.knows_about().as_deref(),
            Some("My Blog \u{2014} Thoughts on things")
        );
        ctx.site_tagline.clear();
        assert_eq!(ctx.knows_about().as_deref(), Some("My Blog"));
        ctx.site_title.clear();
        ctx.site_tagline = "orphan tagline".into();
        assert_eq!(ctx.knows_about(), None);
    }

    #[test]
    fn site_facts_truncate_about() {
        let long = format!("<p>{}</p>", "a".repeat(800));
        let facts = SiteFacts::new("Title", "", &long);
        assert_eq!(facts.about.chars().count(), ABOUT_MAX_CHARS);
        assert_eq!(facts.about_preview().chars().count(), ABOUT_PREVIEW_CHARS);
        assert!(facts.has_preview());
        assert!(!SiteFacts::new("", "", "about only").has_preview());
    }
}
