//! The read-only "Assistant Profile" section on a user's profile page.

use {
    clawpress_gateway::users::{User, UserStore, is_ai_assistant},
    clawpress_onboarding::AssistantContext,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantSection {
    pub heading: String,
    pub rows: Vec<ProfileRow>,
}

/// Summary rows for a stored context. A row is left out when its source
/// field is empty.
pub fn profile_rows(ctx: &AssistantContext) -> Vec<ProfileRow> {
    let mut rows = Vec::new();
    if let Some(vibe) = ctx.vibe {
        rows.push(ProfileRow {
            label: "Vibe",
            value: vibe.label().to_owned(),
        });
    }
    if let Some(knows) = ctx.knows_about() {
        rows.push(ProfileRow {
            label: "Knows about",
            value: knows,
        });
    }
    if !ctx.goals.is_empty() {
        rows.push(ProfileRow {
            label: "Helping with",
            value: ctx.goals.clone(),
        });
    }
    rows
}

/// The section for `user`, or `None` unless they are an assistant.
pub async fn assistant_section(
    store: &dyn UserStore,
    user: &User,
) -> anyhow::Result<Option<AssistantSection>> {
    if !is_ai_assistant(user) {
        return Ok(None);
    }
    let glyph = store.avatar_glyph(user.id).await?;
    let ctx = store.assistant_context(user.id).await?;
    Ok(Some(AssistantSection {
        heading: format!("{glyph} Assistant Profile"),
        rows: profile_rows(&ctx),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use clawpress_onboarding::Vibe;

    use super::*;

    fn labels(ctx: &AssistantContext) -> Vec<&'static str> {
        profile_rows(ctx).iter().map(|r| r.label).collect()
    }

    #[test]
    fn full_context_shows_all_rows() {
        let ctx = AssistantContext {
            vibe: Some(Vibe::Playful),
            goals: "writing posts".into(),
            site_title: "My Blog".into(),
            site_tagline: "Thoughts on things".into(),
            ..Default::default()
        };
        assert_eq!(profile_rows(&ctx), vec![
            ProfileRow {
                label: "Vibe",
                value: "Playful".into(),
            },
            ProfileRow {
                label: "Knows about",
                value: "My Blog \u{2014} Thoughts on things".into(),
            },
            ProfileRow {
                label: "Helping with",
                value: "writing posts".into(),
            },
        ]);
    }

    #[test]
    fn empty_fields_omit_their_rows() {
        let base = AssistantContext {
            vibe: Some(Vibe::Minimal),
            goals: "seo".into(),
            site_title: "My Blog".into(),
            ..Default::default()
        };

        let mut ctx = base.clone();
        ctx.vibe = None;
        assert_eq!(labels(&ctx), ["Knows about", "Helping with"]);

        let mut ctx = base.clone();
        ctx.goals.clear();
        assert_eq!(labels(&ctx), ["Vibe", "Knows about"]);

        let mut ctx = base;
        ctx.site_title.clear();
        ctx.site_tagline = "tagline alone".into();
        assert_eq!(labels(&ctx), ["Vibe", "Helping with"]);

        assert!(profile_rows(&AssistantContext::default()).is_empty());
    }
}
