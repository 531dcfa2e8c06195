//! Pure state machine for the setup wizard. No I/O.
//!
//! Four named steps, each with exactly one forward transition:
//! `Name → Avatar → Context → Done`. There is no way back. The browser
//! script (`assistant-setup.js`) mirrors these steps one to one.

use serde::Serialize;

use crate::{
    avatar::{AVATAR_PALETTE, DEFAULT_AVATAR},
    connection::ConnectionConfig,
    context::{SiteFacts, Vibe},
    error::{Error, Result},
    service::{CreateAssistantRequest, NAME_REQUIRED},
};

/// Steps in the setup wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Name,
    Avatar,
    Context,
    Done,
}

impl WizardStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Avatar => "avatar",
            Self::Context => "context",
            Self::Done => "done",
        }
    }

    /// The single step reachable from this one.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Name => Some(Self::Avatar),
            Self::Avatar => Some(Self::Context),
            Self::Context => Some(Self::Done),
            Self::Done => None,
        }
    }
}

/// Answers collected in the context step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextAnswers {
    pub vibe: Option<Vibe>,
    pub goals: String,
    pub extra: String,
}

/// What the operator (or the server) did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    SubmitName(String),
    SelectAvatar(String),
    ConfirmAvatar,
    SubmitContext(ContextAnswers),
    CreationSucceeded { user_id: i64, chat_url: String },
    CreationFailed(String),
}

impl WizardEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::SubmitName(_) => "submit_name",
            Self::SelectAvatar(_) => "select_avatar",
            Self::ConfirmAvatar => "confirm_avatar",
            Self::SubmitContext(_) => "submit_context",
            Self::CreationSucceeded { .. } => "creation_succeeded",
            Self::CreationFailed(_) => "creation_failed",
        }
    }
}

/// Outcome of the creation call, kept for the confirmation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub user_id: i64,
    pub chat_url: String,
}

/// The wizard state, advanced one event at a time.
#[derive(Debug, Clone)]
pub struct WizardState {
    pub step: WizardStep,
    pub name: String,
    pub avatar: String,
    pub answers: ContextAnswers,
    /// True between submitting the context and hearing back from the server.
    /// The submit control is disabled while set.
    pub submitting: bool,
    /// Last server error, shown verbatim in the context step.
    pub error: Option<String>,
    pub created: Option<Created>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Name,
            name: String::new(),
            avatar: DEFAULT_AVATAR.to_owned(),
            answers: ContextAnswers::default(),
            submitting: false,
            error: None,
            created: None,
        }
    }

    /// Heading for the current step.
    pub fn prompt(&self) -> String {
        match self.step {
            WizardStep::Name => "What do you want to call them?".to_owned(),
            WizardStep::Avatar => format!("{} needs a face", self.name),
            WizardStep::Context => format!("What should {} know about you?", self.name),
            WizardStep::Done => format!(
                "{} noticed a few things about your site. Want to hear?",
                self.name
            ),
        }
    }

    /// Apply an event, returning the step the wizard is in afterwards.
    pub fn apply(&mut self, event: WizardEvent) -> Result<WizardStep> {
        match (self.step, event) {
            (WizardStep::Name, WizardEvent::SubmitName(input)) => {
                let name = input.trim();
                if name.is_empty() {
                    return Err(Error::message(NAME_REQUIRED));
                }
                self.name = name.to_owned();
                self.step = WizardStep::Avatar;
            },
            (WizardStep::Avatar, WizardEvent::SelectAvatar(glyph)) => {
                if !AVATAR_PALETTE.contains(&glyph.as_str()) {
                    return Err(Error::message(format!("{glyph} is not in the palette")));
                }
                self.avatar = glyph;
            },
            (WizardStep::Avatar, WizardEvent::ConfirmAvatar) => {
                self.step = WizardStep::Context;
            },
            (WizardStep::Context, WizardEvent::SubmitContext(answers)) if !self.submitting => {
                self.answers = answers;
                self.submitting = true;
                self.error = None;
            },
            (WizardStep::Context, WizardEvent::CreationSucceeded { user_id, chat_url })
                if self.submitting =>
            {
                self.submitting = false;
                self.created = Some(Created { user_id, chat_url });
                self.step = WizardStep::Done;
            },
            (WizardStep::Context, WizardEvent::CreationFailed(message)) if self.submitting => {
                self.submitting = false;
                self.error = Some(message);
            },
            (step, event) => {
                return Err(Error::Transition {
                    step: step.as_str(),
                    event: event.name(),
                });
            },
        }
        Ok(self.step)
    }

    pub fn is_done(&self) -> bool {
        self.step == WizardStep::Done
    }

    /// Fields for the creation call, including the read-only site facts.
    pub fn request(&self, site: &SiteFacts) -> CreateAssistantRequest {
        CreateAssistantRequest {
            name: Some(self.name.clone()),
            avatar: Some(self.avatar.clone()),
            vibe: self.answers.vibe.map(|v| v.as_str().to_owned()),
            goals: Some(self.answers.goals.clone()),
            extra: Some(self.answers.extra.clone()),
            site_title: Some(site.title.clone()),
            site_tagline: Some(site.tagline.clone()),
            about_content: Some(site.about.clone()),
        }
    }

    /// Snippet for connecting an external agent. Only available once done.
    pub fn connection_config(&self, site_url: &str) -> Option<ConnectionConfig> {
        self.is_done()
            .then(|| ConnectionConfig::new(site_url, &self.name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn at_context() -> WizardState {
        let mut s = WizardState::new();
        s.apply(WizardEvent::SubmitName("Sage".into())).unwrap();
        s.apply(WizardEvent::ConfirmAvatar).unwrap();
        s
    }

    #[test]
    fn full_wizard_flow() {
        let mut s = WizardState::new();
        assert_eq!(s.step, WizardStep::Name);
        assert_eq!(s.avatar, DEFAULT_AVATAR);

        assert_eq!(
            s.apply(WizardEvent::SubmitName("  Sage ".into())).unwrap(),
            WizardStep::Avatar
        );
        assert_eq!(s.name, "Sage");
        assert_eq!(s.prompt(), "Sage needs a face");

        s.apply(WizardEvent::SelectAvatar("\u{1f9e0}".into()))
            .unwrap();
        s.apply(WizardEvent::SelectAvatar("\u{1f989}".into()))
            .unwrap();
        assert_eq!(s.avatar, "\u{1f989}");
        assert_eq!(s.apply(WizardEvent::ConfirmAvatar).unwrap(), WizardStep::Context);

        s.apply(WizardEvent::SubmitContext(ContextAnswers {
            vibe: Some(Vibe::Playful),
            goals: "writing posts".into(),
            extra: String::new(),
        }))
        .unwrap();
        assert!(s.submitting);

        let step = s
            .apply(WizardEvent::CreationSucceeded {
                user_id: 7,
                chat_url: "https://example.com/admin/assistant/chat".into(),
            })
            .unwrap();
        assert_eq!(step, WizardStep::Done);
        assert!(s.is_done());
        assert_eq!(s.created.as_ref().map(|c| c.user_id), Some(7));
    }

    #[test]
    fn blank_name_keeps_first_step() {
        let mut s = WizardState::new();
        assert!(s.apply(WizardEvent::SubmitName("   ".into())).is_err());
        assert_eq!(s.step, WizardStep::Name);
    }

    #[test]
    fn avatar_outside_palette_is_refused() {
        let mut s = WizardState::new();
        s.apply(WizardEvent::SubmitName("Scout".into())).unwrap();
        assert!(s.apply(WizardEvent::SelectAvatar("X".into())).is_err());
        assert_eq!(s.avatar, DEFAULT_AVATAR);
    }

    #[test]
    fn failure_stays_on_context_and_rearms_submit() {
        let mut s = at_context();
        s.apply(WizardEvent::SubmitContext(ContextAnswers::default()))
            .unwrap();
        let step = s
            .apply(WizardEvent::CreationFailed("A user named \"Sage\" already exists.".into()))
            .unwrap();
        assert_eq!(step, WizardStep::Context);
        assert!(!s.submitting);
        assert_eq!(
            s.error.as_deref(),
            Some("A user named \"Sage\" already exists.")
        );

        // Manual retry is allowed.
        s.apply(WizardEvent::SubmitContext(ContextAnswers::default()))
            .unwrap();
        assert!(s.error.is_none());
    }

    #[test]
    fn no_backward_or_skipping_transitions() {
        let mut s = WizardState::new();
        assert!(matches!(
            s.apply(WizardEvent::ConfirmAvatar),
            Err(Error::Transition { step: "name", .. })
        ));

        let mut s = at_context();
        assert!(s.apply(WizardEvent::SubmitName("Other".into())).is_err());
        assert!(
            s.apply(WizardEvent::CreationSucceeded {
                user_id: 1,
                chat_url: String::new(),
            })
            .is_err(),
            "success without a pending submission"
        );
        assert_eq!(s.step, WizardStep::Context);
    }

    #[test]
    fn each_step_has_one_successor() {
        assert_eq!(WizardStep::Name.next(), Some(WizardStep::Avatar));
        assert_eq!(WizardStep::Avatar.next(), Some(WizardStep::Context));
        assert_eq!(WizardStep::Context.next(), Some(WizardStep::Done));
        assert_eq!(WizardStep::Done.next(), None);
    }

    #[test]
    fn request_carries_site_facts() {
        let mut s = at_context();
        s.apply(WizardEvent::SubmitContext(ContextAnswers {
            vibe: Some(Vibe::Minimal),
            goals: "seo".into(),
            extra: "none".into(),
        }))
        .unwrap();
        let site = SiteFacts::new("My Blog", "Thoughts on things", "<p>About us</p>");
        let req = s.request(&site);
        assert_eq!(req.name.as_deref(), Some("Sage"));
        assert_eq!(req.vibe.as_deref(), Some("minimal"));
        assert_eq!(req.site_tagline.as_deref(), Some("Thoughts on things"));
        assert_eq!(req.about_content.as_deref(), Some("About us"));
    }

    #[test]
    fn connection_config_only_when_done() {
        let s = at_context();
        assert!(s.connection_config("https://example.com").is_none());
    }
}
