//! Assistant onboarding: the four-step setup wizard, the context collected
//! along the way, and the contract for creating the assistant account.
//!
//! Flow: name → avatar → context → done.

pub mod avatar;
pub mod connection;
pub mod context;
pub mod error;
pub mod sanitize;
pub mod service;
pub mod state;
pub mod wizard;

pub use {
    avatar::{AVATAR_PALETTE, DEFAULT_AVATAR},
    connection::ConnectionConfig,
    context::{AssistantContext, SiteFacts, Vibe},
    error::{Context, Error, Result},
    service::{AssistantCreator, CreateAssistantError, NewAssistant},
    state::{WizardEvent, WizardState, WizardStep},
};
