//! Per-action request tokens.
//!
//! A token is bound to the action, the user and their session, and to a
//! time tick of half the configured lifetime. Tokens from the current or the
//! previous tick are accepted, so a token lives between one half and one full
//! lifetime.

use {
    hmac::{Hmac, Mac},
    rand::RngCore,
    secrecy::ExposeSecret,
    sha2::Sha256,
};

use crate::auth::{now_secs, safe_equal};

type HmacSha256 = Hmac<Sha256>;

/// Hex characters kept from the MAC.
const TOKEN_LEN: usize = 10;

/// Actions a token can be issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceAction {
    CreateAssistant,
    AssistantChat,
}

impl NonceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateAssistant => "clawpress_create_assistant",
            Self::AssistantChat => "clawpress_assistant_chat",
        }
    }
}

/// How old an accepted token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceAge {
    Current,
    Previous,
}

pub struct NonceIssuer {
    key: Vec<u8>,
    lifetime_secs: u64,
}

impl NonceIssuer {
    pub fn new(key: impl Into<Vec<u8>>, lifetime_secs: u64) -> Self {
        Self {
            key: key.into(),
            lifetime_secs,
        }
    }

    /// Uses the configured secret, or a random one that lasts for this
    /// process only.
    pub fn from_config(auth: &clawpress_config::AuthConfig) -> Self {
        let key = match auth.nonce_secret.as_ref() {
            Some(secret) if !secret.expose_secret().is_empty() => {
                secret.expose_secret().as_bytes().to_vec()
            },
            _ => {
                tracing::warn!("no nonce secret configured, tokens will not survive a restart");
                let mut bytes = vec![0u8; 32];
                rand::rng().fill_bytes(&mut bytes);
                bytes
            },
        };
        Self::new(key, auth.nonce_lifetime_secs)
    }

    pub fn create(&self, action: NonceAction, user_id: i64, session: &str) -> String {
        self.create_at(action, user_id, session, now_secs())
    }

    pub fn verify(
        &self,
        token: &str,
        action: NonceAction,
        user_id: i64,
        session: &str,
    ) -> Option<NonceAge> {
        self.verify_at(token, action, user_id, session, now_secs())
    }

    pub fn create_at(&self, action: NonceAction, user_id: i64, session: &str, now: i64) -> String {
        self.sign(self.tick(now), action, user_id, session)
    }

    pub fn verify_at(
        &self,
        token: &str,
        action: NonceAction,
        user_id: i64,
        session: &str,
        now: i64,
    ) -> Option<NonceAge> {
        if token.is_empty() {
            return None;
        }
        let tick = self.tick(now);
        if safe_equal(token, &self.sign(tick, action, user_id, session)) {
            return Some(NonceAge::Current);
        }
        if tick > 0 && safe_equal(token, &self.sign(tick - 1, action, user_id, session)) {
            return Some(NonceAge::Previous);
        }
        None
    }

    fn tick(&self, now: i64) -> u64 {
        let half = (self.lifetime_secs / 2).max(1);
        u64::try_from(now).unwrap_or_default().div_ceil(half)
    }

    fn sign(&self, tick: u64, action: NonceAction, user_id: i64, session: &str) -> String {
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.key) else {
            return String::new();
        };
        mac.update(format!("{tick}|{}|{user_id}|{session}", action.as_str()).as_bytes());
        let digest = format!("{:x}", mac.finalize().into_bytes());
        digest[..TOKEN_LEN].to_owned()
    }
}
