//! Browser-facing admin pages: the user roster and profile pages, the setup
//! wizard, the chat page, sign-in, and static assets.
//!
//! This crate depends on `clawpress-gateway` for [`AppState`] and the stores.
//! It provides [`web_routes()`] which returns an Axum `Router` that the CLI
//! merges into the gateway router.

pub mod admin;
pub mod assets;
pub mod avatar;
pub mod error;
pub mod pages;
pub mod profile;
pub mod templates;

use {
    axum::{
        Router,
        routing::{get, post},
    },
    clawpress_gateway::server::AppState,
    clawpress_onboarding::service::{CHAT_PAGE_PATH, SETUP_PAGE_PATH},
};

pub use error::{Error, Result};

/// Build the web router: admin pages, sign-in and assets.
pub fn web_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route(admin::USERS_PAGE_PATH, get(pages::users_page))
        .route("/admin/users/{id}", get(pages::profile_page))
        .route(SETUP_PAGE_PATH, get(pages::setup_page))
        .route(CHAT_PAGE_PATH, get(pages::chat_page))
        .route(
            pages::LOGIN_PATH,
            get(pages::login_page).post(pages::login_submit),
        )
        .route("/logout", post(pages::logout))
        .route(
            "/assets/v/{version}/{*path}",
            get(assets::versioned_asset_handler),
        )
        .route("/assets/{*path}", get(assets::asset_handler))
}
