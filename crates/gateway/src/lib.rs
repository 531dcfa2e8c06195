//! Server side of the assistant controller: user and session storage,
//! action tokens, the current-user extractor, the action endpoint and the
//! HTTP server that hosts the web pages.

pub mod ajax;
pub mod auth;
pub mod auth_middleware;
pub mod nonce;
pub mod server;
pub mod state;
pub mod users;

