//! The `FromMessage` trait and the `impl_context!` helper every clawpress
//! crate uses to get `.context()` on its own error type.

pub mod error;

pub use error::FromMessage;
