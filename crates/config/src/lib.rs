//! Configuration loading and env substitution.
//!
//! Config files: `clawpress.toml`, `clawpress.yaml` or `clawpress.json`,
//! searched in `./` then `~/.config/clawpress/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in the raw
//! file before parsing.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        config_dir, data_dir, discover_and_load, discover_and_load_from, find_config_file,
        load_config,
    },
    schema::{AuthConfig, ClawpressConfig, DatabaseConfig, ServerConfig, SiteConfig},
};
