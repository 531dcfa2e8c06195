use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::ClawpressConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "clawpress.toml",
    "clawpress.yaml",
    "clawpress.yml",
    "clawpress.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<ClawpressConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./clawpress.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/clawpress/clawpress.{toml,yaml,yml,json}` (user-global)
///
/// Returns `ClawpressConfig::default()` if no config file is found or the
/// file fails to parse.
pub fn discover_and_load() -> ClawpressConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return ClawpressConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            ClawpressConfig::default()
        },
    }
}

/// Like [`discover_and_load`], but an explicit path wins over discovery and
/// must load cleanly.
pub fn discover_and_load_from(explicit: Option<&Path>) -> anyhow::Result<ClawpressConfig> {
    let Some(path) = explicit else {
        return Ok(discover_and_load());
    };
    debug!(path = %path.display(), "loading explicit config");
    load_config(path).with_context(|| format!("invalid config file {}", path.display()))
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/clawpress/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "clawpress").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory holding the SQLite database.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "clawpress")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".clawpress"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<ClawpressConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
