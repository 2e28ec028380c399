//! Server configuration.
//!
//! Read from a TOML file (optional) layered under `TEAKE_*` environment
//! variables, e.g. `TEAKE_ADMIN_EMAIL`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Marks a value copied from the example config and never filled in.
const PLACEHOLDER_PREFIX: &str = "YOUR_";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  /// SQLite database file.
  pub store_path:      PathBuf,
  /// Directory holding one subdirectory per bucket.
  pub objects_root:    PathBuf,
  /// URL under which `objects_root` is reachable, e.g.
  /// `https://teake.example/objects`.
  pub public_base_url: String,
  pub admin_email:     String,
}

impl ServerConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = ::config::Config::builder()
      .add_source(::config::File::from(path).required(false))
      .add_source(::config::Environment::with_prefix("TEAKE"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.objects_root = expand_tilde(&cfg.objects_root);
    Ok(cfg)
  }

  /// False while the public URL or admin email are missing or still hold
  /// placeholder values.
  pub fn is_configured(&self) -> bool {
    [self.public_base_url.as_str(), self.admin_email.as_str()]
      .iter()
      .all(|v| !v.trim().is_empty() && !v.starts_with(PLACEHOLDER_PREFIX))
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
