//! Client configuration: CLI flags and `SALTERIO_*` variables over an optional
//! TOML file over built-in defaults.
//!
//! ```toml
//! site_url = "https://salterio.example"
//! store_path = "~/.local/share/salterio/mirror.db"
//! sync_interval_secs = 300
//!
//! [remote]
//! url = "https://xyz.supabase.co"
//! anon_key = "…"
//! ```

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use clap::Args;
use salterio_remote::RemoteConfig;
use serde::Deserialize;

use crate::{
  Error, Result,
  context::{RuntimeContext, SyncPolicy},
  scheduler::DEFAULT_SYNC_INTERVAL,
};

pub const DEFAULT_SITE_URL: &str = "http://localhost:4321";
pub const DEFAULT_STORE_PATH: &str = "~/.local/share/salterio/mirror.db";

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", global = true)]
  pub config: Option<PathBuf>,

  /// Base URL of the Salterio site serving `/api/songs.json`.
  #[arg(long, env = "SALTERIO_SITE_URL", global = true)]
  pub site_url: Option<String>,

  /// URL of the hosted data service.
  #[arg(long, env = "SALTERIO_DATA_URL", global = true)]
  pub data_url: Option<String>,

  /// Public anonymous key for the data service.
  #[arg(long, env = "SALTERIO_ANON_KEY", global = true, hide_env_values = true)]
  pub anon_key: Option<String>,

  /// Location of the local mirror database.
  #[arg(long, env = "SALTERIO_STORE", global = true)]
  pub store: Option<PathBuf>,

  /// Whether this client keeps a persistent mirror (default: true).
  #[arg(long, env = "SALTERIO_INSTALLED", global = true)]
  pub installed: Option<bool>,

  /// Treat this as a development build (default: false).
  #[arg(long, env = "SALTERIO_DEVELOPMENT", global = true)]
  pub development: Option<bool>,

  /// `always` or `installed-or-development`.
  #[arg(long, env = "SALTERIO_SYNC_POLICY", global = true)]
  pub sync_policy: Option<SyncPolicy>,

  /// Seconds between background sync cycles (default: 300).
  #[arg(long, env = "SALTERIO_SYNC_INTERVAL", global = true)]
  pub sync_interval: Option<u64>,
}

// ─── Config file ─────────────────────────────────────────────────────────────

#[derive(Deserialize, Debug, Default)]
pub struct ConfigFile {
  #[serde(default)]
  pub site_url:           Option<String>,
  #[serde(default)]
  pub store_path:         Option<PathBuf>,
  #[serde(default)]
  pub installed:          Option<bool>,
  #[serde(default)]
  pub development:        Option<bool>,
  #[serde(default)]
  pub sync_policy:        Option<SyncPolicy>,
  #[serde(default)]
  pub sync_interval_secs: Option<u64>,
  #[serde(default)]
  pub remote:             Option<RemoteFile>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RemoteFile {
  #[serde(default)]
  pub url:      Option<String>,
  #[serde(default)]
  pub anon_key: Option<String>,
}

impl ConfigFile {
  pub fn parse(raw: &str) -> Result<Self> {
    toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
  }

  pub fn read(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
      Error::Config(format!("reading {}: {e}", path.display()))
    })?;
    Self::parse(&raw)
  }
}

// ─── Resolved config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub site_url:      String,
  /// `None` when no data service is configured; sync is then unavailable.
  pub remote:        Option<RemoteConfig>,
  pub store_path:    PathBuf,
  pub context:       RuntimeContext,
  pub policy:        SyncPolicy,
  pub sync_interval: Duration,
}

impl ClientConfig {
  /// Read the file named by `args.config`, if any, and resolve.
  pub fn load(args: ConfigArgs) -> Result<Self> {
    let file = match &args.config {
      Some(path) => ConfigFile::read(&expand_tilde(path))?,
      None => ConfigFile::default(),
    };
    Self::resolve(args, file)
  }

  /// CLI flags override the file, which overrides defaults.
  pub fn resolve(args: ConfigArgs, file: ConfigFile) -> Result<Self> {
    let remote_file = file.remote.unwrap_or_default();
    let remote = match (
      args.data_url.or(remote_file.url),
      args.anon_key.or(remote_file.anon_key),
    ) {
      (Some(url), Some(anon_key)) => Some(RemoteConfig { url, anon_key }),
      (None, None) => None,
      (Some(_), None) => {
        return Err(Error::Config("data service url set without anon_key".into()));
      }
      (None, Some(_)) => {
        return Err(Error::Config("anon_key set without data service url".into()));
      }
    };

    let store_path = args
      .store
      .or(file.store_path)
      .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

    let sync_interval = args
      .sync_interval
      .or(file.sync_interval_secs)
      .map_or(DEFAULT_SYNC_INTERVAL, Duration::from_secs);
    if sync_interval.is_zero() {
      return Err(Error::Config("sync interval must be positive".into()));
    }

    Ok(Self {
      site_url: args
        .site_url
        .or(file.site_url)
        .unwrap_or_else(|| DEFAULT_SITE_URL.to_owned()),
      remote,
      store_path: expand_tilde(&store_path),
      context: RuntimeContext {
        installed:   args.installed.or(file.installed).unwrap_or(true),
        development: args.development.or(file.development).unwrap_or(false),
      },
      policy: args.sync_policy.or(file.sync_policy).unwrap_or_default(),
      sync_interval,
    })
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

#[cfg(test)]
mod tests {
  use super::*;

  const FILE: &str = r#"
    site_url = "https://salterio.example"
    store_path = "/var/lib/salterio.db"
    installed = false
    sync_policy = "always"
    sync_interval_secs = 60

    [remote]
    url = "https://data.example"
    anon_key = "file-key"
  "#;

  #[test]
  fn defaults() {
    let cfg =
      ClientConfig::resolve(ConfigArgs::default(), ConfigFile::default()).unwrap();
    assert_eq!(cfg.site_url, DEFAULT_SITE_URL);
    assert!(cfg.remote.is_none());
    assert_eq!(cfg.context, RuntimeContext { installed: true, development: false });
    assert_eq!(cfg.policy, SyncPolicy::InstalledOrDevelopment);
    assert_eq!(cfg.sync_interval, Duration::from_secs(300));
    assert!(cfg.store_path.ends_with("salterio/mirror.db"));
  }

  #[test]
  fn file_values_apply() {
    let file = ConfigFile::parse(FILE).unwrap();
    let cfg = ClientConfig::resolve(ConfigArgs::default(), file).unwrap();

    assert_eq!(cfg.site_url, "https://salterio.example");
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/salterio.db"));
    assert!(!cfg.context.installed);
    assert_eq!(cfg.policy, SyncPolicy::Always);
    assert_eq!(cfg.sync_interval, Duration::from_secs(60));
    let remote = cfg.remote.unwrap();
    assert_eq!(remote.url, "https://data.example");
    assert_eq!(remote.anon_key, "file-key");
  }

  #[test]
  fn flags_override_the_file() {
    let args = ConfigArgs {
      anon_key: Some("flag-key".into()),
      installed: Some(true),
      sync_interval: Some(30),
      ..ConfigArgs::default()
    };
    let cfg = ClientConfig::resolve(args, ConfigFile::parse(FILE).unwrap()).unwrap();

    let remote = cfg.remote.unwrap();
    assert_eq!(remote.url, "https://data.example");
    assert_eq!(remote.anon_key, "flag-key");
    assert!(cfg.context.installed);
    assert_eq!(cfg.sync_interval, Duration::from_secs(30));
  }

  #[test]
  fn half_configured_remote_is_rejected() {
    let args = ConfigArgs { data_url: Some("https://data.example".into()), ..ConfigArgs::default() };
    assert!(matches!(
      ClientConfig::resolve(args, ConfigFile::default()),
      Err(Error::Config(_))
    ));
  }

  #[test]
  fn zero_interval_is_rejected() {
    let args = ConfigArgs { sync_interval: Some(0), ..ConfigArgs::default() };
    assert!(ClientConfig::resolve(args, ConfigFile::default()).is_err());
  }

  #[test]
  fn bad_toml_is_a_config_error() {
    assert!(matches!(ConfigFile::parse("site_url = ["), Err(Error::Config(_))));
  }
}
