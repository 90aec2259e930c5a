//! How the client is running, and whether background sync applies to it.

use serde::Deserialize;
use strum::{Display, EnumString};

/// Facts about the running client, resolved once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeContext {
  /// Running as an installed app with a persistent local mirror.
  pub installed:   bool,
  /// Development build.
  pub development: bool,
}

/// When the sync agent is allowed to run.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SyncPolicy {
  /// Every client syncs.
  Always,
  /// Only installed clients and development builds sync.
  #[default]
  InstalledOrDevelopment,
}

impl SyncPolicy {
  pub fn allows(self, context: RuntimeContext) -> bool {
    match self {
      Self::Always => true,
      Self::InstalledOrDevelopment => context.installed || context.development,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn installed_or_development() {
    let policy = SyncPolicy::InstalledOrDevelopment;
    assert!(!policy.allows(RuntimeContext::default()));
    assert!(policy.allows(RuntimeContext { installed: true, development: false }));
    assert!(policy.allows(RuntimeContext { installed: false, development: true }));
    assert!(SyncPolicy::Always.allows(RuntimeContext::default()));
  }

  #[test]
  fn policy_names() {
    assert_eq!(
      SyncPolicy::from_str("installed-or-development").unwrap(),
      SyncPolicy::InstalledOrDevelopment
    );
    assert_eq!(SyncPolicy::Always.to_string(), "always");
  }
}
