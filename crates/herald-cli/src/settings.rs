//! Settings loading: TOML file plus `HERALD_*` environment overrides.

use std::path::Path;

use anyhow::Context as _;
use herald_core::{config::LookupConfig, settings::SettingsDocument};

/// Load and validate the lookup configuration.
///
/// A missing file is not an error; the environment alone may configure
/// everything. Nested keys use `__` in variable names, e.g.
/// `HERALD_USER__CURRENT=account.owner`. Keys read from the file keep their
/// case; keys from the environment arrive lowercased.
pub fn load(path: &Path) -> anyhow::Result<LookupConfig> {
  if !path.exists() {
    tracing::info!(path = %path.display(), "settings file not found; using defaults");
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("HERALD")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read settings")?;

  let document: SettingsDocument = settings
    .try_deserialize()
    .context("failed to deserialise settings")?;

  let lookup = LookupConfig::try_from(document)
    .with_context(|| format!("invalid settings in {}", path.display()))?;

  tracing::debug!(
    user_custom_data = lookup.user().subject.custom_data.len(),
    company_custom_data = lookup.company().subject.custom_data.len(),
    "settings loaded"
  );
  Ok(lookup)
}
