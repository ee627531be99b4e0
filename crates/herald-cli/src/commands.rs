//! Command implementations, kept free of printing so they can be tested.

use std::path::Path;

use anyhow::{Context as _, bail};
use herald_core::{
  config::LookupConfig,
  json::JsonContext,
  proxy::Proxy,
  subject::SubjectKind,
};
use serde_json::Value;

/// Human-readable description of the loaded configuration.
pub fn summary(config: &LookupConfig) -> Vec<String> {
  let mut lines = Vec::new();

  for kind in [SubjectKind::User, SubjectKind::Company] {
    let subject = config.subject(kind);
    let current = subject
      .current
      .as_ref()
      .map_or_else(|| "(none)".to_owned(), ToString::to_string);
    lines.push(format!("{kind}.current: {current}"));

    let mut fields: Vec<String> = config
      .delegated(kind)
      .into_iter()
      .map(|(name, _)| name.to_owned())
      .collect();
    fields.extend(subject.custom_data.keys().map(str::to_owned));
    fields.extend(subject.static_fields.keys().cloned());
    lines.push(format!("{kind}.fields: [{}]", fields.join(", ")));
  }

  let user = config.user();
  lines.push(format!(
    "user.lead_attributes: [{}]",
    user.lead_attributes.as_slice().join(", ")
  ));
  if let Some(avatar) = &user.avatar {
    lines.push(format!("user.avatar: {} {}", avatar.kind, avatar.image_url));
  }

  lines
}

pub fn read_context(path: &Path) -> anyhow::Result<Value> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read context {}", path.display()))?;
  serde_json::from_str(&raw)
    .with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Resolve `kind` from a captured context and render its payload.
///
/// Refuses to render a subject that fails validation. The lead view only
/// applies to users. The user's avatar, when configured, is attached under
/// `avatar`.
pub fn preview(
  config: &LookupConfig,
  document: Value,
  kind: SubjectKind,
  lead: bool,
) -> anyhow::Result<Value> {
  if lead && kind != SubjectKind::User {
    bail!("the lead view only applies to users, not {kind}");
  }

  let ctx = JsonContext::new(document);
  let proxy = Proxy::current_in_context(&ctx, kind, config)?;
  if !proxy.is_valid() {
    bail!("resolved {kind} is not usable: it has no identity or is unsaved");
  }

  let mut payload = proxy.to_payload(config);
  if lead {
    payload = payload.for_lead(&config.user().lead_attributes);
  }
  tracing::info!(%kind, fields = payload.len(), "payload built");

  let mut output = serde_json::to_value(&payload)?;
  if kind == SubjectKind::User
    && let Some(avatar) = &config.user().avatar
    && let Value::Object(map) = &mut output
  {
    map.insert("avatar".to_owned(), serde_json::to_value(avatar)?);
  }
  Ok(output)
}
