//! Loosely-typed configuration documents and their validation.
//!
//! Files and environment variables only yield trees of untyped values. A
//! [`SettingsDocument`] captures that tree as-is; converting it into a
//! [`LookupConfig`] checks every shape up front and reports the first
//! mismatch by its dotted key.
//!
//! ```toml
//! [user]
//! current         = "account.owner"
//! lead_attributes = ["utm_source", "ref_data"]
//! custom_data     = { plan = "plan_name", beta = true }
//! avatar          = { type = "avatar", image_url = "https://example.org/a.jpg" }
//!
//! [company]
//! plan          = "plan_name"
//! monthly_spend = "mrr"
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
  config::{
    Accessor, Avatar, CompanyConfig, CustomData, LeadAttributes, LookupConfig,
    SubjectConfig, UserConfig, invalid_type,
  },
  context::LookupExpression,
  error::ConfigError,
  value::Scalar,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsDocument {
  pub user:    UserSettings,
  pub company: CompanySettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserSettings {
  pub current:         Option<Value>,
  pub custom_data:     Option<Value>,
  pub static_fields:   Option<Value>,
  pub lead_attributes: Option<Value>,
  pub avatar:          Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompanySettings {
  pub current:       Option<Value>,
  pub custom_data:   Option<Value>,
  pub static_fields: Option<Value>,
  pub plan:          Option<Value>,
  pub monthly_spend: Option<Value>,
}

impl TryFrom<SettingsDocument> for LookupConfig {
  type Error = ConfigError;

  fn try_from(doc: SettingsDocument) -> Result<Self, Self::Error> {
    let SettingsDocument { user, company } = doc;

    let user = UserConfig {
      subject:         subject_config(
        "user",
        user.current.as_ref(),
        user.custom_data.as_ref(),
        user.static_fields.as_ref(),
      )?,
      lead_attributes: match &user.lead_attributes {
        Some(v) => LeadAttributes::from_value("user.lead_attributes", v)?,
        None => LeadAttributes::default(),
      },
      avatar:          user
        .avatar
        .as_ref()
        .map(|v| Avatar::from_value("user.avatar", v))
        .transpose()?,
    };

    let company = CompanyConfig {
      subject:       subject_config(
        "company",
        company.current.as_ref(),
        company.custom_data.as_ref(),
        company.static_fields.as_ref(),
      )?,
      plan:          company
        .plan
        .as_ref()
        .map(|v| accessor("company.plan", v))
        .transpose()?,
      monthly_spend: company
        .monthly_spend
        .as_ref()
        .map(|v| accessor("company.monthly_spend", v))
        .transpose()?,
    };

    Ok(LookupConfig::new(user, company))
  }
}

fn subject_config(
  prefix: &str,
  current: Option<&Value>,
  custom_data: Option<&Value>,
  static_fields: Option<&Value>,
) -> Result<SubjectConfig, ConfigError> {
  let mut config = SubjectConfig::default();

  if let Some(current) = current {
    let Value::String(expr) = current else {
      return Err(invalid_type(&format!("{prefix}.current"), "a string", current));
    };
    config.current = Some(LookupExpression::parse(expr)?);
  }

  if let Some(custom_data) = custom_data {
    let key = format!("{prefix}.custom_data");
    let mut data = CustomData::default();
    for (name, value) in table(&key, custom_data)? {
      data.insert(name.clone(), accessor(&format!("{key}.{name}"), value)?);
    }
    config.custom_data = data;
  }

  if let Some(static_fields) = static_fields {
    let key = format!("{prefix}.static_fields");
    for (name, value) in table(&key, static_fields)? {
      let scalar = scalar(value)
        .ok_or_else(|| invalid_type(&format!("{key}.{name}"), "a scalar", value))?;
      config.static_fields.insert(name.clone(), scalar);
    }
  }

  Ok(config)
}

fn table<'a>(key: &str, value: &'a Value) -> Result<&'a Map<String, Value>, ConfigError> {
  match value {
    Value::Object(map) => Ok(map),
    other => Err(invalid_type(key, "a table", other)),
  }
}

/// Strings name a subject field; other scalars are constants.
fn accessor(key: &str, value: &Value) -> Result<Accessor, ConfigError> {
  match value {
    Value::String(name) => Ok(Accessor::field(name.clone())),
    other => scalar(other)
      .map(|s| Accessor::constant(s))
      .ok_or_else(|| invalid_type(key, "a field name or a scalar", other)),
  }
}

fn scalar(value: &Value) -> Option<Scalar> {
  match value {
    Value::Bool(b) => Some(Scalar::Bool(*b)),
    Value::Number(n) => Some(if let Some(i) = n.as_i64() {
      Scalar::Int(i)
    } else if n.is_u64() {
      Scalar::Str(n.to_string())
    } else {
      Scalar::Float(n.as_f64()?)
    }),
    Value::String(s) => Some(Scalar::Str(s.clone())),
    _ => None,
  }
}
