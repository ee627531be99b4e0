//! JSON-backed subjects and contexts.
//!
//! A captured request is a JSON object whose keys mirror what the host
//! exposed: `current_user` for the conventional accessor, `@user` for the
//! conventional field, and `intercom_custom_data.user` for extra custom
//! data (likewise for companies). Lookup expressions walk the document.
//!
//! JSON has no time type. A string is read as a time only when it parses as
//! RFC 3339 *and* its field name ends in `_at` (`created_at`,
//! `signed_up_at`); every other string stays a string. Integers beyond the
//! `i64` range are kept as decimal strings.

use chrono::DateTime;
use serde_json::Value;

use crate::{
  context::{EvalError, LookupExpression, ResolutionContext},
  subject::{ProbeError, Record, Subject, SubjectKind},
  value::FieldValue,
};

/// Key under which a JSON document carries the persistence flag.
pub const NEW_RECORD_KEY: &str = "new_record";

/// Key holding the per-kind extra custom data objects.
pub const EXTRA_CUSTOM_DATA_KEY: &str = "intercom_custom_data";

static NULL: Value = Value::Null;

// ─── Subject ─────────────────────────────────────────────────────────────────

/// Suffix marking a field whose RFC 3339 strings are times.
pub const TIME_FIELD_SUFFIX: &str = "_at";

fn to_field_value(name: &str, value: &Value) -> Result<Option<FieldValue>, ProbeError> {
  Ok(match value {
    Value::Null => None,
    Value::Bool(b) => Some(FieldValue::Bool(*b)),
    Value::Number(n) => Some(if let Some(i) = n.as_i64() {
      FieldValue::Int(i)
    } else if n.is_u64() {
      FieldValue::Str(n.to_string())
    } else {
      FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
    }),
    Value::String(s) if name.ends_with(TIME_FIELD_SUFFIX) => {
      Some(match DateTime::parse_from_rfc3339(s) {
        Ok(t) => FieldValue::from(t),
        Err(_) => FieldValue::Str(s.clone()),
      })
    }
    Value::String(s) => Some(FieldValue::Str(s.clone())),
    Value::Array(_) | Value::Object(_) => {
      return Err(ProbeError::Unsupported {
        field: name.to_owned(),
      });
    }
  })
}

impl Subject for Value {
  fn field(&self, name: &str) -> Result<Option<FieldValue>, ProbeError> {
    let Value::Object(map) = self else {
      return Err(ProbeError::NotARecord);
    };
    match map.get(name) {
      Some(value) => to_field_value(name, value),
      None => Ok(None),
    }
  }

  fn is_new_record(&self) -> Result<bool, ProbeError> {
    let Value::Object(map) = self else {
      return Err(ProbeError::NotARecord);
    };
    match map.get(NEW_RECORD_KEY) {
      None | Some(Value::Null) => Ok(false),
      Some(Value::Bool(b)) => Ok(*b),
      Some(_) => Err(ProbeError::Failed {
        field:  NEW_RECORD_KEY.to_owned(),
        reason: "expected a boolean".to_owned(),
      }),
    }
  }
}

/// Convert a JSON object into a [`Record`], skipping non-scalar entries.
pub fn record_from_object(value: &Value) -> Option<Record> {
  let Value::Object(map) = value else {
    return None;
  };
  let mut record = Record::new();
  for (key, value) in map {
    match to_field_value(key, value) {
      Ok(Some(v)) => record.insert(key.clone(), v),
      Ok(None) => {}
      Err(e) => tracing::warn!(key = %key, error = %e, "skipping extra custom data entry"),
    }
  }
  Some(record)
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// A resolution context over a captured JSON document.
///
/// Subjects it yields are plain [`Value`]s; see the module docs for how
/// their strings and numbers map onto [`FieldValue`].
#[derive(Debug, Clone)]
pub struct JsonContext {
  document: Value,
}

impl JsonContext {
  pub fn new(document: Value) -> Self { Self { document } }

  pub fn document(&self) -> &Value { &self.document }

  fn non_null(&self, key: &str) -> Option<Value> {
    self.document.get(key).filter(|v| !v.is_null()).cloned()
  }
}

impl ResolutionContext for JsonContext {
  type Subject = Value;

  fn evaluate(
    &self,
    expression: &LookupExpression,
  ) -> Result<Option<Value>, EvalError> {
    let root = expression.root();
    let mut current = self
      .document
      .get(root)
      .ok_or_else(|| EvalError::Undefined(root.to_owned()))?;

    for segment in &expression.segments()[1..] {
      current = match current {
        Value::Object(map) => map.get(segment).unwrap_or(&NULL),
        Value::Null => {
          return Err(EvalError::failed(format!(
            "`{segment}` looked up on null in `{expression}`"
          )));
        }
        _ => {
          return Err(EvalError::failed(format!(
            "`{segment}` looked up on a non-object in `{expression}`"
          )));
        }
      };
    }

    Ok(Some(current.clone()).filter(|v| !v.is_null()))
  }

  fn conventional_accessor(&self, kind: SubjectKind) -> Option<Value> {
    self.non_null(kind.conventional_accessor())
  }

  fn conventional_field(&self, kind: SubjectKind) -> Option<Value> {
    self.non_null(kind.conventional_field())
  }

  fn extra_custom_data(&self, kind: SubjectKind) -> Option<Record> {
    let data = self.document.get(EXTRA_CUSTOM_DATA_KEY)?.get(kind.as_str())?;
    let record = record_from_object(data);
    if record.is_none() {
      tracing::warn!(%kind, "extra custom data is not an object; ignoring");
    }
    record
  }
}
