//! Subject resolution: find the record to report for a request.
//!
//! Strategies run in a fixed order and the first one that yields a subject
//! wins:
//!
//! 1. the configured lookup expression, if any;
//! 2. the context's conventional accessor (`current_user`);
//! 3. the context's conventional field (`@user`).
//!
//! An expression whose target is undefined on the context falls through to
//! the next strategy. Any other evaluation failure is returned as
//! [`Error::Lookup`]. Validity is not checked here.

use crate::{
  config::LookupConfig,
  context::{EvalError, ResolutionContext},
  error::{Error, Result},
  subject::SubjectKind,
};

/// Locate the `kind` subject of `ctx`.
pub fn resolve<C>(
  ctx: &C,
  kind: SubjectKind,
  config: &LookupConfig,
) -> Result<C::Subject>
where
  C: ResolutionContext + ?Sized,
{
  if let Some(expression) = &config.subject(kind).current {
    match ctx.evaluate(expression) {
      Ok(Some(subject)) => return Ok(subject),
      Ok(None) => {
        tracing::debug!(%kind, %expression, "lookup expression yielded nothing");
      }
      Err(EvalError::Undefined(symbol)) => {
        tracing::debug!(%kind, %expression, %symbol, "lookup target undefined");
      }
      Err(EvalError::Failed(source)) => {
        return Err(Error::Lookup {
          kind,
          expression: expression.to_string(),
          source,
        });
      }
    }
  }

  if let Some(subject) = ctx.conventional_accessor(kind) {
    return Ok(subject);
  }
  tracing::debug!(%kind, accessor = kind.conventional_accessor(), "not available");

  if let Some(subject) = ctx.conventional_field(kind) {
    return Ok(subject);
  }
  tracing::debug!(%kind, field = kind.conventional_field(), "not available");

  Err(Error::NotFound(kind))
}
