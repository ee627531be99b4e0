//! Whether a resolved subject is usable.
//!
//! The predicate never fails: a probe that errors counts against the
//! subject instead of reaching the caller.

use crate::subject::{Subject, SubjectKind};

/// Fields that identify a subject of the given kind.
pub fn identity_fields(kind: SubjectKind) -> &'static [&'static str] {
  match kind {
    SubjectKind::User => &["id", "email"],
    SubjectKind::Company => &["id"],
  }
}

/// A subject is valid when it is not an unsaved record and at least one of
/// its identity fields is present (non-null, non-blank).
pub fn is_valid<S>(kind: SubjectKind, subject: &S) -> bool
where
  S: Subject + ?Sized,
{
  match subject.is_new_record() {
    Ok(false) => {}
    Ok(true) => {
      tracing::debug!(%kind, "subject is a new record");
      return false;
    }
    Err(e) => {
      tracing::debug!(%kind, error = %e, "persistence probe failed");
      return false;
    }
  }

  identity_present(kind, subject)
}

fn identity_present<S>(kind: SubjectKind, subject: &S) -> bool
where
  S: Subject + ?Sized,
{
  identity_fields(kind)
    .iter()
    .any(|name| match subject.field(name) {
      Ok(value) => value.is_some_and(|v| v.is_present()),
      Err(e) => {
        tracing::debug!(%kind, field = *name, error = %e, "identity probe failed");
        false
      }
    })
}
