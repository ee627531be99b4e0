//! A located subject bundled with the request's extra custom data.

use crate::{
  config::LookupConfig,
  context::ResolutionContext,
  error::Result,
  payload::{self, Payload},
  resolver,
  subject::{Record, Subject, SubjectKind},
  validity,
};

/// What the resolver found for one subject kind, ready to be checked and
/// serialized.
#[derive(Debug, Clone)]
pub struct Proxy<S> {
  kind:    SubjectKind,
  subject: S,
  extra:   Option<Record>,
}

impl<S: Subject> Proxy<S> {
  pub fn new(kind: SubjectKind, subject: S) -> Self {
    Self {
      kind,
      subject,
      extra: None,
    }
  }

  /// Attach the secondary custom data source.
  pub fn with_extra(mut self, extra: Record) -> Self {
    self.extra = Some(extra);
    self
  }

  /// Resolve the `kind` subject of `ctx` and pick up its extra custom data.
  pub fn current_in_context<C>(
    ctx: &C,
    kind: SubjectKind,
    config: &LookupConfig,
  ) -> Result<Self>
  where
    C: ResolutionContext<Subject = S> + ?Sized,
  {
    let subject = resolver::resolve(ctx, kind, config)?;
    Ok(Self {
      kind,
      subject,
      extra: ctx.extra_custom_data(kind),
    })
  }

  pub fn kind(&self) -> SubjectKind { self.kind }

  pub fn subject(&self) -> &S { &self.subject }

  pub fn extra(&self) -> Option<&Record> { self.extra.as_ref() }

  pub fn into_subject(self) -> S { self.subject }

  pub fn is_valid(&self) -> bool { validity::is_valid(self.kind, &self.subject) }

  pub fn to_payload(&self, config: &LookupConfig) -> Payload {
    payload::serialize(self.kind, &self.subject, self.extra.as_ref(), config)
  }
}
