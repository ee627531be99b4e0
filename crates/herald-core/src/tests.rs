//! End-to-end tests: resolution, validity, and serialization together.

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{
  Error,
  config::{Accessor, Avatar, ComputeValue, LookupConfig},
  context::{CapturedContext, ResolutionContext},
  json::JsonContext,
  payload::Payload,
  proxy::Proxy,
  resolver::resolve,
  subject::{ProbeError, Record, Subject, SubjectKind},
  validity::is_valid,
  value::{FieldValue, Scalar},
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// An object-backed subject, the way a host's own model type would look.
#[derive(Debug, Clone, PartialEq)]
struct DummyUser {
  id:         Option<i64>,
  email:      Option<String>,
  name:       Option<String>,
  created_at: Option<DateTime<Utc>>,
  plan:       Option<String>,
  some_date:  Option<DateTime<Utc>>,
  new_record: bool,
}

impl DummyUser {
  fn new(email: &str, name: &str) -> Self {
    Self {
      id:         None,
      email:      Some(email.to_owned()),
      name:       Some(name.to_owned()),
      created_at: None,
      plan:       None,
      some_date:  None,
      new_record: false,
    }
  }
}

impl Subject for DummyUser {
  fn field(&self, name: &str) -> Result<Option<FieldValue>, ProbeError> {
    let value: FieldValue = match name {
      "id" => self.id.into(),
      "email" => self.email.clone().into(),
      "name" => self.name.clone().into(),
      "created_at" => self.created_at.into(),
      "plan" => self.plan.clone().into(),
      "some_date" => self.some_date.into(),
      _ => return Ok(None),
    };
    Ok(Some(value).filter(|v| !v.is_null()))
  }

  fn is_new_record(&self) -> Result<bool, ProbeError> { Ok(self.new_record) }
}

/// Every probe throws.
#[derive(Debug, Clone)]
struct Whiny;

impl Subject for Whiny {
  fn field(&self, name: &str) -> Result<Option<FieldValue>, ProbeError> {
    Err(ProbeError::Failed {
      field:  name.to_owned(),
      reason: "boo".to_owned(),
    })
  }
}

fn ciaran() -> DummyUser { DummyUser::new("ciaran@intercom.io", "Ciaran Lee") }

fn user_config(expression: &str) -> LookupConfig {
  LookupConfig::builder()
    .current(SubjectKind::User, expression)
    .build()
    .unwrap()
}

// ─── Resolution ──────────────────────────────────────────────────────────────

#[test]
fn nothing_exposed_is_not_found() {
  let ctx: CapturedContext<DummyUser> = CapturedContext::new();
  for kind in [SubjectKind::User, SubjectKind::Company] {
    let err = resolve(&ctx, kind, &LookupConfig::default()).unwrap_err();
    assert!(matches!(err, Error::NotFound(k) if k == kind));
  }
  assert_eq!(
    Error::NotFound(SubjectKind::User).to_string(),
    "no user found"
  );
}

#[test]
fn finds_conventional_accessor() {
  let ctx = CapturedContext::new().with_accessor(SubjectKind::User, ciaran());
  let found = resolve(&ctx, SubjectKind::User, &LookupConfig::default()).unwrap();
  assert_eq!(found, ciaran());
}

#[test]
fn finds_conventional_field() {
  let ctx = CapturedContext::new().with_field(SubjectKind::User, ciaran());
  let found = resolve(&ctx, SubjectKind::User, &LookupConfig::default()).unwrap();
  assert_eq!(found, ciaran());
}

#[test]
fn accessor_is_preferred_over_field() {
  let other = DummyUser::new("other@intercom.io", "Other");
  let ctx = CapturedContext::new()
    .with_field(SubjectKind::User, other)
    .with_accessor(SubjectKind::User, ciaran());
  let found = resolve(&ctx, SubjectKind::User, &LookupConfig::default()).unwrap();
  assert_eq!(found, ciaran());
}

#[test]
fn finds_configured_lookup() {
  let ctx = CapturedContext::new().with_lookup("something_esoteric", Some(ciaran()));
  let found =
    resolve(&ctx, SubjectKind::User, &user_config("something_esoteric")).unwrap();
  assert_eq!(found, ciaran());
}

#[test]
fn configured_lookup_takes_precedence() {
  let esoteric = DummyUser::new("esoteric@intercom.io", "Esoteric");
  let ctx = CapturedContext::new()
    .with_accessor(SubjectKind::User, ciaran())
    .with_field(SubjectKind::User, ciaran())
    .with_lookup("something_esoteric", Some(esoteric.clone()));
  let found =
    resolve(&ctx, SubjectKind::User, &user_config("something_esoteric")).unwrap();
  assert_eq!(found, esoteric);
}

#[test]
fn undefined_lookup_falls_through_to_accessor_then_field() {
  let config = user_config("something_esoteric");

  let with_accessor =
    CapturedContext::new().with_accessor(SubjectKind::User, ciaran());
  assert_eq!(resolve(&with_accessor, SubjectKind::User, &config).unwrap(), ciaran());

  let with_field = CapturedContext::new().with_field(SubjectKind::User, ciaran());
  assert_eq!(resolve(&with_field, SubjectKind::User, &config).unwrap(), ciaran());

  let empty: CapturedContext<DummyUser> = CapturedContext::new();
  assert!(matches!(
    resolve(&empty, SubjectKind::User, &config),
    Err(Error::NotFound(SubjectKind::User))
  ));
}

#[test]
fn lookup_yielding_nothing_falls_through() {
  let ctx = CapturedContext::new()
    .with_lookup("something_esoteric", None)
    .with_field(SubjectKind::User, ciaran());
  let found =
    resolve(&ctx, SubjectKind::User, &user_config("something_esoteric")).unwrap();
  assert_eq!(found, ciaran());
}

#[test]
fn failing_lookup_propagates() {
  let ctx = CapturedContext::new()
    .with_failing_lookup("something_esoteric", "database on fire")
    .with_accessor(SubjectKind::User, ciaran());
  let err = resolve(&ctx, SubjectKind::User, &user_config("something_esoteric"))
    .unwrap_err();
  match err {
    Error::Lookup {
      kind,
      expression,
      source,
    } => {
      assert_eq!(kind, SubjectKind::User);
      assert_eq!(expression, "something_esoteric");
      assert_eq!(source.to_string(), "database on fire");
    }
    other => panic!("expected a lookup error, got {other:?}"),
  }
}

#[test]
fn company_lookup_uses_company_configuration() {
  let config = LookupConfig::builder()
    .current(SubjectKind::Company, "current_account")
    .build()
    .unwrap();
  let account = Record::new().with("id", "acme");
  let ctx = CapturedContext::new()
    .with_lookup("current_account", Some(account.clone()));

  assert_eq!(resolve(&ctx, SubjectKind::Company, &config).unwrap(), account);
  assert!(matches!(
    resolve(&ctx, SubjectKind::User, &config),
    Err(Error::NotFound(SubjectKind::User))
  ));
}

// ─── Validity ────────────────────────────────────────────────────────────────

#[test]
fn email_makes_user_valid() {
  assert!(is_valid(SubjectKind::User, &ciaran()));
}

#[test]
fn id_alone_makes_user_valid() {
  let user = Record::new().with("id", 12);
  assert!(is_valid(SubjectKind::User, &user));
}

#[test]
fn new_records_are_invalid() {
  let mut user = DummyUser::new("not-saved@intercom.io", "New Record");
  user.new_record = true;
  assert!(!is_valid(SubjectKind::User, &user));
  assert!(!is_valid(
    SubjectKind::Company,
    &Record::new().with("id", "acme").unsaved()
  ));
}

#[test]
fn missing_identity_is_invalid() {
  let user = Record::new().with("name", "Nobody").with("email", "  ");
  assert!(!is_valid(SubjectKind::User, &user));
}

#[test]
fn company_needs_an_id() {
  assert!(is_valid(SubjectKind::Company, &Record::new().with("id", "acme")));
  assert!(!is_valid(SubjectKind::Company, &Record::new().with("id", "")));
  assert!(!is_valid(
    SubjectKind::Company,
    &Record::new().with("email", "billing@acme.io")
  ));
}

#[test]
fn throwing_probes_are_invalid_not_errors() {
  assert!(!is_valid(SubjectKind::User, &Whiny));
  assert!(!is_valid(SubjectKind::User, &serde_json::Value::Null));
  assert!(!is_valid(SubjectKind::Company, &json!("not a record")));
}

#[test]
fn hash_subject_resolves_and_is_valid() {
  let ctx = JsonContext::new(json!({
    "current_user": { "email": "hash@foo.com" }
  }));
  let proxy =
    Proxy::current_in_context(&ctx, SubjectKind::User, &LookupConfig::default())
      .unwrap();
  assert!(proxy.is_valid());
  assert_eq!(proxy.subject(), &json!({ "email": "hash@foo.com" }));
}

// ─── Serialization ───────────────────────────────────────────────────────────

fn payload_for<S: Subject>(subject: S, config: &LookupConfig) -> Payload {
  Proxy::new(SubjectKind::User, subject).to_payload(config)
}

#[test]
fn standard_user_fields() {
  let mut user = ciaran();
  user.id = Some(42);
  user.created_at = Some(Utc.timestamp_opt(1_400_000_000, 0).unwrap());

  let payload = payload_for(user, &LookupConfig::default());
  let entries: Vec<_> = payload.iter().map(|(k, v)| (k, v.clone())).collect();
  assert_eq!(entries, vec![
    ("user_id", Scalar::Int(42)),
    ("email", Scalar::from("ciaran@intercom.io")),
    ("name", Scalar::from("Ciaran Lee")),
    ("created_at", Scalar::Int(1_400_000_000)),
  ]);
}

#[test]
fn includes_custom_data() {
  let mut user = ciaran();
  user.plan = Some("pro".to_owned());
  let config = LookupConfig::builder()
    .custom_data(SubjectKind::User, "plan", Accessor::field("plan"))
    .build()
    .unwrap();

  let payload = payload_for(user, &config);
  assert_eq!(payload.get("plan"), Some(&Scalar::from("pro")));
}

#[test]
fn converts_dates_to_timestamps() {
  let mut user = ciaran();
  user.some_date = Some(Utc.timestamp_opt(5, 0).unwrap());
  let config = LookupConfig::builder()
    .custom_data(SubjectKind::User, "some_date", Accessor::field("some_date"))
    .build()
    .unwrap();

  let payload = payload_for(user, &config);
  assert_eq!(payload.get("some_date"), Some(&Scalar::Int(5)));
}

#[test]
fn custom_data_keeps_configuration_order() {
  struct Shout;

  impl ComputeValue for Shout {
    fn compute(&self, subject: &dyn Subject) -> FieldValue {
      match subject.field("name") {
        Ok(Some(FieldValue::Str(name))) => name.to_uppercase().into(),
        _ => FieldValue::Null,
      }
    }
  }

  let config = LookupConfig::builder()
    .custom_data(SubjectKind::User, "zeta", Accessor::constant("z"))
    .custom_data(SubjectKind::User, "shout", Accessor::source(Shout))
    .custom_data(
      SubjectKind::User,
      "domain",
      Accessor::computed(|s| match s.field("email") {
        Ok(Some(FieldValue::Str(e))) => {
          e.split_once('@').map(|(_, d)| d.to_owned()).into()
        }
        _ => FieldValue::Null,
      }),
    )
    .custom_data(SubjectKind::User, "alpha", Accessor::constant(true))
    .build()
    .unwrap();

  let payload = payload_for(ciaran(), &config);
  let custom: Vec<_> = payload.keys().skip(2).collect();
  assert_eq!(custom, ["zeta", "shout", "domain", "alpha"]);
  assert_eq!(payload.get("shout"), Some(&Scalar::from("CIARAN LEE")));
  assert_eq!(payload.get("domain"), Some(&Scalar::from("intercom.io")));
}

#[test]
fn null_and_failing_custom_fields_are_omitted() {
  let config = LookupConfig::builder()
    .custom_data(SubjectKind::User, "plan", Accessor::field("plan"))
    .custom_data(SubjectKind::User, "nothing", Accessor::computed(|_| FieldValue::Null))
    .custom_data(SubjectKind::User, "fixed", Accessor::constant(1))
    .build()
    .unwrap();

  let payload = payload_for(ciaran(), &config);
  assert!(!payload.contains_key("plan"));
  assert!(!payload.contains_key("nothing"));
  assert_eq!(payload.get("fixed"), Some(&Scalar::Int(1)));

  let whiny = payload_for(Whiny, &config);
  assert_eq!(whiny.keys().collect::<Vec<_>>(), ["fixed"]);
}

#[test]
fn includes_extra_custom_data_from_context() {
  let ctx = CapturedContext::new()
    .with_accessor(SubjectKind::User, ciaran())
    .with_extra_custom_data(
      SubjectKind::User,
      Record::new().with("ponies", "rainbows"),
    );
  let config = LookupConfig::default();
  let proxy = Proxy::current_in_context(&ctx, SubjectKind::User, &config).unwrap();
  assert_eq!(
    proxy.to_payload(&config).get("ponies"),
    Some(&Scalar::from("rainbows"))
  );
}

#[test]
fn field_accessors_fall_back_to_extra_custom_data() {
  let config = LookupConfig::builder()
    .custom_data(SubjectKind::User, "tier", Accessor::field("plan"))
    .build()
    .unwrap();
  let proxy = Proxy::new(SubjectKind::User, ciaran())
    .with_extra(Record::new().with("plan", "enterprise"));
  let payload = proxy.to_payload(&config);
  assert_eq!(payload.get("tier"), Some(&Scalar::from("enterprise")));
  assert_eq!(payload.get("plan"), Some(&Scalar::from("enterprise")));
}

#[test]
fn static_fields_and_company_delegates() {
  let config = LookupConfig::builder()
    .static_field(SubjectKind::Company, "source", "herald")
    .company_plan(Accessor::field("plan_name"))
    .company_monthly_spend(Accessor::field("mrr"))
    .build()
    .unwrap();
  let company = Record::new()
    .with("id", "acme")
    .with("name", "Acme")
    .with("plan_name", "gold")
    .with("mrr", 49.5);

  let payload = Proxy::new(SubjectKind::Company, company).to_payload(&config);
  assert_eq!(
    serde_json::to_value(&payload).unwrap(),
    json!({
      "id": "acme",
      "name": "Acme",
      "plan": "gold",
      "monthly_spend": 49.5,
      "source": "herald",
    })
  );
  assert_eq!(
    payload.keys().collect::<Vec<_>>(),
    ["id", "name", "plan", "monthly_spend", "source"]
  );
}

#[test]
fn lead_view_keeps_only_lead_attributes() {
  let config = LookupConfig::builder()
    .lead_attributes(["utm_source", "ref_data"])
    .custom_data(SubjectKind::User, "utm_source", Accessor::constant("ads"))
    .custom_data(SubjectKind::User, "plan", Accessor::constant("pro"))
    .build()
    .unwrap();
  let payload = payload_for(ciaran(), &config);
  let lead = payload.for_lead(&config.user().lead_attributes);
  assert_eq!(lead.keys().collect::<Vec<_>>(), ["utm_source"]);
}

#[test]
fn avatar_is_carried_in_user_config() {
  let config = LookupConfig::builder()
    .avatar(Avatar::new("https://example.org/128Wash.jpg"))
    .build()
    .unwrap();
  let avatar = config.user().avatar.as_ref().unwrap().to_map();
  assert_eq!(avatar["type"], "avatar");
  assert_eq!(avatar["image_url"], "https://example.org/128Wash.jpg");
}

#[test]
fn json_context_end_to_end() {
  let config = LookupConfig::builder()
    .current(SubjectKind::Company, "account.company")
    .custom_data(SubjectKind::User, "signed_up", Accessor::field("signed_up_at"))
    .build()
    .unwrap();
  let ctx = JsonContext::new(json!({
    "@user": { "id": 7, "email": "u@acme.io", "signed_up_at": "1970-01-01T00:01:40Z" },
    "account": { "company": { "id": "acme", "created_at": "1970-01-02T00:00:00Z" } },
    "intercom_custom_data": { "user": { "ponies": "rainbows" } },
  }));

  let user = Proxy::current_in_context(&ctx, SubjectKind::User, &config).unwrap();
  assert!(user.is_valid());
  assert_eq!(
    serde_json::to_value(user.to_payload(&config)).unwrap(),
    json!({
      "user_id": 7,
      "email": "u@acme.io",
      "signed_up": 100,
      "ponies": "rainbows",
    })
  );

  let company = Proxy::current_in_context(&ctx, SubjectKind::Company, &config).unwrap();
  assert!(company.is_valid());
  assert_eq!(
    serde_json::to_value(company.to_payload(&config)).unwrap(),
    json!({ "id": "acme", "created_at": 86_400 })
  );
  assert!(ctx.extra_custom_data(SubjectKind::Company).is_none());
}
