//! Core types for Herald: locating the current user or company of a request
//! and turning it into a messaging payload.
//!
//! This crate is deliberately free of HTTP and framework dependencies. Hosts
//! describe what their request exposes by implementing
//! [`context::ResolutionContext`]; the crate decides which subject to report,
//! whether it is usable, and what it serializes to.
//!
//! # Quick start
//!
//! ```
//! use herald_core::{
//!   config::LookupConfig,
//!   context::CapturedContext,
//!   proxy::Proxy,
//!   subject::{Record, SubjectKind},
//! };
//!
//! let config = LookupConfig::default();
//! let ctx = CapturedContext::new()
//!   .with_accessor(SubjectKind::User, Record::new().with("email", "a@b.io"));
//!
//! let proxy = Proxy::current_in_context(&ctx, SubjectKind::User, &config)?;
//! assert!(proxy.is_valid());
//! assert_eq!(proxy.to_payload(&config).len(), 1);
//! # Ok::<(), herald_core::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod json;
pub mod payload;
pub mod proxy;
pub mod resolver;
pub mod settings;
pub mod subject;
pub mod validity;
pub mod value;

pub use error::{ConfigError, Error, Result};

#[cfg(test)]
mod tests;
