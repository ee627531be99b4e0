//! `herald` — inspect lookup settings and preview payloads.
//!
//! Reads `herald.toml` (or the path given with `--config`), layered with
//! `HERALD_*` environment variables, and works against request contexts
//! captured as JSON.
//!
//! ```text
//! herald check
//! herald preview --context request.json --kind company --pretty
//! ```

mod commands;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use herald_core::subject::SubjectKind;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Herald payload inspector")]
struct Cli {
  /// Path to the TOML settings file.
  #[arg(short, long, global = true, default_value = "herald.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Validate the settings and print what they configure.
  Check,

  /// Resolve a subject from a captured context and print its payload.
  Preview {
    /// JSON file holding the captured request context.
    #[arg(long)]
    context: PathBuf,

    #[arg(long, value_enum, default_value_t = Kind::User)]
    kind: Kind,

    /// Keep only the configured lead attributes (users only).
    #[arg(long)]
    lead: bool,

    #[arg(long)]
    pretty: bool,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
  User,
  Company,
}

impl From<Kind> for SubjectKind {
  fn from(kind: Kind) -> Self {
    match kind {
      Kind::User => SubjectKind::User,
      Kind::Company => SubjectKind::Company,
    }
  }
}

fn main() -> anyhow::Result<()> {
  // Logs go to stderr; stdout is reserved for command output.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let lookup = settings::load(&cli.config)?;

  match cli.command {
    Command::Check => {
      for line in commands::summary(&lookup) {
        println!("{line}");
      }
    }
    Command::Preview {
      context,
      kind,
      lead,
      pretty,
    } => {
      let document = commands::read_context(&context)?;
      let output = commands::preview(&lookup, document, kind.into(), lead)?;
      if pretty {
        println!("{}", serde_json::to_string_pretty(&output)?);
      } else {
        println!("{output}");
      }
    }
  }

  Ok(())
}
