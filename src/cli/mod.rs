//! CLI module: clap-based argument parsing mapped onto a validated `AppConfig`.
//!
//! Every option also reads a `FUZZY_MERGE_*` environment variable, so a `.env`
//! file loaded before parsing (see `util::envfile`) can supply defaults.

mod clap_parser;

pub use clap_parser::{Cli, ScorerOpt};
