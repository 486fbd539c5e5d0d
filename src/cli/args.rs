//! CLI argument definitions
//!
//! All Clap derive structs for `tddtrainer` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Red-Green-Refactor phase engine for TDD practice sessions.
#[derive(Parser, Debug)]
#[command(name = "tddtrainer", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// What to do.
    #[command(subcommand)]
    pub command: Commands,

    /// Log more; repeat for debug and trace.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// When to color log lines.
    #[arg(long, default_value = "auto", global = true, env = "TDDTRAINER_COLOR")]
    pub color: ColorChoice,

    /// Shape of log lines on stderr.
    #[arg(long, default_value = "human", global = true)]
    pub log_format: LogFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a session script against an exercise catalog.
    Replay(ReplayArgs),

    /// Validate exercise catalog files.
    Validate(ValidateArgs),

    /// Print the version.
    Version(VersionArgs),
}

/// Arguments for `replay`.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Exercise catalog (YAML).
    #[arg(short, long, env = "TDDTRAINER_CATALOG")]
    pub catalog: PathBuf,

    /// Session script (YAML).
    #[arg(short, long, env = "TDDTRAINER_SCRIPT")]
    pub script: PathBuf,

    /// Write the JSONL event stream to this file instead of stdout.
    #[arg(short, long, env = "TDDTRAINER_EVENTS")]
    pub events: Option<PathBuf>,

    /// Serve Prometheus metrics on this port while replaying.
    #[arg(long, env = "TDDTRAINER_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Format of the tracking summary printed to stderr.
    #[arg(long, default_value = "human")]
    pub summary: OutputFormat,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Catalog files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// How to report each file.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Fail on warnings too.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Plain text or a JSON object.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Value Enums
// ============================================================================

/// When stderr gets ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Only on a terminal without `NO_COLOR`.
    #[default]
    Auto,
    /// Unconditionally.
    Always,
    /// Not at all.
    Never,
}

/// Report format for command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Text for people.
    #[default]
    Human,
    /// Machine-readable JSON.
    Json,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_args() {
        let cli = Cli::try_parse_from([
            "tddtrainer",
            "replay",
            "--catalog",
            "catalog.yaml",
            "--script",
            "session.yaml",
        ])
        .unwrap();

        let Commands::Replay(args) = cli.command else {
            panic!("expected replay command");
        };
        assert_eq!(args.catalog, PathBuf::from("catalog.yaml"));
        assert_eq!(args.script, PathBuf::from("session.yaml"));
        assert!(args.events.is_none());
        assert!(args.metrics_port.is_none());
        assert_eq!(args.summary, OutputFormat::Human);
    }

    #[test]
    fn test_replay_requires_script() {
        let cli = Cli::try_parse_from(["tddtrainer", "replay", "--catalog", "c.yaml"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_validate_requires_files() {
        let cli = Cli::try_parse_from(["tddtrainer", "validate"]);
        assert!(cli.is_err());

        let cli = Cli::try_parse_from(["tddtrainer", "validate", "a.yaml", "b.yaml", "--strict"])
            .unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate command");
        };
        assert_eq!(args.files.len(), 2);
        assert!(args.strict);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "tddtrainer",
            "version",
            "-vv",
            "--color",
            "never",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_help_output() {
        let err = Cli::try_parse_from(["tddtrainer", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let err = Cli::try_parse_from(["tddtrainer", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
