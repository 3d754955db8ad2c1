use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the host described by the given profile
    Provision(ProvisionArgs),

    /// Validate the given YAML profile
    Validate(CommonArgs),

    /// Print the daemon options that would be written for the profile
    Render(CommonArgs),

    /// List the supported operating system backends
    Backends,

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

/// Arguments shared by every profile-driven subcommand.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to the YAML file defining the host profile
    #[arg(short, long, default_value = "profile.yaml")]
    pub file: Utf8PathBuf,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Do not run, just show what would be done
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Represents log levels for controlling the verbosity of logging output.
///
/// Maps directly to the levels of the `tracing` crate; `--log-level debug`
/// also prints every remote command before it runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Commands {
    /// Log level requested on the command line, if the subcommand takes one.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Provision(opts) => opts.common.log_level,
            Self::Validate(opts) | Self::Render(opts) => opts.log_level,
            Self::Backends | Self::Completions(_) => LogLevel::Warn,
        }
    }
}
