use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "classdelta",
    about = "Structural diff and patch for JVM class trees",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with patcher settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Drop source file, line number, local variable and parameter debug info
    #[arg(short = 'D', long, global = true)]
    pub skip_debug: bool,

    /// Drop attributes the model keeps only as opaque bytes
    #[arg(short = 'A', long, global = true)]
    pub skip_unknown_attributes: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a patch turning OLD into NEW
    Diff(DiffArgs),
    /// Apply a patch to OLD
    Apply(ApplyArgs),
    /// Show a patch's header and edit counts
    Inspect(InspectArgs),
    /// Diff, apply and compare, without writing files
    Test(TestArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct ApplyArgs {
    pub old: PathBuf,
    pub patch: PathBuf,
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct InspectArgs {
    pub patch: PathBuf,
}

#[derive(Args)]
pub struct TestArgs {
    pub old: PathBuf,
    pub new: PathBuf,
}
