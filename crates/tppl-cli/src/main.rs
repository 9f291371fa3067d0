use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    compile_args::{self, CompileArgsArgs},
    encode::{self, EncodeArgs},
    subsample::{self, SubsampleArgs},
    summarize::{self, SummarizeArgs},
    version::{self, VersionArgs},
};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "tppl", about = "TreePPL host bridge CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and canonicalise an argument document in wire form.
    Encode(EncodeArgs),
    /// Decode runtime output and print its summary.
    Summarize(SummarizeArgs),
    /// Draw weighted subsamples from runtime output.
    Subsample(SubsampleArgs),
    /// Print the compiler argument vector for a run configuration.
    CompileArgs(CompileArgsArgs),
    /// Print the CLI version.
    Version(VersionArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Encode(args) => encode::run(&args),
        Command::Summarize(args) => summarize::run(&args),
        Command::Subsample(args) => subsample::run(&args),
        Command::CompileArgs(args) => compile_args::run(&args),
        Command::Version(args) => version::run(&args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // stdout carries command output.
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
