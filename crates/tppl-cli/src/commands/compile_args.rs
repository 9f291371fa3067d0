use std::error::Error;
use std::path::PathBuf;

use clap::Args;

use super::load_config;

#[derive(Args, Debug)]
pub struct CompileArgsArgs {
    /// YAML run configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Model source file handed to the compiler.
    #[arg(long)]
    pub source: String,
}

pub fn run(args: &CompileArgsArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    println!("{}", serde_json::to_string(&config.compiler_args(&args.source))?);
    Ok(())
}
