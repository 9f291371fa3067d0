use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tppl_wire::VariantRegistry;

use super::{load_config, load_result};

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Captured runtime output; stdin when omitted.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// YAML run configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &SummarizeArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    let registry = VariantRegistry::standard();
    let result = load_result(args.output.as_deref(), &config, &registry)?;
    println!("{}", serde_json::to_string_pretty(&result.summary())?);
    Ok(())
}
