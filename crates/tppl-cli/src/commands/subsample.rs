use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use serde_json::Value as Json;
use tppl_core::RngHandle;
use tppl_wire::{encode, VariantRegistry};
use tracing::info;

use super::{load_config, load_result};

#[derive(Args, Debug)]
pub struct SubsampleArgs {
    /// Number of samples to draw with replacement.
    #[arg(long)]
    pub count: usize,
    /// Seed overriding the configured master seed.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Captured runtime output; stdin when omitted.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// YAML run configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &SubsampleArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    let registry = VariantRegistry::standard();
    let result = load_result(args.output.as_deref(), &config, &registry)?;

    let mut rng = match args.seed {
        Some(seed) => RngHandle::from_seed(seed),
        None => RngHandle::for_substream(config.seed_policy.master_seed, 0),
    };
    let draws = result.subsample(args.count, &mut rng)?;
    info!(count = args.count, population = result.len(), "subsampled runtime output");

    let encoded = draws
        .into_iter()
        .map(encode)
        .collect::<Result<Vec<_>, _>>()?;
    println!("{}", serde_json::to_string(&Json::Array(encoded))?);
    Ok(())
}
