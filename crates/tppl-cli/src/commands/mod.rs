use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use tppl_infer::{InferenceResult, RunConfig};
use tppl_wire::{Decoder, VariantRegistry};

pub mod compile_args;
pub mod encode;
pub mod subsample;
pub mod summarize;
pub mod version;

/// Reads a file, or stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<Vec<u8>, Box<dyn Error>> {
    match path {
        Some(path) => Ok(fs::read(path)?),
        None => {
            let mut bytes = Vec::new();
            io::stdin().lock().read_to_end(&mut bytes)?;
            Ok(bytes)
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<RunConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(RunConfig::load(path)?),
        None => Ok(RunConfig::default()),
    }
}

pub fn load_result(
    output: Option<&Path>,
    config: &RunConfig,
    registry: &VariantRegistry,
) -> Result<InferenceResult, Box<dyn Error>> {
    let bytes = read_input(output)?;
    let result = InferenceResult::from_slice(&bytes, &Decoder::new(registry), &config.output)?;
    Ok(result)
}
