use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use serde_json::Value as Json;
use tppl_wire::{encode_arguments, input_digest, to_bytes, Arguments, Decoder, VariantRegistry};
use tracing::debug;

use super::read_input;

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// JSON object of call arguments in wire form; stdin when omitted.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Print the SHA-256 digest of the encoded document to stderr.
    #[arg(long)]
    pub digest: bool,
}

pub fn run(args: &EncodeArgs) -> Result<(), Box<dyn Error>> {
    let bytes = read_input(args.input.as_deref())?;
    let document: Json = serde_json::from_slice(&bytes)?;
    let Json::Object(entries) = document else {
        return Err("argument document must be a JSON object".into());
    };

    let registry = VariantRegistry::standard();
    let decoder = Decoder::new(&registry);
    let mut arguments = Arguments::new();
    for (name, value) in &entries {
        arguments.insert(name.clone(), decoder.decode(value)?);
    }
    debug!(arguments = arguments.len(), "decoded argument document");

    let encoded = encode_arguments(&arguments)?;
    println!("{}", String::from_utf8(to_bytes(&encoded)?)?);
    if args.digest {
        eprintln!("{}", input_digest(&encoded)?);
    }
    Ok(())
}
