//! Seam between the codec and the external runtime process.

use tppl_core::{RngHandle, TpplError};
use tppl_wire::{encode_arguments, input_digest, to_bytes, Arguments, Decoder, VariantRegistry};
use tracing::info;

use crate::config::RunConfig;
use crate::result::InferenceResult;

/// Runs a compiled model on an encoded input document and returns its stdout.
///
/// Locating, launching and supervising the runtime is up to the implementor.
pub trait Runtime {
    /// Invokes the runtime once.
    fn invoke(&self, input: &[u8]) -> Result<Vec<u8>, TpplError>;
}

impl<F> Runtime for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, TpplError>,
{
    fn invoke(&self, input: &[u8]) -> Result<Vec<u8>, TpplError> {
        self(input)
    }
}

/// Result of one [`Session::call`].
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    /// Zero-based index of the call within its session.
    pub index: u64,
    /// Digest of the encoded input document.
    pub input_digest: String,
    /// Decoded output.
    pub result: InferenceResult,
}

/// Encodes calls, drives a [`Runtime`] and decodes its output.
#[derive(Debug)]
pub struct Session<'r, R> {
    runtime: R,
    decoder: Decoder<'r>,
    config: RunConfig,
    calls: u64,
}

impl<'r, R: Runtime> Session<'r, R> {
    /// Creates a session decoding against `registry`.
    pub fn new(runtime: R, registry: &'r VariantRegistry, config: RunConfig) -> Self {
        Self {
            runtime,
            decoder: Decoder::new(registry),
            config,
            calls: 0,
        }
    }

    /// Run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Number of completed calls.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Calls the model with keyword arguments.
    pub fn call(&mut self, args: &Arguments) -> Result<CallOutcome, TpplError> {
        let document = encode_arguments(args)?;
        let digest = input_digest(&document)?;
        let index = self.calls;
        info!(call = index, digest = %digest, args = args.len(), "invoking runtime");
        let stdout = self.runtime.invoke(&to_bytes(&document)?)?;
        let result = InferenceResult::from_slice(&stdout, &self.decoder, &self.config.output)?;
        self.calls += 1;
        Ok(CallOutcome {
            index,
            input_digest: digest,
            result,
        })
    }

    /// Deterministic RNG for resampling the output of `outcome`.
    pub fn rng_for(&self, outcome: &CallOutcome) -> RngHandle {
        RngHandle::for_substream(self.config.seed_policy.master_seed, outcome.index)
    }
}
