#![deny(missing_docs)]

//! Interpretation of weighted-sample output from the TreePPL runtime.

/// YAML run configuration and compiler argument translation.
pub mod config;
pub mod ess;
/// Weighted resampling with replacement.
pub mod resample;
pub mod result;
pub mod session;

pub use config::{FlagValue, OutputConfig, RunConfig, SeedPolicy};
pub use ess::{compress_weights, effective_sample_size, CompressedWeight};
pub use resample::{draw_indices, stable_weights};
pub use result::{InferenceResult, ResultSummary};
pub use session::{CallOutcome, Runtime, Session};
