//! Decoded output of one runtime invocation.

use std::io::Read;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tppl_core::{byte_preview, ErrorInfo, TpplError, Value};
use tppl_wire::{parse_document, Decoder};
use tracing::debug;

use crate::config::OutputConfig;
use crate::ess;
use crate::resample::{draw_indices, stable_weights};

/// Output key holding the samples.
pub const SAMPLES_KEY: &str = "samples";
/// Output key holding the log-weights.
pub const WEIGHTS_KEY: &str = "weights";
/// Output key holding the log normalising constant.
pub const NORM_CONST_KEY: &str = "normConst";

/// Weighted samples returned by one run. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    samples: Vec<Value>,
    log_weights: Vec<f64>,
    norm_const: f64,
}

/// Serializable digest of an [`InferenceResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    /// Number of samples.
    pub samples: usize,
    /// Log normalising constant, absent when the runtime reported none.
    pub norm_const: Option<f64>,
    /// Effective sample size, absent when it could not be computed.
    pub ess: Option<f64>,
    /// Error code explaining an absent `ess`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ess_error: Option<String>,
    /// Largest log-weight, absent for an empty result.
    pub max_log_weight: Option<f64>,
}

impl InferenceResult {
    /// Builds a result. Log-weights are index-aligned with the samples, or
    /// empty when the runtime reported none.
    pub fn new(samples: Vec<Value>, log_weights: Vec<f64>, norm_const: f64) -> Result<Self, TpplError> {
        if !log_weights.is_empty() && samples.len() != log_weights.len() {
            return Err(TpplError::MalformedOutput(
                ErrorInfo::new("length-mismatch", "samples and weights differ in length")
                    .with_context("samples", samples.len().to_string())
                    .with_context("weights", log_weights.len().to_string()),
            ));
        }
        Ok(Self {
            samples,
            log_weights,
            norm_const,
        })
    }

    /// Interprets a parsed output document.
    ///
    /// Missing `weights` leave the result unweighted, a missing `normConst` is
    /// NaN and `null` weights are zero weights.
    pub fn from_document(document: &Json, decoder: &Decoder<'_>) -> Result<Self, TpplError> {
        let Some(object) = document.as_object() else {
            return Err(malformed("document-not-object", "runtime output must be a JSON object"));
        };
        let samples = match object.get(SAMPLES_KEY) {
            None => Vec::new(),
            Some(Json::Array(items)) => items
                .iter()
                .map(|item| decoder.decode(item))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(malformed("samples-not-array", "`samples` must be an array")),
        };
        let log_weights = match object.get(WEIGHTS_KEY) {
            None => Vec::new(),
            Some(Json::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| match item {
                    Json::Null => Ok(f64::NEG_INFINITY),
                    other => other.as_f64().ok_or_else(|| {
                        TpplError::MalformedOutput(
                            ErrorInfo::new("weight-not-number", "log-weights must be numbers")
                                .with_context("index", idx.to_string()),
                        )
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(malformed("weights-not-array", "`weights` must be an array")),
        };
        let norm_const = match object.get(NORM_CONST_KEY) {
            None | Some(Json::Null) => f64::NAN,
            Some(value) => value.as_f64().ok_or_else(|| {
                malformed("norm-const-not-number", "`normConst` must be a number")
            })?,
        };
        let result = Self::new(samples, log_weights, norm_const)?;
        debug!(
            samples = result.len(),
            norm_const = result.norm_const,
            "decoded inference result"
        );
        Ok(result)
    }

    /// Parses and interprets raw runtime output.
    pub fn from_slice(
        bytes: &[u8],
        decoder: &Decoder<'_>,
        output: &OutputConfig,
    ) -> Result<Self, TpplError> {
        let document = parse_document(bytes, output.preview_bytes)?;
        Self::from_document(&document, decoder)
    }

    /// Reads runtime output to the end and interprets it.
    pub fn from_reader<R: Read>(
        mut reader: R,
        decoder: &Decoder<'_>,
        output: &OutputConfig,
    ) -> Result<Self, TpplError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|err| {
            TpplError::MalformedOutput(
                ErrorInfo::new("output-read", err.to_string())
                    .with_context("read", bytes.len().to_string())
                    .with_context("preview", byte_preview(&bytes, output.preview_bytes)),
            )
        })?;
        Self::from_slice(&bytes, decoder, output)
    }

    /// Decoded samples.
    pub fn samples(&self) -> &[Value] {
        &self.samples
    }

    /// Natural-log weights, index-aligned with the samples. Empty when the
    /// runtime reported no weights.
    pub fn log_weights(&self) -> &[f64] {
        &self.log_weights
    }

    /// Log normalising constant, NaN when absent.
    pub fn norm_const(&self) -> f64 {
        self.norm_const
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true when the run produced no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `exp(log_weight)` for every sample, without renormalisation.
    pub fn normalized_weights(&self) -> Vec<f64> {
        self.log_weights.iter().map(|weight| weight.exp()).collect()
    }

    /// Alias of [`InferenceResult::normalized_weights`].
    pub fn nweights(&self) -> Vec<f64> {
        self.normalized_weights()
    }

    /// Projects the named fields out of every sample.
    pub fn items(&self, names: &[&str]) -> Result<Vec<Vec<&Value>>, TpplError> {
        self.samples
            .iter()
            .enumerate()
            .map(|(idx, sample)| {
                names
                    .iter()
                    .map(|name| {
                        sample.field(name).ok_or_else(|| {
                            TpplError::InvalidField(
                                ErrorInfo::new("missing-field", "sample has no such field")
                                    .with_context("index", idx.to_string())
                                    .with_context("field", name.to_string())
                                    .with_context("found", sample.kind_name()),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }

    /// Draws `count` sample indices with replacement, proportionally to weight.
    pub fn subsample_indices<R>(&self, count: usize, rng: &mut R) -> Result<Vec<usize>, TpplError>
    where
        R: Rng + ?Sized,
    {
        let weights = stable_weights(&self.log_weights)?;
        let indices = draw_indices(&weights, count, rng)?;
        debug!(count, population = self.len(), "drew weighted subsample");
        Ok(indices)
    }

    /// Draws `count` samples with replacement, proportionally to weight.
    pub fn subsample<R>(&self, count: usize, rng: &mut R) -> Result<Vec<&Value>, TpplError>
    where
        R: Rng + ?Sized,
    {
        Ok(self
            .subsample_indices(count, rng)?
            .into_iter()
            .map(|idx| &self.samples[idx])
            .collect())
    }

    /// Effective sample size after merging duplicate sample values.
    pub fn effective_sample_size(&self) -> Result<f64, TpplError> {
        if self.log_weights.is_empty() && !self.samples.is_empty() {
            return Err(TpplError::DegenerateWeights(
                ErrorInfo::new("weights-missing", "result carries no weights")
                    .with_context("samples", self.samples.len().to_string()),
            ));
        }
        let weights = stable_weights(&self.log_weights)?;
        let ess = ess::effective_sample_size(&self.samples, &weights)?;
        debug!(ess, samples = self.len(), "computed effective sample size");
        Ok(ess)
    }

    /// Serializable overview of the result.
    ///
    /// A failed ESS estimate does not fail the summary; its error code is
    /// kept in `ess_error`.
    pub fn summary(&self) -> ResultSummary {
        let (ess, ess_error) = match self.effective_sample_size() {
            Ok(ess) => (Some(ess), None),
            Err(err) => (None, Some(err.info().code.clone())),
        };
        ResultSummary {
            samples: self.len(),
            norm_const: Some(self.norm_const).filter(|value| !value.is_nan()),
            ess,
            ess_error,
            max_log_weight: self.log_weights.iter().copied().reduce(f64::max),
        }
    }
}

fn malformed(code: &str, message: &str) -> TpplError {
    TpplError::MalformedOutput(ErrorInfo::new(code, message))
}
