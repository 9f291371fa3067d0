//! Effective sample size over weight-compressed samples.
//!
//! Samples with identical values are merged before the estimate so that
//! duplicates produced by upstream resampling count once. Only real scalars
//! and fixed-length real vectors are supported; a scalar is treated as a
//! length-one tuple.

use indexmap::IndexMap;
use tppl_core::{ErrorInfo, TpplError, Value};

/// One distinct sample value with its accumulated weight.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedWeight {
    /// The sample value as a tuple of reals.
    pub value: Vec<f64>,
    /// Sum of the weights of every sample equal to `value`.
    pub weight: f64,
}

/// Merges the weights of samples with exactly equal values, in first-seen order.
///
/// `weights` are on the linear scale (already exponentiated).
pub fn compress_weights(
    samples: &[Value],
    weights: &[f64],
) -> Result<Vec<CompressedWeight>, TpplError> {
    if samples.len() != weights.len() {
        return Err(TpplError::InvalidField(
            ErrorInfo::new("length-mismatch", "samples and weights differ in length")
                .with_context("samples", samples.len().to_string())
                .with_context("weights", weights.len().to_string()),
        ));
    }
    let mut width = None;
    let mut groups: IndexMap<Vec<u64>, CompressedWeight> = IndexMap::new();
    for (idx, (sample, weight)) in samples.iter().zip(weights).enumerate() {
        if weight.is_nan() || *weight < 0.0 {
            return Err(TpplError::DegenerateWeights(
                ErrorInfo::new("invalid-weight", "weights must be non-negative numbers")
                    .with_context("index", idx.to_string())
                    .with_context("value", weight.to_string()),
            ));
        }
        let tuple = real_tuple(sample, idx)?;
        match width {
            None => width = Some(tuple.len()),
            Some(expected) if expected != tuple.len() => {
                return Err(TpplError::UnsupportedSampleType(
                    ErrorInfo::new("ragged-samples", "sample tuples differ in length")
                        .with_context("index", idx.to_string())
                        .with_context("expected", expected.to_string())
                        .with_context("found", tuple.len().to_string()),
                ))
            }
            Some(_) => {}
        }
        let key = tuple.iter().map(|real| canonical_bits(*real)).collect();
        groups
            .entry(key)
            .or_insert_with(|| CompressedWeight {
                value: tuple,
                weight: 0.0,
            })
            .weight += weight;
    }
    Ok(groups.into_values().collect())
}

/// Computes `1 / sum(w_i^2)` over the normalised compressed weights.
///
/// Returns 0 for an empty sample set.
pub fn effective_sample_size(samples: &[Value], weights: &[f64]) -> Result<f64, TpplError> {
    let compressed = compress_weights(samples, weights)?;
    if compressed.is_empty() {
        return Ok(0.0);
    }
    let total: f64 = compressed.iter().map(|entry| entry.weight).sum();
    if !(total > 0.0 && total.is_finite()) {
        return Err(TpplError::DegenerateWeights(
            ErrorInfo::new("weights-sum-invalid", "sample weights must sum to a positive finite value")
                .with_context("total", total.to_string())
                .with_context("len", weights.len().to_string()),
        ));
    }
    let sum_sq: f64 = compressed
        .iter()
        .map(|entry| {
            let normalised = entry.weight / total;
            normalised * normalised
        })
        .sum();
    Ok(1.0 / sum_sq)
}

fn real_tuple(sample: &Value, idx: usize) -> Result<Vec<f64>, TpplError> {
    match sample {
        Value::Int(_) | Value::Real(_) => Ok(sample.as_real().into_iter().collect()),
        Value::Vector(items) => Ok(items.clone()),
        other => Err(TpplError::UnsupportedSampleType(
            ErrorInfo::new(
                "non-real-sample",
                "effective sample size needs real scalars or fixed-length real vectors",
            )
            .with_context("index", idx.to_string())
            .with_context("found", other.kind_name()),
        )),
    }
}

// 0.0 and -0.0 compare equal, so they share a key.
fn canonical_bits(real: f64) -> u64 {
    if real == 0.0 {
        0.0f64.to_bits()
    } else {
        real.to_bits()
    }
}
