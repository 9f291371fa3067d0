use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use tppl_core::{ErrorInfo, TpplError};

/// Exponentiates log-weights after shifting by their maximum.
///
/// The result is proportional to `exp(log_weights)` but cannot overflow. An
/// all `-inf` input yields all zeros.
pub fn stable_weights(log_weights: &[f64]) -> Result<Vec<f64>, TpplError> {
    if let Some(idx) = log_weights
        .iter()
        .position(|weight| weight.is_nan() || *weight == f64::INFINITY)
    {
        return Err(TpplError::DegenerateWeights(
            ErrorInfo::new("non-finite-log-weight", "log-weight is NaN or +inf")
                .with_context("index", idx.to_string())
                .with_context("value", log_weights[idx].to_string()),
        ));
    }
    let max = log_weights
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return Ok(vec![0.0; log_weights.len()]);
    }
    Ok(log_weights
        .iter()
        .map(|weight| (weight - max).exp())
        .collect())
}

/// Draws `count` indices with replacement, proportionally to `weights`.
///
/// Weights need not be normalised. Empty or all-zero weights fail with
/// [`TpplError::DegenerateWeights`].
pub fn draw_indices<R>(weights: &[f64], count: usize, rng: &mut R) -> Result<Vec<usize>, TpplError>
where
    R: Rng + ?Sized,
{
    if weights.is_empty() {
        return Err(TpplError::DegenerateWeights(
            ErrorInfo::new("empty-weights", "cannot resample from an empty population")
                .with_context("count", count.to_string()),
        ));
    }
    let distribution = WeightedIndex::new(weights).map_err(|err| {
        let code = match err {
            WeightedError::AllWeightsZero => "all-zero-weights",
            WeightedError::InvalidWeight => "invalid-weight",
            _ => "weights-unusable",
        };
        TpplError::DegenerateWeights(
            ErrorInfo::new(code, err.to_string())
                .with_context("len", weights.len().to_string()),
        )
    })?;
    Ok((0..count).map(|_| distribution.sample(rng)).collect())
}
