//! Confidence post-processing: temperature, preferred-class boost, ranking.
//!
//! The temperature stage works on an already-softmaxed vector by going back to
//! log space, so it only approximates a temperature applied to true logits.

use plantport_core::{
    LabelSet, PipelineError, PipelineResult, Prediction, ProbabilityVector,
};
use tracing::debug;

/// Added before taking logarithms so zero probabilities stay finite.
pub const LOG_EPSILON: f64 = 1e-9;

pub const DEFAULT_BOOST: f64 = 0.25;

#[derive(Clone, Debug, PartialEq)]
pub struct PostprocessOptions {
    /// Below 1 sharpens, above 1 flattens, 0 collapses to the arg-max.
    pub temperature: f64,
    /// Case-insensitive substring selecting the classes to boost.
    pub prefer: Option<String>,
    /// Multiplier increment for preferred classes (`p * (1 + boost)`).
    pub boost: f64,
}

impl Default for PostprocessOptions {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            prefer: None,
            boost: DEFAULT_BOOST,
        }
    }
}

impl PostprocessOptions {
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(PipelineError::InvalidTemperature(self.temperature));
        }
        if !self.boost.is_finite() || self.boost <= -1.0 {
            return Err(PipelineError::InvalidBoost(self.boost));
        }
        Ok(())
    }

    fn preferred(&self) -> Option<&str> {
        self.prefer.as_deref().filter(|p| !p.is_empty())
    }
}

/// Runs every configured stage and returns the `top_k` best classes.
pub fn postprocess(
    probs: ProbabilityVector,
    labels: &LabelSet,
    options: &PostprocessOptions,
    top_k: usize,
) -> PipelineResult<Vec<Prediction>> {
    let probs = calibrate(probs, labels, options)?;
    Ok(rank(&probs, labels, top_k))
}

/// Normalizes the raw model output, then applies temperature and boost.
/// The result always sums to 1, so quantized heads that emit 0..=255 come out
/// as probabilities too. An all-zero output is a `DegenerateDistribution`.
pub fn calibrate(
    mut probs: ProbabilityVector,
    labels: &LabelSet,
    options: &PostprocessOptions,
) -> PipelineResult<ProbabilityVector> {
    if labels.is_empty() {
        return Err(PipelineError::EmptyLabelSet);
    }
    if probs.len() != labels.len() {
        return Err(PipelineError::DimensionMismatch {
            probs: probs.len(),
            labels: labels.len(),
        });
    }
    options.validate()?;
    probs.check_finite()?;
    probs.renormalize()?;

    apply_temperature(&mut probs, options.temperature)?;
    if let Some(prefer) = options.preferred() {
        apply_boost(&mut probs, labels, prefer, options.boost)?;
    }

    probs.check_finite()?;
    Ok(probs)
}

pub fn apply_temperature(probs: &mut ProbabilityVector, temperature: f64) -> PipelineResult<()> {
    if temperature == 1.0 {
        return Ok(());
    }
    if probs.is_empty() {
        return Err(PipelineError::DegenerateDistribution(0.0));
    }

    let values = probs.as_mut_slice();
    if temperature == 0.0 {
        let best = argmax(values);
        for (i, v) in values.iter_mut().enumerate() {
            *v = if i == best { 1.0 } else { 0.0 };
        }
        return Ok(());
    }

    for v in values.iter_mut() {
        *v = (*v + LOG_EPSILON).ln() / temperature;
    }
    // Shifting by the max cancels out in the renormalization but keeps exp()
    // from underflowing to an all-zero vector at small temperatures.
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    for v in values.iter_mut() {
        *v = (*v - max).exp();
    }

    debug!(temperature, "temperature applied");
    probs.renormalize()
}

pub fn apply_boost(
    probs: &mut ProbabilityVector,
    labels: &LabelSet,
    prefer: &str,
    boost: f64,
) -> PipelineResult<()> {
    let factor = 1.0 + boost;
    let values = probs.as_mut_slice();
    for index in labels.matching(prefer) {
        values[index] *= factor;
        debug!(class = labels.get(index).unwrap_or_default(), boost, "boost applied");
    }
    probs.renormalize()
}

/// Orders classes by probability, highest first; equal probabilities keep
/// class-index order.
pub fn rank(probs: &ProbabilityVector, labels: &LabelSet, top_k: usize) -> Vec<Prediction> {
    let values = probs.as_slice();
    let mut order: Vec<usize> = (0..values.len().min(labels.len())).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    order
        .into_iter()
        .take(top_k)
        .filter_map(|i| labels.get(i).map(|label| Prediction::new(label, values[i])))
        .collect()
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
