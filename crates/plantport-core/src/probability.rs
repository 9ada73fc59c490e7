use crate::{PipelineError, PipelineResult};

/// Per-class scores, index-aligned with a [`crate::LabelSet`].
///
/// Raw model output is not guaranteed to be normalized; every post-processing
/// stage that touches the values finishes with [`ProbabilityVector::renormalize`].
#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityVector(Vec<f64>);

impl ProbabilityVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn from_f32(values: &[f32]) -> Self {
        Self(values.iter().map(|&v| f64::from(v)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.0
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Rejects NaN, infinities and negative entries.
    pub fn check_finite(&self) -> PipelineResult<()> {
        match self
            .0
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            Some((index, &value)) => Err(PipelineError::InvalidProbability { index, value }),
            None => Ok(()),
        }
    }

    /// Divides every entry by the total mass.
    pub fn renormalize(&mut self) -> PipelineResult<()> {
        let total = self.sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(PipelineError::DegenerateDistribution(total));
        }
        for v in &mut self.0 {
            *v /= total;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    pub fn percent(&self) -> f64 {
        self.confidence * 100.0
    }
}
