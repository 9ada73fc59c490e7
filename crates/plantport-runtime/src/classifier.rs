use image::{DynamicImage, RgbImage};
use plantport_core::{BackendModel, LabelSet, PipelineError, PipelineResult, Prediction};
use tracing::{debug, info};

use crate::{fit_image, postprocess, InferenceEngine, PostprocessOptions};

/// Top-K used by the capture-and-report flow.
pub const SCAN_TOP_K: usize = 3;
/// Top-K used by the diagnostic flow.
pub const DIAGNOSTIC_TOP_K: usize = 5;

/// Inference engine plus the labels and post-processing it reports with.
pub struct Classifier<M> {
    engine: InferenceEngine<M>,
    labels: LabelSet,
    options: PostprocessOptions,
}

impl<M: BackendModel> Classifier<M> {
    pub fn new(
        engine: InferenceEngine<M>,
        labels: LabelSet,
        options: PostprocessOptions,
    ) -> PipelineResult<Self> {
        if labels.is_empty() {
            return Err(PipelineError::EmptyLabelSet);
        }
        if let Some(classes) = engine.class_count() {
            if classes != labels.len() {
                return Err(PipelineError::DimensionMismatch {
                    probs: classes,
                    labels: labels.len(),
                });
            }
        }
        options.validate()?;

        info!(
            classes = labels.len(),
            input_size = engine.input_size(),
            "classifier ready"
        );
        Ok(Self {
            engine,
            labels,
            options,
        })
    }

    pub fn input_size(&self) -> u32 {
        self.engine.input_size()
    }

    /// Ranked predictions for an image already sized to the model input.
    pub fn classify(&mut self, image: &RgbImage, top_k: usize) -> PipelineResult<Vec<Prediction>> {
        let probs = self.engine.infer(image)?;
        let predictions = postprocess(probs, &self.labels, &self.options, top_k)?;
        if let Some(best) = predictions.first() {
            debug!(label = %best.label, confidence = best.confidence, "top prediction");
        }
        Ok(predictions)
    }

    /// Converts and resizes a decoded image before classifying it.
    pub fn classify_image(
        &mut self,
        image: &DynamicImage,
        top_k: usize,
    ) -> PipelineResult<Vec<Prediction>> {
        let fitted = fit_image(image, self.input_size());
        self.classify(&fitted, top_k)
    }
}
