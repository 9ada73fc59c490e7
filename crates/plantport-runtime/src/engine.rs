use std::borrow::Cow;

use image::RgbImage;
use plantport_core::{BackendModel, PipelineError, PipelineResult, ProbabilityVector};
use tracing::debug;

use crate::{adjust_brightness, FloatNorm, InputPlan};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineOptions {
    pub float_norm: FloatNorm,
    /// Applied to the RGB image before tensor conversion; 1.0 disables it.
    pub brightness: f32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            float_norm: FloatNorm::default(),
            brightness: 1.0,
        }
    }
}

/// Owns a loaded model and turns images into raw per-class scores.
pub struct InferenceEngine<M> {
    model: M,
    plan: InputPlan,
    brightness: f32,
}

impl<M: BackendModel> InferenceEngine<M> {
    pub fn new(model: M, options: EngineOptions) -> PipelineResult<Self> {
        let input = model.spec().input().ok_or_else(|| {
            PipelineError::UnsupportedInputLayout("model declares no inputs".to_string())
        })?;
        let plan = InputPlan::from_spec(input, options.float_norm)?;
        debug!(?plan, "input plan resolved");

        Ok(Self {
            model,
            plan,
            brightness: options.brightness,
        })
    }

    pub fn plan(&self) -> &InputPlan {
        &self.plan
    }

    pub fn input_size(&self) -> u32 {
        self.plan.size
    }

    pub fn class_count(&self) -> Option<usize> {
        self.model.spec().class_count()
    }

    /// Single forward pass over one image. The output is flattened but not
    /// normalized; it is whatever the model's first output holds.
    pub fn infer(&mut self, image: &RgbImage) -> PipelineResult<ProbabilityVector> {
        self.plan.check_image(image)?;

        let image = if self.brightness == 1.0 {
            Cow::Borrowed(image)
        } else {
            let mut adjusted = image.clone();
            adjust_brightness(&mut adjusted, self.brightness);
            Cow::Owned(adjusted)
        };

        let input = self.plan.to_tensor(&image)?;
        let outputs = self
            .model
            .infer(vec![input])
            .map_err(PipelineError::Backend)?;
        let Some(output) = outputs.into_iter().next() else {
            return Err(PipelineError::Backend(anyhow::anyhow!(
                "model produced no outputs"
            )));
        };

        let values = output.to_f32_vec().map_err(PipelineError::Backend)?;
        debug!(classes = values.len(), "forward pass complete");
        Ok(ProbabilityVector::from_f32(&values))
    }
}
