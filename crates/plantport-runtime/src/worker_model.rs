use image::RgbImage;
use plantport_core::{BackendModel, PipelineResult, Prediction};

use crate::Classifier;

/// Object-safe classifier interface.
/// Keep it synchronous; the worker task calls it directly.
pub trait WorkerModel: Send {
    fn input_size(&self) -> u32;
    fn classify(&mut self, image: &RgbImage, top_k: usize) -> PipelineResult<Vec<Prediction>>;
}

impl<M: BackendModel> WorkerModel for Classifier<M> {
    fn input_size(&self) -> u32 {
        Classifier::input_size(self)
    }

    fn classify(&mut self, image: &RgbImage, top_k: usize) -> PipelineResult<Vec<Prediction>> {
        Classifier::classify(self, image, top_k)
    }
}
