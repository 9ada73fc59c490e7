use image::RgbImage;
use plantport_core::{PipelineResult, Prediction};
use tokio::sync::oneshot;

#[derive(Debug)]
pub struct ClassifyRequest {
    pub image: RgbImage,
    pub top_k: usize,
    pub enqueued_at: std::time::Instant,
    pub resp_tx: oneshot::Sender<ClassifyResponse>,
}

#[derive(Debug)]
pub struct ClassifyResponse {
    pub predictions: PipelineResult<Vec<Prediction>>,
    pub timings: Timings,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Timings {
    pub queued_us: u64,
    pub inference_us: u64,
}
