use anyhow::{anyhow, Result};
use image::RgbImage;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{ClassifyRequest, ClassifyResponse, Timings, WorkerModel};

/// Owns the classifier and serves requests strictly one after another.
pub struct Worker {
    pub inbox: mpsc::Receiver<ClassifyRequest>,
    pub model: Box<dyn WorkerModel>,
}

/// Cheap, cloneable sender side of a [`Worker`].
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<ClassifyRequest>,
    input_size: u32,
}

impl Worker {
    pub fn new(model: Box<dyn WorkerModel>, capacity: usize) -> (Self, WorkerHandle) {
        let (tx, inbox) = mpsc::channel(capacity);
        let handle = WorkerHandle {
            tx,
            input_size: model.input_size(),
        };
        (Self { inbox, model }, handle)
    }

    pub async fn run(mut self) -> Result<()> {
        info!("classification worker started");
        while let Some(req) = self.inbox.recv().await {
            let queued_us = req.enqueued_at.elapsed().as_micros() as u64;

            let t0 = std::time::Instant::now();
            let predictions = self.model.classify(&req.image, req.top_k);
            let inference_us = t0.elapsed().as_micros() as u64;

            if let Err(err) = &predictions {
                warn!(error = %err, "classification failed");
            }
            debug!(queued_us, inference_us, "request served");

            let response = ClassifyResponse {
                predictions,
                timings: Timings {
                    queued_us,
                    inference_us,
                },
            };
            if req.resp_tx.send(response).is_err() {
                debug!("requester went away before the response was ready");
            }
        }
        info!("classification worker stopped");
        Ok(())
    }
}

impl WorkerHandle {
    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub async fn classify(&self, image: RgbImage, top_k: usize) -> Result<ClassifyResponse> {
        let (resp_tx, rx) = oneshot::channel();
        let req = ClassifyRequest {
            image,
            top_k,
            enqueued_at: std::time::Instant::now(),
            resp_tx,
        };
        self.tx
            .send(req)
            .await
            .map_err(|_| anyhow!("classification worker is not running"))?;
        rx.await
            .map_err(|_| anyhow!("classification worker dropped the request"))
    }
}
