use anyhow::{Context, Result};
use plantport_backend_ort::{OrtBackend, OrtModel};
use plantport_core::{Backend, LabelSet, ModelArtifact};
use plantport_device::{DeviceClient, SerialSession};
use plantport_runtime::{Classifier, InferenceEngine};
use tracing::info;

use crate::cli::{DeviceArgs, ModelArgs};

/// Loads the model and its labels; done once per process.
pub fn load_classifier(args: &ModelArgs) -> Result<Classifier<OrtModel>> {
    let labels = LabelSet::load(&args.labels)?;
    info!(classes = labels.len(), path = %args.labels.display(), "labels loaded");

    let mut backend = OrtBackend::new();
    if let Some(threads) = args.threads {
        backend = backend.with_intra_threads(threads);
    }
    let model = backend.load(&ModelArtifact::OnnxPath(args.model.clone()))?;

    let engine = InferenceEngine::new(model, args.engine_options())
        .context("model input is not usable for image classification")?;
    let classifier = Classifier::new(engine, labels, args.postprocess_options())
        .context("labels do not fit the model")?;
    Ok(classifier)
}

/// Opens the controller port. A missing device yields a client in the
/// unavailable state rather than an error.
pub async fn open_device(args: &DeviceArgs) -> DeviceClient {
    DeviceClient::new(SerialSession::open(&args.serial_config()).await)
}
