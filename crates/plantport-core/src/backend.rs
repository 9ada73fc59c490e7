use anyhow::Result;

use crate::{ModelArtifact, ModelSpec, Tensor};

pub trait Backend: Send + Sync + 'static {
    type Model: BackendModel;

    fn name(&self) -> &'static str;
    fn load(&self, artifact: &ModelArtifact) -> Result<Self::Model>;
}

pub trait BackendModel: Send + 'static {
    fn spec(&self) -> &ModelSpec;

    /// One forward pass. Inputs are already batched (batch size 1).
    fn infer(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>>;
}

impl<M: BackendModel + ?Sized> BackendModel for Box<M> {
    fn spec(&self) -> &ModelSpec {
        (**self).spec()
    }

    fn infer(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        (**self).infer(inputs)
    }
}
