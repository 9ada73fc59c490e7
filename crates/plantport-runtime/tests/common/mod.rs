#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use plantport_core::{BackendModel, DType, IOName, ModelSpec, Tensor, TensorSpec};

/// In-memory model: records every input and answers with a fixed vector.
pub struct FakeModel {
    spec: ModelSpec,
    output: Vec<f32>,
    pub seen: Arc<Mutex<Vec<Tensor>>>,
}

impl FakeModel {
    pub fn new(input_dtype: DType, input_dims: &[usize], output: Vec<f32>) -> Self {
        let spec = ModelSpec {
            inputs: vec![TensorSpec {
                name: IOName("image".to_string()),
                dtype: input_dtype,
                rank: input_dims.len(),
                dims: input_dims.iter().map(|&d| Some(d)).collect(),
            }],
            outputs: vec![TensorSpec {
                name: IOName("probs".to_string()),
                dtype: DType::F32,
                rank: 2,
                dims: vec![Some(1), Some(output.len())],
            }],
        };
        Self {
            spec,
            output,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn nhwc(input_dtype: DType, size: usize, output: Vec<f32>) -> Self {
        Self::new(input_dtype, &[1, size, size, 3], output)
    }
}

impl BackendModel for FakeModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn infer(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        self.seen.lock().unwrap().extend(inputs);
        let shape = plantport_core::Shape::from_slice(&[1, self.output.len()]);
        Ok(vec![Tensor::from_f32(shape, &self.output)])
    }
}
