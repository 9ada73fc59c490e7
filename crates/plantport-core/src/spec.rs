#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IOName(pub String);

#[derive(Clone, Debug)]
pub struct TensorSpec {
    pub name: IOName,
    pub dtype: super::DType,
    pub rank: usize,
    pub dims: Vec<Option<usize>>, // None = dynamic
}

#[derive(Clone, Debug)]
pub struct ModelSpec {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}

impl ModelSpec {
    pub fn input(&self) -> Option<&TensorSpec> {
        self.inputs.first()
    }

    pub fn output(&self) -> Option<&TensorSpec> {
        self.outputs.first()
    }

    /// Length of the flattened first output, ignoring a leading batch axis.
    pub fn class_count(&self) -> Option<usize> {
        let out = self.output()?;
        out.dims
            .iter()
            .skip(usize::from(out.rank > 1))
            .try_fold(1usize, |acc, d| d.map(|d| acc * d))
    }
}
