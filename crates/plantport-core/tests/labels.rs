use std::io::Write;

use anyhow::Result;
use plantport_core::{
    DType, IOName, LabelSet, ModelSpec, PipelineError, ProbabilityVector, Shape, Tensor,
    TensorSpec,
};

#[test]
fn labels_skip_blank_lines_and_trim() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "Aloe vera\n\n  Kalanchoe blossfeldiana  \r\nMonstera deliciosa\n")?;

    let labels = LabelSet::load(file.path())?;
    assert_eq!(labels.len(), 3);
    assert_eq!(labels.get(1), Some("Kalanchoe blossfeldiana"));
    assert_eq!(labels.get(3), None);
    Ok(())
}

#[test]
fn matching_is_case_insensitive_substring() {
    let labels = LabelSet::new(["Kalanchoe blossfeldiana", "kalanchoe tomentosa", "Fern"]);
    assert_eq!(labels.matching("KALANCHOE"), vec![0, 1]);
    assert_eq!(labels.matching("rose"), Vec::<usize>::new());
}

#[test]
fn renormalize_rejects_zero_mass() {
    let mut probs = ProbabilityVector::new(vec![0.0, 0.0]);
    assert!(matches!(
        probs.renormalize(),
        Err(PipelineError::DegenerateDistribution(_))
    ));
}

#[test]
fn check_finite_reports_first_bad_index() {
    let probs = ProbabilityVector::new(vec![0.5, f64::NAN, -1.0]);
    match probs.check_finite() {
        Err(PipelineError::InvalidProbability { index, .. }) => assert_eq!(index, 1),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn f32_tensor_widens_back() -> Result<()> {
    let data = [0.25f32, 0.5, 0.25];
    let tensor = Tensor::from_f32(Shape::from_slice(&[1, 3]), &data);
    assert_eq!(tensor.dtype(), DType::F32);
    assert_eq!(tensor.to_f32_vec()?, data.to_vec());

    let bytes = Tensor::from_u8(Shape::from_slice(&[1, 2]), vec![0, 255]);
    assert_eq!(bytes.to_f32_vec()?, vec![0.0, 255.0]);
    Ok(())
}

#[test]
fn class_count_skips_batch_axis() {
    let spec = ModelSpec {
        inputs: vec![],
        outputs: vec![TensorSpec {
            name: IOName("probs".to_string()),
            dtype: DType::F32,
            rank: 2,
            dims: vec![None, Some(30)],
        }],
    };
    assert_eq!(spec.class_count(), Some(30));
}
