//! Image to tensor conversion.
//!
//! The model's declared input dtype picks one of two mutually exclusive
//! strategies. Quantized models receive the raw 0..=255 pixels; float models
//! receive the pixels mapped the way the reference MobileNet architecture was
//! trained. Getting the float mapping wrong does not fail loudly, it only
//! degrades accuracy, so the mapping is an explicit part of the plan.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use plantport_core::{DType, PipelineError, PipelineResult, Shape, Tensor, TensorSpec};

/// Square input size used when the model leaves its spatial dims dynamic.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Pixel mapping for float inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FloatNorm {
    /// `x / 127.5 - 1`, i.e. every channel into [-1, 1].
    #[default]
    SignedUnit,
    /// Raw 0..=255 values as floats, for graphs that rescale internally.
    Passthrough,
}

impl FloatNorm {
    #[inline]
    pub fn apply(self, value: u8) -> f32 {
        match self {
            FloatNorm::SignedUnit => f32::from(value) / 127.5 - 1.0,
            FloatNorm::Passthrough => f32::from(value),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preprocess {
    /// u8 input: pixels unchanged, batch axis added.
    Quantized,
    /// f32 input: pixels widened and normalized.
    Float(FloatNorm),
}

impl Preprocess {
    pub fn for_dtype(dtype: DType, norm: FloatNorm) -> PipelineResult<Self> {
        match dtype {
            DType::U8 => Ok(Preprocess::Quantized),
            DType::F32 => Ok(Preprocess::Float(norm)),
            other => Err(PipelineError::UnsupportedDtype(other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// `[1, S, S, 3]`
    Nhwc,
    /// `[1, 3, S, S]`
    Nchw,
}

/// Everything needed to turn an RGB image into the model's input tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputPlan {
    pub preprocess: Preprocess,
    pub layout: Layout,
    pub size: u32,
}

impl InputPlan {
    pub fn from_spec(spec: &TensorSpec, norm: FloatNorm) -> PipelineResult<Self> {
        let preprocess = Preprocess::for_dtype(spec.dtype, norm)?;

        let unsupported = || {
            PipelineError::UnsupportedInputLayout(format!("{:?}", spec.dims))
        };
        if spec.rank != 4 || spec.dims.len() != 4 {
            return Err(unsupported());
        }

        let (layout, h, w) = match (spec.dims[1], spec.dims[3]) {
            (_, Some(3)) => (Layout::Nhwc, spec.dims[1], spec.dims[2]),
            (Some(3), _) => (Layout::Nchw, spec.dims[2], spec.dims[3]),
            (None, None) => (Layout::Nhwc, spec.dims[1], spec.dims[2]),
            _ => return Err(unsupported()),
        };

        let size = match (h, w) {
            (Some(h), Some(w)) if h == w => h,
            (Some(s), None) | (None, Some(s)) => s,
            (None, None) => DEFAULT_INPUT_SIZE as usize,
            _ => return Err(unsupported()),
        };
        let size = u32::try_from(size).map_err(|_| unsupported())?;

        Ok(Self {
            preprocess,
            layout,
            size,
        })
    }

    pub fn shape(&self) -> Shape {
        let s = self.size as usize;
        match self.layout {
            Layout::Nhwc => Shape::from_slice(&[1, s, s, 3]),
            Layout::Nchw => Shape::from_slice(&[1, 3, s, s]),
        }
    }

    pub fn check_image(&self, image: &RgbImage) -> PipelineResult<()> {
        let (width, height) = image.dimensions();
        if width != self.size || height != self.size {
            return Err(PipelineError::ShapeMismatch {
                expected: self.size as usize,
                actual_width: width,
                actual_height: height,
            });
        }
        Ok(())
    }

    /// Builds the batch-of-one input tensor. Fails without touching the model
    /// when the image is not exactly `size x size`.
    pub fn to_tensor(&self, image: &RgbImage) -> PipelineResult<Tensor> {
        self.check_image(image)?;
        let shape = self.shape();

        let tensor = match (self.preprocess, self.layout) {
            (Preprocess::Quantized, Layout::Nhwc) => Tensor::from_u8(shape, image.as_raw().clone()),
            (Preprocess::Quantized, Layout::Nchw) => {
                Tensor::from_u8(shape, planar(image, |v| v))
            }
            (Preprocess::Float(norm), Layout::Nhwc) => {
                let data: Vec<f32> = image.as_raw().iter().map(|&v| norm.apply(v)).collect();
                Tensor::from_f32(shape, &data)
            }
            (Preprocess::Float(norm), Layout::Nchw) => {
                Tensor::from_f32(shape, &planar(image, |v| norm.apply(v)))
            }
        };
        Ok(tensor)
    }
}

/// CHW reordering: all R values, then all G, then all B.
fn planar<T: Copy + Default>(image: &RgbImage, map: impl Fn(u8) -> T) -> Vec<T> {
    let pixels = (image.width() * image.height()) as usize;
    let mut out = vec![T::default(); 3 * pixels];
    for (i, pixel) in image.pixels().enumerate() {
        for c in 0..3 {
            out[c * pixels + i] = map(pixel[c]);
        }
    }
    out
}

/// Scales every channel by `factor`, saturating at 255. Same result as
/// blending the image with black, so 1.0 is a no-op.
pub fn adjust_brightness(image: &mut RgbImage, factor: f32) {
    if factor == 1.0 {
        return;
    }
    for v in image.iter_mut() {
        *v = (f32::from(*v) * factor).clamp(0.0, 255.0) as u8;
    }
}

/// Converts any decoded image to RGB and resizes it to `size x size`.
pub fn fit_image(image: &DynamicImage, size: u32) -> RgbImage {
    if image.width() == size && image.height() == size {
        return image.to_rgb8();
    }
    image
        .resize_exact(size, size, FilterType::CatmullRom)
        .to_rgb8()
}
