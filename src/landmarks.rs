//! Face-mesh landmark detection.
//!
//! Runs a 468-point face-mesh model through ONNX Runtime on the whole frame and
//! returns the landmarks as fractions of the frame size.

use crate::{
    constants::NUM_FACE_MESH_LANDMARKS,
    error::Error,
    geometry::Landmark,
    utils::safe_cast::usize_to_i32,
    Result,
};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Size, Vec3f, CV_32F};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Anything that turns a camera frame into face-mesh landmarks
pub trait LandmarkSource {
    /// Landmarks of the first face in `frame`, fractional in `[0, 1]`, or
    /// `None` when no face is present
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails
    fn process(&mut self, frame: &Mat) -> Result<Option<Vec<Landmark>>>;
}

/// Memory layout of the model input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLayout {
    /// Batch, channels, height, width
    Nchw,
    /// Batch, height, width, channels
    Nhwc,
}

impl InputLayout {
    /// Parse `nchw` or `nhwc`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for any other name
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "nchw" => Ok(Self::Nchw),
            "nhwc" => Ok(Self::Nhwc),
            other => Err(Error::InvalidInput(format!("Unknown input layout: {other}"))),
        }
    }
}

/// How a model reports face presence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    /// Already a probability in `[0, 1]`
    Probability,
    /// Raw logit, passed through a sigmoid
    Logit,
}

impl ScoreKind {
    /// Parse `probability` or `logit`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for any other name
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "probability" => Ok(Self::Probability),
            "logit" => Ok(Self::Logit),
            other => Err(Error::InvalidInput(format!("Unknown score kind: {other}"))),
        }
    }

    /// Presence probability for a raw score
    #[must_use]
    pub fn probability(self, score: f32) -> f32 {
        match self {
            Self::Probability => score,
            Self::Logit => 1.0 / (1.0 + (-score).exp()),
        }
    }
}

/// Face-presence gate applied to the model's score output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenceGate {
    pub kind: ScoreKind,
    pub threshold: f32,
}

impl PresenceGate {
    #[must_use]
    pub fn accepts(&self, score: f32) -> bool {
        self.kind.probability(score) >= self.threshold
    }
}

/// 468-point face mesh running through `ONNX` Runtime
pub struct FaceMeshDetector {
    session: Session,
    input_size: i32,
    layout: InputLayout,
    presence: PresenceGate,
}

impl FaceMeshDetector {
    /// Load a face-mesh model
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The model has no inputs or outputs
    /// - `input_size` is not positive
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        input_size: i32,
        layout: InputLayout,
        presence: PresenceGate,
    ) -> Result<Self> {
        log::info!(
            "Initializing FaceMeshDetector with model: {}",
            model_path.as_ref().display()
        );
        if input_size <= 0 {
            return Err(Error::InvalidInput(format!("Input size must be positive, got {input_size}")));
        }

        let environment = Arc::new(
            Environment::builder()
                .with_name("face_mesh")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        if session.inputs.is_empty() {
            return Err(Error::ModelError("Model has no inputs".to_string()));
        }
        if session.outputs.is_empty() {
            return Err(Error::ModelOutputError("Model has no outputs".to_string()));
        }

        Ok(Self {
            session,
            input_size,
            layout,
            presence,
        })
    }

    /// Resize, convert to RGB and scale a BGR frame into the model tensor
    #[allow(clippy::cast_sign_loss)] // input_size checked positive in new()
    fn preprocess(&self, frame: &Mat) -> Result<Array4<f32>> {
        let size = self.input_size as usize;
        let channels = 3;

        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut rgb_image = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb_image, imgproc::COLOR_BGR2RGB, 0)?;

        let mut float_image = Mat::default();
        rgb_image.convert_to(&mut float_image, CV_32F, 1.0 / 255.0, 0.0)?;

        let mut data = vec![0.0f32; size * size * channels];
        for row in 0..size {
            for col in 0..size {
                let pixel = float_image.at_2d::<Vec3f>(usize_to_i32(row)?, usize_to_i32(col)?)?;
                for ch in 0..channels {
                    data[(row * size + col) * channels + ch] = pixel[ch];
                }
            }
        }

        let array = Array4::from_shape_vec((1, size, size, channels), data)
            .map_err(|e| Error::ModelDataFormatError(format!("Failed to create array: {e}")))?;

        Ok(match self.layout {
            InputLayout::Nhwc => array,
            InputLayout::Nchw => array.permuted_axes([0, 3, 1, 2]).as_standard_layout().into_owned(),
        })
    }

    /// Run the model, returning every output flattened
    fn forward(&self, input: Array4<f32>) -> Result<Vec<Vec<f32>>> {
        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;

        let mut flattened = Vec::with_capacity(outputs.len());
        for output in outputs {
            let tensor = output.try_extract::<f32>()?;
            let view = tensor.view();
            flattened.push(view.iter().copied().collect());
        }
        Ok(flattened)
    }
}

impl LandmarkSource for FaceMeshDetector {
    fn process(&mut self, frame: &Mat) -> Result<Option<Vec<Landmark>>> {
        if frame.empty() {
            return Ok(None);
        }
        let input = self.preprocess(frame)?;
        let outputs = self.forward(input)?;
        decode_face_mesh(&outputs, self.input_size, self.presence)
    }
}

/// Turn raw face-mesh outputs into fractional landmarks.
///
/// The landmark tensor is recognised by size (at least 468 x 3 values,
/// coordinates in input pixels); a single-value tensor is the face score,
/// read according to `presence.kind`.
///
/// # Errors
///
/// Returns `ModelOutputError` when no output holds landmarks
#[allow(clippy::cast_precision_loss)] // input_size is small
pub fn decode_face_mesh(outputs: &[Vec<f32>], input_size: i32, presence: PresenceGate) -> Result<Option<Vec<Landmark>>> {
    let coords = outputs
        .iter()
        .find(|o| o.len() >= NUM_FACE_MESH_LANDMARKS * 3)
        .ok_or_else(|| Error::ModelOutputError("No landmark tensor in model output".to_string()))?;

    if let Some(score) = outputs.iter().find(|o| o.len() == 1).map(|o| o[0]) {
        if !presence.accepts(score) {
            log::debug!(
                "Face presence {:.3} below threshold {:.3}",
                presence.kind.probability(score),
                presence.threshold
            );
            return Ok(None);
        }
    }

    let scale = input_size as f32;
    let landmarks = coords
        .chunks_exact(3)
        .take(NUM_FACE_MESH_LANDMARKS)
        .map(|xyz| Landmark::new(xyz[0] / scale, xyz[1] / scale))
        .collect();
    Ok(Some(landmarks))
}
