//! Facial landmark detection driver.
//!
//! Frames come from a still image, a manifest of image paths, a video file or
//! a camera. Each frame is resized to a fixed working size, faces are found
//! with a cascade classifier, landmarks are fitted with a regression tree
//! ensemble and the result is drawn and shown in a window.
//!
//! Every external capability sits behind a small trait ([`FaceDetector`],
//! [`LandmarkPredictor`], [`MediaOpener`], [`FrameSource`], [`Viewer`]) so the
//! control flow in [`LandmarkSession`] and [`app::run`] can run against stubs.

pub mod app;
pub mod config;
pub mod detector;
pub mod input;
pub mod manifest;
pub mod media;
pub mod predictor;
pub mod render;
pub mod session;
pub mod viewer;

use opencv::core::Mat;
use opencv::prelude::*;
use thiserror::Error;

pub use config::{DetectorConfig, Invocation};
pub use detector::{CascadeFaceDetector, FaceDetector, FaceRegion};
pub use input::{InputTarget, Resolved};
pub use manifest::Manifest;
pub use media::{FrameSource, MediaOpener, OpencvMedia, VideoCaptureSource};
pub use predictor::{KazemiPredictor, LandmarkPredictor, LandmarkSet};
pub use render::RenderStyle;
pub use session::{LandmarkSession, RunSummary};
pub use viewer::{Control, HighguiViewer, KeyWait, Viewer};

#[derive(Error, Debug)]
pub enum Error {
    #[error("could not load classifier cascade {0}")]
    CascadeLoad(String),

    #[error("failed to open trained model file {path}: {source}")]
    ModelOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to load trained model {path}: {source}")]
    ModelLoad {
        path: String,
        source: opencv::Error,
    },

    #[error("predictor returned {landmarks} landmark sets for {faces} faces")]
    LandmarkMismatch { faces: usize, landmarks: usize },

    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::CascadeLoad(_) => -1,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// OpenCV reports failed decodes and exhausted captures as zero sized mats.
pub fn is_empty_frame(frame: &Mat) -> Result<bool> {
    Ok(frame.size()?.width == 0)
}

pub fn convert_to_grayscale(image: &Mat) -> Result<Mat> {
    let mut gray: Mat = Mat::default();
    opencv::imgproc::cvt_color_def(image, &mut gray, opencv::imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_failure_exits_negative() {
        assert_eq!(Error::CascadeLoad("x.xml".into()).exit_code(), -1);
    }

    #[test]
    fn model_open_failure_exits_one() {
        let err = Error::ModelOpen {
            path: "model.dat".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("model.dat"));
    }

    #[test]
    fn default_mat_is_empty() {
        assert!(is_empty_frame(&Mat::default()).unwrap());
    }
}
