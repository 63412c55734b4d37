use std::path::Path;

use log::{debug, info};
use opencv::core::{self, Mat, Rect, Size, Vector};
use opencv::prelude::*;
use opencv::{imgproc, objdetect};

use crate::{convert_to_grayscale, Error, Result};

/// Axis aligned face rectangle in frame pixel coordinates.
pub type FaceRegion = Rect;

pub trait FaceDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<FaceRegion>>;
}

/// Haar/LBP cascade face detector.
pub struct CascadeFaceDetector {
    classifier: objdetect::CascadeClassifier,
    scale_factor: f64,
    min_neighbors: i32,
    min_size: Size,
}

impl CascadeFaceDetector {
    /// Loads a cascade from `path`. When `path` is not an existing file it is
    /// looked up in OpenCV's sample data directories as well.
    pub fn from_file(path: &Path) -> Result<Self> {
        let requested = path.to_string_lossy().into_owned();
        let resolved = if path.is_file() {
            requested.clone()
        } else {
            core::find_file(&requested, false, true).unwrap_or_default()
        };
        if resolved.is_empty() {
            return Err(Error::CascadeLoad(requested));
        }

        let classifier = objdetect::CascadeClassifier::new(&resolved)
            .map_err(|_| Error::CascadeLoad(requested.clone()))?;
        if classifier.empty()? {
            return Err(Error::CascadeLoad(requested));
        }
        info!("Loaded face cascade {}", resolved);

        Ok(Self {
            classifier,
            scale_factor: 1.1,
            min_neighbors: 3,
            min_size: Size {
                width: 30,
                height: 30,
            },
        })
    }
}

impl FaceDetector for CascadeFaceDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<FaceRegion>> {
        let gray = convert_to_grayscale(frame)?;
        let mut equalized = Mat::default();
        imgproc::equalize_hist(&gray, &mut equalized)?;

        let mut faces = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            &equalized,
            &mut faces,
            self.scale_factor,
            self.min_neighbors,
            objdetect::CASCADE_SCALE_IMAGE,
            self.min_size,
            Size {
                width: 0,
                height: 0,
            },
        )?;
        debug!("Detected {} faces", faces.len());
        Ok(faces.to_vec())
    }
}
