use std::fs::File;
use std::path::Path;

use log::info;
use opencv::core::{Mat, Point2f, Ptr, Rect, Vector};
use opencv::face;
use opencv::prelude::*;

use crate::detector::FaceRegion;
use crate::{Error, Result};

/// Landmark points of one face, in the same frame coordinates as its region.
pub type LandmarkSet = Vec<Point2f>;

pub trait LandmarkPredictor {
    /// Returns exactly one landmark set per entry of `faces`, in order.
    fn predict(&mut self, frame: &Mat, faces: &[FaceRegion]) -> Result<Vec<LandmarkSet>>;
}

/// Kazemi & Sullivan regression tree ensemble from the OpenCV face module.
pub struct KazemiPredictor {
    facemark: Ptr<face::Facemark>,
}

impl KazemiPredictor {
    /// The file is opened here so that a missing or unreadable model is told
    /// apart from one the facemark loader rejects.
    pub fn from_file(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        File::open(path).map_err(|source| Error::ModelOpen {
            path: display.clone(),
            source,
        })?;

        let mut facemark = face::create_facemark_kazemi()?;
        facemark
            .load_model(&path.to_string_lossy())
            .map_err(|source| Error::ModelLoad {
                path: display.clone(),
                source,
            })?;
        info!("Loaded landmark model {}", display);

        Ok(Self { facemark })
    }
}

impl LandmarkPredictor for KazemiPredictor {
    fn predict(&mut self, frame: &Mat, faces: &[FaceRegion]) -> Result<Vec<LandmarkSet>> {
        if faces.is_empty() {
            return Ok(Vec::new());
        }

        let faces: Vector<Rect> = faces.iter().copied().collect();
        let mut landmarks = Vector::<Vector<Point2f>>::new();
        if !self.facemark.fit(frame, &faces, &mut landmarks)? {
            // fit only fails as a whole, keep one (empty) set per face
            return Ok(vec![Vec::new(); faces.len()]);
        }
        Ok(landmarks.iter().map(|points| points.to_vec()).collect())
    }
}
