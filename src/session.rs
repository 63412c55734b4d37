use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

use log::{debug, error, info, warn};
use opencv::core::{Mat, Size};
use opencv::imgproc;

use crate::detector::FaceDetector;
use crate::manifest::Manifest;
use crate::media::{FrameSource, MediaOpener};
use crate::predictor::LandmarkPredictor;
use crate::render::{render, RenderStyle};
use crate::viewer::{Control, KeyWait, Viewer};
use crate::{is_empty_frame, Error, Result};

/// Side length of the square every frame is resized to before detection.
pub const CANONICAL_SIZE: i32 = 460;

/// Default key poll timeout between video frames, in milliseconds.
pub const STREAM_WAIT_MS: u64 = 10;

/// A manifest whose reader fails this many times in a row is abandoned.
const MAX_CONSECUTIVE_READ_ERRORS: usize = 3;

/// How a run ended.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames that went through detection and were shown.
    pub rendered: usize,
    /// Manifest entries that could not be read or decoded.
    pub skipped: usize,
    pub cancelled: bool,
}

/// Detect, predict, render and show loop.
///
/// Owns the loaded detector and predictor for the whole run; they are built
/// once before the first frame and only borrowed per frame.
pub struct LandmarkSession {
    detector: Box<dyn FaceDetector>,
    predictor: Box<dyn LandmarkPredictor>,
    viewer: Box<dyn Viewer>,
    style: RenderStyle,
    size: Size,
    stream_wait: KeyWait,
}

impl LandmarkSession {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        predictor: Box<dyn LandmarkPredictor>,
        viewer: Box<dyn Viewer>,
    ) -> Self {
        Self {
            detector,
            predictor,
            viewer,
            style: RenderStyle::default(),
            size: Size::new(CANONICAL_SIZE, CANONICAL_SIZE),
            stream_wait: KeyWait::Timeout(Duration::from_millis(STREAM_WAIT_MS)),
        }
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_canonical_size(mut self, side: i32) -> Self {
        self.size = Size::new(side, side);
        self
    }

    pub fn with_stream_wait(mut self, wait: KeyWait) -> Self {
        self.stream_wait = wait;
        self
    }

    /// Runs one frame through the pipeline and returns the annotated,
    /// resized copy. `frame` itself is left untouched.
    pub fn annotate(&mut self, frame: &Mat) -> Result<Mat> {
        let mut working = Mat::default();
        imgproc::resize(frame, &mut working, self.size, 0.0, 0.0, imgproc::INTER_LINEAR)?;

        let faces = self.detector.detect(&working)?;
        let landmarks = self.predictor.predict(&working, &faces)?;
        if landmarks.len() != faces.len() {
            return Err(Error::LandmarkMismatch {
                faces: faces.len(),
                landmarks: landmarks.len(),
            });
        }
        debug!("{} faces, {} landmark sets", faces.len(), landmarks.len());

        render(&mut working, &faces, &landmarks, &self.style)?;
        Ok(working)
    }

    fn present(&mut self, frame: &Mat, wait: KeyWait) -> Result<Control> {
        let annotated = self.annotate(frame)?;
        self.viewer.show(&annotated)?;
        self.viewer.wait(wait)
    }

    /// Camera or video mode: runs until the stream ends or the user cancels.
    pub fn run_stream(&mut self, source: &mut dyn FrameSource) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        loop {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("End of stream");
                    break;
                }
                Err(e) => {
                    warn!("Stopping capture, failed to read frame: {}", e);
                    break;
                }
            };
            if is_empty_frame(&frame)? {
                info!("End of stream");
                break;
            }

            let control = self.present(&frame, self.stream_wait)?;
            summary.rendered += 1;
            if control == Control::Cancel {
                summary.cancelled = true;
                break;
            }
        }
        Ok(summary)
    }

    /// Single image mode: shows the result until a key is pressed.
    pub fn run_image(&mut self, image: &Mat) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        if is_empty_frame(image)? {
            error!("Image is empty, nothing to detect");
            summary.skipped += 1;
            return Ok(summary);
        }
        let control = self.present(image, KeyWait::Forever)?;
        summary.rendered = 1;
        summary.cancelled = control == Control::Cancel;
        Ok(summary)
    }

    /// Batch mode over a manifest. Entries that cannot be read or decoded are
    /// reported and skipped; cancelling stops before the next entry is read.
    pub fn run_manifest<R: BufRead>(
        &mut self,
        manifest: Manifest<R>,
        media: &dyn MediaOpener,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut read_errors = 0;
        for entry in manifest {
            let path = match entry {
                Ok(path) => {
                    read_errors = 0;
                    path
                }
                Err(e) => {
                    error!("Couldn't read manifest entry: {}", e);
                    summary.skipped += 1;
                    read_errors += 1;
                    if read_errors == MAX_CONSECUTIVE_READ_ERRORS {
                        error!("Giving up on manifest after {} read errors", read_errors);
                        break;
                    }
                    continue;
                }
            };
            info!("file {}", path.display());

            let Some(image) = decode_entry(media, &path) else {
                error!("Couldn't read image {}", path.display());
                summary.skipped += 1;
                continue;
            };

            let control = self.present(&image, KeyWait::Forever)?;
            summary.rendered += 1;
            if control == Control::Cancel {
                summary.cancelled = true;
                break;
            }
        }
        Ok(summary)
    }
}

fn decode_entry(media: &dyn MediaOpener, path: &Path) -> Option<Mat> {
    match media.decode_image(path) {
        Ok(Some(image)) => match is_empty_frame(&image) {
            Ok(false) => Some(image),
            _ => None,
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Decoding {} failed: {}", path.display(), e);
            None
        }
    }
}
