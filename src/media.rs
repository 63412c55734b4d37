use std::path::Path;

use log::debug;
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::{imgcodecs, videoio};

use crate::{is_empty_frame, Result};

/// A camera or video file producing frames one at a time.
pub trait FrameSource {
    /// `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Mat>>;
}

/// Still image decoding and stream opening.
///
/// The `Option` results signal "this input is not of that kind", which is how
/// the input resolver walks its fallback order. `Err` is reserved for failures of
/// the backend itself.
pub trait MediaOpener {
    fn decode_image(&self, path: &Path) -> Result<Option<Mat>>;
    fn open_camera(&self, index: i32) -> Result<Option<Box<dyn FrameSource>>>;
    fn open_video(&self, path: &Path) -> Result<Option<Box<dyn FrameSource>>>;
}

/// Frames from an OpenCV `VideoCapture`. The device or file is released when
/// the source is dropped.
pub struct VideoCaptureSource {
    capture: videoio::VideoCapture,
}

impl VideoCaptureSource {
    pub fn camera(index: i32) -> Result<Option<Self>> {
        let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)?;
        Self::opened(capture)
    }

    pub fn file(path: &Path) -> Result<Option<Self>> {
        let capture = videoio::VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?;
        Self::opened(capture)
    }

    fn opened(capture: videoio::VideoCapture) -> Result<Option<Self>> {
        if videoio::VideoCapture::is_opened(&capture)? {
            Ok(Some(Self { capture }))
        } else {
            Ok(None)
        }
    }
}

impl FrameSource for VideoCaptureSource {
    fn next_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || is_empty_frame(&frame)? {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OpencvMedia;

impl MediaOpener for OpencvMedia {
    fn decode_image(&self, path: &Path) -> Result<Option<Mat>> {
        let image = imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_COLOR)?;
        if is_empty_frame(&image)? {
            debug!("{} is not a decodable image", path.display());
            return Ok(None);
        }
        Ok(Some(image))
    }

    fn open_camera(&self, index: i32) -> Result<Option<Box<dyn FrameSource>>> {
        Ok(VideoCaptureSource::camera(index)?.map(|source| Box::new(source) as Box<dyn FrameSource>))
    }

    fn open_video(&self, path: &Path) -> Result<Option<Box<dyn FrameSource>>> {
        Ok(VideoCaptureSource::file(path)?.map(|source| Box::new(source) as Box<dyn FrameSource>))
    }
}
