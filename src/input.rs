use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;
use opencv::core::Mat;

use crate::media::{FrameSource, MediaOpener};
use crate::Result;

/// The positional input argument, before any file has been looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    /// No input given: camera 0, or the sample image when there is no camera.
    DefaultCamera,
    Camera(i32),
    Path(PathBuf),
}

impl InputTarget {
    pub fn parse(input: &str) -> Self {
        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (None, _) => InputTarget::DefaultCamera,
            (Some(c), None) if c.is_ascii_digit() => InputTarget::Camera(c as i32 - '0' as i32),
            _ => InputTarget::Path(PathBuf::from(input)),
        }
    }
}

/// What the run will actually process.
pub enum Resolved {
    Stream {
        source: Box<dyn FrameSource>,
        label: String,
    },
    Image {
        path: PathBuf,
        image: Mat,
    },
    Manifest(PathBuf),
    /// Nothing usable. The message explains why; this is not a failure of the
    /// program.
    Unavailable(String),
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Stream { label, .. } => f.debug_struct("Stream").field("label", label).finish(),
            Resolved::Image { path, .. } => f.debug_struct("Image").field("path", path).finish(),
            Resolved::Manifest(path) => f.debug_tuple("Manifest").field(path).finish(),
            Resolved::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// Works out what `target` refers to.
///
/// A path is tried as a still image first, then as a video, and anything
/// that is neither is taken to be a manifest.
pub fn resolve(
    target: &InputTarget,
    fallback_image: &Path,
    media: &dyn MediaOpener,
) -> Result<Resolved> {
    match target {
        InputTarget::DefaultCamera => {
            if let Some(source) = media.open_camera(0)? {
                return Ok(camera(source, 0));
            }
            debug!("No camera available, using {}", fallback_image.display());
            match media.decode_image(fallback_image)? {
                Some(image) => Ok(Resolved::Image {
                    path: fallback_image.to_path_buf(),
                    image,
                }),
                None => Ok(Resolved::Unavailable(format!(
                    "Couldn't read {}",
                    fallback_image.display()
                ))),
            }
        }
        InputTarget::Camera(index) => match media.open_camera(*index)? {
            Some(source) => Ok(camera(source, *index)),
            None => Ok(Resolved::Unavailable(format!(
                "Capture from camera #{} didn't work",
                index
            ))),
        },
        InputTarget::Path(path) => {
            if let Some(image) = media.decode_image(path)? {
                return Ok(Resolved::Image {
                    path: path.clone(),
                    image,
                });
            }
            if let Some(source) = media.open_video(path)? {
                return Ok(Resolved::Stream {
                    source,
                    label: path.display().to_string(),
                });
            }
            debug!("Could not read {} as image or video", path.display());
            Ok(Resolved::Manifest(path.clone()))
        }
    }
}

fn camera(source: Box<dyn FrameSource>, index: i32) -> Resolved {
    Resolved::Stream {
        source,
        label: format!("camera #{}", index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{self, Scalar};
    use opencv::prelude::*;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    struct NoFrames;

    impl FrameSource for NoFrames {
        fn next_frame(&mut self) -> Result<Option<Mat>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct StubMedia {
        cameras: Vec<i32>,
        images: Vec<PathBuf>,
        videos: Vec<PathBuf>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MediaOpener for StubMedia {
        fn decode_image(&self, path: &Path) -> Result<Option<Mat>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("image {}", path.display()));
            Ok(self.images.iter().any(|p| p == path).then(|| {
                Mat::new_rows_cols_with_default(8, 8, core::CV_8UC3, Scalar::all(0.0)).unwrap()
            }))
        }

        fn open_camera(&self, index: i32) -> Result<Option<Box<dyn FrameSource>>> {
            self.calls.lock().unwrap().push(format!("camera {}", index));
            Ok(self
                .cameras
                .contains(&index)
                .then(|| Box::new(NoFrames) as Box<dyn FrameSource>))
        }

        fn open_video(&self, path: &Path) -> Result<Option<Box<dyn FrameSource>>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("video {}", path.display()));
            Ok(self
                .videos
                .iter()
                .any(|p| p == path)
                .then(|| Box::new(NoFrames) as Box<dyn FrameSource>))
        }
    }

    const FALLBACK: &str = "../data/lena.jpg";

    #[rstest]
    #[case::empty("", InputTarget::DefaultCamera)]
    #[case::digit("2", InputTarget::Camera(2))]
    #[case::zero("0", InputTarget::Camera(0))]
    #[case::two_digits("12", InputTarget::Path("12".into()))]
    #[case::image("face.png", InputTarget::Path("face.png".into()))]
    #[case::non_ascii_digit("٣", InputTarget::Path("٣".into()))]
    fn test_parse(#[case] input: &str, #[case] expected: InputTarget) {
        assert_eq!(InputTarget::parse(input), expected);
    }

    #[test]
    fn test_digit_selects_camera_index() {
        let media = StubMedia {
            cameras: vec![2],
            ..Default::default()
        };

        let resolved = resolve(&InputTarget::parse("2"), Path::new(FALLBACK), &media).unwrap();

        assert!(matches!(resolved, Resolved::Stream { ref label, .. } if label == "camera #2"));
        assert_eq!(*media.calls.lock().unwrap(), vec!["camera 2"]);
    }

    #[test]
    fn test_missing_camera_is_unavailable() {
        let media = StubMedia::default();

        let resolved = resolve(&InputTarget::Camera(3), Path::new(FALLBACK), &media).unwrap();

        assert!(matches!(resolved, Resolved::Unavailable(ref msg) if msg.contains("#3")));
    }

    #[test]
    fn test_no_camera_falls_back_to_sample_image() {
        let media = StubMedia {
            images: vec![FALLBACK.into()],
            ..Default::default()
        };

        let resolved = resolve(&InputTarget::DefaultCamera, Path::new(FALLBACK), &media).unwrap();

        assert!(matches!(resolved, Resolved::Image { ref path, .. } if path == Path::new(FALLBACK)));
        assert_eq!(
            *media.calls.lock().unwrap(),
            vec!["camera 0".to_string(), format!("image {}", FALLBACK)]
        );
    }

    #[test]
    fn test_default_camera_preferred_over_fallback() {
        let media = StubMedia {
            cameras: vec![0],
            images: vec![FALLBACK.into()],
            ..Default::default()
        };

        let resolved = resolve(&InputTarget::DefaultCamera, Path::new(FALLBACK), &media).unwrap();

        assert!(matches!(resolved, Resolved::Stream { .. }));
    }

    #[test]
    fn test_unreadable_fallback_is_unavailable() {
        let media = StubMedia::default();

        let resolved = resolve(&InputTarget::DefaultCamera, Path::new(FALLBACK), &media).unwrap();

        assert!(matches!(resolved, Resolved::Unavailable(_)));
    }

    #[test]
    fn test_image_wins() {
        let media = StubMedia {
            images: vec!["face.png".into()],
            videos: vec!["face.png".into()],
            ..Default::default()
        };

        let resolved =
            resolve(&InputTarget::parse("face.png"), Path::new(FALLBACK), &media).unwrap();

        assert!(matches!(resolved, Resolved::Image { .. }));
        assert_eq!(*media.calls.lock().unwrap(), vec!["image face.png"]);
    }

    #[test]
    fn test_video_after_failed_image() {
        let media = StubMedia {
            videos: vec!["clip.avi".into()],
            ..Default::default()
        };

        let resolved =
            resolve(&InputTarget::parse("clip.avi"), Path::new(FALLBACK), &media).unwrap();

        assert!(matches!(resolved, Resolved::Stream { ref label, .. } if label == "clip.avi"));
        assert_eq!(
            *media.calls.lock().unwrap(),
            vec!["image clip.avi", "video clip.avi"]
        );
    }

    #[test]
    fn test_neither_image_nor_video_is_manifest() {
        let media = StubMedia::default();

        let resolved =
            resolve(&InputTarget::parse("list.txt"), Path::new(FALLBACK), &media).unwrap();

        assert!(matches!(resolved, Resolved::Manifest(ref p) if p == Path::new("list.txt")));
    }
}
