use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches, Parser};

use crate::render::RenderStyle;
use crate::session::{CANONICAL_SIZE, STREAM_WAIT_MS};
use crate::viewer::KeyWait;

pub const DEFAULT_CASCADE: &str = "../data/haarcascade_frontalface_alt2.xml";
pub const DEFAULT_MODEL: &str = "../data/68_landmarks_face_align.dat";
pub const DEFAULT_IMAGE: &str = "../data/lena.jpg";

const ABOUT: &str = "Detects facial landmarks in images, image lists, video files and live camera input";

const LONG_ABOUT: &str = "\
Detects facial landmarks with an ensemble of regression trees (Kazemi & Sullivan).
Runs on a single image, a text file listing one image path per line, a video file,
or a live camera. Works with LBP, HOG and Haar face detectors; use the same face
detector the landmark model was trained with for the most accurate results.

Press Esc or q to stop. In image mode any other key moves to the next image.

Options also accept the single dash form, for example:
  landmark-detection -cascade=../data/haarcascade_frontalface_alt2.xml \\
      -model=../data/68_landmarks_face_align.dat image1.png";

#[derive(Parser, Debug)]
#[command(name = "landmark-detection", version, about = ABOUT, long_about = LONG_ABOUT)]
struct Args {
    /// Face detector cascade
    #[arg(long, default_value = DEFAULT_CASCADE)]
    cascade: PathBuf,

    /// Trained landmark model
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: PathBuf,

    /// Image, video, text file listing images, or camera index (0-9). Leave out
    /// for the default camera
    filename: Option<String>,

    /// Side of the square every frame is resized to
    #[arg(long, default_value_t = CANONICAL_SIZE, value_parser = clap::value_parser!(i32).range(16..))]
    size: i32,

    /// Also draw detected face rectangles
    #[arg(long)]
    boxes: bool,

    /// Key poll timeout between video frames, in milliseconds
    #[arg(
        long,
        default_value_t = STREAM_WAIT_MS,
        value_parser = clap::value_parser!(u64).range(0..=i32::MAX as u64)
    )]
    wait: u64,
}

/// Everything a run needs, fixed once the command line has been parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub cascade: PathBuf,
    pub model: PathBuf,
    /// Raw positional argument, empty when omitted.
    pub input: String,
    pub fallback_image: PathBuf,
    pub canonical_size: i32,
    pub draw_boxes: bool,
    pub stream_wait: Duration,
}

impl DetectorConfig {
    pub fn render_style(&self) -> RenderStyle {
        RenderStyle {
            draw_boxes: self.draw_boxes,
            ..RenderStyle::default()
        }
    }

    pub fn stream_key_wait(&self) -> KeyWait {
        KeyWait::Timeout(self.stream_wait)
    }
}

impl Args {
    fn into_config(self) -> DetectorConfig {
        DetectorConfig {
            cascade: self.cascade,
            model: self.model,
            input: self.filename.unwrap_or_default(),
            fallback_image: PathBuf::from(DEFAULT_IMAGE),
            canonical_size: self.size,
            draw_boxes: self.boxes,
            stream_wait: Duration::from_millis(self.wait),
        }
    }
}

/// Outcome of reading the command line.
#[derive(Debug)]
pub enum Invocation {
    Run(DetectorConfig),
    /// Help, version, or a malformed command line. The error carries the text
    /// to print; none of these start any detection work.
    Exit(clap::Error),
}

impl Invocation {
    pub fn from_env() -> Self {
        Self::from_args(std::env::args_os())
    }

    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let matches = command().try_get_matches_from(normalize_args(args));
        match matches.and_then(|m| Args::from_arg_matches(&m)) {
            Ok(args) => Invocation::Run(args.into_config()),
            Err(err) => Invocation::Exit(err),
        }
    }
}

/// Help text, printed again when a model fails to load.
pub fn usage() -> String {
    command().render_help().to_string()
}

fn command() -> clap::Command {
    let version = opencv::core::get_version_string().unwrap_or_default();
    Args::command().after_help(format!("Using OpenCV version {}", version))
}

/// Turns OpenCV style `-name=value` options into `--name=value`. Short flags
/// (`-h`), `--` options and positionals pass through unchanged.
fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut normalized: Vec<OsString> = args.next().into_iter().collect();
    normalized.extend(args.map(|arg| match arg.to_str() {
        Some(s) if is_single_dash_long(s) => OsString::from(format!("-{}", s)),
        _ => arg,
    }));
    normalized
}

fn is_single_dash_long(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    let name = rest.split('=').next().unwrap_or_default();
    !rest.starts_with('-') && name.len() > 1 && name.chars().all(|c| c.is_ascii_alphabetic())
}
