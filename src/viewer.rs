use std::time::Duration;

use log::warn;
use opencv::core::Mat;
use opencv::highgui;

use crate::Result;

const KEY_ESCAPE: u8 = 27;

/// What the frame loop should do after a frame has been shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Cancel,
}

impl Control {
    /// Maps a raw `wait_key` code. Escape, `q` and `Q` cancel, anything else
    /// (including the -1 of a timeout) continues.
    pub fn from_key(key: i32) -> Self {
        if key < 0 {
            return Control::Continue;
        }
        match (key & 0xff) as u8 {
            KEY_ESCAPE | b'q' | b'Q' => Control::Cancel,
            _ => Control::Continue,
        }
    }
}

/// How long to block for a key press after showing a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyWait {
    Timeout(Duration),
    Forever,
}

impl KeyWait {
    fn as_millis(self) -> i32 {
        match self {
            // wait_key treats 0 as forever
            KeyWait::Timeout(duration) => i32::try_from(duration.as_millis())
                .unwrap_or(i32::MAX)
                .max(1),
            KeyWait::Forever => 0,
        }
    }
}

pub trait Viewer {
    fn show(&mut self, frame: &Mat) -> Result<()>;
    fn wait(&mut self, wait: KeyWait) -> Result<Control>;
}

/// A highgui window, destroyed on drop.
pub struct HighguiViewer {
    window: String,
}

impl HighguiViewer {
    pub fn new(window: &str) -> Result<Self> {
        highgui::named_window_def(window)?;
        Ok(Self {
            window: window.to_owned(),
        })
    }
}

impl Viewer for HighguiViewer {
    fn show(&mut self, frame: &Mat) -> Result<()> {
        highgui::imshow(&self.window, frame)?;
        Ok(())
    }

    fn wait(&mut self, wait: KeyWait) -> Result<Control> {
        let key = highgui::wait_key(wait.as_millis())?;
        Ok(Control::from_key(key))
    }
}

impl Drop for HighguiViewer {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.window) {
            warn!("Failed to close window {}: {}", self.window, e);
        }
    }
}
