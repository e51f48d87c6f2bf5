//! Headless frame sink.
//!
//! Used by the CLI and by discovery, where nothing is drawn on screen.  The
//! display records what a real surface would have shown: the advertised VGA
//! size, the number of frames painted and the most recent frame, which can be
//! written to disk as a JPEG.
//!
//! Cloning a `HeadlessDisplay` yields another handle to the same state, so the
//! caller can keep one handle while the session owns the other.

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::frame::Bitmap;
use crate::application::session::FrameSink;

/// What the headless display has seen so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplaySnapshot {
    /// Size from the last `vgaSizeUpdate`, if any.
    pub vga_size: Option<(u32, u32)>,
    pub frames_painted: u64,
    pub last_frame: Option<Bitmap>,
    pub focus_requests: u64,
    pub detached: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessDisplay {
    state: Arc<Mutex<DisplaySnapshot>>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.lock().clone()
    }

    /// Writes the most recent frame to `path`.
    ///
    /// Returns `Ok(false)` when no frame has been painted yet.
    pub fn save_last_frame(&self, path: &Path) -> io::Result<bool> {
        let Some(frame) = self.lock().last_frame.clone() else {
            return Ok(false);
        };
        std::fs::write(path, &frame.image.data)?;
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, DisplaySnapshot> {
        // The state is plain data; a panic mid-update leaves nothing torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameSink for HeadlessDisplay {
    fn resize(&mut self, width: u32, height: u32) {
        self.lock().vga_size = Some((width, height));
    }

    fn paint(&mut self, bitmap: &Bitmap) {
        let mut state = self.lock();
        state.frames_painted += 1;
        state.last_frame = Some(bitmap.clone());
    }

    fn focus(&mut self) {
        self.lock().focus_requests += 1;
    }

    fn detach(&mut self) {
        self.lock().detached = true;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
