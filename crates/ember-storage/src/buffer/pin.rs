//! Scoped pinning of frames.

use std::ops::Deref;
use std::sync::Arc;

use super::frame::Frame;

/// RAII holder of a pin on a frame.
///
/// The guard pins the frame on construction and unpins it on drop, so
/// every exit path - early return, `?`, panic unwind - releases the pin.
/// Any pool path that touches a frame's buffer does so while holding one
/// of these, which is what keeps concurrent eviction from observing a
/// zero pin count on a frame in use.
///
/// The guard is move-only; cloning would double-release on drop.
pub struct PinGuard {
    frame: Arc<Frame>,
}

impl PinGuard {
    /// Pins `frame` and returns the guard.
    pub fn new(frame: Arc<Frame>) -> Self {
        frame.pin();
        Self { frame }
    }

    /// Returns the pinned frame.
    #[inline]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}

impl Deref for PinGuard {
    type Target = Frame;

    fn deref(&self) -> &Self::Target {
        &self.frame
    }
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        self.frame.unpin();
    }
}

impl std::fmt::Debug for PinGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinGuard").field("frame", &*self.frame).finish()
    }
}
