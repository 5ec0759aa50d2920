use crate::browser::driver::{ElementHandle, PageDriver};
use crate::error::Result;

/// Scoped frame context.
///
/// Entering switches the driver into the frame's document; dropping the scope
/// switches back, whichever way the enclosing code exits.
pub struct FrameScope<'a> {
    page: &'a dyn PageDriver,
    frame: ElementHandle,
}

impl<'a> FrameScope<'a> {
    pub fn enter(page: &'a dyn PageDriver, frame: &ElementHandle) -> Result<Self> {
        page.enter_frame(frame)?;
        log::debug!("Entered frame {}", frame);
        Ok(Self {
            page,
            frame: *frame,
        })
    }

    pub fn page(&self) -> &'a dyn PageDriver {
        self.page
    }

    pub fn frame(&self) -> ElementHandle {
        self.frame
    }

    /// Leave the frame now instead of at the end of the enclosing block
    pub fn exit(self) {
        drop(self);
    }
}

impl Drop for FrameScope<'_> {
    fn drop(&mut self) {
        match self.page.exit_frame() {
            Ok(()) => log::debug!("Left frame {}", self.frame),
            Err(e) => log::warn!("Failed to leave frame {}: {}", self.frame, e),
        }
    }
}
