//! Per-frame coalescing of redraws and pointer moves

use depviz_core::Point;

#[derive(Debug, Clone, Default)]
pub struct FrameState {
    needs_redraw: bool,
    pending_pointer: Option<Point>,
    frames: u64,
}

impl FrameState {
    pub fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Queue a pointer move for the next frame. Returns true when it
    /// replaced one that had not run yet.
    pub fn queue_pointer(&mut self, world: Point) -> bool {
        self.pending_pointer.replace(world).is_some()
    }

    pub fn take_pointer(&mut self) -> Option<Point> {
        self.pending_pointer.take()
    }

    pub fn discard_pointer(&mut self) {
        self.pending_pointer = None;
    }

    /// Consume the redraw flag. Returns whether a redraw is due.
    pub fn begin(&mut self) -> bool {
        let due = std::mem::take(&mut self.needs_redraw);
        if due {
            self.frames += 1;
        }
        due
    }

    /// Frames that actually redrew.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
