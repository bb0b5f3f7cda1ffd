//! Abstract scroll state for one stream panel.
//!
//! Units are whatever the concrete view measures scroll in (pixels, rows);
//! the semantics only need offsets to be comparable.

/// Distance from the bottom edge within which the reader still counts as
/// "at the bottom" for auto-scroll purposes.
pub const FOLLOW_TOLERANCE: f32 = 50.0;

/// The single scroll adjustment a flush applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scroll {
    ToBottom,
    Restore(f32),
}

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    follow: bool,
    offset: f32,
    extent: f32,
}

impl Viewport {
    pub fn new(follow: bool) -> Self {
        Self { follow, offset: 0.0, extent: 0.0 }
    }

    pub fn follow(&self) -> bool {
        self.follow
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn extent(&self) -> f32 {
        self.extent
    }

    /// User moved the scrollbar. Moving away from the bottom edge switches
    /// follow off; it only comes back when re-enabled explicitly.
    pub fn record_scroll(&mut self, offset: f32) {
        self.offset = offset.clamp(0.0, self.extent);
        if self.follow && self.extent - self.offset > FOLLOW_TOLERANCE {
            self.follow = false;
        }
    }

    /// Toggle auto-scroll; enabling snaps to the bottom immediately.
    pub fn set_follow(&mut self, on: bool) {
        self.follow = on;
        if on {
            self.offset = self.extent;
        }
    }

    /// Account for a flushed batch of `added` units and produce the one
    /// scroll adjustment: bottom when following, otherwise restore the
    /// pre-flush offset so the reading position is undisturbed.
    pub fn after_flush(&mut self, added: usize) -> Scroll {
        self.extent += added as f32;
        if self.follow {
            self.offset = self.extent;
            Scroll::ToBottom
        } else {
            Scroll::Restore(self.offset)
        }
    }

    /// Panel content was cleared.
    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.extent = 0.0;
    }
}
