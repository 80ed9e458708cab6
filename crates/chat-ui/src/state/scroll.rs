/// How close to the bottom (in points) still counts as "at the bottom".
pub const NEAR_BOTTOM_THRESHOLD: f32 = 20.0;

/// True when the viewport's lower edge is within the threshold of the end
/// of the content.
pub fn is_near_bottom(scroll_top: f32, viewport_height: f32, content_height: f32) -> bool {
    scroll_top + viewport_height >= content_height - NEAR_BOTTOM_THRESHOLD
}

/// Follows the newest message unless the viewer has scrolled up to read
/// history, in which case new content raises a "scroll to latest" control.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    at_bottom: bool,
    has_unseen: bool,
    jump_requested: bool,
    seen_count: usize,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self {
            at_bottom: true,
            has_unseen: false,
            jump_requested: false,
            seen_count: 0,
        }
    }

    /// Record the scroll geometry from the last frame.
    pub fn observe(&mut self, scroll_top: f32, viewport_height: f32, content_height: f32) {
        self.at_bottom = is_near_bottom(scroll_top, viewport_height, content_height);
        if self.at_bottom {
            self.has_unseen = false;
        }
    }

    /// Called when the stream delivers `count` messages.
    pub fn content_changed(&mut self, count: usize) {
        let grew = count > self.seen_count;
        self.seen_count = count;
        if grew && !self.at_bottom {
            self.has_unseen = true;
        }
    }

    /// Whether the list should stay pinned to its end this frame.
    pub fn should_follow(&self) -> bool {
        self.at_bottom || self.jump_requested
    }

    pub fn show_jump_control(&self) -> bool {
        self.has_unseen && !self.at_bottom
    }

    pub fn request_jump(&mut self) {
        self.jump_requested = true;
        self.has_unseen = false;
    }

    /// Consume a pending jump request.
    pub fn take_jump(&mut self) -> bool {
        std::mem::take(&mut self.jump_requested)
    }
}
