use gpui::{Bounds, Pixels, ScrollStrategy, point};
use gpui_component::VirtualListScrollHandle;

/// How far above the last row still counts as "at the tail".
const TAIL_SLACK: f32 = 24.0;
const RESIZE_EPSILON: f32 = 1.0;

/// True when a list scrolled to `offset_y` shows its last row.
///
/// Offsets run from 0 at the top to `-max_offset` at the tail.
pub fn is_at_tail(offset_y: f32, max_offset: f32) -> bool {
    max_offset <= 0.0 || (offset_y + max_offset).abs() <= TAIL_SLACK
}

/// Whether the list should stick to its newest row.
///
/// Content growth keeps the current choice; only a scroll at a stable
/// content height moves it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TailFollow {
    pinned: bool,
    last_max_offset: f32,
}

impl Default for TailFollow {
    fn default() -> Self {
        Self {
            pinned: true,
            last_max_offset: 0.0,
        }
    }
}

impl TailFollow {
    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub fn pin(&mut self) {
        self.pinned = true;
    }

    pub fn unpin(&mut self) {
        self.pinned = false;
    }

    pub fn observe(&mut self, offset_y: f32, max_offset: f32) {
        let resized = (max_offset - self.last_max_offset).abs() > RESIZE_EPSILON;
        self.last_max_offset = max_offset;
        if !resized {
            self.pinned = is_at_tail(offset_y, max_offset);
        }
    }
}

/// Scroll position of the message list: follows new rows, jumps to focused ones.
pub struct ListScroll {
    handle: VirtualListScrollHandle,
    follow: TailFollow,
    jump_to: Option<usize>,
}

impl ListScroll {
    pub fn new() -> Self {
        Self {
            handle: VirtualListScrollHandle::new(),
            follow: TailFollow::default(),
            jump_to: None,
        }
    }

    pub fn handle(&self) -> &VirtualListScrollHandle {
        &self.handle
    }

    pub fn bounds(&self) -> Bounds<Pixels> {
        self.handle.bounds()
    }

    /// A different row set: start again from the newest row.
    pub fn rows_replaced(&mut self) {
        self.jump_to = None;
        self.follow.pin();
    }

    pub fn reveal_row(&mut self, row: usize) {
        self.jump_to = Some(row);
        self.follow.unpin();
    }

    /// Call once per frame before the list lays out.
    pub fn apply(&mut self) {
        if let Some(row) = self.jump_to.take() {
            self.handle.scroll_to_item(row, ScrollStrategy::Center);
            return;
        }

        let offset = self.handle.offset();
        let max_offset = self.handle.max_offset().height;
        self.follow
            .observe(f32::from(offset.y), f32::from(max_offset));

        if self.follow.pinned() && max_offset > Pixels::ZERO {
            self.handle.set_offset(point(offset.x, -max_offset));
        }
    }
}

impl Default for ListScroll {
    fn default() -> Self {
        Self::new()
    }
}
