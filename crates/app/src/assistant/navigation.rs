/// Keys the assistant panel reacts to, after key-binding resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    /// Control + "f"; bound so the native find action never runs.
    Find,
    Escape,
    ArrowUp,
    ArrowDown,
}

/// Filter bar visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavState {
    #[default]
    Idle,
    FiltersOpen,
}

/// What the panel has to do after a key was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEffect {
    /// Filter bar opened; the native find action must not run.
    OpenFilters,
    CloseFilters,
    /// Move focus to the row at this position in the focus ring.
    FocusRow(usize),
    /// Nothing to do; default handling applies.
    Ignored,
}

/// Ordered focus targets for the message rows, indexed directly.
#[derive(Debug, Clone)]
pub struct FocusRing<H> {
    handles: Vec<H>,
}

impl<H> FocusRing<H> {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Resizes the ring to `len` rows, keeping existing handles in place.
    pub fn resize_with(&mut self, len: usize, make: impl FnMut() -> H) {
        self.handles.resize_with(len, make);
    }

    pub fn get(&self, index: usize) -> Option<&H> {
        self.handles.get(index)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Position of the first handle satisfying `is_focused`.
    pub fn position(&self, mut is_focused: impl FnMut(&H) -> bool) -> Option<usize> {
        self.handles.iter().position(|handle| is_focused(handle))
    }
}

impl<H> Default for FocusRing<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyboard state machine of the assistant panel.
#[derive(Debug, Clone, Default)]
pub struct KeyboardNavigator {
    state: NavState,
}

impl KeyboardNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn filters_visible(&self) -> bool {
        self.state == NavState::FiltersOpen
    }

    /// Closes the filter bar from a pointer action (the close button).
    pub fn close_filters(&mut self) {
        self.state = NavState::Idle;
    }

    /// Handles one key press.
    ///
    /// `focused_row` is the focus ring position holding focus, or `None` when
    /// focus is outside the message list; `row_count` is the ring length.
    pub fn handle(
        &mut self,
        key: NavKey,
        focused_row: Option<usize>,
        row_count: usize,
    ) -> NavEffect {
        match key {
            NavKey::Find => {
                self.state = NavState::FiltersOpen;
                NavEffect::OpenFilters
            }
            NavKey::Escape if self.state == NavState::FiltersOpen => {
                self.state = NavState::Idle;
                NavEffect::CloseFilters
            }
            NavKey::Escape => NavEffect::Ignored,
            NavKey::ArrowUp | NavKey::ArrowDown => {
                let Some(current) = focused_row.filter(|row| *row < row_count) else {
                    return NavEffect::Ignored;
                };

                let next = if key == NavKey::ArrowUp {
                    current.saturating_sub(1)
                } else {
                    (current + 1).min(row_count - 1)
                };
                NavEffect::FocusRow(next)
            }
        }
    }
}
