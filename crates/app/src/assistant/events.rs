use crate::assistant::filter::RoleFilter;
use crate::assistant::send::FailureNotice;

/// Emitted by the conversation store once per failed send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFailed {
    pub notice: FailureNotice,
}

/// Emitted when the store puts text back into the draft (after a cancel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRestored {
    pub draft: String,
}

/// Emitted by the filter bar when the search term or role filter changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChanged {
    SearchTerm(String),
    Role(RoleFilter),
}

/// Emitted by the filter bar close button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterBarClosed;
