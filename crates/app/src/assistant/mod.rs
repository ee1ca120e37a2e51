/// Event contracts between the panel, its children and the store.
pub mod events;
/// Search and role filtering over the message sequence.
pub mod filter;
pub mod filter_bar;
pub mod header;
pub mod list_scroll;
/// Conversation domain types.
pub mod message;
pub mod message_input;
pub mod message_list;
pub mod mode;
/// Keyboard state machine and the focus ring.
pub mod navigation;
pub mod notifier;
pub mod panel;
pub mod retry;
/// UI-free send lifecycle: pending, failed, retry.
pub mod send;
pub mod store;
pub mod visualization;

pub use events::{DraftRestored, FilterBarClosed, FilterChanged, SendFailed};
pub use filter::{FilterState, FilteredView, RoleFilter, filter_messages};
pub use message::{Message, MessageId, Role, SendTicket};
pub use mode::AssistantMode;
pub use navigation::{FocusRing, KeyboardNavigator, NavEffect, NavKey, NavState};
pub use notifier::{Notice, NoticeAction, NoticeSeverity, NotificationListNotifier, Notifier};
pub use panel::{AssistantPanel, bind_keys};
pub use retry::{FailureReporter, RetryClaim};
pub use send::{
    ConversationState, FailedSend, FailureNotice, PendingSend, ReplyBuffer, SendFailure,
    SendRejected,
};
pub use store::{ConversationStore, ProviderSelection, build_chat_request};
