use std::rc::Rc;

use crate::assistant::message::{Message, Role};

/// Role predicate of the filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoleFilter {
    #[default]
    All,
    User,
    Assistant,
}

impl RoleFilter {
    pub const ALL: [RoleFilter; 3] = [Self::All, Self::User, Self::Assistant];

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Messages",
            Self::User => "User Messages",
            Self::Assistant => "AI Responses",
        }
    }

    pub fn matches(self, role: Role) -> bool {
        match self {
            Self::All => true,
            Self::User => role == Role::User,
            Self::Assistant => role == Role::Assistant,
        }
    }
}

/// Search term plus role filter. Lives only as long as the panel that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub search_term: String,
    pub role_filter: RoleFilter,
}

impl FilterState {
    pub fn new(search_term: impl Into<String>, role_filter: RoleFilter) -> Self {
        Self {
            search_term: search_term.into(),
            role_filter,
        }
    }

    /// True when the filter lets every message through.
    pub fn is_identity(&self) -> bool {
        self.search_term.is_empty() && self.role_filter == RoleFilter::All
    }

    pub fn matches(&self, message: &Message) -> bool {
        self.role_filter.matches(message.role)
            && content_matches(&message.content, &self.search_term)
    }
}

fn content_matches(content: &str, search_term: &str) -> bool {
    if search_term.is_empty() {
        return true;
    }

    content
        .to_lowercase()
        .contains(&search_term.to_lowercase())
}

/// Returns the indices of `messages` that pass `filter`, in source order.
pub fn filter_messages(messages: &[Message], filter: &FilterState) -> Vec<usize> {
    if filter.is_identity() {
        return (0..messages.len()).collect();
    }

    messages
        .iter()
        .enumerate()
        .filter(|(_, message)| filter.matches(message))
        .map(|(index, _)| index)
        .collect()
}

/// Filtered index list memoized on the store revision and the filter.
pub struct FilteredView {
    revision: Option<u64>,
    filter: FilterState,
    indices: Rc<Vec<usize>>,
}

impl FilteredView {
    pub fn new() -> Self {
        Self {
            revision: None,
            filter: FilterState::default(),
            indices: Rc::new(Vec::new()),
        }
    }

    /// Recomputes the view when the revision or the filter changed.
    ///
    /// Returns true when the index list was rebuilt.
    pub fn refresh(&mut self, revision: u64, messages: &[Message], filter: &FilterState) -> bool {
        if self.revision == Some(revision) && self.filter == *filter {
            return false;
        }

        self.indices = Rc::new(filter_messages(messages, filter));
        self.revision = Some(revision);
        self.filter = filter.clone();
        true
    }

    pub fn indices(&self) -> Rc<Vec<usize>> {
        self.indices.clone()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl Default for FilteredView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::assistant::message::MessageId;

    fn message(id: u64, role: Role, content: &str) -> Message {
        let timestamp = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).single();
        Message::new(
            MessageId::new(id),
            role,
            content,
            timestamp.unwrap_or_default(),
        )
    }

    fn fixture() -> Vec<Message> {
        vec![
            message(1, Role::User, "Is this granola high in SUGAR?"),
            message(2, Role::Assistant, "It has 24g sugar per 100g."),
            message(3, Role::User, "What about salt?"),
            message(4, Role::Assistant, "Salt is 0.3g per 100g, which is low."),
            message(5, Role::User, ""),
        ]
    }

    #[test]
    fn empty_term_and_all_roles_is_identity() {
        let messages = fixture();
        let indices = filter_messages(&messages, &FilterState::default());

        assert_eq!(indices, (0..messages.len()).collect::<Vec<_>>());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let messages = fixture();
        let indices = filter_messages(&messages, &FilterState::new("sugar", RoleFilter::All));

        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn hello_does_not_match_hi() {
        let messages = vec![
            message(1, Role::User, "hello"),
            message(2, Role::Assistant, "hi there"),
        ];
        let indices = filter_messages(&messages, &FilterState::new("hi", RoleFilter::All));

        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn role_and_search_combine_with_and() {
        let messages = fixture();
        let indices = filter_messages(&messages, &FilterState::new("100G", RoleFilter::Assistant));
        assert_eq!(indices, vec![1, 3]);

        let indices = filter_messages(&messages, &FilterState::new("100g", RoleFilter::User));
        assert!(indices.is_empty());
    }

    #[test]
    fn role_filter_alone_keeps_source_order() {
        let messages = fixture();
        let indices = filter_messages(&messages, &FilterState::new("", RoleFilter::User));

        assert_eq!(indices, vec![0, 2, 4]);
    }

    #[test]
    fn empty_content_only_matches_empty_term() {
        let messages = vec![message(1, Role::User, "")];

        assert_eq!(
            filter_messages(&messages, &FilterState::new("", RoleFilter::All)),
            vec![0]
        );
        assert!(filter_messages(&messages, &FilterState::new("a", RoleFilter::All)).is_empty());
    }

    #[test]
    fn result_is_exactly_the_matching_subsequence() {
        let messages = fixture();
        let terms = ["", "s", "salt", "100", "zzz", "?"];

        for term in terms {
            for role_filter in RoleFilter::ALL {
                let filter = FilterState::new(term, role_filter);
                let indices = filter_messages(&messages, &filter);

                assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
                let expected = messages
                    .iter()
                    .enumerate()
                    .filter(|(_, message)| {
                        message.content.to_lowercase().contains(&term.to_lowercase())
                            && (role_filter == RoleFilter::All
                                || role_filter.matches(message.role))
                    })
                    .map(|(index, _)| index)
                    .collect::<Vec<_>>();
                assert_eq!(indices, expected, "term={term:?} role={role_filter:?}");
            }
        }
    }

    #[test]
    fn filtered_view_rebuilds_only_on_change() {
        let messages = fixture();
        let mut view = FilteredView::new();
        let filter = FilterState::new("salt", RoleFilter::All);

        assert!(view.refresh(1, &messages, &filter));
        assert!(!view.refresh(1, &messages, &filter));
        assert_eq!(*view.indices(), vec![2, 3]);

        assert!(view.refresh(2, &messages, &filter));
        assert!(view.refresh(2, &messages, &FilterState::default()));
        assert_eq!(view.len(), messages.len());
    }
}
