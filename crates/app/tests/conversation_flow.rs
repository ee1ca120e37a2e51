use chrono::{TimeZone, Utc};
use nutrilens::assistant::{
    ConversationState, FilterState, FilteredView, KeyboardNavigator, NavEffect, NavKey,
    ReplyBuffer, Role, RoleFilter, SendRejected, filter_messages,
};
use nutrilens_llm::ReplyEvent;

fn at(second: u32) -> chrono::DateTime<Utc> {
    match Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, second).single() {
        Some(time) => time,
        None => panic!("invalid timestamp"),
    }
}

fn stream_reply(chunks: &[&str]) -> String {
    let mut buffer = ReplyBuffer::new();
    for chunk in chunks {
        assert!(buffer.push(ReplyEvent::Text((*chunk).to_string())).is_none());
    }

    match buffer.push(ReplyEvent::Finished) {
        Some(Ok(reply)) => reply,
        other => panic!("expected a finished reply, got {other:?}"),
    }
}

#[test]
fn failed_send_is_retried_then_filtered_and_navigated() {
    let mut state = ConversationState::new();

    state.set_draft("Is palm oil bad for me?");
    let first = match state.begin_send(at(0)) {
        Ok(pending) => pending,
        Err(rejected) => panic!("send rejected: {rejected}"),
    };
    assert!(state.is_loading());
    assert_eq!(state.begin_send(at(1)), Err(SendRejected::InFlight));

    let mut buffer = ReplyBuffer::new();
    let failure = match buffer.push(ReplyEvent::Failed("rate limited".into())) {
        Some(Err(failure)) => failure,
        other => panic!("expected a failure, got {other:?}"),
    };
    let notice = state.fail(first.ticket, failure);
    assert!(notice.is_some());
    assert!(!state.is_loading());
    assert_eq!(state.messages().len(), 1);
    assert_eq!(state.messages()[0].role, Role::User);

    let users = FilterState::new("palm", RoleFilter::User);
    assert_eq!(filter_messages(state.messages(), &users), vec![0]);

    let retry = match state.begin_retry(first.ticket, at(2)) {
        Ok(pending) => pending,
        Err(rejected) => panic!("retry rejected: {rejected}"),
    };
    assert_eq!(retry.prompt, "Is palm oil bad for me?");
    assert_eq!(retry.message_id, first.message_id);
    assert_eq!(state.messages().len(), 1);
    assert!(state.complete(retry.ticket, stream_reply(&["In ", "moderation."]), at(3)));
    assert_eq!(state.messages().len(), 2);

    state.set_draft("What about E471?");
    let second = match state.begin_send(at(4)) {
        Ok(pending) => pending,
        Err(rejected) => panic!("send rejected: {rejected}"),
    };
    assert!(state.complete(second.ticket, stream_reply(&["A common emulsifier."]), at(5)));
    assert_eq!(state.messages().len(), 4);

    let assistant_only = FilterState::new("", RoleFilter::Assistant);
    let indices = filter_messages(state.messages(), &assistant_only);
    assert_eq!(indices, vec![1, 3]);
    assert!(
        indices
            .iter()
            .all(|index| state.messages()[*index].role == Role::Assistant)
    );

    let mut view = FilteredView::new();
    let search = FilterState::new("E471", RoleFilter::All);
    assert!(view.refresh(state.revision(), state.messages(), &search));
    assert_eq!(view.indices().as_slice(), &[2]);
    assert!(!view.refresh(state.revision(), state.messages(), &search));

    let mut navigator = KeyboardNavigator::new();
    assert_eq!(navigator.handle(NavKey::Find, None, 4), NavEffect::OpenFilters);
    assert_eq!(
        navigator.handle(NavKey::ArrowDown, Some(3), 4),
        NavEffect::FocusRow(3)
    );
    assert_eq!(
        navigator.handle(NavKey::ArrowUp, Some(0), 4),
        NavEffect::FocusRow(0)
    );
    assert_eq!(navigator.handle(NavKey::Escape, None, 4), NavEffect::CloseFilters);
    assert_eq!(navigator.handle(NavKey::Escape, None, 4), NavEffect::Ignored);
}

#[test]
fn cancelled_send_restores_the_draft_without_a_retry() {
    let mut state = ConversationState::new();
    state.set_draft("Compare these two cereals");
    let pending = match state.begin_send(at(0)) {
        Ok(pending) => pending,
        Err(rejected) => panic!("send rejected: {rejected}"),
    };

    assert_eq!(state.messages().len(), 1);
    assert!(state.cancel().is_some());
    assert_eq!(state.draft(), "Compare these two cereals");
    assert!(state.messages().is_empty());
    assert!(!state.complete(pending.ticket, "late reply".into(), at(1)));
    assert_eq!(
        state.begin_retry(pending.ticket, at(2)),
        Err(SendRejected::NothingToRetry)
    );
}
