use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::assistant::message::SendTicket;
use crate::assistant::send::FailureNotice;

/// The Retry button of one failure notice.
///
/// Clones share state: the first [`RetryClaim::take`] hands out the ticket,
/// every later one gets `None`.
#[derive(Debug, Clone)]
pub struct RetryClaim {
    ticket: SendTicket,
    used: Rc<Cell<bool>>,
}

impl RetryClaim {
    pub fn ticket(&self) -> SendTicket {
        self.ticket
    }

    pub fn take(&self) -> Option<SendTicket> {
        (!self.used.replace(true)).then_some(self.ticket)
    }
}

/// Decides which send failures become notices. Each failed ticket is reported once.
#[derive(Debug, Default)]
pub struct FailureReporter {
    reported: HashSet<SendTicket>,
}

impl FailureReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, failure: &FailureNotice) -> Option<RetryClaim> {
        if !self.reported.insert(failure.ticket) {
            tracing::debug!(ticket = ?failure.ticket, "failure already reported");
            return None;
        }

        Some(RetryClaim {
            ticket: failure.ticket,
            used: Rc::new(Cell::new(false)),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::assistant::send::{ConversationState, SendFailure};

    /// Stands in for the notification list: keeps every Retry button it was handed.
    #[derive(Default)]
    struct RecordingNotices {
        shown: Vec<RetryClaim>,
    }

    impl RecordingNotices {
        fn show(&mut self, reporter: &mut FailureReporter, failure: &FailureNotice) {
            if let Some(claim) = reporter.report(failure) {
                self.shown.push(claim);
            }
        }
    }

    fn failed_send(state: &mut ConversationState) -> FailureNotice {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_default();
        state.set_draft("is this bread wholegrain?");
        let Ok(pending) = state.begin_send(now) else {
            panic!("send should start");
        };
        let failure = SendFailure::Provider {
            stage: "test",
            message: "502".to_string(),
        };
        match state.fail(pending.ticket, failure) {
            Some(notice) => notice,
            None => panic!("failure should be reported"),
        }
    }

    #[test]
    fn one_notice_per_failed_send() {
        let mut state = ConversationState::new();
        let mut reporter = FailureReporter::new();
        let mut notices = RecordingNotices::default();

        let failure = failed_send(&mut state);
        notices.show(&mut reporter, &failure);
        notices.show(&mut reporter, &failure);

        assert_eq!(notices.shown.len(), 1);
        assert_eq!(notices.shown[0].ticket(), failure.ticket);
    }

    #[test]
    fn clicking_retry_twice_reissues_the_send_once() {
        let mut state = ConversationState::new();
        let mut reporter = FailureReporter::new();
        let mut notices = RecordingNotices::default();
        notices.show(&mut reporter, &failed_send(&mut state));

        let button = notices.shown[0].clone();
        let mut retried = Vec::new();
        for _ in 0..2 {
            if let Some(ticket) = button.take() {
                retried.push(state.begin_retry(ticket, Utc::now()));
            }
        }

        assert_eq!(retried.len(), 1);
        assert!(retried[0].is_ok());
        assert!(state.is_loading());
        assert_eq!(state.messages().len(), 1);
    }
}
