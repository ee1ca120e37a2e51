use tokio::sync::{mpsc, oneshot};

/// What the assistant produced so far for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    /// Visible reply text, in order.
    Text(String),
    /// Model reasoning; never part of the reply.
    Reasoning(String),
    Finished,
    Failed(String),
}

/// Producer side, held by the provider worker.
#[derive(Debug, Clone)]
pub struct ReplySender {
    events: mpsc::UnboundedSender<ReplyEvent>,
}

impl ReplySender {
    /// Returns false once the reader is gone and the worker should stop.
    pub fn send(&self, event: ReplyEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

/// Reader side of one request. Dropping it cancels the request.
#[derive(Debug)]
pub struct ReplyStream {
    events: mpsc::UnboundedReceiver<ReplyEvent>,
    cancel: Option<oneshot::Sender<()>>,
}

impl ReplyStream {
    pub async fn next(&mut self) -> Option<ReplyEvent> {
        self.events.recv().await
    }

    /// Asks the worker to stop. Returns false if it was already asked or is gone.
    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(cancel) => cancel.send(()).is_ok(),
            None => false,
        }
    }
}

impl Drop for ReplyStream {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Fires when the reader cancels or drops its [`ReplyStream`].
pub type CancelSignal = oneshot::Receiver<()>;

/// Wires a worker to its reader.
pub fn reply_channel() -> (ReplySender, ReplyStream, CancelSignal) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (cancel_tx, cancel_rx) = oneshot::channel();

    (
        ReplySender { events: events_tx },
        ReplyStream {
            events: events_rx,
            cancel: Some(cancel_tx),
        },
        cancel_rx,
    )
}
