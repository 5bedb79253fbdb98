//! Delivery of run events to whoever is listening.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::models::RunEvent;

/// Fire-and-forget event channel. Delivery failures never affect the run.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<RunEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<RunEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that drops every event.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn channel() -> (Self, UnboundedReceiver<RunEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: RunEvent) {
        let Some(ref tx) = self.tx else {
            return;
        };
        if tx.send(event).is_err() {
            debug!("Dropping run event, receiver is gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProgressEvent;

    fn progress() -> RunEvent {
        RunEvent::Progress(ProgressEvent {
            posts_found: 1,
            percentage: 10.0,
            scroll_passes: 0,
            status: "Found 1 posts".to_string(),
        })
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(progress());
        EventSink::none().emit(progress());
    }

    #[test]
    fn test_delivery() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(progress());
        assert_eq!(rx.try_recv().unwrap(), progress());
    }
}
