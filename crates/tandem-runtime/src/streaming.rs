//! Live view of a running call tree.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use tandem_protocols::event::StreamEvent;
use tandem_protocols::tool::AbortSignal;

use crate::runner::RunReport;

/// Stream of events from every agent in a run, in emission order.
///
/// Ends once the run and all of its delegates have finished.
pub struct AgentEventStream {
    receiver: mpsc::UnboundedReceiver<StreamEvent>,
}

impl AgentEventStream {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<StreamEvent>) -> Self {
        Self { receiver }
    }
}

impl Stream for AgentEventStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// Handle to a run started with [`crate::Runner::run_stream`].
pub struct RunHandle<T> {
    events: AgentEventStream,
    abort_signal: Arc<AbortSignal>,
    task: JoinHandle<RunReport<T>>,
}

impl<T> RunHandle<T> {
    pub(crate) fn new(
        events: AgentEventStream,
        abort_signal: Arc<AbortSignal>,
        task: JoinHandle<RunReport<T>>,
    ) -> Self {
        Self {
            events,
            abort_signal,
            task,
        }
    }

    pub fn events(&mut self) -> &mut AgentEventStream {
        &mut self.events
    }

    /// Signal shared by the whole call tree.
    pub fn abort_signal(&self) -> Arc<AbortSignal> {
        Arc::clone(&self.abort_signal)
    }

    /// Cancel the run and every delegated sub-run under it.
    pub fn cancel(&self) {
        self.abort_signal.abort();
    }

    /// Wait for the final report. Fails only if the run task panicked.
    pub async fn join(self) -> Result<RunReport<T>, JoinError> {
        self.task.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_event_stream_ends_when_senders_drop() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut stream = AgentEventStream::new(rx);
        tx.send(StreamEvent::TextDelta {
            agent_id: "research".to_string(),
            depth: 0,
            content: "hi".to_string(),
        })
        .unwrap();
        drop(tx);

        assert!(matches!(stream.next().await, Some(StreamEvent::TextDelta { .. })));
        assert!(stream.next().await.is_none());
    }
}
