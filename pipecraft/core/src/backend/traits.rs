//! Agent Backend Traits
//!
//! Trait definitions for the analysis agent transport. The core only ever
//! sees a channel of [`StreamSignal`]s; how those signals are produced
//! (HTTP/SSE, WebSocket, in-process) is a backend concern.
//!
//! # Design Philosophy
//!
//! The source application wired three callbacks (`onChunk`, `onComplete`,
//! `onError`) straight into component state. Here the same contract is one
//! cancellable subscription yielding a discriminated union:
//!
//! - `StreamSignal::Event` — one typed analysis event (the chunk callback)
//! - `StreamSignal::Error` — transport failure or malformed event (the
//!   error callback)
//! - channel close — end of stream (the completion callback)

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::streaming::events::AnalysisEvent;
use crate::streaming::session::SessionKey;

/// One message from an analysis stream.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamSignal {
    /// A typed event from the agent.
    Event(AnalysisEvent),
    /// Transport failure or malformed event payload.
    Error(String),
}

/// Parameters for opening an analysis stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// The session this stream belongs to.
    pub key: SessionKey,
}

impl AnalysisRequest {
    /// Create a request for the given session key.
    #[must_use]
    pub fn new(key: SessionKey) -> Self {
        Self { key }
    }
}

/// A live analysis stream: the signal receiver plus its transport task.
///
/// Dropping the stream cancels it: the receiver goes away (so a still-running
/// transport task stops at its next send) and the task itself is aborted.
/// Cancellation is best-effort and never surfaces an error.
pub struct AnalysisStream {
    receiver: mpsc::Receiver<StreamSignal>,
    task: Option<JoinHandle<()>>,
}

impl AnalysisStream {
    /// Wrap a receiver together with the transport task feeding it.
    #[must_use]
    pub fn new(receiver: mpsc::Receiver<StreamSignal>, task: JoinHandle<()>) -> Self {
        Self {
            receiver,
            task: Some(task),
        }
    }

    /// Wrap a bare receiver (in-process producers, tests).
    #[must_use]
    pub fn from_receiver(receiver: mpsc::Receiver<StreamSignal>) -> Self {
        Self {
            receiver,
            task: None,
        }
    }

    /// Non-blocking receive of the next signal.
    pub(crate) fn try_recv(&mut self) -> Result<StreamSignal, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Abort the transport task, if any. Idempotent, swallows errors.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for AnalysisStream {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for AnalysisStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisStream")
            .field("has_task", &self.task.is_some())
            .finish_non_exhaustive()
    }
}

/// Analysis agent transport trait.
///
/// Implement this trait to reach the agent over a different transport.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Backend name (e.g. "agent-http").
    fn name(&self) -> &str;

    /// Check if the agent service is healthy and reachable.
    async fn health_check(&self) -> bool;

    /// Open a streaming analysis for the request's session key.
    ///
    /// Returns the live stream; signals arrive on its channel until the
    /// session ends, the transport fails, or the stream is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error when the stream cannot be opened at all (connection
    /// refused, non-success HTTP status). Failures after opening are
    /// reported in-band as [`StreamSignal::Error`].
    async fn stream_analysis(&self, request: &AnalysisRequest) -> anyhow::Result<AnalysisStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_from_receiver() {
        let (tx, rx) = mpsc::channel(8);
        let mut stream = AnalysisStream::from_receiver(rx);

        tx.send(StreamSignal::Error("boom".to_string()))
            .await
            .unwrap();

        assert_eq!(
            stream.try_recv(),
            Ok(StreamSignal::Error("boom".to_string()))
        );
        assert_eq!(
            stream.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        );
    }

    #[tokio::test]
    async fn test_drop_closes_channel() {
        let (tx, rx) = mpsc::channel(8);
        let stream = AnalysisStream::from_receiver(rx);
        drop(stream);

        // A producer holding the sender sees the cancellation as a closed
        // channel; its late signals go nowhere.
        assert!(tx
            .send(StreamSignal::Error("late".to_string()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_cancel_aborts_task_and_is_idempotent() {
        let (_tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        });
        let mut stream = AnalysisStream::new(rx, task);

        stream.cancel();
        stream.cancel();
    }
}
