//! Session Manager
//!
//! [`SessionManager`] owns the single in-flight analysis stream and the view
//! state it feeds. Its one hard contract: starting a session for any key
//! drops whatever stream was running before, so signals from a superseded
//! stream can never reach the new session's state.
//!
//! Hosts drive it with a non-blocking [`poll`](SessionManager::poll) from
//! their update loop; the manager never blocks and never spawns tasks of
//! its own.

use tokio::sync::mpsc::error::TryRecvError;

use crate::backend::{AgentBackend, AnalysisRequest, AnalysisStream, StreamSignal};
use crate::streaming::session::{AnalysisState, SessionKey};

/// The one live session: its key, its state, and its stream (if still open).
#[derive(Debug)]
struct ActiveSession {
    key: SessionKey,
    state: AnalysisState,
    stream: Option<AnalysisStream>,
}

/// Owner of the single in-flight analysis stream.
///
/// At most one stream exists at a time. [`start`](Self::start) with a new
/// key cancels the previous stream (its receiver and transport task are
/// dropped) before the fresh session begins, and the fresh session always
/// starts from an empty [`AnalysisState`].
#[derive(Debug, Default)]
pub struct SessionManager {
    active: Option<ActiveSession>,
}

impl SessionManager {
    /// Create a manager with no active session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session for `key`, fed by an already-open `stream`.
    ///
    /// Any previous session's stream is dropped first; a late signal from
    /// it sees a closed channel. State for the new session starts empty.
    pub fn start(&mut self, key: SessionKey, stream: AnalysisStream) {
        if let Some(old) = self.active.take() {
            tracing::debug!(thread_id = %old.key.thread_id, "cancelling superseded stream");
            // Dropping ActiveSession drops the stream, which aborts its task.
        }
        tracing::debug!(
            connection_id = key.connection_id,
            thread_id = %key.thread_id,
            "starting analysis session"
        );
        self.active = Some(ActiveSession {
            key,
            state: AnalysisState::new(),
            stream: Some(stream),
        });
    }

    /// Open a stream on `backend` for `key` and begin the session.
    ///
    /// # Errors
    ///
    /// Returns the backend's error when the stream cannot be opened; in that
    /// case the previous session (if any) is left untouched.
    pub async fn start_session(
        &mut self,
        backend: &dyn AgentBackend,
        key: SessionKey,
    ) -> anyhow::Result<()> {
        let request = AnalysisRequest::new(key.clone());
        let stream = backend.stream_analysis(&request).await?;
        self.start(key, stream);
        Ok(())
    }

    /// Drain all currently available stream signals into the session state.
    ///
    /// Non-blocking. Returns the number of signals consumed. On an error
    /// signal the state transitions to its error status and the stream is
    /// dropped; on a closed channel without a terminal event the state is
    /// completed degraded.
    pub fn poll(&mut self) -> usize {
        let Some(active) = self.active.as_mut() else {
            return 0;
        };
        let Some(stream) = active.stream.as_mut() else {
            return 0;
        };

        let mut consumed = 0;
        let mut close_stream = false;

        loop {
            match stream.try_recv() {
                Ok(StreamSignal::Event(event)) => {
                    consumed += 1;
                    active.state.apply(&event);
                }
                Ok(StreamSignal::Error(message)) => {
                    consumed += 1;
                    active.state.fail(message);
                    close_stream = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Clean close is the completion signal; without a
                    // terminal event the session completes degraded.
                    if !active.state.is_terminal() {
                        active.state.finish_degraded();
                    }
                    close_stream = true;
                    break;
                }
            }
        }

        if close_stream {
            active.stream = None;
        }
        consumed
    }

    /// Cancel the active stream, keeping the session state as-is.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.as_mut() {
            if active.stream.take().is_some() {
                tracing::debug!(thread_id = %active.key.thread_id, "analysis stream cancelled");
            }
        }
    }

    /// Key of the active session, if any.
    #[must_use]
    pub fn key(&self) -> Option<&SessionKey> {
        self.active.as_ref().map(|a| &a.key)
    }

    /// State of the active session, if any.
    #[must_use]
    pub fn state(&self) -> Option<&AnalysisState> {
        self.active.as_ref().map(|a| &a.state)
    }

    /// Whether a stream is currently open.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.stream.is_some())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use crate::streaming::events::{
        AnalysisEvent, CompletionData, ResultsSummary, StartData, StartMeta,
    };
    use crate::streaming::session::{Step, StreamStatus};

    use super::*;

    fn key(thread: &str) -> SessionKey {
        SessionKey::new(7, "monthly revenue", thread)
    }

    fn started() -> StreamSignal {
        StreamSignal::Event(AnalysisEvent::MetaStarted {
            meta: StartMeta {
                title: "Revenue".to_string(),
                request_id: "req-1".to_string(),
            },
            data: StartData {
                input_question: "monthly revenue".to_string(),
            },
        })
    }

    fn sql(text: &str) -> StreamSignal {
        StreamSignal::Event(AnalysisEvent::Sql {
            content: text.to_string(),
        })
    }

    fn completed() -> StreamSignal {
        StreamSignal::Event(AnalysisEvent::MetaCompleted {
            data: CompletionData {
                duration_ms: 1200,
                results_summary: ResultsSummary {
                    tables_generated: Some(1),
                },
            },
        })
    }

    #[tokio::test]
    async fn test_poll_without_session_is_noop() {
        let mut manager = SessionManager::new();
        assert_eq!(manager.poll(), 0);
        assert!(manager.state().is_none());
        assert!(!manager.is_streaming());
    }

    #[tokio::test]
    async fn test_full_session_flow() {
        let (tx, rx) = mpsc::channel(8);
        let mut manager = SessionManager::new();
        manager.start(key("t-1"), AnalysisStream::from_receiver(rx));

        tx.send(started()).await.unwrap();
        tx.send(sql("SELECT 1")).await.unwrap();
        tx.send(completed()).await.unwrap();
        drop(tx);

        assert_eq!(manager.poll(), 3);

        let state = manager.state().unwrap();
        assert_eq!(state.status, Some(StreamStatus::Complete));
        assert_eq!(state.sql.as_deref(), Some("SELECT 1"));
        assert_eq!(state.current_step, Some(Step::Complete));
        // The closed channel was observed; the stream is released.
        assert!(!manager.is_streaming());
    }

    #[tokio::test]
    async fn test_error_signal_fails_session_and_drops_stream() {
        let (tx, rx) = mpsc::channel(8);
        let mut manager = SessionManager::new();
        manager.start(key("t-1"), AnalysisStream::from_receiver(rx));

        tx.send(started()).await.unwrap();
        tx.send(sql("SELECT 1")).await.unwrap();
        tx.send(StreamSignal::Error("connection reset".to_string()))
            .await
            .unwrap();

        assert_eq!(manager.poll(), 3);

        let state = manager.state().unwrap();
        assert_eq!(state.status, Some(StreamStatus::Error));
        assert_eq!(state.error.as_deref(), Some("connection reset"));
        assert_eq!(state.sql.as_deref(), Some("SELECT 1"));
        assert!(!manager.is_streaming());

        // The receiver is gone, so a producer retrying sees a closed channel.
        assert!(tx.send(sql("SELECT 2")).await.is_err());
    }

    #[tokio::test]
    async fn test_clean_close_without_terminal_event_is_degraded() {
        let (tx, rx) = mpsc::channel(8);
        let mut manager = SessionManager::new();
        manager.start(key("t-1"), AnalysisStream::from_receiver(rx));

        tx.send(started()).await.unwrap();
        tx.send(sql("SELECT 1")).await.unwrap();
        drop(tx);

        manager.poll();

        let state = manager.state().unwrap();
        assert_eq!(state.status, Some(StreamStatus::Complete));
        assert!(state.duration_ms.is_none());
        assert!(!manager.is_streaming());
    }

    #[tokio::test]
    async fn test_new_key_cancels_previous_stream() {
        let (old_tx, old_rx) = mpsc::channel(8);
        let mut manager = SessionManager::new();
        manager.start(key("t-old"), AnalysisStream::from_receiver(old_rx));

        old_tx.send(started()).await.unwrap();
        manager.poll();

        // Changed key: the old stream is dropped before the new one starts.
        let (new_tx, new_rx) = mpsc::channel(8);
        manager.start(key("t-new"), AnalysisStream::from_receiver(new_rx));

        assert!(old_tx.send(sql("stale")).await.is_err());
        assert_eq!(manager.key().unwrap().thread_id, "t-new");

        // The new session starts from a fresh record.
        let state = manager.state().unwrap();
        assert!(state.status.is_none());
        assert!(state.sql.is_none());

        new_tx.send(started()).await.unwrap();
        new_tx.send(sql("SELECT 2")).await.unwrap();
        manager.poll();
        assert_eq!(manager.state().unwrap().sql.as_deref(), Some("SELECT 2"));
    }

    #[tokio::test]
    async fn test_cancel_keeps_state() {
        let (tx, rx) = mpsc::channel(8);
        let mut manager = SessionManager::new();
        manager.start(key("t-1"), AnalysisStream::from_receiver(rx));

        tx.send(started()).await.unwrap();
        tx.send(sql("SELECT 1")).await.unwrap();
        manager.poll();

        manager.cancel();
        assert!(!manager.is_streaming());
        assert!(tx.send(sql("late")).await.is_err());

        // Cancellation leaves the collected state in place.
        let state = manager.state().unwrap();
        assert_eq!(state.sql.as_deref(), Some("SELECT 1"));
        assert_eq!(state.status, Some(StreamStatus::Streaming));

        // Idempotent.
        manager.cancel();
    }

    #[tokio::test]
    async fn test_poll_after_close_is_noop() {
        let (tx, rx) = mpsc::channel(8);
        let mut manager = SessionManager::new();
        manager.start(key("t-1"), AnalysisStream::from_receiver(rx));

        tx.send(started()).await.unwrap();
        tx.send(completed()).await.unwrap();
        drop(tx);

        manager.poll();
        assert_eq!(manager.poll(), 0);
    }
}
