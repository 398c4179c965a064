//! Streaming Analysis Sessions
//!
//! A chat analysis session asks the agent service a question about a
//! connection and receives a stream of typed events (`meta_started`,
//! `identify`, `sql`, `table`, `explanation`, `meta_completed`). This module
//! folds that stream into a single explicit view-state record driving a step
//! indicator and progressive content panels.
//!
//! # Architecture
//!
//! ```text
//!  AgentBackend ──► mpsc::Receiver<StreamSignal> ──► SessionManager::poll()
//!                                                           │
//!                                                 AnalysisState::apply()
//!                                                           │
//!                                                           ▼
//!                                      { status, current_step, identify,
//!                                        sql, table, explanation, ... }
//! ```
//!
//! # Hard Contract: One Stream At A Time
//!
//! The manager owns at most one in-flight stream. Starting a session for a
//! new [`session::SessionKey`] cancels the previous stream first, and late
//! events from a cancelled stream can never reach the replacement session's
//! state: the old receiver is dropped along with its transport task.
//!
//! # Example
//!
//! ```ignore
//! use pipecraft_core::streaming::{manager::SessionManager, session::SessionKey};
//!
//! let mut manager = SessionManager::new();
//! manager.start_session(&backend, SessionKey::new_thread(7, "top customers")).await?;
//!
//! loop {
//!     manager.poll();
//!     if let Some(state) = manager.state() {
//!         render(state);
//!         if state.is_terminal() { break; }
//!     }
//! }
//! ```

pub mod events;
pub mod manager;
pub mod session;

pub use events::{
    AnalysisEvent, CompletionData, ResultsSummary, StartData, StartMeta, TableContent,
    TableMetadata,
};
pub use manager::SessionManager;
pub use session::{AnalysisState, SessionKey, Step, StreamStatus};

// Re-export the signal type from backend for convenience
pub use crate::backend::StreamSignal;
