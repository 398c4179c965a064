//! Session State and Reducer
//!
//! [`AnalysisState`] is the single view-state record for one analysis
//! session, and [`AnalysisState::apply`] is the pure state-transition
//! function that folds stream events into it. All mutation goes through the
//! named entry points here ([`AnalysisState::apply`], [`AnalysisState::fail`],
//! [`AnalysisState::finish_degraded`]); nothing else touches the fields.
//!
//! Step completion accumulates as a deduplicated, insertion-ordered set, so
//! the reducer is idempotent under the duplicate and out-of-order deliveries
//! a retrying transport can produce.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::streaming::events::{AnalysisEvent, ResultsSummary, TableContent};

/// One named phase of a streaming analysis session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Agent is parsing the question.
    Thinking,
    /// Agent is identifying relevant entities.
    Identifying,
    /// Agent is generating SQL.
    GeneratingSql,
    /// Agent is executing the SQL and fetching rows.
    FetchingData,
    /// Agent is explaining the results.
    Explaining,
    /// Session finished.
    Complete,
}

impl Step {
    /// All non-terminal steps, in session order.
    pub const NON_TERMINAL: [Step; 5] = [
        Step::Thinking,
        Step::Identifying,
        Step::GeneratingSql,
        Step::FetchingData,
        Step::Explaining,
    ];

    /// Stable lowercase name, as used by step indicators.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::Identifying => "identifying",
            Self::GeneratingSql => "generating_sql",
            Self::FetchingData => "fetching_data",
            Self::Explaining => "explaining",
            Self::Complete => "complete",
        }
    }

    /// The steps that are complete once a session reaches this step.
    #[must_use]
    pub fn prior_steps(self) -> &'static [Step] {
        match self {
            Self::Thinking => &[],
            Self::Identifying => &Self::NON_TERMINAL[..1],
            Self::GeneratingSql => &Self::NON_TERMINAL[..2],
            Self::FetchingData => &Self::NON_TERMINAL[..3],
            Self::Explaining => &Self::NON_TERMINAL[..4],
            Self::Complete => &Self::NON_TERMINAL[..],
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Overall status of a session's stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    /// Events are still arriving.
    Streaming,
    /// Session finished (with or without a terminal event).
    Complete,
    /// Transport failed or an event was malformed.
    Error,
}

/// The identifying triple for one streaming conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Connection the question is asked against.
    pub connection_id: i64,
    /// The user's question.
    pub query: String,
    /// Conversation thread identifier.
    pub thread_id: String,
}

impl SessionKey {
    /// Create a key for an existing thread.
    pub fn new(connection_id: i64, query: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            connection_id,
            query: query.into(),
            thread_id: thread_id.into(),
        }
    }

    /// Create a key with a freshly generated thread id.
    pub fn new_thread(connection_id: i64, query: impl Into<String>) -> Self {
        Self::new(connection_id, query, Uuid::new_v4().to_string())
    }
}

/// View state for one streaming analysis session.
///
/// Created empty when a session starts; every later change is a pure merge
/// performed by [`apply`](Self::apply), [`fail`](Self::fail), or
/// [`finish_degraded`](Self::finish_degraded). Fields not named by a
/// transition are never touched by it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    /// Stream status; `None` until the first event arrives.
    pub status: Option<StreamStatus>,
    /// Session title, from `meta_started`.
    pub title: Option<String>,
    /// The question as the agent understood it, from `meta_started`.
    pub input_question: Option<String>,
    /// Server-assigned request id, from `meta_started`.
    pub request_id: Option<String>,
    /// Identified entities/facts; append-only during a session.
    pub identify: Vec<String>,
    /// Generated SQL; set at most once, overwritten by duplicates.
    pub sql: Option<String>,
    /// Fetched table; set at most once, overwritten by duplicates.
    pub table: Option<TableContent>,
    /// Results explanation; set at most once, overwritten by duplicates.
    pub explanation: Option<String>,
    /// Session duration; only from the terminal event.
    pub duration_ms: Option<u64>,
    /// Summary counters; only from the terminal event.
    pub results_summary: Option<ResultsSummary>,
    /// Error message when `status` is `Error`.
    pub error: Option<String>,
    /// The step currently in progress.
    pub current_step: Option<Step>,
    /// Completed steps: deduplicated, insertion-ordered.
    pub completed_steps: Vec<Step>,
}

impl AnalysisState {
    /// Fresh, not-yet-started state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the session reached a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            Some(StreamStatus::Complete | StreamStatus::Error)
        )
    }

    /// Whether a step is in the completed set.
    #[must_use]
    pub fn step_completed(&self, step: Step) -> bool {
        self.completed_steps.contains(&step)
    }

    /// Fold one stream event into the state.
    ///
    /// A pure merge: each event kind sets only the fields its transition
    /// names. Step accumulation is idempotent, so duplicate or out-of-order
    /// events cannot double-complete a step.
    pub fn apply(&mut self, event: &AnalysisEvent) {
        tracing::debug!(step = %event.step(), "applying analysis event");
        match event {
            AnalysisEvent::MetaStarted { meta, data } => {
                self.status = Some(StreamStatus::Streaming);
                self.title = Some(meta.title.clone());
                self.request_id = Some(meta.request_id.clone());
                self.input_question = Some(data.input_question.clone());
                self.identify.clear();
                self.current_step = Some(Step::Thinking);
                self.completed_steps.clear();
            }
            AnalysisEvent::Identify { content } => {
                self.identify.push(content.clone());
                self.advance_to(Step::Identifying);
            }
            AnalysisEvent::Sql { content } => {
                self.sql = Some(content.clone());
                self.advance_to(Step::GeneratingSql);
            }
            AnalysisEvent::Table { content } => {
                self.table = Some(content.clone());
                self.advance_to(Step::FetchingData);
            }
            AnalysisEvent::Explanation { content } => {
                self.explanation = Some(content.clone());
                self.advance_to(Step::Explaining);
            }
            AnalysisEvent::MetaCompleted { data } => {
                self.duration_ms = Some(data.duration_ms);
                self.results_summary = Some(data.results_summary.clone());
                self.status = Some(StreamStatus::Complete);
                self.advance_to(Step::Complete);
            }
        }
    }

    /// Transition into the error state.
    ///
    /// Partial results collected before the failure stay in the record; how
    /// an error view treats them is a rendering concern.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(error = %message, "analysis session failed");
        self.status = Some(StreamStatus::Error);
        self.error = Some(message);
    }

    /// Transition into the degraded terminal state.
    ///
    /// Used when the transport closed cleanly but no `meta_completed`
    /// arrived: the session is complete, without duration or summary.
    pub fn finish_degraded(&mut self) {
        tracing::debug!("stream closed without terminal event");
        self.status = Some(StreamStatus::Complete);
        self.current_step = Some(Step::Complete);
    }

    /// Set the current step and mark its prior steps completed (dedup'd).
    fn advance_to(&mut self, step: Step) {
        self.current_step = Some(step);
        for prior in step.prior_steps() {
            if !self.completed_steps.contains(prior) {
                self.completed_steps.push(*prior);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::streaming::events::{CompletionData, StartData, StartMeta};

    use super::*;

    fn started() -> AnalysisEvent {
        AnalysisEvent::MetaStarted {
            meta: StartMeta {
                title: "Revenue".to_string(),
                request_id: "req-1".to_string(),
            },
            data: StartData {
                input_question: "monthly revenue".to_string(),
            },
        }
    }

    fn identify(text: &str) -> AnalysisEvent {
        AnalysisEvent::Identify {
            content: text.to_string(),
        }
    }

    fn sql(text: &str) -> AnalysisEvent {
        AnalysisEvent::Sql {
            content: text.to_string(),
        }
    }

    fn completed(duration_ms: u64) -> AnalysisEvent {
        AnalysisEvent::MetaCompleted {
            data: CompletionData {
                duration_ms,
                results_summary: ResultsSummary {
                    tables_generated: Some(1),
                },
            },
        }
    }

    #[test]
    fn test_meta_started_initializes() {
        let mut state = AnalysisState::new();
        state.apply(&started());

        assert_eq!(state.status, Some(StreamStatus::Streaming));
        assert_eq!(state.title.as_deref(), Some("Revenue"));
        assert_eq!(state.request_id.as_deref(), Some("req-1"));
        assert_eq!(state.input_question.as_deref(), Some("monthly revenue"));
        assert_eq!(state.current_step, Some(Step::Thinking));
        assert!(state.identify.is_empty());
        assert!(state.completed_steps.is_empty());
    }

    #[test]
    fn test_full_session_completes_all_steps() {
        let mut state = AnalysisState::new();
        state.apply(&started());
        state.apply(&identify("orders table"));
        state.apply(&sql("SELECT region, sum(total) FROM orders GROUP BY 1"));
        state.apply(&AnalysisEvent::Table {
            content: TableContent::default(),
        });
        state.apply(&AnalysisEvent::Explanation {
            content: "EMEA leads".to_string(),
        });
        state.apply(&completed(4200));

        assert_eq!(state.status, Some(StreamStatus::Complete));
        assert_eq!(state.current_step, Some(Step::Complete));
        assert_eq!(state.duration_ms, Some(4200));
        assert_eq!(state.completed_steps, Step::NON_TERMINAL.to_vec());
    }

    #[test]
    fn test_skipped_steps_still_complete_on_terminal_event() {
        // Terminal event arriving after only sql: all five non-terminal
        // steps are completed regardless of which events were seen.
        let mut state = AnalysisState::new();
        state.apply(&started());
        state.apply(&sql("SELECT 1"));
        state.apply(&completed(100));

        assert_eq!(state.completed_steps, Step::NON_TERMINAL.to_vec());
    }

    #[test]
    fn test_identify_appends_but_steps_dedup() {
        let mut state = AnalysisState::new();
        state.apply(&started());
        state.apply(&identify("orders"));
        state.apply(&identify("orders"));

        // Append is not deduplicated.
        assert_eq!(state.identify, vec!["orders", "orders"]);
        // Step completion is.
        assert_eq!(state.completed_steps, vec![Step::Thinking]);
    }

    #[test]
    fn test_duplicate_sql_overwrites() {
        let mut state = AnalysisState::new();
        state.apply(&started());
        state.apply(&sql("SELECT 1"));
        state.apply(&sql("SELECT 2"));

        assert_eq!(state.sql.as_deref(), Some("SELECT 2"));
        assert_eq!(
            state.completed_steps,
            vec![Step::Thinking, Step::Identifying]
        );
    }

    #[test]
    fn test_out_of_order_events_idempotent() {
        let mut state = AnalysisState::new();
        state.apply(&started());
        state.apply(&AnalysisEvent::Explanation {
            content: "early".to_string(),
        });
        state.apply(&sql("SELECT 1"));

        // Explanation already completed the first four steps; the late sql
        // event moves current_step back but adds nothing new to the set.
        assert_eq!(state.completed_steps.len(), 4);
        assert_eq!(state.current_step, Some(Step::GeneratingSql));
    }

    #[test]
    fn test_fresh_meta_started_resets_session_fields() {
        let mut state = AnalysisState::new();
        state.apply(&started());
        state.apply(&identify("orders"));
        state.apply(&sql("SELECT 1"));

        // New session for a changed key starts from a fresh record.
        let mut state = AnalysisState::new();
        state.apply(&started());
        assert!(state.identify.is_empty());
        assert!(state.sql.is_none());
        assert!(state.completed_steps.is_empty());
    }

    #[test]
    fn test_fail_keeps_partial_data() {
        let mut state = AnalysisState::new();
        state.apply(&started());
        state.apply(&identify("orders"));
        state.apply(&sql("SELECT 1"));
        state.fail("connection reset");

        assert_eq!(state.status, Some(StreamStatus::Error));
        assert_eq!(state.error.as_deref(), Some("connection reset"));
        // Already-collected partials are retained in the record.
        assert_eq!(state.identify, vec!["orders"]);
        assert_eq!(state.sql.as_deref(), Some("SELECT 1"));
        assert!(state.is_terminal());
    }

    #[test]
    fn test_degraded_completion() {
        let mut state = AnalysisState::new();
        state.apply(&started());
        state.apply(&sql("SELECT 1"));
        state.finish_degraded();

        assert_eq!(state.status, Some(StreamStatus::Complete));
        assert_eq!(state.current_step, Some(Step::Complete));
        assert!(state.duration_ms.is_none());
        assert!(state.results_summary.is_none());
    }

    #[test]
    fn test_step_names_and_order() {
        assert_eq!(Step::GeneratingSql.name(), "generating_sql");
        assert_eq!(Step::Thinking.prior_steps(), &[] as &[Step]);
        assert_eq!(
            Step::Explaining.prior_steps(),
            &[
                Step::Thinking,
                Step::Identifying,
                Step::GeneratingSql,
                Step::FetchingData
            ]
        );
        assert_eq!(Step::Complete.prior_steps(), &Step::NON_TERMINAL);
    }

    #[test]
    fn test_session_key_new_thread_unique() {
        let a = SessionKey::new_thread(1, "q");
        let b = SessionKey::new_thread(1, "q");
        assert_ne!(a.thread_id, b.thread_id);
        assert_eq!(a.connection_id, b.connection_id);
    }
}
