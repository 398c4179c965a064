//! Analysis Stream Events
//!
//! Wire shapes for the typed events the agent service emits during one
//! analysis session. The discriminator is the `event_type` field; field
//! names match the agent API exactly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::streaming::session::Step;

/// Metadata from the session-opening event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StartMeta {
    /// Display title for the session.
    pub title: String,
    /// Server-assigned request identifier.
    pub request_id: String,
}

/// Data payload of the session-opening event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StartData {
    /// The question as the agent understood it.
    pub input_question: String,
}

/// Row-count metadata attached to a table payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableMetadata {
    /// Total rows in the underlying result set, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
}

/// Tabular result payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableContent {
    /// Column headers, in display order.
    pub column_names: Vec<String>,
    /// Row data; each inner vec aligns with `column_names`.
    pub column_values: Vec<Vec<Value>>,
    /// Optional row-count metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TableMetadata>,
}

/// Summary counters from the terminal event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsSummary {
    /// Number of tables the session produced, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables_generated: Option<u32>,
}

/// Data payload of the terminal event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionData {
    /// Wall-clock duration of the whole session.
    pub duration_ms: u64,
    /// Summary counters.
    #[serde(default)]
    pub results_summary: ResultsSummary,
}

/// One typed event from the agent's analysis stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    /// Session opened; carries title, request id, and the parsed question.
    MetaStarted {
        /// Session metadata.
        meta: StartMeta,
        /// Session data payload.
        data: StartData,
    },
    /// One identified entity/fact (appended to a running list).
    Identify {
        /// The identification text.
        content: String,
    },
    /// Generated SQL for the question.
    Sql {
        /// The SQL text.
        content: String,
    },
    /// Tabular results fetched by executing the SQL.
    Table {
        /// The table payload.
        content: TableContent,
    },
    /// Natural-language explanation of the results.
    Explanation {
        /// The explanation text.
        content: String,
    },
    /// Session finished; carries duration and summary counters.
    MetaCompleted {
        /// Terminal data payload.
        data: CompletionData,
    },
}

impl AnalysisEvent {
    /// Whether this is the session-opening event.
    #[must_use]
    pub fn is_meta_started(&self) -> bool {
        matches!(self, Self::MetaStarted { .. })
    }

    /// Whether this is an identification event.
    #[must_use]
    pub fn is_identify(&self) -> bool {
        matches!(self, Self::Identify { .. })
    }

    /// Whether this is a SQL event.
    #[must_use]
    pub fn is_sql(&self) -> bool {
        matches!(self, Self::Sql { .. })
    }

    /// Whether this is a table event.
    #[must_use]
    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table { .. })
    }

    /// Whether this is an explanation event.
    #[must_use]
    pub fn is_explanation(&self) -> bool {
        matches!(self, Self::Explanation { .. })
    }

    /// Whether this is the terminal event.
    #[must_use]
    pub fn is_meta_completed(&self) -> bool {
        matches!(self, Self::MetaCompleted { .. })
    }

    /// The step this event moves the session into.
    #[must_use]
    pub fn step(&self) -> Step {
        match self {
            Self::MetaStarted { .. } => Step::Thinking,
            Self::Identify { .. } => Step::Identifying,
            Self::Sql { .. } => Step::GeneratingSql,
            Self::Table { .. } => Step::FetchingData,
            Self::Explanation { .. } => Step::Explaining,
            Self::MetaCompleted { .. } => Step::Complete,
        }
    }
}
