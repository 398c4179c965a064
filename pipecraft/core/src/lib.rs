//! Pipecraft Core - Headless Logic for Chat-Driven Pipeline Building
//!
//! This crate provides the core logic for pipecraft, completely independent of
//! any UI framework. It can drive a web form builder, a TUI, or run headless
//! for testing/automation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       UI Surfaces                            │
//! │   connection forms · operator forms · chat analysis panel    │
//! └───────────────┬────────────────────────────┬─────────────────┘
//!                 │                            │
//! ┌───────────────┼────────────────────────────┼─────────────────┐
//! │               │      PIPECRAFT CORE        │                 │
//! │  ┌────────────┴───────────┐   ┌────────────┴──────────────┐  │
//! │  │     Schema Engine      │   │  Streaming Analysis       │  │
//! │  │ ┌────────┐ ┌─────────┐ │   │ ┌─────────┐ ┌───────────┐ │  │
//! │  │ │Compiler│ │Classifr.│ │   │ │ Session │ │  Agent    │ │  │
//! │  │ │        │ │ Catalog │ │   │ │ Manager │ │  Backend  │ │  │
//! │  │ └────────┘ └─────────┘ │   │ └─────────┘ └───────────┘ │  │
//! │  └────────────────────────┘   └───────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`FieldSchema`]: declarative description of one configuration field
//! - [`CompiledSchema`]: a compiled validator tree, produced by [`compile`]
//! - [`FieldKind`]: closed set of widget kinds, produced by [`classify`]
//! - [`SessionManager`]: owns the single in-flight analysis stream
//! - [`AnalysisState`]: the view-state record folded from stream events
//! - [`AgentBackend`]: transport trait for the remote agent service
//!
//! # Quick Start
//!
//! ```ignore
//! use pipecraft_core::{
//!     backend::HttpAgentBackend,
//!     streaming::manager::SessionManager,
//!     streaming::session::SessionKey,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = pipecraft_core::load_config()?;
//!     let backend = HttpAgentBackend::from_config(&config);
//!
//!     let mut manager = SessionManager::new();
//!     let key = SessionKey::new_thread(42, "monthly revenue by region");
//!     manager.start_session(&backend, key).await?;
//!
//!     // Main loop: drain stream signals into the session state
//!     loop {
//!         manager.poll();
//!         if manager.state().is_some_and(|s| s.is_terminal()) {
//!             break;
//!         }
//!         tokio::time::sleep(std::time::Duration::from_millis(33)).await;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`schema`]: field schemas, the schema-to-validator compiler, the
//!   field-kind classifier, and the operator catalog lookup
//! - [`streaming`]: analysis stream events, the session state reducer, and
//!   the session manager (one cancellable stream at a time)
//! - [`backend`]: agent service transport (trait + HTTP/SSE implementation)
//! - [`config`]: TOML configuration with environment overrides
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on any UI framework. It's pure
//! business logic that can be used anywhere.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod schema;
pub mod streaming;

// Re-exports for convenience
pub use backend::{AgentBackend, AnalysisRequest, AnalysisStream, HttpAgentBackend, StreamSignal};
pub use config::{
    default_config_path, load_config, load_config_from_path, AgentConfig, ConfigError,
    ConfigSource, PipecraftConfig, StreamingConfig,
};
pub use schema::catalog::{
    find_operator_schema, Operator, OperatorSchema, PipelineModule, UiProperties,
};
pub use schema::classifier::{classify, is_sensitive, FieldKind};
pub use schema::compiler::{
    compile, compile_operator, CompileMode, CompiledSchema, ValidationErrors, ValidationIssue,
};
pub use schema::field::FieldSchema;
pub use streaming::events::{
    AnalysisEvent, CompletionData, ResultsSummary, StartData, StartMeta, TableContent,
    TableMetadata,
};
pub use streaming::manager::SessionManager;
pub use streaming::session::{AnalysisState, SessionKey, Step, StreamStatus};
