//! Agent Service Transport
//!
//! This module provides abstracted access to the remote analysis agent
//! through a common trait interface.
//!
//! # Available Backends
//!
//! - **HTTP/SSE**: the agent's streaming REST endpoint (default)
//! - In-process channels via [`AnalysisStream::from_receiver`] for tests
//!   and embedded setups
//!
//! # Usage
//!
//! ```ignore
//! use pipecraft_core::backend::{AgentBackend, AnalysisRequest, HttpAgentBackend};
//! use pipecraft_core::streaming::session::SessionKey;
//!
//! let backend = HttpAgentBackend::new("http://localhost:8080");
//! let request = AnalysisRequest::new(SessionKey::new_thread(7, "top customers"));
//! let stream = backend.stream_analysis(&request).await?;
//! ```

mod http;
mod traits;

pub use http::HttpAgentBackend;
pub use traits::{AgentBackend, AnalysisRequest, AnalysisStream, StreamSignal};
