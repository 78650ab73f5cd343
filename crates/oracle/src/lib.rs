//! Decision oracle boundary for the edgebet trading pipeline.
//!
//! The oracle is treated as an untrusted external collaborator. This crate
//! owns the boundary: the [`DecisionOracle`] trait, an OpenAI-compatible
//! implementation, prompt construction, and the shape validation that
//! stands between the model's output and the execution engine. A decision
//! that fails validation is dropped, never acted on; an oracle failure
//! skips the batch without crashing the run.

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

pub use client::{DecisionOracle, LlmOracle};
pub use error::OracleError;
pub use prompt::{build_prompt, format_candidate};
pub use types::{parse_decisions, Decision, OpenPosition};
