//! Execution bridge contract.
//!
//! The bridge is how a spec's raw script actually gets evaluated: an external
//! agent (an embedded content server plus a browser-like process) consumes
//! the request and reports its verdict asynchronously. This crate only
//! depends on the request/response contract below, never on how content is
//! served or the agent process is managed.

use crate::description::Description;
use std::path::PathBuf;
use tokio::sync::oneshot;

/// Outcome of evaluating one spec in the external agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    /// An assertion failed; carries the agent's captured diagnostic.
    Failed(String),
    /// The spec errored or timed out inside the agent.
    Error(String),
}

/// Error type for bridge operations.
#[derive(Debug)]
pub struct BridgeError {
    pub message: String,
}

impl BridgeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BridgeError {}

/// Channel to the external execution agent.
///
/// `evaluate` hands back a oneshot receiver for the verdict; the coordinator
/// blocks on it, which is the run's only suspension point. Implementations
/// that detect an agent crash should drop the sender, which the coordinator
/// reports as a spec failure.
pub trait ExecutionChannel {
    /// Establish the execution context for one source before any of its
    /// tests run: load the given libraries and per-source external libraries
    /// into the agent.
    fn initialize_run(
        &self,
        source_id: &str,
        library_paths: &[PathBuf],
        external_libs: &[String],
    ) -> Result<(), BridgeError>;

    /// Ask the agent to evaluate one spec's raw block text.
    fn evaluate(
        &self,
        spec: &Description,
        raw_block: &str,
    ) -> Result<oneshot::Receiver<Verdict>, BridgeError>;
}
