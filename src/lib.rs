//! jstest runs browser JavaScript test suites through an external execution
//! agent and reports results back to a host test framework.
//!
//! Discovery scans loosely structured script text for marker-led blocks
//! (`describe(` / `it(` and friends) with delimiter-depth tracking instead of
//! a real parser, builds an immutable suite/spec tree per source, and hands
//! the host framework a single composite test with a stable, memoized
//! description identity. Execution walks the tree strictly sequentially,
//! delegating each spec's evaluation to an [`bridge::ExecutionChannel`] and
//! converting verdicts into [`notify::RunNotifier`] notifications.
//!
//! The embedding framework supplies the two external collaborators: the
//! execution channel (backed by a content server and a browser-like process)
//! and the notifier (the host framework's own reporting stream).

pub mod blocks;
pub mod bridge;
pub mod config;
pub mod description;
pub mod error;
pub mod interpreter;
pub mod master;
pub mod memo;
pub mod node;
pub mod notify;
pub mod scanner;

pub use bridge::{BridgeError, ExecutionChannel, Verdict};
pub use description::Description;
pub use error::DiscoveryError;
pub use interpreter::{HostSuite, ScriptInterpreter, SourceInterpreter, SourceRef};
pub use master::MasterTest;
pub use node::{JASMINE_MARKERS, Markers, Outcome, QUNIT_MARKERS, SpecNode, SuiteNode, TestNode};
pub use notify::{Notification, RecordingNotifier, RunNotifier};
