//! Master coordinator.
//!
//! Owns the full source-to-tests mapping for one host suite and presents it
//! to the host framework as a single composite test: one aggregate identity,
//! one `run` that walks every source in discovery order. Execution is
//! strictly sequential; the external agent is a single shared stateful
//! process and concurrent evaluation would corrupt its global state.

use crate::bridge::ExecutionChannel;
use crate::description::Description;
use crate::error::DiscoveryError;
use crate::interpreter::{HostSuite, SourceInterpreter};
use crate::memo::Memoized;
use crate::node::{Outcome, TestNode};
use crate::notify::RunNotifier;
use crate::scanner::{ScanListener, TestScanner};
use indexmap::IndexMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// The composite test over everything discovered for one host suite.
///
/// Built once at discovery time; the node trees and the source mapping are
/// immutable afterwards and read-only during execution.
pub struct MasterTest {
    host: HostSuite,
    tests: IndexMap<String, Vec<TestNode>>,
    library_paths: Vec<PathBuf>,
    external_libs: Vec<String>,
    desc: Memoized<Description>,
}

impl MasterTest {
    /// Discover every test declared on `host` through `interpreter`.
    ///
    /// Fails on any discovery error without reporting a partial tree.
    pub fn new(
        host: HostSuite,
        interpreter: &dyn SourceInterpreter,
        external_libs: Vec<String>,
    ) -> Result<Self, DiscoveryError> {
        let mut collector = Collector::default();
        TestScanner::new(&host, interpreter).parse_tests(&mut collector)?;
        debug!(
            host = %host.name(),
            sources = collector.tests.len(),
            "discovery complete"
        );
        Ok(Self {
            host,
            tests: collector.tests,
            library_paths: interpreter.library_paths().to_vec(),
            external_libs,
            desc: Memoized::new(),
        })
    }

    /// The aggregate description tree over all sources, in discovery order.
    /// Computed once and cached; repeated calls return the same identity.
    pub fn describe(&self) -> Description {
        self.desc
            .get_or_compute(|| {
                Description::suite(
                    self.host.name(),
                    self.tests
                        .values()
                        .flatten()
                        .map(|t| t.describe(&self.host))
                        .collect(),
                )
            })
            .clone()
    }

    /// The discovered source-to-tests mapping, in discovery order.
    pub fn tests(&self) -> &IndexMap<String, Vec<TestNode>> {
        &self.tests
    }

    /// Run every discovered test, source by source.
    ///
    /// For each source the execution context is initialized first, so the
    /// agent has the right libraries loaded before any of the source's tests
    /// run. An initialization failure fails every test in that source, and an
    /// execution channel failure mid-source fails the source's remaining
    /// tests; neither aborts the remaining sources, which attempt their own
    /// initialization.
    pub fn run(
        &self,
        notifier: &mut dyn RunNotifier,
        channel: &dyn ExecutionChannel,
    ) -> Outcome {
        let desc = self.describe();
        notifier.fire_test_started(&desc);
        info!(host = %self.host.name(), sources = self.tests.len(), "test run started");

        let mut outcome = Outcome::Passed;
        for (source_id, tests) in &self.tests {
            match channel.initialize_run(source_id, &self.library_paths, &self.external_libs) {
                Ok(()) => {
                    let mut remaining = tests.iter();
                    while let Some(test) = remaining.next() {
                        match test.run(&self.host, notifier, channel) {
                            Ok(o) => outcome = outcome.merge(o),
                            Err(e) => {
                                warn!(source = %source_id, error = %e, "execution channel failed mid-source");
                                let diagnostic = format!(
                                    "execution channel failed for source {source_id:?}: {e}"
                                );
                                for rest in remaining.by_ref() {
                                    rest.fail(&self.host, notifier, &diagnostic);
                                }
                                outcome = outcome.merge(Outcome::Error);
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(source = %source_id, error = %e, "failed to initialize source run");
                    let diagnostic =
                        format!("failed to initialize run for source {source_id:?}: {e}");
                    for test in tests {
                        test.fail(&self.host, notifier, &diagnostic);
                    }
                    outcome = outcome.merge(Outcome::Error);
                }
            }
        }

        notifier.fire_test_finished(&desc);
        info!(host = %self.host.name(), passed = outcome.is_pass(), "test run finished");
        outcome
    }
}

#[derive(Default)]
struct Collector {
    tests: IndexMap<String, Vec<TestNode>>,
}

impl ScanListener for Collector {
    fn source_scanned(&mut self, source_id: &str, tests: Vec<TestNode>) {
        self.tests.insert(source_id.to_string(), tests);
    }
}
