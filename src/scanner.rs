//! Test scanner.
//!
//! Resolves a host suite's sources through its interpreter and scans each one
//! for top-level test-definition blocks, reporting the completed node list
//! per source to a listener. Any discovery error aborts the whole scan: the
//! host framework's description tree is computed once and must be complete
//! before any run begins.

use crate::error::DiscoveryError;
use crate::interpreter::{HostSuite, SourceInterpreter};
use crate::node::{self, TestNode};
use tracing::debug;

/// Receives the discovered node list for each scanned source.
pub trait ScanListener {
    fn source_scanned(&mut self, source_id: &str, tests: Vec<TestNode>);
}

/// Scans a host suite's sources into test-node lists.
pub struct TestScanner<'a> {
    host: &'a HostSuite,
    interpreter: &'a dyn SourceInterpreter,
}

impl<'a> TestScanner<'a> {
    pub fn new(host: &'a HostSuite, interpreter: &'a dyn SourceInterpreter) -> Self {
        Self { host, interpreter }
    }

    /// Scan every source in interpreter enumeration order. That order becomes
    /// the execution order.
    pub fn parse_tests(&self, listener: &mut dyn ScanListener) -> Result<(), DiscoveryError> {
        let sources = self.interpreter.resolve(self.host)?;
        let markers = self.interpreter.markers();

        for (source_id, text) in &sources {
            let nodes = node::collect_nodes(text, &markers, "")?;
            debug!(
                source = %source_id,
                nodes = nodes.len(),
                "scanned source for test definitions"
            );
            listener.source_scanned(source_id, nodes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::ScriptInterpreter;

    #[derive(Default)]
    struct Collecting {
        scanned: Vec<(String, Vec<TestNode>)>,
    }

    impl ScanListener for Collecting {
        fn source_scanned(&mut self, source_id: &str, tests: Vec<TestNode>) {
            self.scanned.push((source_id.to_string(), tests));
        }
    }

    #[test]
    fn scans_sources_in_declaration_order() {
        let host = HostSuite::new("OrderTest")
            .with_inline("a.js", r#"it("a1", function() { f(); })"#)
            .with_inline("b.js", r#"it("b1", function() { g(); })"#);
        let interpreter = ScriptInterpreter::jasmine(vec![]);

        let mut listener = Collecting::default();
        TestScanner::new(&host, &interpreter)
            .parse_tests(&mut listener)
            .unwrap();

        assert_eq!(listener.scanned.len(), 2);
        assert_eq!(listener.scanned[0].0, "a.js");
        assert_eq!(listener.scanned[1].0, "b.js");
        assert_eq!(listener.scanned[0].1[0].name(), "a1");
    }

    #[test]
    fn parse_error_aborts_whole_scan() {
        let host = HostSuite::new("BrokenTest")
            .with_inline("good.js", r#"it("ok", function() { f(); })"#)
            .with_inline("bad.js", r#"it("broken", function() { "#);
        let interpreter = ScriptInterpreter::jasmine(vec![]);

        let mut listener = Collecting::default();
        let result = TestScanner::new(&host, &interpreter).parse_tests(&mut listener);

        assert!(matches!(result, Err(DiscoveryError::Parse(_))));
    }

    #[test]
    fn unresolvable_source_aborts_discovery() {
        let host = HostSuite::new("MissingTest").with_file("/nonexistent/specs.js");
        let interpreter = ScriptInterpreter::jasmine(vec![]);

        let mut listener = Collecting::default();
        let result = TestScanner::new(&host, &interpreter).parse_tests(&mut listener);

        assert!(matches!(
            result,
            Err(DiscoveryError::SourceResolution { .. })
        ));
        assert!(listener.scanned.is_empty());
    }
}
