//! Suite/spec hierarchy model.
//!
//! A [`TestNode`] is one test-definition block extracted from source text:
//! either a leaf [`SpecNode`] or a composite [`SuiteNode`] that recursively
//! scanned its own body for children. Trees are built once during discovery
//! and are immutable afterwards; child order is exactly source order, which
//! is also execution and reporting order.

use crate::blocks::{self, BlockSpan};
use crate::bridge::{BridgeError, ExecutionChannel, Verdict};
use crate::description::Description;
use crate::error::{DiscoveryError, block_excerpt};
use crate::interpreter::HostSuite;
use crate::memo::Memoized;
use crate::notify::RunNotifier;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// The marker pair a script dialect uses to open grouping and leaf blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    /// Opens a grouping block, e.g. `describe(`.
    pub suite: &'static str,
    /// Opens a leaf block, e.g. `it(`.
    pub spec: &'static str,
}

/// Jasmine-style `describe(` / `it(` markers.
pub const JASMINE_MARKERS: Markers = Markers {
    suite: "describe(",
    spec: "it(",
};

/// QUnit-style `module(` / `test(` markers.
pub const QUNIT_MARKERS: Markers = Markers {
    suite: "module(",
    spec: "test(",
};

/// Terminal result of running a node. Suites roll up the worst child result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    Passed,
    Failed,
    Error,
}

impl Outcome {
    /// Combine with another outcome, keeping the worse of the two.
    pub fn merge(self, other: Outcome) -> Outcome {
        self.max(other)
    }

    pub fn is_pass(self) -> bool {
        self == Outcome::Passed
    }
}

/// One discovered test-definition block: a leaf spec or a composite suite.
#[derive(Debug)]
pub enum TestNode {
    Suite(SuiteNode),
    Spec(SpecNode),
}

impl TestNode {
    pub fn name(&self) -> &str {
        match self {
            TestNode::Suite(s) => &s.name,
            TestNode::Spec(s) => &s.name,
        }
    }

    /// The raw block text this node was built from.
    pub fn raw_data(&self) -> &str {
        match self {
            TestNode::Suite(s) => &s.raw,
            TestNode::Spec(s) => &s.raw,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TestNode::Spec(_))
    }

    /// The name of the suite this node reports under. A suite reports under
    /// its own name; a top-level spec reports under the empty string.
    pub fn suite_name(&self) -> &str {
        match self {
            TestNode::Suite(s) => &s.name,
            TestNode::Spec(s) => &s.suite_name,
        }
    }

    /// The node's description identity, computed once per node for the first
    /// host it is asked about and cached for the rest of the run.
    pub fn describe(&self, host: &HostSuite) -> Description {
        match self {
            TestNode::Suite(s) => s.describe(host),
            TestNode::Spec(s) => s.describe(host),
        }
    }

    /// Run this node against the execution channel, firing notifications.
    ///
    /// `Err` means the channel itself became unreachable; the caller decides
    /// how much of the remaining run to abandon.
    pub fn run(
        &self,
        host: &HostSuite,
        notifier: &mut dyn RunNotifier,
        channel: &dyn ExecutionChannel,
    ) -> Result<Outcome, BridgeError> {
        match self {
            TestNode::Suite(s) => s.run(host, notifier, channel),
            TestNode::Spec(s) => s.run(host, notifier, channel),
        }
    }

    /// Report this node's whole subtree as failed with `diagnostic`, keeping
    /// the started/finished bracketing intact for every identity. Failure
    /// notifications fire only at spec granularity.
    pub fn fail(&self, host: &HostSuite, notifier: &mut dyn RunNotifier, diagnostic: &str) {
        let desc = self.describe(host);
        notifier.fire_test_started(&desc);
        match self {
            TestNode::Suite(s) => {
                for child in &s.children {
                    child.fail(host, notifier, diagnostic);
                }
            }
            TestNode::Spec(_) => notifier.fire_test_failure(&desc, diagnostic),
        }
        notifier.fire_test_finished(&desc);
    }
}

impl std::fmt::Display for TestNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestNode::Spec(s) => {
                writeln!(f, "spec {:?}:", s.name)?;
                write!(f, "{}", indent_lines(&s.raw, 2))
            }
            TestNode::Suite(s) => {
                writeln!(f, "suite {:?}:", s.name)?;
                for (i, child) in s.children.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", indent_lines(&child.to_string(), 2))?;
                }
                Ok(())
            }
        }
    }
}

/// A leaf test case. Immutable after construction.
#[derive(Debug)]
pub struct SpecNode {
    name: String,
    raw: String,
    suite_name: String,
    desc: Memoized<Description>,
}

impl SpecNode {
    /// Build a spec node from a raw leaf block.
    ///
    /// Returns `Ok(None)` for blocks the drop policy discards: an empty
    /// argument region (`it()`) or an empty extracted name (`it("")`). A
    /// block with content but no quoted name literal is malformed and fails
    /// discovery for the whole source.
    pub fn parse(
        raw: &str,
        markers: &Markers,
        suite_name: &str,
    ) -> Result<Option<Self>, DiscoveryError> {
        let Some(name) = parse_display_name(raw, markers.spec)? else {
            debug!(block = %block_excerpt(raw), "dropping empty spec block");
            return Ok(None);
        };
        Ok(Some(Self {
            name,
            raw: raw.to_string(),
            suite_name: suite_name.to_string(),
            desc: Memoized::new(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn describe(&self, host: &HostSuite) -> Description {
        self.desc
            .get_or_compute(|| Description::spec_for_host(host.name(), self.name.as_str()))
            .clone()
    }

    /// Fire started, delegate evaluation to the bridge, block on the verdict,
    /// convert any failure into a failure notification, fire finished.
    ///
    /// `Err` means `evaluate` itself failed, so the channel is unreachable
    /// rather than the spec wrong; the spec is reported failed here and the
    /// error propagates so the rest of the source can be failed too.
    pub fn run(
        &self,
        host: &HostSuite,
        notifier: &mut dyn RunNotifier,
        channel: &dyn ExecutionChannel,
    ) -> Result<Outcome, BridgeError> {
        let desc = self.describe(host);
        notifier.fire_test_started(&desc);

        let receiver = match channel.evaluate(&desc, &self.raw) {
            Ok(receiver) => receiver,
            Err(e) => {
                notifier.fire_test_failure(&desc, &e.to_string());
                notifier.fire_test_finished(&desc);
                return Err(e);
            }
        };

        let outcome = match receiver.blocking_recv() {
            Ok(Verdict::Passed) => Outcome::Passed,
            Ok(Verdict::Failed(diagnostic)) => {
                notifier.fire_test_failure(&desc, &diagnostic);
                Outcome::Failed
            }
            Ok(Verdict::Error(diagnostic)) => {
                notifier.fire_test_failure(&desc, &diagnostic);
                Outcome::Error
            }
            Err(_) => {
                notifier.fire_test_failure(&desc, "execution agent closed the verdict channel");
                Outcome::Error
            }
        };

        notifier.fire_test_finished(&desc);
        Ok(outcome)
    }
}

/// A grouping block owning an ordered mix of spec and nested suite children.
#[derive(Debug)]
pub struct SuiteNode {
    name: String,
    raw: String,
    children: Vec<TestNode>,
    desc: Memoized<Description>,
}

impl SuiteNode {
    /// Build a suite node from a raw grouping block, recursively scanning its
    /// body for children. Drop policy matches [`SpecNode::parse`].
    pub fn parse(raw: &str, markers: &Markers) -> Result<Option<Self>, DiscoveryError> {
        let Some(name) = parse_display_name(raw, markers.suite)? else {
            debug!(block = %block_excerpt(raw), "dropping empty suite block");
            return Ok(None);
        };
        // Scan past the suite's own marker so it cannot match itself.
        let body = &raw[markers.suite.len()..];
        let children = collect_nodes(body, markers, &name)?;
        Ok(Some(Self {
            name,
            raw: raw.to_string(),
            children,
            desc: Memoized::new(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[TestNode] {
        &self.children
    }

    pub fn describe(&self, host: &HostSuite) -> Description {
        self.desc
            .get_or_compute(|| {
                Description::suite(
                    self.name.as_str(),
                    self.children.iter().map(|c| c.describe(host)).collect(),
                )
            })
            .clone()
    }

    /// Fire started, run each child depth-first in source order, fire
    /// finished. Pass/fail is only reported at spec granularity; the suite's
    /// own outcome is a roll-up of its children. When the execution channel
    /// becomes unreachable mid-suite, the remaining children are reported
    /// failed before the error propagates.
    pub fn run(
        &self,
        host: &HostSuite,
        notifier: &mut dyn RunNotifier,
        channel: &dyn ExecutionChannel,
    ) -> Result<Outcome, BridgeError> {
        let desc = self.describe(host);
        notifier.fire_test_started(&desc);
        let mut outcome = Outcome::Passed;
        for (i, child) in self.children.iter().enumerate() {
            match child.run(host, notifier, channel) {
                Ok(o) => outcome = outcome.merge(o),
                Err(e) => {
                    for rest in &self.children[i + 1..] {
                        rest.fail(host, notifier, &e.to_string());
                    }
                    notifier.fire_test_finished(&desc);
                    return Err(e);
                }
            }
        }
        notifier.fire_test_finished(&desc);
        Ok(outcome)
    }
}

/// Scan `text` for top-level suite and spec blocks and build nodes for them,
/// preserving source order across the two marker kinds. Leaf blocks that fall
/// inside a suite block belong to that suite and are not collected here.
pub(crate) fn collect_nodes(
    text: &str,
    markers: &Markers,
    parent_suite: &str,
) -> Result<Vec<TestNode>, DiscoveryError> {
    let suite_spans = blocks::find_block_spans(text, markers.suite)?;
    let spec_spans = blocks::find_block_spans(text, markers.spec)?;

    let mut found: Vec<(BlockSpan, bool)> = suite_spans.iter().map(|s| (*s, true)).collect();
    found.extend(
        spec_spans
            .iter()
            .filter(|s| !suite_spans.iter().any(|outer| s.is_within(outer)))
            .map(|s| (*s, false)),
    );
    found.sort_by_key(|(span, _)| span.start);

    let mut nodes = Vec::new();
    for (span, is_suite) in found {
        let raw = &text[span.start..span.end];
        let node = if is_suite {
            SuiteNode::parse(raw, markers)?.map(TestNode::Suite)
        } else {
            SpecNode::parse(raw, markers, parent_suite)?.map(TestNode::Spec)
        };
        if let Some(node) = node {
            nodes.push(node);
        }
    }
    Ok(nodes)
}

static NAME_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)'"#).expect("name literal pattern")
});

/// Extract a block's display name, applying the drop policy.
///
/// The name is the first quoted literal in the block header, the argument
/// text before the first top-level `{`; string literals deeper in the body
/// never name a block. `Ok(None)` means the block should be discarded (empty
/// arguments or empty name). `Err` means the block has content but no quoted
/// name literal in its header.
fn parse_display_name(raw: &str, marker: &str) -> Result<Option<String>, DiscoveryError> {
    let args = argument_region(raw, marker);
    if args.trim().is_empty() {
        return Ok(None);
    }
    let Some(caps) = NAME_LITERAL.captures(header_region(args)) else {
        return Err(DiscoveryError::MalformedDefinition {
            detail: "no quoted name literal before the block body".to_string(),
            block: block_excerpt(raw),
        });
    };
    let name = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or("");
    if name.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(name.to_string()))
}

/// The text between a block's outer delimiters.
fn argument_region<'a>(raw: &'a str, marker: &str) -> &'a str {
    let start = if marker.ends_with('(') || marker.ends_with('{') {
        marker.len()
    } else {
        raw[marker.len()..]
            .find(['(', '{'])
            .map(|i| marker.len() + i + 1)
            .unwrap_or(raw.len())
    };
    let end = raw.len().saturating_sub(1).max(start);
    &raw[start..end]
}

/// The argument text before the first `{` outside any string literal, or the
/// whole argument region when there is none.
fn header_region(args: &str) -> &str {
    let bytes = args.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => return &args[..i],
            quote @ (b'"' | b'\'') => match blocks::skip_string(bytes, i, quote) {
                Ok(next) => i = next,
                Err(_) => return args,
            },
            _ => i += 1,
        }
    }
    args
}

fn indent_lines(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        out.push_str(&pad);
        out.push_str(line);
        out.push('\n');
    }
    out
}
