//! Source interpreter abstraction.
//!
//! An interpreter knows how to turn a host suite's declared source references
//! into script text, which libraries to load before those scripts run, and
//! which marker dialect the scripts are written in.

use crate::error::DiscoveryError;
use crate::node::{JASMINE_MARKERS, Markers, QUNIT_MARKERS};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// A scripting-language source declared on a host suite.
#[derive(Debug, Clone)]
pub enum SourceRef {
    /// A test script on disk.
    File(PathBuf),
    /// An inline source carried directly by the host suite.
    Inline { key: String, text: String },
}

/// The host test suite the discovered tree is reported under: a stable name
/// plus the ordered source references declared on it.
#[derive(Debug, Clone)]
pub struct HostSuite {
    name: String,
    sources: Vec<SourceRef>,
}

impl HostSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(SourceRef::File(path.into()));
        self
    }

    pub fn with_inline(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.sources.push(SourceRef::Inline {
            key: key.into(),
            text: text.into(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> &[SourceRef] {
        &self.sources
    }
}

/// Resolves a host suite's sources to text and supplies the library context
/// the execution agent needs before running them.
pub trait SourceInterpreter {
    /// Resolve every declared source to its text, keyed by source id, in
    /// declaration order. Declaration order becomes execution order.
    fn resolve(&self, host: &HostSuite) -> Result<IndexMap<String, String>, DiscoveryError>;

    /// Library files the execution agent must load before any test source.
    fn library_paths(&self) -> &[PathBuf];

    /// The marker dialect this interpreter's sources use.
    fn markers(&self) -> Markers;
}

/// The built-in interpreter for file and inline sources in a fixed dialect.
#[derive(Debug)]
pub struct ScriptInterpreter {
    markers: Markers,
    library_files: Vec<PathBuf>,
}

impl ScriptInterpreter {
    pub fn new(markers: Markers, library_files: Vec<PathBuf>) -> Self {
        Self {
            markers,
            library_files,
        }
    }

    /// Jasmine dialect (`describe(` / `it(`).
    pub fn jasmine(library_files: Vec<PathBuf>) -> Self {
        Self::new(JASMINE_MARKERS, library_files)
    }

    /// QUnit dialect (`module(` / `test(`).
    pub fn qunit(library_files: Vec<PathBuf>) -> Self {
        Self::new(QUNIT_MARKERS, library_files)
    }
}

impl SourceInterpreter for ScriptInterpreter {
    fn resolve(&self, host: &HostSuite) -> Result<IndexMap<String, String>, DiscoveryError> {
        let mut sources = IndexMap::new();
        for source in host.sources() {
            match source {
                SourceRef::File(path) => {
                    let text = read_source(path)?;
                    sources.insert(path.display().to_string(), text);
                }
                SourceRef::Inline { key, text } => {
                    sources.insert(key.clone(), text.clone());
                }
            }
        }
        Ok(sources)
    }

    fn library_paths(&self) -> &[PathBuf] {
        &self.library_files
    }

    fn markers(&self) -> Markers {
        self.markers
    }
}

fn read_source(path: &Path) -> Result<String, DiscoveryError> {
    std::fs::read_to_string(path).map_err(|cause| DiscoveryError::SourceResolution {
        source: path.display().to_string(),
        cause,
    })
}
