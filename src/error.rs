//! Discovery-phase error taxonomy.
//!
//! All of these abort discovery for the whole host suite: the host framework
//! computes its description tree once, so a partial tree must never be
//! reported.

use crate::blocks::ParseError;

/// Error type for test discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Malformed block delimiters in a source; fatal to scanning that source.
    Parse(ParseError),
    /// A block with content but no quoted name literal.
    MalformedDefinition {
        /// What was wrong.
        detail: String,
        /// Leading text of the offending block.
        block: String,
    },
    /// A declared source could not be resolved to text.
    SourceResolution {
        /// The source identifier that failed.
        source: String,
        cause: std::io::Error,
    },
    /// The interpreter implementation could not be constructed.
    InterpreterCreation {
        detail: String,
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::Parse(e) => write!(f, "failed to scan source: {e}"),
            DiscoveryError::MalformedDefinition { detail, block } => {
                write!(f, "malformed test definition: {detail} in block {block:?}")
            }
            DiscoveryError::SourceResolution { source, cause } => {
                write!(f, "failed to resolve source {source:?}: {cause}")
            }
            DiscoveryError::InterpreterCreation { detail, cause } => {
                write!(f, "couldn't create interpreter: {detail}")?;
                if let Some(cause) = cause {
                    write!(f, " ({cause})")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::Parse(e) => Some(e),
            DiscoveryError::SourceResolution { cause, .. } => Some(cause),
            DiscoveryError::InterpreterCreation { cause, .. } => {
                cause.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
            }
            DiscoveryError::MalformedDefinition { .. } => None,
        }
    }
}

impl From<ParseError> for DiscoveryError {
    fn from(e: ParseError) -> Self {
        DiscoveryError::Parse(e)
    }
}

/// Truncate a block for error messages; full raw data can be large.
pub(crate) fn block_excerpt(block: &str) -> String {
    const MAX: usize = 60;
    if block.len() <= MAX {
        block.to_string()
    } else {
        let mut cut = MAX;
        while !block.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &block[..cut])
    }
}
