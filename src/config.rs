//! Harness configuration.
//!
//! The configuration surface the embedding framework attaches to a host
//! suite: where served content lives, which interpreter dialect to use,
//! which library files to load, and which external libraries to inject.
//! Loaded from `jstest.yaml` (or a `.toml` equivalent).

use crate::error::DiscoveryError;
use crate::interpreter::ScriptInterpreter;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The name of the harness configuration file.
pub const CONFIG_FILENAME: &str = "jstest.yaml";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum LoadError {
    /// Failed to read the file.
    Io(std::io::Error),
    /// Failed to parse YAML.
    Yaml(serde_yaml::Error),
    /// Failed to parse TOML.
    Toml(toml::de::Error),
    /// Unsupported file extension.
    UnsupportedFormat(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "failed to read file: {e}"),
            LoadError::Yaml(e) => write!(f, "invalid YAML: {e}"),
            LoadError::Toml(e) => write!(f, "invalid TOML: {e}"),
            LoadError::UnsupportedFormat(ext) => {
                write!(f, "unsupported file format: {ext} (expected .yaml, .yml, or .toml)")
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Root configuration for a harness run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct HarnessConfig {
    /// Schema version (must match crate major version).
    #[serde(default = "default_version")]
    pub version: u32,

    /// Base path the content server serves test resources from.
    #[serde(default)]
    pub resource_base: Option<PathBuf>,

    /// Interpreter selection and its library files.
    #[serde(default)]
    pub interpreter: InterpreterConfig,

    /// External libraries injected into the agent before every source runs.
    #[serde(default)]
    pub inject_libs: Vec<String>,
}

fn default_version() -> u32 {
    1
}

/// Which interpreter implementation resolves and scans test sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InterpreterConfig {
    /// The marker dialect the test sources use.
    #[serde(default)]
    pub kind: InterpreterKind,

    /// Explicit library file paths to load before test sources.
    /// A single empty-string element is the documented "none provided"
    /// sentinel and is equivalent to an empty list.
    #[serde(default)]
    pub library_files: Vec<String>,
}

impl InterpreterConfig {
    /// Library files with the `[""]` sentinel filtered out.
    pub fn effective_library_files(&self) -> Vec<PathBuf> {
        self.library_files
            .iter()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect()
    }
}

/// Supported interpreter dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InterpreterKind {
    #[default]
    Jasmine,
    Qunit,
}

/// Load a harness config from a file path.
pub fn load_config(path: &Path) -> Result<HarnessConfig, LoadError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let contents = std::fs::read_to_string(path).map_err(LoadError::Io)?;

    match ext {
        "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(LoadError::Yaml),
        "toml" => toml::from_str(&contents).map_err(LoadError::Toml),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

/// Load the harness config from a directory.
///
/// Looks for `jstest.yaml` in the given directory.
/// Returns `None` if the file doesn't exist, `Err` if it exists but is invalid.
pub fn load_dir_config(dir: &Path) -> Result<Option<HarnessConfig>, LoadError> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&config_path).map_err(LoadError::Io)?;
    let config: HarnessConfig = serde_yaml::from_str(&contents).map_err(LoadError::Yaml)?;
    Ok(Some(config))
}

/// Construct the interpreter selected by the config.
///
/// Verifies the configured library files exist up front; a missing library
/// surfaces as an interpreter creation error with the root cause attached.
pub fn create_interpreter(config: &HarnessConfig) -> Result<ScriptInterpreter, DiscoveryError> {
    let libs = config.interpreter.effective_library_files();
    for lib in &libs {
        if !lib.exists() {
            return Err(DiscoveryError::InterpreterCreation {
                detail: format!("library file not found: {}", lib.display()),
                cause: None,
            });
        }
    }
    Ok(match config.interpreter.kind {
        InterpreterKind::Jasmine => ScriptInterpreter::jasmine(libs),
        InterpreterKind::Qunit => ScriptInterpreter::qunit(libs),
    })
}

/// Find all test script files in a directory or return the single file.
pub fn find_sources(path: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut sources = Vec::new();
    collect_sources_recursive(path, &mut sources)?;
    sources.sort();
    Ok(sources)
}

fn collect_sources_recursive(
    dir: &Path,
    sources: &mut Vec<PathBuf>,
) -> Result<(), std::io::Error> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_sources_recursive(&path, sources)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("js") {
            sources.push(path);
        }
    }
    Ok(())
}

/// Generate the JSON schema for the harness config.
pub fn generate_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(HarnessConfig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_minimal_config() {
        let yaml = "version: 1\n";
        let config: HarnessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.interpreter.kind, InterpreterKind::Jasmine);
        assert!(config.inject_libs.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
version: 1
resource_base: web/assets
interpreter:
  kind: qunit
  library_files:
    - lib/qunit.js
inject_libs:
  - lib/sinon.js
"#;
        let config: HarnessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.resource_base, Some(PathBuf::from("web/assets")));
        assert_eq!(config.interpreter.kind, InterpreterKind::Qunit);
        assert_eq!(config.interpreter.library_files, vec!["lib/qunit.js"]);
        assert_eq!(config.inject_libs, vec!["lib/sinon.js"]);
    }

    #[test]
    fn empty_string_sentinel_means_no_libraries() {
        let yaml = r#"
version: 1
interpreter:
  library_files: [""]
"#;
        let config: HarnessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.interpreter.library_files, vec![""]);
        assert!(config.interpreter.effective_library_files().is_empty());
    }

    #[test]
    fn load_valid_toml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jstest.toml");
        std::fs::write(
            &path,
            r#"
version = 1

[interpreter]
kind = "jasmine"
library_files = ["lib/jasmine.js"]
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.interpreter.library_files, vec!["lib/jasmine.js"]);
    }

    #[test]
    fn unsupported_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jstest.txt");
        std::fs::write(&path, "").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(LoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn load_dir_config_not_found() {
        let dir = tempdir().unwrap();
        let result = load_dir_config(dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_dir_config_invalid() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "invalid: [yaml: {").unwrap();

        let result = load_dir_config(dir.path());
        assert!(matches!(result, Err(LoadError::Yaml(_))));
    }

    #[test]
    fn find_sources_in_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "").unwrap();
        std::fs::write(dir.path().join("b.js"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.js"), "").unwrap();

        let sources = find_sources(dir.path()).unwrap();
        assert_eq!(sources.len(), 3);
        assert!(sources.iter().all(|p| p.extension().unwrap() == "js"));
    }

    #[test]
    fn create_interpreter_missing_library_fails() {
        let config: HarnessConfig = serde_yaml::from_str(
            r#"
version: 1
interpreter:
  library_files: ["/nonexistent/jasmine.js"]
"#,
        )
        .unwrap();

        let result = create_interpreter(&config);
        assert!(matches!(
            result,
            Err(DiscoveryError::InterpreterCreation { .. })
        ));
    }

    #[test]
    fn create_interpreter_selects_dialect() {
        let config: HarnessConfig =
            serde_yaml::from_str("version: 1\ninterpreter:\n  kind: qunit\n").unwrap();
        let interpreter = create_interpreter(&config).unwrap();
        assert_eq!(
            crate::interpreter::SourceInterpreter::markers(&interpreter).suite,
            "module("
        );
    }

    #[test]
    fn schema_generates() {
        let schema = generate_schema();
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("library_files"));
    }
}
