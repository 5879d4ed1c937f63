use clap::{Parser, Subcommand, ValueEnum};
use jstest::config::{self, HarnessConfig};
use jstest::description::Description;
use jstest::interpreter::HostSuite;
use jstest::master::MasterTest;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Human-readable suite/spec tree
    #[default]
    Human,
    /// Machine-readable JSON output
    Json,
}

#[derive(Parser)]
#[command(name = "jstest")]
#[command(about = "Discovers browser-script test suites and reports their structure")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover test definitions and print the suite/spec tree
    Scan {
        /// Path to test scripts (file or directory)
        path: PathBuf,
        /// Output format
        #[arg(short, long, default_value = "human")]
        output: OutputFormat,
    },
    /// Check that test sources scan cleanly without running them
    Validate {
        /// Path to test scripts (file or directory)
        path: PathBuf,
    },
    /// Scaffold a new harness config file
    Init {
        /// Output path for the new config file
        #[arg(default_value = "jstest.yaml")]
        path: PathBuf,
    },
    /// Output the harness config schema
    Schema,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan { path, output } => {
            let master = discover(&path);
            match output {
                OutputFormat::Human => {
                    let desc = master.describe();
                    println!("{}", desc.display_name());
                    for child in desc.children() {
                        print_tree(child, 1);
                    }
                    println!("\n{} spec(s) discovered", count_specs(&desc));
                }
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&master.describe())
                        .expect("Failed to serialize");
                    println!("{json}");
                }
            }
        }
        Command::Validate { path } => {
            let sources = find_sources_or_exit(&path);
            let config = load_config_or_exit(&path);
            let interpreter = create_interpreter_or_exit(&config);

            let mut errors = 0;
            for source in &sources {
                let host = HostSuite::new(source.display().to_string()).with_file(source);
                match MasterTest::new(host, &interpreter, config.inject_libs.clone()) {
                    Ok(master) => {
                        let specs = count_specs(&master.describe());
                        println!("✓ {} ({specs} specs)", source.display());
                    }
                    Err(e) => {
                        eprintln!("✗ {}: {e}", source.display());
                        errors += 1;
                    }
                }
            }

            if errors > 0 {
                eprintln!("\n{errors} source(s) failed validation");
                std::process::exit(1);
            }
            println!("\nAll {} source(s) valid", sources.len());
        }
        Command::Init { path } => {
            let template = r#"version: 1

# Base path the content server serves test resources from.
# resource_base: web/assets

interpreter:
  kind: jasmine
  library_files:
    - lib/jasmine.js

# External libraries injected into the agent before every source runs.
# inject_libs:
#   - lib/sinon.js
"#;
            if path.exists() {
                eprintln!("Error: file already exists: {}", path.display());
                std::process::exit(1);
            }
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
                && let Err(e) = fs::create_dir_all(parent)
            {
                eprintln!("Error creating directory: {e}");
                std::process::exit(1);
            }
            if let Err(e) = fs::write(&path, template) {
                eprintln!("Error writing file: {e}");
                std::process::exit(1);
            }
            println!("Created: {}", path.display());
        }
        Command::Schema => {
            let schema = config::generate_schema();
            let json = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema");
            println!("{json}");
        }
    }
}

/// Discover everything under `path` as one host suite, exiting on error.
fn discover(path: &Path) -> MasterTest {
    let sources = find_sources_or_exit(path);
    let config = load_config_or_exit(path);
    let interpreter = create_interpreter_or_exit(&config);

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("jstest")
        .to_string();
    let mut host = HostSuite::new(name);
    for source in sources {
        host = host.with_file(source);
    }

    match MasterTest::new(host, &interpreter, config.inject_libs.clone()) {
        Ok(master) => master,
        Err(e) => {
            eprintln!("Error discovering tests: {e}");
            std::process::exit(1);
        }
    }
}

fn find_sources_or_exit(path: &Path) -> Vec<PathBuf> {
    let sources = match config::find_sources(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error finding sources: {e}");
            std::process::exit(1);
        }
    };
    if sources.is_empty() {
        eprintln!("No test scripts found at: {}", path.display());
        std::process::exit(1);
    }
    sources
}

fn load_config_or_exit(path: &Path) -> HarnessConfig {
    let root = if path.is_file() {
        path.parent().unwrap_or(path)
    } else {
        path
    };
    match config::load_dir_config(root) {
        Ok(Some(config)) => config,
        Ok(None) => HarnessConfig::default(),
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    }
}

fn create_interpreter_or_exit(config: &HarnessConfig) -> jstest::ScriptInterpreter {
    match config::create_interpreter(config) {
        Ok(interpreter) => interpreter,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_tree(desc: &Description, depth: usize) {
    let indent = "  ".repeat(depth);
    if desc.is_leaf() {
        println!("{indent}• {}", desc.display_name());
    } else {
        println!("{indent}{}", desc.display_name());
        for child in desc.children() {
            print_tree(child, depth + 1);
        }
    }
}

fn count_specs(desc: &Description) -> usize {
    if desc.is_leaf() {
        1
    } else {
        desc.children().iter().map(count_specs).sum()
    }
}
