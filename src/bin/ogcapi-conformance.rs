//! OGC API Conformance CLI
//!
//! Command-line interface for validating OpenAPI documents against OGC API
//! conformance declarations.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ogcapi_conformance::{
    detect_families, group_by_spec, parse_conformance_classes, validate_structure,
    ConformanceClass, OpenApiVersion, Severity, StrategyRegistry, ValidateError,
    ValidationResult,
};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "ogcapi-conformance")]
#[command(about = "Validate OpenAPI documents against OGC API conformance classes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a document against its conformance declarations
    Validate {
        /// OpenAPI document (JSON file)
        document: PathBuf,

        /// Conformance declaration file (array of URIs or {"conformsTo": [...]})
        #[arg(long)]
        conformance: Option<PathBuf>,

        /// Conformance class URI (repeatable; overrides --conformance)
        #[arg(long, short = 'c')]
        class: Vec<String>,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Only report critical findings
        #[arg(long, short)]
        quiet: bool,
    },

    /// Check the core OpenAPI structure of a document
    Structure {
        /// OpenAPI document (JSON file)
        document: PathBuf,

        /// Expected OpenAPI version line (3.0 or 3.1)
        #[arg(long)]
        expected: Option<String>,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Parse a conformance declaration and group it by specification
    Classes {
        /// Conformance declaration file (array of URIs or {"conformsTo": [...]})
        conformance: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            document,
            conformance,
            class,
            json,
            quiet,
        } => run_validate(&document, conformance.as_deref(), &class, json, quiet),

        Commands::Structure {
            document,
            expected,
            json,
        } => run_structure(&document, expected.as_deref(), json),

        Commands::Classes { conformance, json } => run_classes(&conformance, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn load_json(path: &Path) -> Result<Value, ValidateError> {
    let content = std::fs::read_to_string(path).map_err(|source| ValidateError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn run_validate(
    document_path: &Path,
    conformance_path: Option<&Path>,
    class_uris: &[String],
    json_output: bool,
    quiet: bool,
) -> Result<(), u8> {
    let document = load_json(document_path).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let classes: Vec<ConformanceClass> = if !class_uris.is_empty() {
        class_uris.iter().map(|u| ConformanceClass::parse(u)).collect()
    } else if let Some(path) = conformance_path {
        let declaration = load_json(path).map_err(|e| {
            report_error(json_output, &e.to_string());
            e.exit_code() as u8
        })?;
        parse_conformance_classes(&declaration)
    } else {
        Vec::new()
    };

    let registry = StrategyRegistry::new();
    let result = registry.detect_and_validate(&document, &classes).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    report_result(&result, json_output, quiet)
}

fn run_structure(
    document_path: &Path,
    expected: Option<&str>,
    json_output: bool,
) -> Result<(), u8> {
    let expected = match expected {
        Some(value) => match OpenApiVersion::from_version(value) {
            Some(version) => Some(version),
            None => {
                report_error(json_output, &format!("unknown OpenAPI version line: {value}"));
                return Err(2);
            }
        },
        None => None,
    };

    let document = load_json(document_path).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let result = validate_structure(&document, expected).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    report_result(&result, json_output, false)
}

fn run_classes(conformance_path: &Path, json_output: bool) -> Result<(), u8> {
    let declaration = load_json(conformance_path).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let classes = parse_conformance_classes(&declaration);
    let families = detect_families(&classes);
    let grouped = group_by_spec(&classes);

    if json_output {
        let output: Vec<Value> = grouped
            .iter()
            .map(|(key, members)| {
                serde_json::json!({
                    "specification": key.to_string(),
                    "family": key.family,
                    "version": key.spec_version,
                    "part": key.part,
                    "classes": members,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({ "families": families, "specifications": output })
        );
    } else {
        if grouped.is_empty() {
            println!("No conformance classes recognized");
            return Ok(());
        }
        for (key, members) in &grouped {
            println!("{key}");
            for class in members {
                let marker = if class.is_core() { "*" } else { "-" };
                println!("  {marker} {} ({})", class.class_name(), class.uri());
            }
        }
    }

    Ok(())
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!(r#"{{"is_valid":false,"error":"{}"}}"#, msg);
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn report_result(result: &ValidationResult, json_output: bool, quiet: bool) -> Result<(), u8> {
    if json_output {
        match serde_json::to_string(result) {
            Ok(output) => println!("{output}"),
            Err(e) => {
                eprintln!("Error serializing output: {e}");
                return Err(2);
            }
        }
        return if result.is_valid { Ok(()) } else { Err(1) };
    }

    for finding in &result.errors {
        print_finding(finding);
    }
    if !quiet {
        for finding in &result.warnings {
            print_finding(finding);
        }
    }

    let summary = result.summary();
    if result.is_valid {
        if summary.total == 0 {
            println!("\x1b[32m✓ Valid\x1b[0m");
        } else {
            println!(
                "\x1b[32m✓ Valid\x1b[0m ({} warnings, {} info)",
                summary.warning, summary.info
            );
        }
        Ok(())
    } else {
        println!(
            "\x1b[31m✗ Invalid\x1b[0m ({} critical, {} warnings, {} info)",
            summary.critical, summary.warning, summary.info
        );
        Err(1)
    }
}

fn print_finding(finding: &ogcapi_conformance::Finding) {
    let (color, label) = match finding.severity {
        Severity::Critical => ("\x1b[31m", "critical"),
        Severity::Warning => ("\x1b[33m", "warning"),
        Severity::Info => ("\x1b[36m", "info"),
    };
    let class_note = finding
        .conformance_class
        .as_deref()
        .map(|c| format!(" [{c}]"))
        .unwrap_or_default();
    println!(
        "  {color}{label}\x1b[0m: {} - {}{class_note}",
        finding.path, finding.message
    );
}
