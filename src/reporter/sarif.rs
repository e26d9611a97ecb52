//! SARIF 2.1.0 rendering for GitHub Code Scanning, grounded in the teacher's
//! `SarifReporter`. Gate violation codes stand in for the teacher's `Rule`
//! enum: each code gets a fixed rule definition (id, description, default
//! severity level) and one `SarifResult` per `(file, violation)` pair.

use crate::gate::GateVerdict;
use crate::SandwichResult;
use serde::Serialize;
use std::path::Path;

const SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const VERSION: &str = "2.1.0";
const DRIVER_NAME: &str = "sandwich";
const INFORMATION_URI: &str = "https://github.com/example/sandwich";

#[derive(Debug, Serialize)]
struct SarifLog {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifDriver {
    name: String,
    version: String,
    information_uri: String,
    rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRule {
    id: String,
    short_description: SarifMessage,
    full_description: SarifMessage,
    default_configuration: SarifDefaultConfig,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifDefaultConfig {
    level: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: SarifArtifactLocation,
    region: SarifRegion,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    start_line: usize,
    start_column: usize,
}

/// Fixed rule catalog: every violation code the gate engine can emit, in the
/// order `GateEngine::check_gate` appends them (cheese, then bread, then
/// ham), plus `parse-failed`.
fn rule_catalog() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("parse-failed", "Source file failed to parse", "error"),
        ("nesting-exceeded", "Logic nesting depth exceeds the stage threshold", "warning"),
        ("concepts-exceeded", "A function's concept count exceeds the stage threshold", "warning"),
        ("hidden-deps-exceeded", "Hidden I/O dependencies exceed the stage threshold", "warning"),
        ("sar-coexistence", "State, async, and retry logic coexist in one scope", "error"),
        ("secret-hardcoded", "A hardcoded secret-shaped literal was found", "error"),
        ("secret-leak", "A secret-shaped value is passed to a logging/network call", "error"),
        ("auth-missing", "An external API surface has no explicit auth-flow declaration", "error"),
        ("critical-path-untested", "A critical-path symbol has no golden test coverage", "warning"),
        ("coverage-below-threshold", "Golden-test coverage is below the stage minimum", "warning"),
    ]
}

fn level_for(rule_id: &str) -> String {
    rule_catalog()
        .into_iter()
        .find(|(id, _, _)| *id == rule_id)
        .map(|(_, _, level)| level.to_string())
        .unwrap_or_else(|| "warning".to_string())
}

fn path_to_uri(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

pub struct SarifReporter;

impl SarifReporter {
    pub fn new() -> Self {
        Self
    }

    /// One pair per analyzed file: its full result (for the file path) and
    /// the gate verdict that was checked against it.
    pub fn report(&self, pairs: &[(SandwichResult, GateVerdict)]) -> String {
        let rules = rule_catalog()
            .into_iter()
            .map(|(id, desc, level)| SarifRule {
                id: id.to_string(),
                short_description: SarifMessage { text: desc.to_string() },
                full_description: SarifMessage { text: desc.to_string() },
                default_configuration: SarifDefaultConfig { level: level.to_string() },
            })
            .collect();

        let mut results = Vec::new();
        for (result, verdict) in pairs {
            for violation in &verdict.violations {
                results.push(SarifResult {
                    rule_id: violation.clone(),
                    level: level_for(violation),
                    message: SarifMessage {
                        text: format!("{} violates {} at gate stage {:?}", result.file_path.display(), violation, verdict.stage),
                    },
                    locations: vec![SarifLocation {
                        physical_location: SarifPhysicalLocation {
                            artifact_location: SarifArtifactLocation { uri: path_to_uri(&result.file_path) },
                            region: SarifRegion { start_line: 1, start_column: 1 },
                        },
                    }],
                });
            }
        }

        let log = SarifLog {
            schema: SCHEMA.to_string(),
            version: VERSION.to_string(),
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: DRIVER_NAME.to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                        information_uri: INFORMATION_URI.to_string(),
                        rules,
                    },
                },
                results,
            }],
        };

        serde_json::to_string_pretty(&log).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for SarifReporter {
    fn default() -> Self {
        Self::new()
    }
}
