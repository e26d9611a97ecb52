//! Gate Engine (spec.md S4.8): combines per-axis passes into a release-
//! readiness verdict, with waiver suppression and before/after budget and
//! degradation checks.

pub mod stages;
pub mod waiver;

pub use stages::GateStage;
pub use waiver::WaiverRecord;

use crate::analyzer::cheese::CheeseReport;
use crate::classifier::ArchetypeTag;
use crate::SandwichResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerAxisPass {
    pub bread: bool,
    pub cheese: bool,
    pub ham: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateVerdict {
    pub passed: bool,
    pub stage: GateStage,
    pub per_axis_pass: PerAxisPass,
    pub violations: Vec<String>,
    pub waiver_applied: bool,
    pub waiver_ref: Option<WaiverRecord>,
    /// Non-fatal notes surfaced alongside the verdict -- e.g. a malformed
    /// `.waiver.json` that was ignored rather than failing the analysis
    /// (spec.md S7's "waiver-invalid" error taxonomy entry).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct BudgetTable {
    pub delta_cognitive: f64,
    pub delta_state_transitions: f64,
    pub delta_public_api: usize,
    pub breaking_allowed: bool,
}

fn budget_table(archetype: ArchetypeTag) -> BudgetTable {
    match archetype {
        ArchetypeTag::ApiExternal => BudgetTable {
            delta_cognitive: 5.0,
            delta_state_transitions: 1.0,
            delta_public_api: 0,
            breaking_allowed: false,
        },
        ArchetypeTag::ApiInternal => BudgetTable {
            delta_cognitive: 8.0,
            delta_state_transitions: 2.0,
            delta_public_api: 1,
            breaking_allowed: false,
        },
        ArchetypeTag::App => BudgetTable {
            delta_cognitive: 10.0,
            delta_state_transitions: 3.0,
            delta_public_api: 2,
            breaking_allowed: true,
        },
        ArchetypeTag::LibDomain => BudgetTable {
            delta_cognitive: 6.0,
            delta_state_transitions: 1.0,
            delta_public_api: 0,
            breaking_allowed: false,
        },
        ArchetypeTag::LibInfra => BudgetTable {
            delta_cognitive: 8.0,
            delta_state_transitions: 2.0,
            delta_public_api: 1,
            breaking_allowed: true,
        },
        ArchetypeTag::Deploy => BudgetTable {
            delta_cognitive: 10.0,
            delta_state_transitions: 3.0,
            delta_public_api: 2,
            breaking_allowed: true,
        },
        ArchetypeTag::Default => BudgetTable {
            delta_cognitive: 8.0,
            delta_state_transitions: 2.0,
            delta_public_api: 1,
            breaking_allowed: true,
        },
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetVerdict {
    pub within_budget: bool,
    pub delta_cognitive: f64,
    pub delta_state_transitions: f64,
    pub delta_public_api: usize,
    pub exceeded: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradationReport {
    pub indicators: Vec<String>,
    pub severity: String,
}

fn cheese_violations_for_stage(cheese: &CheeseReport, thresholds: &stages::StageThresholds) -> Vec<String> {
    if cheese.violations == ["parse failed"] {
        return vec!["parse-failed".to_string()];
    }
    let mut out = Vec::new();
    if cheese.adjusted_nesting > thresholds.nesting_max {
        out.push("nesting-exceeded".to_string());
    }
    if cheese
        .functions
        .iter()
        .any(|f| f.adjusted_concept_count > thresholds.concepts_per_fn)
    {
        out.push("concepts-exceeded".to_string());
    }
    if cheese.hidden_dependencies > thresholds.hidden_deps_max {
        out.push("hidden-deps-exceeded".to_string());
    }
    if cheese.state_async_retry.violated {
        out.push("sar-coexistence".to_string());
    }
    out
}

pub struct GateEngine;

impl GateEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn check_gate(
        &self,
        stage: GateStage,
        result: &SandwichResult,
        file_path: &Path,
        project_root: Option<&Path>,
    ) -> GateVerdict {
        let thresholds = stage.thresholds();
        let mut cheese_violations = cheese_violations_for_stage(&result.cheese, &thresholds);

        let mut bread_violations = Vec::new();
        let high_severity_secret = result.bread.secret_patterns.iter().any(|s| s.severity == "high");
        if high_severity_secret {
            bread_violations.push("secret-hardcoded".to_string());
        }
        let api_archetype = matches!(result.archetype, ArchetypeTag::ApiExternal | ArchetypeTag::ApiInternal);
        if api_archetype && result.bread.violations.iter().any(|v| v == "secret-leak") {
            bread_violations.push("secret-leak".to_string());
        }
        if result.archetype == ArchetypeTag::ApiExternal
            && result.bread.violations.iter().any(|v| v == "auth-missing")
        {
            bread_violations.push("auth-missing".to_string());
        }

        let mut ham_violations = Vec::new();
        if !result.ham.untested_critical_paths.is_empty() {
            ham_violations.push("critical-path-untested".to_string());
        }
        if result.ham.golden_test_coverage < thresholds.golden_test_min {
            ham_violations.push("coverage-below-threshold".to_string());
        }

        let today = chrono::Local::now().date_naive();
        let mut waiver_applied = false;
        let mut waiver_ref = None;
        let mut advisories = Vec::new();

        if thresholds.allows_waiver {
            match waiver::discover(file_path, project_root) {
                Ok(Some(waivers)) => {
                    let overage = result
                        .cheese
                        .functions
                        .iter()
                        .map(|f| f.adjusted_concept_count - thresholds.concepts_per_fn)
                        .fold(0.0_f64, f64::max);
                    let match_path = waiver::relative_to_root(file_path, project_root);
                    if let Some(active) = waiver::find_active(&waivers, &match_path, today) {
                        if active.eligible_for(overage, today) {
                            cheese_violations.retain(|v| v != "nesting-exceeded" && v != "concepts-exceeded");
                            waiver_applied = true;
                            waiver_ref = Some(active.clone());
                        }
                    }
                }
                Ok(None) => {}
                // Malformed JSON, unknown schema version, etc.: ignored, not
                // surfaced as an error (spec.md S7) -- analysis proceeds as
                // if no waiver existed, but the verdict carries a note.
                Err(e) => advisories.push(format!("waiver-invalid: {e}")),
            }
        }

        let cheese_pass = cheese_violations.is_empty();
        let bread_pass = bread_violations.is_empty();
        let ham_pass = ham_violations.is_empty();

        let mut violations = Vec::new();
        violations.extend(cheese_violations);
        violations.extend(bread_violations);
        violations.extend(ham_violations);

        GateVerdict {
            passed: cheese_pass && bread_pass && ham_pass,
            stage,
            per_axis_pass: PerAxisPass {
                bread: bread_pass,
                cheese: cheese_pass,
                ham: ham_pass,
            },
            violations,
            waiver_applied,
            waiver_ref,
            advisories,
        }
    }

    pub fn check_budget(&self, before: &SandwichResult, after: &SandwichResult, archetype: ArchetypeTag) -> BudgetVerdict {
        let table = budget_table(archetype);

        let delta_cognitive = (after.cheese.score() - before.cheese.score()).abs();
        let delta_state_transitions = (state_signal(&after.cheese) - state_signal(&before.cheese)).abs();
        let delta_public_api =
            (after.ham.critical_paths.len() as i64 - before.ham.critical_paths.len() as i64).unsigned_abs() as usize;

        let mut exceeded = Vec::new();
        if delta_cognitive > table.delta_cognitive {
            exceeded.push("cognitive".to_string());
        }
        if delta_state_transitions > table.delta_state_transitions {
            exceeded.push("state-transitions".to_string());
        }
        if delta_public_api > table.delta_public_api && !table.breaking_allowed {
            exceeded.push("public-api".to_string());
        }

        BudgetVerdict {
            within_budget: exceeded.is_empty(),
            delta_cognitive,
            delta_state_transitions,
            delta_public_api,
            exceeded,
        }
    }

    pub fn check_degradation(&self, before: &CheeseReport, after: &CheeseReport) -> DegradationReport {
        let mut indicators = Vec::new();
        if before.accessible && !after.accessible {
            indicators.push("accessibility-dropped".to_string());
        }
        if after.max_nesting > before.max_nesting {
            indicators.push("nesting-increased".to_string());
        }
        if after.hidden_dependencies > before.hidden_dependencies {
            indicators.push("hidden-deps-increased".to_string());
        }
        if !before.state_async_retry.violated && after.state_async_retry.violated {
            indicators.push("sar-newly-violated".to_string());
        }
        if after.violations.len() > before.violations.len() {
            indicators.push("violations-increased".to_string());
        }

        let severity = if (before.accessible && !after.accessible) || indicators.len() >= 3 {
            "severe"
        } else if indicators.len() == 2 {
            "moderate"
        } else if indicators.len() == 1 {
            "mild"
        } else {
            "none"
        };

        DegradationReport {
            indicators,
            severity: severity.to_string(),
        }
    }
}

impl Default for GateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn state_signal(cheese: &CheeseReport) -> f64 {
    if cheese.state_async_retry.has_state {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze_sandwich;
    use std::path::Path;

    #[test]
    fn trivial_function_passes_mvp() {
        let result = analyze_sandwich("function add(a,b){ return a+b; }", Path::new("src/lib/math.ts"));
        let verdict = GateEngine::new().check_gate(GateStage::Mvp, &result, Path::new("src/lib/math.ts"), None);
        assert!(verdict.passed);
    }

    #[test]
    fn six_nested_ifs_pass_poc_fail_mvp() {
        let mut src = String::from("function f(x) {\n");
        for _ in 0..6 {
            src.push_str("if (x) {\n");
        }
        for _ in 0..6 {
            src.push_str("}\n");
        }
        src.push_str("}\n");
        let result = analyze_sandwich(&src, Path::new("src/lib/deep.ts"));
        let poc = GateEngine::new().check_gate(GateStage::PoC, &result, Path::new("src/lib/deep.ts"), None);
        let mvp = GateEngine::new().check_gate(GateStage::Mvp, &result, Path::new("src/lib/deep.ts"), None);
        assert!(poc.passed);
        assert!(!mvp.passed);
        assert!(mvp.violations.contains(&"nesting-exceeded".to_string()));
    }

    #[test]
    fn waiver_applies_only_at_production() {
        let result = analyze_sandwich("function add(a,b){ return a+b; }", Path::new("src/crypto/aes.ts"));
        let mvp = GateEngine::new().check_gate(GateStage::Mvp, &result, Path::new("src/crypto/aes.ts"), None);
        let prod = GateEngine::new().check_gate(GateStage::Production, &result, Path::new("src/crypto/aes.ts"), None);
        assert!(!mvp.waiver_applied);
        assert!(!prod.waiver_applied); // no .waiver.json present on disk in this test
    }

    #[test]
    fn malformed_waiver_file_is_ignored_with_advisory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(".waiver.json"), "{ not json }").unwrap();
        let file_path = dir.path().join("src/crypto/aes.ts");
        std::fs::create_dir_all(file_path.parent().unwrap()).unwrap();

        let result = analyze_sandwich("function add(a,b){ return a+b; }", &file_path);
        let verdict = GateEngine::new().check_gate(GateStage::Production, &result, &file_path, Some(dir.path()));

        assert!(!verdict.waiver_applied);
        assert!(verdict.advisories.iter().any(|a| a.contains("waiver-invalid")));
    }

    #[test]
    fn waiver_matches_absolute_file_path_rebased_to_project_root() {
        // Reproduces the two natural CLI invocation shapes (`sandwich .` and
        // `sandwich /abs/path/to/proj`): file_path and project_root are both
        // absolute, and the waiver pattern is written relative to the root.
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".waiver.json"),
            r#"{"version":"1.0","waivers":[{"pattern":"src/crypto/*.ts","adr":"ADR-007","justification":"AES core","approvedAt":"2025-01-15","expiresAt":"2026-12-31","approver":"sec"}]}"#,
        )
        .unwrap();
        let file_path = dir.path().join("src/crypto/aes.ts");
        std::fs::create_dir_all(file_path.parent().unwrap()).unwrap();

        let mut src = String::from("function f(x) {\n");
        for _ in 0..5 {
            src.push_str("if (x) {\n");
        }
        for _ in 0..5 {
            src.push_str("}\n");
        }
        src.push_str("}\n");

        let result = analyze_sandwich(&src, &file_path);
        let verdict = GateEngine::new().check_gate(GateStage::Production, &result, &file_path, Some(dir.path()));

        assert!(verdict.waiver_applied);
        assert_eq!(verdict.waiver_ref.as_ref().unwrap().adr, "ADR-007");
        assert!(!verdict.violations.contains(&"nesting-exceeded".to_string()));
    }

    #[test]
    fn degradation_symmetry_none_when_unchanged() {
        use crate::analyzer::cheese::{CheeseAnalyzer, CheeseConfig};
        let src = "function add(a,b){ return a+b; }";
        let t = crate::tree::parse(crate::Language::TypeScript, src);
        let report = CheeseAnalyzer::new(CheeseConfig::default()).analyze(&t, src);
        let degradation = GateEngine::new().check_degradation(&report, &report);
        assert_eq!(degradation.severity, "none");
        assert!(degradation.indicators.is_empty());
    }
}
