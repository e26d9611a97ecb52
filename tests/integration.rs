//! Integration tests: the full sandwich pipeline end to end -- classification,
//! the bread/cheese/ham triple, the simplex label, gate verdicts, and
//! recommendations -- exercised through `analyze_sandwich`/`check_gate`
//! rather than any single analyzer module in isolation.

use sandwich::gate::GateStage;
use sandwich::{analyze_sandwich, check_gate, classifier, ArchetypeTag, DominantLabel};
use std::path::Path;

#[test]
fn trivial_function_is_well_formed_and_near_default_archetype() {
    let src = "function add(a, b) { return a + b; }";
    let result = analyze_sandwich(src, Path::new("src/util/math.ts"));

    assert!(result.raw.bread >= 0.0);
    assert!(result.raw.cheese >= 0.0);
    assert!(result.raw.ham >= 0.0);
    assert!((result.simplex.bread + result.simplex.cheese + result.simplex.ham - 1.0).abs() < 1e-6);
}

#[test]
fn api_external_path_is_classified_and_flows_into_the_result() {
    let src = "export function handler(req, res) { res.send(200); }";
    let result = analyze_sandwich(src, Path::new("src/api/external/handler.ts"));
    assert_eq!(result.archetype, ArchetypeTag::ApiExternal);
    assert_eq!(classifier::classify(Path::new("src/api/external/handler.ts")), ArchetypeTag::ApiExternal);
}

#[test]
fn hardcoded_secret_pushes_the_bread_score_up_and_surfaces_a_recommendation() {
    let clean = "export function handler(req, res) { res.send(200); }";
    let leaky = "const API_KEY = \"sk_live_ABC123\";\nexport function handler(req, res) { console.log(API_KEY); res.send(200); }";

    let clean_result = analyze_sandwich(clean, Path::new("src/api/external/handler.ts"));
    let leaky_result = analyze_sandwich(leaky, Path::new("src/api/external/handler.ts"));

    assert!(
        leaky_result.raw.bread > clean_result.raw.bread,
        "leaky ({}) should score higher on bread than clean ({})",
        leaky_result.raw.bread,
        clean_result.raw.bread
    );
}

#[test]
fn deeply_nested_function_fails_mvp_gate_on_cheese_and_passes_poc() {
    let mut src = String::from("function f(x) {\n");
    for _ in 0..6 {
        src.push_str("if (x) {\n");
    }
    for _ in 0..6 {
        src.push_str("}\n");
    }
    src.push_str("}\n");

    let result = analyze_sandwich(&src, Path::new("src/app/deep.ts"));
    let mvp_verdict = check_gate(&src, GateStage::Mvp, Path::new("src/app/deep.ts"), None);
    let poc_verdict = check_gate(&src, GateStage::PoC, Path::new("src/app/deep.ts"), None);

    assert!(!mvp_verdict.passed, "deep nesting should fail the mvp gate: {:?}", mvp_verdict.violations);
    assert!(poc_verdict.passed, "poc gate should tolerate deep nesting while bootstrapping");
    assert!(result.raw.cheese > 0.0);
}

#[test]
fn default_archetype_for_unmatched_path() {
    let result = analyze_sandwich("function f() {}", Path::new("README_helper.ts"));
    assert_eq!(result.archetype, ArchetypeTag::Default);
}

#[test]
fn recommendations_target_the_most_deviated_axis() {
    let mut src = String::from("function f(x) {\n");
    for _ in 0..8 {
        src.push_str("if (x) {\n");
    }
    for _ in 0..8 {
        src.push_str("}\n");
    }
    src.push_str("}\n");

    let result = analyze_sandwich(&src, Path::new("src/app/deep.ts"));
    assert!(!result.recommendations.is_empty(), "a heavily-deviated file should get recommendations");
}

#[test]
fn label_and_confidence_are_well_formed() {
    let result = analyze_sandwich("function add(a, b) { return a + b; }", Path::new("src/lib/math.ts"));
    assert!(result.confidence >= 0.0 && result.confidence <= 1.0);
    let _: DominantLabel = result.label;
}

#[test]
fn python_and_go_sources_classify_and_analyze_without_divergence_in_shape() {
    let py_result = analyze_sandwich("def add(a, b):\n    return a + b\n", Path::new("src/lib/math.py"));
    let go_result = analyze_sandwich(
        "package main\n\nfunc add(a, b int) int {\n\treturn a + b\n}\n",
        Path::new("src/lib/math.go"),
    );
    assert!(py_result.raw.bread >= 0.0 && py_result.raw.cheese >= 0.0 && py_result.raw.ham >= 0.0);
    assert!(go_result.raw.bread >= 0.0 && go_result.raw.cheese >= 0.0 && go_result.raw.ham >= 0.0);
}

#[test]
fn gate_violations_report_is_non_empty_when_gate_fails() {
    let mut src = String::from("function f(x) {\n");
    for _ in 0..6 {
        src.push_str("if (x) {\n");
    }
    for _ in 0..6 {
        src.push_str("}\n");
    }
    src.push_str("}\n");
    let verdict = check_gate(&src, GateStage::Production, Path::new("src/app/deep.ts"), None);
    assert!(!verdict.passed);
    assert!(!verdict.violations.is_empty());
}
