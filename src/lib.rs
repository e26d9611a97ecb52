//! Sandwich: a static code-complexity analyzer scoring source files along
//! three orthogonal quality axes -- structural-security (bread), cognitive
//! accessibility (cheese), and behavioral-preservation (ham) -- and deciding
//! whether a file passes a release-readiness gate.
//!
//! This library provides the analysis pipeline only: parsing is delegated to
//! language-specific [`tree`] adapters, and physical persistence (waiver
//! files, project config, the result cache) is read/written via `std::fs`
//! but never embeds a network or process boundary.

pub mod analyzer;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod gate;
pub mod history;
pub mod mcp;
pub mod recommender;
pub mod reporter;
pub mod simplex;
pub mod tree;
pub mod watcher;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use analyzer::bread::BreadReport;
pub use analyzer::cheese::CheeseReport;
pub use analyzer::ham::HamReport;
pub use classifier::ArchetypeTag;
pub use gate::waiver::WaiverRecord;
pub use gate::{GateStage, GateVerdict};
pub use recommender::Recommendation;
pub use simplex::{CanonicalDeviation, DominantLabel, SimplexPoint};

/// Errors that can surface from a public entry point in this crate.
///
/// Analyzers themselves never throw across their boundary (spec.md S7): a
/// parse failure becomes a single-entry violations list, not an `Err`. This
/// enum covers the smaller set of conditions that *are* fatal to a request:
/// missing input, an unreadable file, or a malformed on-disk store.
#[derive(Debug, Error)]
pub enum SandwichError {
    #[error("unknown archetype: {0}")]
    UnknownArchetype(String),
    #[error("unknown gate stage: {0}")]
    UnknownGateStage(String),
    #[error("failed to read source file {path}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed waiver file {path}")]
    MalformedWaiver {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw, per-axis analyzer output. Magnitudes are comparable within one axis
/// across files but not across languages or across axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTriple {
    pub bread: f64,
    pub cheese: f64,
    pub ham: f64,
}

impl RawTriple {
    pub fn total(&self) -> f64 {
        self.bread + self.cheese + self.ham
    }
}

/// The full result of analyzing one source file: raw triple, normalized
/// simplex coordinate, archetype, deviation, label, gate-independent
/// recommendations. This is the payload `analyze_sandwich` returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandwichResult {
    pub file_path: PathBuf,
    pub raw: RawTriple,
    pub bread: BreadReport,
    pub cheese: CheeseReport,
    pub ham: HamReport,
    pub simplex: SimplexPoint,
    pub archetype: ArchetypeTag,
    pub deviation: CanonicalDeviation,
    pub equilibrium: bool,
    pub label: DominantLabel,
    pub confidence: f64,
    pub recommendations: Vec<Recommendation>,
}

/// Language a source file is written in, as inferred from its extension.
/// Unrecognized extensions fall back to `PlainText`, under which the cheese
/// and bread analyzers still run (on regex/line-based heuristics only) but
/// no tree-sitter parse is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    Tsx,
    Python,
    Go,
    #[default]
    PlainText,
}

impl Language {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") => Language::TypeScript,
            Some("tsx") => Language::Tsx,
            Some("py") => Language::Python,
            Some("go") => Language::Go,
            _ => Language::PlainText,
        }
    }
}

/// Run the full pipeline (Bread -> Cheese -> Ham -> Normalizer -> Label ->
/// Recommender) on already-loaded source text, per the strict ordering in
/// spec.md S5. `file_path` drives archetype classification and (for Ham)
/// test-file discovery; it need not exist on disk when `source` is supplied
/// directly (see `analyze_sandwich`/tests), but Ham's filesystem probe is a
/// no-op in that case since the candidate paths simply won't exist.
pub fn analyze_sandwich(source: &str, file_path: &Path) -> SandwichResult {
    let language = Language::from_path(file_path);
    let syntax_tree = tree::parse(language, source);

    let bread = analyzer::bread::BreadAnalyzer::new().analyze(&syntax_tree, source, file_path);
    let cheese = analyzer::cheese::CheeseAnalyzer::new(analyzer::cheese::CheeseConfig::default())
        .analyze(&syntax_tree, source);
    let ham = analyzer::ham::HamAnalyzer::new().analyze(&syntax_tree, file_path, source);

    let raw = RawTriple {
        bread: bread.score(),
        cheese: cheese.score(),
        ham: ham.score(),
    };

    let archetype = classifier::classify(file_path);
    let simplex = simplex::normalize(&raw);
    let canonical = classifier::canonical_profile(archetype);
    let deviation = simplex::deviation(&simplex, &canonical);
    let equilibrium = simplex::is_equilibrium(&deviation, simplex::EQ_TOLERANCE);
    let (label, confidence) = simplex::dominant_label(&simplex);

    let recommendations = recommender::recommend(&deviation, &cheese, recommender::DEFAULT_K);

    SandwichResult {
        file_path: file_path.to_path_buf(),
        raw,
        bread,
        cheese,
        ham,
        simplex,
        archetype,
        deviation,
        equilibrium,
        label,
        confidence,
        recommendations,
    }
}

/// Public entry point mirroring `analyze_sandwich` but reading the file from
/// disk first. Propagates I/O errors rather than swallowing them, since a
/// missing source file is an input error (spec.md S7), not a parse failure.
pub fn analyze_sandwich_file(file_path: &Path) -> anyhow::Result<SandwichResult> {
    let source = std::fs::read_to_string(file_path).map_err(|source| SandwichError::ReadSource {
        path: file_path.to_path_buf(),
        source,
    })?;
    Ok(analyze_sandwich(&source, file_path))
}

/// `analyze_cheese` tool operation (spec.md S6): cheese-only analysis.
pub fn analyze_cheese(source: &str, file_path: &Path) -> CheeseReport {
    let language = Language::from_path(file_path);
    let syntax_tree = tree::parse(language, source);
    analyzer::cheese::CheeseAnalyzer::new(analyzer::cheese::CheeseConfig::default())
        .analyze(&syntax_tree, source)
}

/// `get_label` tool operation (spec.md S6).
pub fn get_label(source: &str, file_path: &Path) -> (DominantLabel, f64, SimplexPoint) {
    let result = analyze_sandwich(source, file_path);
    (result.label, result.confidence, result.simplex)
}

/// `suggest_refactor` tool operation (spec.md S6). `archetype` overrides
/// path-based classification when provided.
pub fn suggest_refactor(
    source: &str,
    file_path: &Path,
    archetype: Option<ArchetypeTag>,
) -> Vec<Recommendation> {
    let language = Language::from_path(file_path);
    let syntax_tree = tree::parse(language, source);
    let bread = analyzer::bread::BreadAnalyzer::new().analyze(&syntax_tree, source, file_path);
    let cheese = analyzer::cheese::CheeseAnalyzer::new(analyzer::cheese::CheeseConfig::default())
        .analyze(&syntax_tree, source);
    let ham = analyzer::ham::HamAnalyzer::new().analyze(&syntax_tree, file_path, source);
    let raw = RawTriple {
        bread: bread.score(),
        cheese: cheese.score(),
        ham: ham.score(),
    };
    let archetype = archetype.unwrap_or_else(|| classifier::classify(file_path));
    let simplex = simplex::normalize(&raw);
    let canonical = classifier::canonical_profile(archetype);
    let deviation = simplex::deviation(&simplex, &canonical);
    recommender::recommend(&deviation, &cheese, recommender::DEFAULT_K)
}

/// `check_gate` tool operation (spec.md S6).
pub fn check_gate(
    source: &str,
    stage: GateStage,
    file_path: &Path,
    project_root: Option<&Path>,
) -> GateVerdict {
    let result = analyze_sandwich(source, file_path);
    gate::GateEngine::new().check_gate(stage, &result, file_path, project_root)
}

/// `check_budget` tool operation (spec.md S6).
pub fn check_budget(
    before_source: &str,
    after_source: &str,
    file_path: &Path,
    archetype: Option<ArchetypeTag>,
) -> gate::BudgetVerdict {
    let before = analyze_sandwich(before_source, file_path);
    let after = analyze_sandwich(after_source, file_path);
    let archetype = archetype.unwrap_or(after.archetype);
    gate::GateEngine::new().check_budget(&before, &after, archetype)
}

/// `check_degradation` tool operation (spec.md S6).
pub fn check_degradation(
    before_source: &str,
    after_source: &str,
    file_path: &Path,
) -> gate::DegradationReport {
    let before_cheese = analyze_cheese(before_source, file_path);
    let after_cheese = analyze_cheese(after_source, file_path);
    gate::GateEngine::new().check_degradation(&before_cheese, &after_cheese)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_function_is_balanced_or_bread_default() {
        let source = "function add(a, b) { return a + b; }";
        let result = analyze_sandwich(source, Path::new("src/lib/math.ts"));
        assert!(result.cheese.accessible);
        assert_eq!(result.cheese.max_nesting, 0);
    }

    #[test]
    fn language_from_path_recognizes_extensions() {
        assert_eq!(Language::from_path(Path::new("a.ts")), Language::TypeScript);
        assert_eq!(Language::from_path(Path::new("a.tsx")), Language::Tsx);
        assert_eq!(Language::from_path(Path::new("a.py")), Language::Python);
        assert_eq!(Language::from_path(Path::new("a.go")), Language::Go);
        assert_eq!(Language::from_path(Path::new("a.md")), Language::PlainText);
    }
}
