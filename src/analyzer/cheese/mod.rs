//! Cheese Analyzer (spec.md S4.2): cognitive accessibility. The hardest
//! subsystem -- nesting decomposition, concept counting, type-system
//! penalties, the State x Async x Retry invariant, and hidden-dependency
//! detection all feed into a single accessibility verdict.

mod concepts;
mod framework;
mod hidden_deps;
mod nesting;
mod sar;
mod type_complexity;

pub use framework::Framework;
pub use sar::StateAsyncRetry;

use crate::tree::SyntaxTree;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConceptRecord {
    pub name: String,
    pub line: usize,
    pub raw_concept_count: usize,
    pub adjusted_concept_count: f64,
    pub anti_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheeseReport {
    pub accessible: bool,
    pub violations: Vec<String>,
    pub functions: Vec<FunctionConceptRecord>,
    pub max_nesting: usize,
    pub adjusted_nesting: usize,
    pub hidden_dependencies: usize,
    pub state_async_retry: StateAsyncRetry,
    /// Aggregate type-system penalty, folded per-function into
    /// `adjustedConceptCount` (spec.md S4.2c) and kept here for scoring and
    /// audit purposes; not part of the stable external contract in S3.
    pub type_penalty: f64,
}

impl CheeseReport {
    /// Raw cheese axis magnitude, comparable across files in the same
    /// language but not across axes (spec.md S3).
    pub fn score(&self) -> f64 {
        if self.violations == ["parse failed"] {
            return 0.0;
        }
        let nesting_component = self.adjusted_nesting as f64 * 2.0;
        let concept_overage: f64 = self
            .functions
            .iter()
            .map(|f| (f.adjusted_concept_count - 1.0).max(0.0))
            .sum();
        let hidden_component = self.hidden_dependencies as f64 * 2.0;
        let sar_component = if self.state_async_retry.violated { 10.0 } else { 0.0 };
        nesting_component + concept_overage * 0.5 + hidden_component + sar_component + self.type_penalty
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CheeseConfig {
    pub nesting_threshold: usize,
    pub concepts_per_fn: f64,
    pub hidden_dep_threshold: usize,
    pub framework: Option<Framework>,
}

impl Default for CheeseConfig {
    fn default() -> Self {
        Self {
            nesting_threshold: 4,
            concepts_per_fn: 9.0,
            hidden_dep_threshold: 2,
            framework: None,
        }
    }
}

pub struct CheeseAnalyzer {
    config: CheeseConfig,
}

impl CheeseAnalyzer {
    pub fn new(config: CheeseConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, tree: &SyntaxTree, source: &str) -> CheeseReport {
        if tree.parse_failed {
            return CheeseReport {
                accessible: false,
                violations: vec!["parse failed".to_string()],
                functions: Vec::new(),
                max_nesting: 0,
                adjusted_nesting: 0,
                hidden_dependencies: 0,
                state_async_retry: StateAsyncRetry::default(),
                type_penalty: 0.0,
            };
        }

        let framework = self
            .config
            .framework
            .unwrap_or_else(|| framework::detect_framework(source));

        let nesting_result = nesting::analyze(tree, source, framework);
        let type_penalty = type_complexity::analyze(tree);
        let sar = sar::analyze(tree, source);
        let hidden = hidden_deps::analyze(tree, source);

        let fn_indices = tree.functions();
        let fn_count = fn_indices.len().max(1);
        let type_share = type_penalty.total_penalty / fn_count as f64;

        let mut functions = Vec::with_capacity(fn_indices.len());
        let mut any_fn_over_threshold = false;
        for &idx in &fn_indices {
            let mut c = concepts::analyze_function(tree, source, framework, idx);
            c.adjusted_concept_count += type_share;
            if c.adjusted_concept_count > self.config.concepts_per_fn {
                any_fn_over_threshold = true;
            }
            functions.push(FunctionConceptRecord {
                name: c.name,
                line: c.line,
                raw_concept_count: c.raw_concept_count,
                adjusted_concept_count: c.adjusted_concept_count,
                anti_patterns: c.anti_patterns,
            });
        }

        let mut violations = Vec::new();
        if nesting_result.adjusted_nesting > self.config.nesting_threshold {
            violations.push("nesting-exceeded".to_string());
        }
        if any_fn_over_threshold || type_penalty.exceeds_bounds() {
            violations.push("concepts-exceeded".to_string());
        }
        if hidden.count > self.config.hidden_dep_threshold {
            violations.push("hidden-deps-exceeded".to_string());
        }
        if sar.violated {
            violations.push("sar-coexistence".to_string());
        }

        CheeseReport {
            accessible: violations.is_empty(),
            violations,
            functions,
            max_nesting: nesting_result.logic_nesting,
            adjusted_nesting: nesting_result.adjusted_nesting,
            hidden_dependencies: hidden.count,
            state_async_retry: sar,
            type_penalty: type_penalty.total_penalty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;
    use crate::Language;

    #[test]
    fn trivial_add_is_accessible() {
        let src = "function add(a, b) { return a + b; }";
        let t = tree::parse(Language::TypeScript, src);
        let report = CheeseAnalyzer::new(CheeseConfig::default()).analyze(&t, src);
        assert!(report.accessible);
        assert!(report.violations.is_empty());
        assert_eq!(report.max_nesting, 0);
        assert_eq!(report.functions.len(), 1);
        assert_eq!(report.functions[0].raw_concept_count, 2);
    }

    #[test]
    fn six_nested_ifs_exceed_mvp_threshold() {
        let mut src = String::from("function f(x) {\n");
        for _ in 0..6 {
            src.push_str("if (x) {\n");
        }
        for _ in 0..6 {
            src.push_str("}\n");
        }
        src.push_str("}\n");
        let t = tree::parse(Language::TypeScript, &src);
        let report = CheeseAnalyzer::new(CheeseConfig::default()).analyze(&t, &src);
        assert_eq!(report.max_nesting, 6);
        assert!(!report.accessible);
        assert!(report.violations.contains(&"nesting-exceeded".to_string()));
    }

    #[test]
    fn sar_violation_surfaces_in_report() {
        let src = "async function f() { this.x = await g(); for (let attempt=0; attempt<3; attempt++) {} }";
        let t = tree::parse(Language::TypeScript, src);
        let report = CheeseAnalyzer::new(CheeseConfig::default()).analyze(&t, src);
        assert!(report.state_async_retry.violated);
        assert!(report.violations.contains(&"sar-coexistence".to_string()));
        assert!(!report.accessible);
    }

    #[test]
    fn parse_failure_yields_single_violation_and_zero_report() {
        let t = tree::parse(Language::TypeScript, "function f( { { { (");
        let report = CheeseAnalyzer::new(CheeseConfig::default()).analyze(&t, "function f( { { { (");
        assert_eq!(report.violations, vec!["parse failed".to_string()]);
        assert!(!report.accessible);
        assert_eq!(report.score(), 0.0);
    }
}
