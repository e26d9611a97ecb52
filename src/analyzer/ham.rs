//! Ham Analyzer (spec.md S4.4): behavioral preservation via golden-test
//! coverage of critical-path symbols.

use crate::tree::{NodeKind, SyntaxTree};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPath {
    pub name: String,
    pub line: usize,
    pub category: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestInfo {
    pub framework: Option<String>,
    pub test_count: usize,
    pub described_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HamReport {
    pub golden_test_coverage: f64,
    pub critical_paths: Vec<CriticalPath>,
    pub untested_critical_paths: Vec<String>,
    pub test_info: TestInfo,
}

impl HamReport {
    pub fn score(&self) -> f64 {
        let critical_component = self.critical_paths.len() as f64 * 5.0;
        let untested_component = self.untested_critical_paths.len() as f64 * 3.0;
        let coverage_deficit = (1.0 - self.golden_test_coverage) * 10.0;
        critical_component + untested_component + coverage_deficit
    }
}

fn filler_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        ["should", "when", "then", "given", "returns", "throws"]
            .into_iter()
            .collect()
    })
}

struct CategoryRule {
    category: &'static str,
    regex: Regex,
}

fn category_rules() -> &'static Vec<CategoryRule> {
    static TABLE: OnceLock<Vec<CategoryRule>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            CategoryRule {
                category: "payment",
                regex: Regex::new(r"(?i)payment|charge|invoice|billing|checkout").unwrap(),
            },
            CategoryRule {
                category: "auth",
                regex: Regex::new(r"(?i)auth|login|logout|session|credential").unwrap(),
            },
            CategoryRule {
                category: "data-destructive",
                regex: Regex::new(r"(?i)delete|truncate|purge|migrate|backup|restore").unwrap(),
            },
            CategoryRule {
                category: "security",
                regex: Regex::new(r"(?i)encrypt|hash|sanitize|csrf|acl").unwrap(),
            },
            CategoryRule {
                category: "api",
                regex: Regex::new(r"(?i)webhook|throttle|externalrequest|fetchexternal").unwrap(),
            },
            CategoryRule {
                category: "database",
                regex: Regex::new(r"(?i)transaction|commit|rollback").unwrap(),
            },
        ]
    })
}

fn name_regexes() -> &'static Vec<Regex> {
    static TABLE: OnceLock<Vec<Regex>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\*?\s+([A-Za-z_$][\w$]*)").unwrap(),
            Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_][\w]*)").unwrap(),
            Regex::new(r"^\s*func\s+(?:\([^)]*\)\s*)?([A-Za-z_][\w]*)").unwrap(),
            Regex::new(r"^\s*class\s+([A-Za-z_$][\w$]*)").unwrap(),
            Regex::new(r"^\s*(?:public\s+|private\s+|protected\s+|static\s+|async\s+)*([A-Za-z_$][\w$]*)\s*\(").unwrap(),
        ]
    })
}

fn declared_name(text: &str) -> Option<String> {
    for re in name_regexes() {
        if let Some(cap) = re.captures(text) {
            return Some(cap[1].to_string());
        }
    }
    None
}

fn categorize(name: &str) -> Option<(&'static str, String)> {
    for rule in category_rules() {
        if rule.regex.is_match(name) {
            return Some((rule.category, format!("name matches the {} category pattern", rule.category)));
        }
    }
    None
}

fn candidate_test_paths(file_path: &Path) -> Vec<PathBuf> {
    let Some(ext) = file_path.extension().and_then(|e| e.to_str()) else {
        return Vec::new();
    };
    let stem = file_path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let parent = file_path.parent().unwrap_or_else(|| Path::new(""));

    match ext {
        "ts" | "tsx" | "js" | "jsx" => vec![
            parent.join(format!("{stem}.test.{ext}")),
            parent.join(format!("{stem}.spec.{ext}")),
            parent.join("test").join(format!("{stem}.test.{ext}")),
            parent.join("__tests__").join(format!("{stem}.test.{ext}")),
        ],
        "py" => vec![
            parent.join(format!("test_{stem}.py")),
            parent.join("tests").join(format!("test_{stem}.py")),
            parent.join(format!("{stem}_test.py")),
        ],
        "go" => vec![parent.join(format!("{stem}_test.go"))],
        _ => Vec::new(),
    }
}

fn framework_markers() -> &'static [(&'static str, &'static str)] {
    &[
        ("vitest", "vitest"),
        ("node:test", "node-test"),
        ("mocha", "mocha"),
        ("jest", "jest"),
        ("import pytest", "pytest"),
        ("def test_", "pytest"),
        ("testing.T", "gotest"),
        ("func Test", "gotest"),
    ]
}

fn detect_framework(test_source: &str) -> Option<String> {
    framework_markers()
        .iter()
        .find(|(marker, _)| test_source.contains(marker))
        .map(|(_, name)| name.to_string())
}

fn test_case_count(test_source: &str) -> usize {
    static JS_RE: OnceLock<Regex> = OnceLock::new();
    static PY_RE: OnceLock<Regex> = OnceLock::new();
    static GO_RE: OnceLock<Regex> = OnceLock::new();
    let js = JS_RE.get_or_init(|| Regex::new(r"\b(?:it|test)\s*\(").unwrap());
    let py = PY_RE.get_or_init(|| Regex::new(r"def\s+test_\w+\s*\(").unwrap());
    let go = GO_RE.get_or_init(|| Regex::new(r"func\s+Test\w+\s*\(").unwrap());
    js.find_iter(test_source).count() + py.find_iter(test_source).count() + go.find_iter(test_source).count()
}

fn described_names(test_source: &str) -> Vec<String> {
    static STRING_ARG: OnceLock<Regex> = OnceLock::new();
    static CALL_TARGET: OnceLock<Regex> = OnceLock::new();
    let string_arg = STRING_ARG
        .get_or_init(|| Regex::new(r#"(?:describe|it|test)\s*\(\s*["']([^"']+)["']"#).unwrap());
    let call_target = CALL_TARGET
        .get_or_init(|| Regex::new(r"(?:expect|assert|spy|mock)\w*\s*\(\s*([A-Za-z_$][\w$]*)").unwrap());

    let mut names = HashSet::new();
    for cap in string_arg.captures_iter(test_source) {
        for word in split_words(&cap[1]) {
            if !filler_words().contains(word.as_str()) {
                names.insert(word);
            }
        }
    }
    for cap in call_target.captures_iter(test_source) {
        names.insert(cap[1].to_lowercase());
    }
    let mut out: Vec<String> = names.into_iter().collect();
    out.sort();
    out
}

fn split_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

pub struct HamAnalyzer;

impl HamAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, tree: &SyntaxTree, file_path: &Path, _source: &str) -> HamReport {
        let mut seen = HashSet::new();
        let mut critical_paths = Vec::new();
        let mut declaration_nodes: Vec<usize> = tree.functions();
        declaration_nodes.extend(tree.nodes_of_kind(NodeKind::ClassLike).map(|(i, _)| i));

        for idx in declaration_nodes {
            let node = &tree.nodes[idx];
            let Some(name) = declared_name(&node.text) else {
                continue;
            };
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some((category, reason)) = categorize(&name) {
                critical_paths.push(CriticalPath {
                    name,
                    line: node.start_line,
                    category: category.to_string(),
                    reason,
                });
            }
        }

        let test_source = candidate_test_paths(file_path)
            .into_iter()
            .find_map(|p| std::fs::read_to_string(&p).ok());

        let test_info = match &test_source {
            Some(contents) => TestInfo {
                framework: detect_framework(contents),
                test_count: test_case_count(contents),
                described_names: described_names(contents),
            },
            None => TestInfo::default(),
        };

        let described: HashSet<&String> = test_info.described_names.iter().collect();
        let untested_critical_paths: Vec<String> = critical_paths
            .iter()
            .filter(|cp| !described.contains(&cp.name.to_lowercase()))
            .map(|cp| cp.name.clone())
            .collect();

        let golden_test_coverage = if critical_paths.is_empty() {
            1.0
        } else {
            (critical_paths.len() - untested_critical_paths.len()) as f64 / critical_paths.len() as f64
        };

        HamReport {
            golden_test_coverage,
            critical_paths,
            untested_critical_paths,
            test_info,
        }
    }
}

impl Default for HamAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;
    use crate::Language;

    #[test]
    fn no_critical_paths_defaults_to_full_coverage() {
        let src = "function add(a, b) { return a + b; }";
        let t = tree::parse(Language::TypeScript, src);
        let report = HamAnalyzer::new().analyze(&t, Path::new("src/lib/math.ts"), src);
        assert!(report.critical_paths.is_empty());
        assert_eq!(report.golden_test_coverage, 1.0);
    }

    #[test]
    fn untested_payment_function_detected() {
        let src = "function processPayment(order) { return order; }";
        let t = tree::parse(Language::TypeScript, src);
        let report = HamAnalyzer::new().analyze(
            &t,
            Path::new("/nonexistent/src/billing.ts"),
            src,
        );
        assert_eq!(report.critical_paths.len(), 1);
        assert_eq!(report.critical_paths[0].name, "processPayment");
        assert_eq!(report.critical_paths[0].category, "payment");
        assert_eq!(report.untested_critical_paths, vec!["processPayment".to_string()]);
        assert_eq!(report.golden_test_coverage, 0.0);
    }

    #[test]
    fn candidate_test_paths_follow_fixed_order() {
        let candidates = candidate_test_paths(Path::new("src/foo.ts"));
        assert_eq!(candidates[0], Path::new("src/foo.test.ts"));
        assert_eq!(candidates[1], Path::new("src/foo.spec.ts"));
    }
}
