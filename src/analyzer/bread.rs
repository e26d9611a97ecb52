//! Bread Analyzer (spec.md S4.3): structural security. Detects trust-
//! boundary markers, authentication-flow explicitness, hardcoded/leaked
//! secrets, and hidden I/O dependencies.
//!
//! Unlike Cheese and Ham, the external contract in S4.3 names only
//! `analyze(tree, sourceText)`; auth-explicitness needs to know whether the
//! file touches an `api-external` surface (S4.3's "Auth flow" rule), which
//! is a path-derived fact. We thread `filePath` through as a third argument
//! rather than re-deriving archetype from source text -- this diverges from
//! the literal two-argument contract but resolves an otherwise-unresolvable
//! gap; see DESIGN.md's Open Question log.

use crate::classifier::{self, ArchetypeTag};
use crate::tree::SyntaxTree;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretMatch {
    pub pattern: String,
    pub severity: String,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenDeps {
    pub env_access: usize,
    pub file_io: usize,
    pub network_io: usize,
}

impl HiddenDeps {
    pub fn total(&self) -> usize {
        self.env_access + self.file_io + self.network_io
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadReport {
    pub trust_boundary_count: usize,
    pub auth_explicitness: f64,
    pub secret_patterns: Vec<SecretMatch>,
    pub hidden_deps: HiddenDeps,
    pub violations: Vec<String>,
}

impl BreadReport {
    pub fn score(&self) -> f64 {
        if self.violations == ["parse failed"] {
            return 0.0;
        }
        let secret_component: f64 = self
            .secret_patterns
            .iter()
            .map(|s| if s.severity == "high" { 5.0 } else { 3.0 })
            .sum();
        let auth_deficit = (1.0 - self.auth_explicitness) * 5.0;
        self.trust_boundary_count as f64 * 3.0 + secret_component + self.hidden_deps.total() as f64 + auth_deficit
    }
}

fn trust_boundary_markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"TRUST_BOUNDARY\s*=\s*(?:true|True)|TRUST_BOUNDARY(?!\s*=)|Trust Boundary:").unwrap()
    })
}

fn auth_flow_declaration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"AUTH_FLOW:\s*(\S+)").unwrap())
}

struct SecretRule {
    name: &'static str,
    regex: Regex,
    severity: &'static str,
}

fn secret_rules() -> &'static Vec<SecretRule> {
    static TABLE: OnceLock<Vec<SecretRule>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            SecretRule {
                name: "api_key",
                regex: Regex::new(r#"(?i)\b(?:api_key|apikey)\s*[:=]\s*["'][^"']{6,}["']"#).unwrap(),
                severity: "high",
            },
            SecretRule {
                name: "password",
                regex: Regex::new(r#"(?i)\b(?:password|passwd|pwd)\s*[:=]\s*["'][^"']{3,}["']"#).unwrap(),
                severity: "high",
            },
            SecretRule {
                name: "secret_token",
                regex: Regex::new(r#"(?i)\b(?:secret|token)\s*[:=]\s*["'][^"']{6,}["']"#).unwrap(),
                severity: "high",
            },
            SecretRule {
                name: "bearer_token",
                regex: Regex::new(r#"(?i)bearer\s+[A-Za-z0-9._-]{10,}"#).unwrap(),
                severity: "medium",
            },
        ]
    })
}

fn secret_name_fragment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)api_?key|password|passwd|pwd|secret|token").unwrap())
}

fn secret_leak_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:print|console\.log|logger\.\w+)\s*\(\s*([A-Za-z_$][\w$.]*)\s*\)").unwrap()
    })
}

fn env_access() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"process\.env\.\w+|os\.environ(?:\.get|\[)?|\bgetenv\(").unwrap())
}

fn file_io() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"fs\.(?:readFile|writeFile|open)\w*\(|\bopen\(|os\.Open\(|ioutil\.ReadFile\(")
            .unwrap()
    })
}

fn network_io() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bfetch\(|axios\.\w+\(|http\.(?:get|Get|post|Post)\(|requests\.(?:get|post)\(")
            .unwrap()
    })
}

pub struct BreadAnalyzer;

impl BreadAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, tree: &SyntaxTree, source: &str, file_path: &Path) -> BreadReport {
        if tree.parse_failed {
            return BreadReport {
                trust_boundary_count: 0,
                auth_explicitness: 0.0,
                secret_patterns: Vec::new(),
                hidden_deps: HiddenDeps::default(),
                violations: vec!["parse failed".to_string()],
            };
        }

        let trust_boundary_count = trust_boundary_markers()
            .find_iter(source)
            .map(|m| line_of(source, m.start()))
            .collect::<std::collections::HashSet<_>>()
            .len();

        let auth_explicitness = if auth_flow_declaration().is_match(source) {
            1.0
        } else if classifier::classify(file_path) == ArchetypeTag::ApiExternal {
            0.0
        } else {
            1.0
        };

        let mut secret_patterns = Vec::new();
        for (line_no, line) in source.lines().enumerate() {
            for rule in secret_rules() {
                if rule.regex.is_match(line) {
                    secret_patterns.push(SecretMatch {
                        pattern: rule.name.to_string(),
                        severity: rule.severity.to_string(),
                        line: line_no + 1,
                    });
                }
            }
        }

        let secret_leaked = secret_leak_call().captures_iter(source).any(|cap| {
            secret_name_fragment().is_match(&cap[1])
        });

        let hidden_deps = HiddenDeps {
            env_access: env_access().find_iter(source).count(),
            file_io: file_io().find_iter(source).count(),
            network_io: network_io().find_iter(source).count(),
        };

        let mut violations = Vec::new();
        if !secret_patterns.is_empty() {
            violations.push("secret-hardcoded".to_string());
        }
        if classifier::classify(file_path) == ArchetypeTag::ApiExternal && auth_explicitness == 0.0 {
            violations.push("auth-missing".to_string());
        }
        if secret_leaked {
            violations.push("secret-leak".to_string());
        }

        BreadReport {
            trust_boundary_count,
            auth_explicitness,
            secret_patterns,
            hidden_deps,
            violations,
        }
    }
}

impl Default for BreadAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn line_of(source: &str, byte_offset: usize) -> usize {
    source[..byte_offset].matches('\n').count() + 1
}
