//! Per-function concept counting (spec.md S4.2b). A concept is any unique
//! external name a function references -- parameters, locally bound names,
//! called names -- plus fixed-penalty anti-patterns. The raw concept set and
//! the anti-pattern penalty list are kept as separate collections so the
//! effective count (`|set| + penalty`, weighted per spec.md S4.2b for
//! hooks/chains) stays auditable, per Design Notes S9.

use super::framework::{is_hook_call, Framework};
use crate::tree::{NodeKind, SyntaxTree};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const REST_PARAM_PENALTY: f64 = 3.0;
const SPREAD_CONFIG_PENALTY: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct FunctionConcepts {
    pub name: String,
    pub line: usize,
    pub raw_concept_count: usize,
    pub adjusted_concept_count: f64,
    pub anti_patterns: Vec<String>,
}

fn builtin_allowlist() -> &'static [&'static str] {
    &[
        "console", "Math", "JSON", "Object", "Array", "Promise", "Number", "String", "Boolean",
        "Map", "Set", "Symbol", "Error", "TypeError", "RangeError", "parseInt", "parseFloat",
        "isNaN", "isFinite", "require", "module", "exports", "print", "len", "range", "str",
        "int", "float", "list", "dict", "tuple", "set", "Date", "RegExp", "Reflect", "Proxy",
    ]
}

fn name_regexes() -> &'static [Regex] {
    static TABLE: OnceLock<Vec<Regex>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\*?\s+([A-Za-z_$][\w$]*)").unwrap(),
            Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_][\w]*)").unwrap(),
            Regex::new(r"^\s*func\s+(?:\([^)]*\)\s*)?([A-Za-z_][\w]*)").unwrap(),
            Regex::new(r"^\s*(?:public\s+|private\s+|protected\s+|static\s+|async\s+|get\s+|set\s+)*([A-Za-z_$][\w$]*)\s*\(").unwrap(),
        ]
    })
}

pub fn function_name(tree: &SyntaxTree, idx: usize, source: &str) -> String {
    let node = &tree.nodes[idx];
    for re in name_regexes() {
        if let Some(cap) = re.captures(&node.text) {
            return cap[1].to_string();
        }
    }
    // Arrow functions: look at the nearest enclosing VariableDecl for `const
    // name = (...) => ...`.
    if let Some(parent) = node.parent {
        if tree.nodes[parent].kind == NodeKind::VariableDecl {
            if let Some(name) = first_identifier(&tree.nodes[parent].text) {
                return name;
            }
        }
    }
    let _ = source;
    "<anonymous>".to_string()
}

fn first_identifier(text: &str) -> Option<String> {
    let ident_re = Regex::new(r"[A-Za-z_$][\w$]*").unwrap();
    ident_re.find(text).map(|m| m.as_str().to_string())
}

fn simple_ident(text: &str) -> Option<String> {
    first_identifier(text)
}

fn is_self_receiver(name: &str) -> bool {
    name == "self" || name == "this"
}

/// Does `rhs` look like a fluent method chain (`a.b().c()`)? Used both to
/// weight chain intermediates and to skip double-counting their names.
fn is_fluent_chain(rhs: &str) -> bool {
    rhs.matches(").").count() >= 1 && rhs.matches('(').count() >= 2
}

pub fn analyze_function(
    tree: &SyntaxTree,
    source: &str,
    framework: Framework,
    fn_idx: usize,
) -> FunctionConcepts {
    let name = function_name(tree, fn_idx, source);
    let line = tree.nodes[fn_idx].start_line;

    let mut concept_weights: HashMap<String, f64> = HashMap::new();
    let mut anti_patterns = Vec::new();
    let mut penalty = 0.0;

    // Parameters (excluding a leading self/this receiver).
    let mut params: Vec<usize> = tree
        .children_of(fn_idx)
        .filter(|&c| {
            matches!(tree.nodes[c].kind, NodeKind::Parameter | NodeKind::RestParameter)
        })
        .collect();
    params.sort_by_key(|&c| (tree.nodes[c].start_line, tree.nodes[c].start_col));
    for (i, &p) in params.iter().enumerate() {
        let Some(pname) = simple_ident(&tree.nodes[p].text) else {
            continue;
        };
        if i == 0 && is_self_receiver(&pname) {
            continue;
        }
        concept_weights.entry(pname.clone()).or_insert(1.0);
        if tree.nodes[p].kind == NodeKind::RestParameter {
            anti_patterns.push("rest-parameter".to_string());
            penalty += REST_PARAM_PENALTY;
        }
    }

    // Locally bound names, called names: walk every descendant belonging to
    // this function (not a nested one).
    for desc in tree.descendants_of(fn_idx) {
        if tree.enclosing_function(desc) != Some(fn_idx) {
            continue;
        }
        let node = &tree.nodes[desc];
        match node.kind {
            NodeKind::VariableDecl => {
                let Some(eq) = node.text.find('=') else {
                    continue;
                };
                let (lhs, rhs) = node.text.split_at(eq);
                let rhs = &rhs[1..];
                let rhs_trim = rhs.trim_start();
                let hook_call_result = first_identifier(rhs_trim)
                    .map(|callee| is_hook_call(framework, &callee))
                    .unwrap_or(false);
                if hook_call_result {
                    continue; // framework-hook call results are excluded (S4.2b)
                }
                if is_fluent_chain(rhs_trim) {
                    if let Some(bound) = first_identifier(lhs) {
                        let weight = framework.presentational_weight();
                        let e = concept_weights.entry(bound).or_insert(weight);
                        *e = e.max(weight);
                    }
                    continue;
                }
                if let Some(bound) = first_identifier(lhs) {
                    if !matches!(bound.as_str(), "const" | "let" | "var") {
                        concept_weights.entry(bound).or_insert(1.0);
                    }
                }
            }
            NodeKind::CallExpression => {
                let callee_full = node.text.split('(').next().unwrap_or("").trim();
                let callee = callee_full.rsplit('.').next().unwrap_or(callee_full);
                let callee = callee.trim_start_matches("await").trim_start_matches("new").trim();
                if callee.is_empty() || builtin_allowlist().contains(&callee) {
                    continue;
                }
                let weight = if is_hook_call(framework, callee) || callee_full.contains('.') && is_fluent_chain(node.text.as_str()) {
                    framework.presentational_weight()
                } else {
                    1.0
                };
                let e = concept_weights.entry(callee.to_string()).or_insert(weight);
                *e = e.max(weight);
            }
            NodeKind::SpreadInCall => {
                if node.text.trim_start().starts_with('{') {
                    anti_patterns.push("spread-config".to_string());
                    penalty += SPREAD_CONFIG_PENALTY;
                }
            }
            _ => {}
        }
    }

    let raw_concept_count = concept_weights.len();
    let weighted_sum: f64 = concept_weights.values().sum();
    let adjusted_concept_count = weighted_sum + penalty;

    FunctionConcepts {
        name,
        line,
        raw_concept_count,
        adjusted_concept_count,
        anti_patterns,
    }
}
