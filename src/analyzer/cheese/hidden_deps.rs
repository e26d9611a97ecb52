//! Hidden-dependency detection (spec.md S4.2e): occurrences of global-like
//! identifier access, environment-variable access, file/network I/O, and
//! closure captures of mutable enclosing bindings.

use crate::tree::{NodeKind, SyntaxTree};
use regex::Regex;
use std::sync::OnceLock;

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

fn global_access() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bglobalThis\.\w+|\bwindow\.\w+|\bglobal\.\w+").unwrap())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HiddenDepsResult {
    pub count: usize,
    pub env_access: usize,
    pub file_io: usize,
    pub network_io: usize,
    pub global_access: usize,
    pub closure_captures: usize,
}

pub fn analyze(tree: &SyntaxTree, source: &str) -> HiddenDepsResult {
    let env = env_access().find_iter(source).count();
    let file = file_io().find_iter(source).count();
    let network = network_io().find_iter(source).count();
    let global = global_access().find_iter(source).count();
    let closures = closure_captures(tree);

    HiddenDepsResult {
        count: env + file + network + global + closures,
        env_access: env,
        file_io: file,
        network_io: network,
        global_access: global,
        closure_captures: closures,
    }
}

/// A lambda referencing an identifier declared as a variable in its
/// enclosing (but not its own) function scope is a closure capture of a
/// mutable enclosing binding.
fn closure_captures(tree: &SyntaxTree) -> usize {
    let mut count = 0;
    for (lambda_idx, lambda) in tree.nodes_of_kind(NodeKind::LambdaLike) {
        let Some(outer_fn) = tree
            .ancestors_of(lambda_idx)
            .into_iter()
            .find(|&a| tree.nodes[a].kind.is_function_boundary())
        else {
            continue;
        };
        for desc in tree.descendants_of(outer_fn) {
            if tree.nodes[desc].kind != NodeKind::VariableDecl {
                continue;
            }
            if tree.enclosing_function(desc) != Some(outer_fn) {
                continue;
            }
            let Some(eq) = tree.nodes[desc].text.find('=') else {
                continue;
            };
            if let Some(ident) = first_word(&tree.nodes[desc].text[..eq]) {
                if lambda.text.contains(&ident) {
                    count += 1;
                }
            }
        }
    }
    count
}

fn first_word(text: &str) -> Option<String> {
    let re = Regex::new(r"[A-Za-z_$][\w$]*").ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}
