//! Framework-aware nesting decomposition (spec.md S4.2a): structural nesting
//! is split into logic-nesting (if/for/while/try/switch...) and
//! presentational-nesting (JSX/template markup), combined as
//! `logic + ceil(presentational * framework_weight)`.

use super::framework::Framework;
use crate::tree::SyntaxTree;

#[derive(Debug, Clone, Default)]
pub struct NestingResult {
    pub logic_nesting: usize,
    pub presentational_nesting: usize,
    pub adjusted_nesting: usize,
    /// One entry per adjustment applied, naming what changed and why --
    /// spec.md S4.2a: "Each reduction produces an audit record naming the
    /// adjustment."
    pub audit: Vec<String>,
}

pub fn analyze(tree: &SyntaxTree, source: &str, framework: Framework) -> NestingResult {
    let logic_nesting = max_logic_nesting(tree);
    let presentational_nesting = max_presentational_nesting(source, framework);

    let weight = framework.presentational_weight();
    let presentational_contribution = (presentational_nesting as f64 * weight).ceil() as usize;
    let adjusted_nesting = logic_nesting + presentational_contribution;

    let mut audit = Vec::new();
    if presentational_nesting > 0 {
        audit.push(format!(
            "presentational nesting {} weighted by {} ({}) -> +{}",
            presentational_nesting,
            weight,
            framework.label(),
            presentational_contribution
        ));
    }

    NestingResult {
        logic_nesting,
        presentational_nesting,
        adjusted_nesting,
        audit,
    }
}

fn max_logic_nesting(tree: &SyntaxTree) -> usize {
    tree.nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.kind.is_logic_nesting())
        .map(|(i, _)| 1 + tree.logic_nesting_depth(i))
        .max()
        .unwrap_or(0)
}

/// Heuristic presentational-nesting depth: the deepest stack of open JSX/
/// template tags in the raw source. JSX has no dedicated entry in the
/// abstract `NodeKind` set (spec.md S4.1 enumerates logic/expression/type
/// node kinds only), so this stays a lightweight text scan rather than a
/// tree-shape computation -- the same class of regex-driven heuristic the
/// Bread analyzer uses for secret scanning.
fn max_presentational_nesting(source: &str, framework: Framework) -> usize {
    if framework == Framework::None {
        return 0;
    }
    let mut depth = 0usize;
    let mut max_depth = 0usize;
    let bytes = source.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            let rest = &source[i + 1..];
            if rest.starts_with('/') {
                depth = depth.saturating_sub(1);
            } else if rest
                .chars()
                .next()
                .map(|c| c.is_alphabetic() || c == '>')
                .unwrap_or(false)
            {
                // Self-closing tags (`<Foo ... />`) don't add depth.
                if let Some(close) = rest.find('>') {
                    let tag = &rest[..close];
                    if !tag.trim_end().ends_with('/') {
                        depth += 1;
                        max_depth = max_depth.max(depth);
                    }
                }
            }
        }
        i += 1;
    }
    max_depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;
    use crate::Language;

    #[test]
    fn six_nested_ifs_reported_as_depth_six() {
        let mut src = String::from("function f(x) {\n");
        for _ in 0..6 {
            src.push_str("if (x) {\n");
        }
        for _ in 0..6 {
            src.push_str("}\n");
        }
        src.push_str("}\n");
        let t = tree::parse(Language::TypeScript, &src);
        let result = analyze(&t, &src, Framework::None);
        assert_eq!(result.logic_nesting, 6);
        assert_eq!(result.adjusted_nesting, 6);
    }

    #[test]
    fn no_framework_ignores_markup_depth() {
        let result = max_presentational_nesting("<div><span><b>x</b></span></div>", Framework::None);
        assert_eq!(result, 0);
    }

    #[test]
    fn react_markup_depth_weighted_down() {
        let src = "<div><span><b>x</b></span></div>";
        let result = analyze(&tree::parse(Language::Tsx, src), src, Framework::React);
        assert_eq!(result.presentational_nesting, 3);
        assert_eq!(result.adjusted_nesting, 1); // ceil(3 * 0.3) = 1
    }
}
