//! Tree-View Adapter contract (spec.md S4.1): a uniform, language-agnostic
//! view over a parsed syntax tree. Each supported language implements the
//! adapter in its own submodule; the analyzers in [`crate::analyzer`] never
//! touch a language-specific grammar node directly.
//!
//! A closed enum beats open polymorphism here because every node kind an
//! analyzer cares about is known statically, and match exhaustiveness is the
//! correctness guard that keeps a newly-added analyzer condition from being
//! silently skipped for a language that doesn't (yet) tag it.

mod go;
mod python;
mod typescript;

pub use go::GoAdapter;
pub use python::PythonAdapter;
pub use typescript::TypeScriptAdapter;

use crate::Language;

/// Abstract node kinds the core consumes, fixed by spec.md S4.1/S6. A
/// language adapter that has no construct for a given kind simply never
/// emits it -- e.g. a Python adapter never produces `ConditionalType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    FunctionLike,
    MethodLike,
    LambdaLike,
    ClassLike,
    If,
    ElseIf,
    For,
    While,
    DoWhile,
    ForEach,
    TryCatch,
    CatchClause,
    SwitchMatch,
    Await,
    AsyncBlock,
    GoroutineSpawn,
    ChannelOp,
    CallExpression,
    PropertyAccess,
    Identifier,
    VariableDecl,
    Parameter,
    RestParameter,
    SpreadInCall,
    DecoratorApplication,
    GenericParamList,
    UnionType,
    IntersectionType,
    ConditionalType,
    MappedType,
    TypePredicate,
    StringLiteral,
    Comment,
}

impl NodeKind {
    /// Node kinds that introduce a new level of logic-nesting (spec.md S4.2a).
    pub fn is_logic_nesting(self) -> bool {
        matches!(
            self,
            NodeKind::If
                | NodeKind::ElseIf
                | NodeKind::For
                | NodeKind::While
                | NodeKind::DoWhile
                | NodeKind::ForEach
                | NodeKind::TryCatch
                | NodeKind::CatchClause
                | NodeKind::SwitchMatch
        )
    }

    pub fn is_function_boundary(self) -> bool {
        matches!(
            self,
            NodeKind::FunctionLike | NodeKind::MethodLike | NodeKind::LambdaLike
        )
    }
}

/// One node in the flattened, pre-order tagged view of a parsed file. Only
/// nodes whose grammar kind maps to an abstract [`NodeKind`] are tagged;
/// `parent` points at the nearest *tagged* ancestor, so traversal never has
/// to skip over untagged grammar noise.
#[derive(Debug, Clone)]
pub struct TaggedNode {
    pub kind: NodeKind,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    /// Verbatim source slice for this node, used by regex/name-based checks.
    pub text: String,
    pub parent: Option<usize>,
}

impl TaggedNode {
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Opaque tree view delivered by a language-specific provider (spec.md S3).
/// Trees are produced fresh per analysis request; nothing here is cached
/// across calls (caching, where it exists, happens one level up at the
/// whole-result granularity -- see [`crate::cache`]).
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    pub language: Language,
    /// Set when the underlying parser reported a parse error. Downstream
    /// analyzers must then emit a single "parse failed" violation and zero
    /// scores (spec.md S4.1 Errors).
    pub parse_failed: bool,
    pub nodes: Vec<TaggedNode>,
}

impl SyntaxTree {
    fn sentinel(language: Language) -> Self {
        Self {
            language,
            parse_failed: true,
            nodes: Vec::new(),
        }
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = (usize, &TaggedNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.kind == kind)
    }

    pub fn children_of(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(move |(i, n)| if n.parent == Some(idx) { Some(i) } else { None })
    }

    /// Ancestor chain of `idx`, nearest first, not including `idx` itself.
    pub fn ancestors_of(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cur = self.nodes[idx].parent;
        while let Some(p) = cur {
            out.push(p);
            cur = self.nodes[p].parent;
        }
        out
    }

    /// Count of ancestor nodes matching `pred`, stopping at the first
    /// enclosing function boundary (nesting is scoped to a single function,
    /// per spec.md S4.2's per-function concept/nesting model).
    pub fn logic_nesting_depth(&self, idx: usize) -> usize {
        let mut depth = 0;
        for anc in self.ancestors_of(idx) {
            if self.nodes[anc].kind.is_function_boundary() {
                break;
            }
            if self.nodes[anc].kind.is_logic_nesting() {
                depth += 1;
            }
        }
        depth
    }

    /// Nearest enclosing function/method/lambda, if any.
    pub fn enclosing_function(&self, idx: usize) -> Option<usize> {
        self.ancestors_of(idx)
            .into_iter()
            .find(|&a| self.nodes[a].kind.is_function_boundary())
    }

    /// All top-level function-like declarations (spec.md S4.2b operates
    /// per-function; analyzers iterate this to walk each function's body).
    pub fn functions(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind.is_function_boundary())
            .map(|(i, _)| i)
            .collect()
    }

    /// Nodes whose span is contained within `idx`'s span (including `idx`).
    pub fn descendants_of(&self, idx: usize) -> Vec<usize> {
        let outer = &self.nodes[idx];
        let mut out = Vec::new();
        for (i, n) in self.nodes.iter().enumerate() {
            if i == idx {
                continue;
            }
            if span_contains(outer, n) {
                out.push(i);
            }
        }
        out
    }
}

fn span_contains(outer: &TaggedNode, inner: &TaggedNode) -> bool {
    (outer.start_line, outer.start_col) <= (inner.start_line, inner.start_col)
        && (outer.end_line, outer.end_col) >= (inner.end_line, inner.end_col)
}

/// Dispatch to the adapter for `language`, or a sentinel "not this kind of
/// file" tree for languages with no adapter (treated like plain text: no
/// structural nodes are tagged, so cheese/bread fall back to their
/// line/regex-based checks only).
pub fn parse(language: Language, source: &str) -> SyntaxTree {
    match language {
        Language::TypeScript => TypeScriptAdapter::parse(source, false),
        Language::Tsx => TypeScriptAdapter::parse(source, true),
        Language::Python => PythonAdapter::parse(source),
        Language::Go => GoAdapter::parse(source),
        Language::PlainText => SyntaxTree {
            language,
            parse_failed: false,
            nodes: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_tree_is_marked_failed() {
        let t = SyntaxTree::sentinel(Language::TypeScript);
        assert!(t.parse_failed);
        assert!(t.nodes.is_empty());
    }

    #[test]
    fn plain_text_language_produces_empty_but_valid_tree() {
        let t = parse(Language::PlainText, "whatever");
        assert!(!t.parse_failed);
        assert!(t.nodes.is_empty());
    }
}
