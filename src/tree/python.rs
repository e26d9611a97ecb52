//! Python tree-view adapter, built on `tree-sitter-python` (same crate pair
//! as `sibyllinesoft-valknut` and `iepathos-debtmap` use alongside
//! tree-sitter-typescript for multi-language complexity analysis).
//!
//! Python has no distinct generics/union/conditional/mapped-type grammar
//! (`typing.Union[...]` is just a subscript expression), so every
//! type-system `NodeKind` variant is simply never emitted here -- the
//! empty-set edge case from spec.md S4.1.

use super::{NodeKind, SyntaxTree, TaggedNode};
use crate::Language;
use tree_sitter::{Language as TsLanguage, Node, Parser};

pub struct PythonAdapter;

impl PythonAdapter {
    pub fn parse(source: &str) -> SyntaxTree {
        let mut parser = Parser::new();
        let language: TsLanguage = tree_sitter_python::LANGUAGE.into();
        if parser.set_language(&language).is_err() {
            return SyntaxTree {
                language: Language::Python,
                parse_failed: true,
                nodes: Vec::new(),
            };
        }

        let Some(tree) = parser.parse(source, None) else {
            return SyntaxTree {
                language: Language::Python,
                parse_failed: true,
                nodes: Vec::new(),
            };
        };

        let root = tree.root_node();
        let parse_failed = root.has_error();
        let mut nodes = Vec::new();
        walk(root, source, None, &mut nodes);

        SyntaxTree {
            language: Language::Python,
            parse_failed,
            nodes,
        }
    }
}

fn is_method(node: Node) -> bool {
    node.parent()
        .and_then(|block| block.parent())
        .map(|class_def| class_def.kind() == "class_definition")
        .unwrap_or(false)
}

fn map_kind(node: Node) -> Option<NodeKind> {
    match node.kind() {
        "function_definition" => {
            if is_method(node) {
                Some(NodeKind::MethodLike)
            } else {
                Some(NodeKind::FunctionLike)
            }
        }
        "lambda" => Some(NodeKind::LambdaLike),
        "class_definition" => Some(NodeKind::ClassLike),
        "if_statement" => Some(NodeKind::If),
        "elif_clause" => Some(NodeKind::ElseIf),
        "for_statement" => Some(NodeKind::ForEach),
        "while_statement" => Some(NodeKind::While),
        "try_statement" => Some(NodeKind::TryCatch),
        "except_clause" | "except_group_clause" => Some(NodeKind::CatchClause),
        "match_statement" => Some(NodeKind::SwitchMatch),
        "await" => Some(NodeKind::Await),
        "call" => Some(NodeKind::CallExpression),
        "attribute" => Some(NodeKind::PropertyAccess),
        "identifier" => Some(NodeKind::Identifier),
        "assignment" | "augmented_assignment" => Some(NodeKind::VariableDecl),
        "default_parameter" | "typed_parameter" | "typed_default_parameter" => {
            Some(NodeKind::Parameter)
        }
        "list_splat_pattern" | "dictionary_splat_pattern" => Some(NodeKind::RestParameter),
        "list_splat" | "dictionary_splat" => Some(NodeKind::SpreadInCall),
        "decorator" => Some(NodeKind::DecoratorApplication),
        "string" => Some(NodeKind::StringLiteral),
        "comment" => Some(NodeKind::Comment),
        _ => {
            if node.kind() == "function_definition" && has_async_keyword(node) {
                Some(NodeKind::AsyncBlock)
            } else {
                None
            }
        }
    }
}

fn has_async_keyword(node: Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == "async")
}

fn walk(node: Node, source: &str, tagged_parent: Option<usize>, out: &mut Vec<TaggedNode>) {
    let mapped = map_kind(node);
    let mut new_parent = tagged_parent;

    if let Some(kind) = mapped {
        let start = node.start_position();
        let end = node.end_position();
        let text = node.utf8_text(source.as_bytes()).unwrap_or("").to_string();
        out.push(TaggedNode {
            kind,
            start_line: start.row + 1,
            start_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column + 1,
            text,
            parent: tagged_parent,
        });
        new_parent = Some(out.len() - 1);

        if kind.is_function_boundary() && has_async_keyword(node) {
            out.push(TaggedNode {
                kind: NodeKind::AsyncBlock,
                start_line: start.row + 1,
                start_col: start.column + 1,
                end_line: end.row + 1,
                end_col: end.column + 1,
                text: String::new(),
                parent: new_parent,
            });
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, new_parent, out);
    }
}
