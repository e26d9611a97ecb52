//! TypeScript/TSX tree-view adapter, built on `tree-sitter-typescript` --
//! the teacher's own parsing stack (see `TypeScriptParser` in the original
//! `rigor` crate this analyzer is descended from).

use super::{NodeKind, SyntaxTree, TaggedNode};
use crate::Language;
use tree_sitter::{Language as TsLanguage, Node, Parser};

pub struct TypeScriptAdapter;

impl TypeScriptAdapter {
    pub fn parse(source: &str, tsx: bool) -> SyntaxTree {
        let mut parser = Parser::new();
        let language: TsLanguage = if tsx {
            tree_sitter_typescript::LANGUAGE_TSX.into()
        } else {
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
        };
        if parser.set_language(&language).is_err() {
            return SyntaxTree {
                language: if tsx { Language::Tsx } else { Language::TypeScript },
                parse_failed: true,
                nodes: Vec::new(),
            };
        }

        let Some(tree) = parser.parse(source, None) else {
            return SyntaxTree {
                language: if tsx { Language::Tsx } else { Language::TypeScript },
                parse_failed: true,
                nodes: Vec::new(),
            };
        };

        let root = tree.root_node();
        let parse_failed = root.has_error();

        let mut nodes = Vec::new();
        walk(root, source, None, &mut nodes);

        SyntaxTree {
            language: if tsx { Language::Tsx } else { Language::TypeScript },
            parse_failed,
            nodes,
        }
    }
}

/// Map a tree-sitter-typescript grammar kind to the abstract node-kind set.
/// Returns `None` for grammar nodes with no counterpart in spec.md S4.1/S6 --
/// their children still get walked and attach to the nearest tagged
/// ancestor, so traversal never loses depth information.
fn map_kind(node: Node, source: &str) -> Option<NodeKind> {
    match node.kind() {
        "function_declaration" | "function" | "generator_function"
        | "generator_function_declaration" => Some(NodeKind::FunctionLike),
        "method_definition" => Some(NodeKind::MethodLike),
        "arrow_function" => Some(NodeKind::LambdaLike),
        "class_declaration" | "class" => Some(NodeKind::ClassLike),
        "if_statement" => {
            if is_else_if(node) {
                Some(NodeKind::ElseIf)
            } else {
                Some(NodeKind::If)
            }
        }
        "for_statement" => Some(NodeKind::For),
        "while_statement" => Some(NodeKind::While),
        "do_statement" => Some(NodeKind::DoWhile),
        "for_in_statement" => Some(NodeKind::ForEach),
        "try_statement" => Some(NodeKind::TryCatch),
        "catch_clause" => Some(NodeKind::CatchClause),
        "switch_statement" => Some(NodeKind::SwitchMatch),
        "await_expression" => Some(NodeKind::Await),
        "call_expression" => Some(NodeKind::CallExpression),
        "member_expression" | "subscript_expression" => Some(NodeKind::PropertyAccess),
        "identifier" | "property_identifier" | "shorthand_property_identifier" => {
            Some(NodeKind::Identifier)
        }
        "variable_declarator" => Some(NodeKind::VariableDecl),
        "required_parameter" | "optional_parameter" => Some(NodeKind::Parameter),
        "rest_pattern" => Some(NodeKind::RestParameter),
        "spread_element" => Some(NodeKind::SpreadInCall),
        "decorator" => Some(NodeKind::DecoratorApplication),
        "type_parameters" => Some(NodeKind::GenericParamList),
        "union_type" => Some(NodeKind::UnionType),
        "intersection_type" => Some(NodeKind::IntersectionType),
        "conditional_type" => Some(NodeKind::ConditionalType),
        "mapped_type_clause" | "mapped_type" => Some(NodeKind::MappedType),
        "type_predicate" | "type_predicate_annotation" => Some(NodeKind::TypePredicate),
        "string" | "template_string" => Some(NodeKind::StringLiteral),
        "comment" => Some(NodeKind::Comment),
        _ => {
            // `async` functions/arrows/methods have no dedicated grammar node;
            // synthesize the AsyncBlock tag on any declaration carrying the
            // "async" keyword child, so SAR detection (spec.md S4.2d) sees it
            // as a distinct tagged node alongside the FunctionLike/MethodLike
            // tag that `map_kind` would otherwise return for the same span.
            if matches!(
                node.kind(),
                "function_declaration" | "function" | "arrow_function" | "method_definition"
            ) && has_async_keyword(node, source)
            {
                Some(NodeKind::AsyncBlock)
            } else {
                None
            }
        }
    }
}

fn has_async_keyword(node: Node, _source: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|child| child.kind() == "async")
}

fn is_else_if(node: Node) -> bool {
    node.parent()
        .map(|p| p.kind() == "else_clause")
        .unwrap_or(false)
}

fn walk(node: Node, source: &str, tagged_parent: Option<usize>, out: &mut Vec<TaggedNode>) {
    let mapped = map_kind(node, source);
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

        // Functions/methods with an "async" keyword also get a co-located
        // AsyncBlock tag (see map_kind's fallback arm) so both the function
        // boundary and the async marker are queryable independently.
        if kind.is_function_boundary() && has_async_keyword(node, source) {
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
