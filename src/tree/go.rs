//! Go tree-view adapter, built on `tree-sitter-go`. Go has no
//! exceptions/async-await and no decorators, so `TryCatch`, `CatchClause`,
//! `Await`, `DecoratorApplication` are never emitted; `GoroutineSpawn` and
//! `ChannelOp` stand in as Go's async-ish primitives per spec.md S4.2d's
//! Async detector ("goroutine/channel operations").

use super::{NodeKind, SyntaxTree, TaggedNode};
use crate::Language;
use tree_sitter::{Language as TsLanguage, Node, Parser};

pub struct GoAdapter;

impl GoAdapter {
    pub fn parse(source: &str) -> SyntaxTree {
        let mut parser = Parser::new();
        let language: TsLanguage = tree_sitter_go::LANGUAGE.into();
        if parser.set_language(&language).is_err() {
            return SyntaxTree {
                language: Language::Go,
                parse_failed: true,
                nodes: Vec::new(),
            };
        }

        let Some(tree) = parser.parse(source, None) else {
            return SyntaxTree {
                language: Language::Go,
                parse_failed: true,
                nodes: Vec::new(),
            };
        };

        let root = tree.root_node();
        let parse_failed = root.has_error();
        let mut nodes = Vec::new();
        walk(root, source, None, &mut nodes);

        SyntaxTree {
            language: Language::Go,
            parse_failed,
            nodes,
        }
    }
}

fn is_else_if(node: Node) -> bool {
    node.parent()
        .map(|p| p.kind() == "if_statement")
        .unwrap_or(false)
}

fn for_kind(node: Node) -> NodeKind {
    let mut cursor = node.walk();
    let mut has_clause = false;
    for child in node.children(&mut cursor) {
        if child.kind() == "range_clause" {
            return NodeKind::ForEach;
        }
        if child.kind() == "for_clause" {
            has_clause = true;
        }
    }
    if has_clause {
        NodeKind::For
    } else {
        // Bare `for { ... }` -- Go's infinite loop, closest analogue to `while`.
        NodeKind::While
    }
}

fn map_kind(node: Node) -> Option<NodeKind> {
    match node.kind() {
        "function_declaration" => Some(NodeKind::FunctionLike),
        "method_declaration" => Some(NodeKind::MethodLike),
        "func_literal" => Some(NodeKind::LambdaLike),
        "type_spec" if has_struct_type_child(node) => Some(NodeKind::ClassLike),
        "if_statement" => {
            if is_else_if(node) {
                Some(NodeKind::ElseIf)
            } else {
                Some(NodeKind::If)
            }
        }
        "for_statement" => Some(for_kind(node)),
        "expression_switch_statement" | "type_switch_statement" | "select_statement" => {
            Some(NodeKind::SwitchMatch)
        }
        "go_statement" => Some(NodeKind::GoroutineSpawn),
        "send_statement" => Some(NodeKind::ChannelOp),
        "unary_expression" if is_channel_receive(node) => Some(NodeKind::ChannelOp),
        "call_expression" => Some(NodeKind::CallExpression),
        "selector_expression" => Some(NodeKind::PropertyAccess),
        "identifier" | "field_identifier" => Some(NodeKind::Identifier),
        "var_declaration" | "short_var_declaration" | "const_declaration" => {
            Some(NodeKind::VariableDecl)
        }
        "variadic_parameter_declaration" => Some(NodeKind::RestParameter),
        "parameter_declaration" => Some(NodeKind::Parameter),
        "type_parameter_list" => Some(NodeKind::GenericParamList),
        "interpreted_string_literal" | "raw_string_literal" => Some(NodeKind::StringLiteral),
        "comment" => Some(NodeKind::Comment),
        _ => None,
    }
}

fn has_struct_type_child(node: Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == "struct_type")
}

fn is_channel_receive(node: Node) -> bool {
    node.child(0)
        .map(|op| op.kind() == "<-")
        .unwrap_or(false)
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
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, new_parent, out);
    }
}
