//! Type-system complexity penalties (spec.md S4.2c). Only meaningful for
//! languages whose grammar surfaces generics/unions/conditional types --
//! Python and Go simply never tag these `NodeKind` variants, so every count
//! here is naturally zero for them (the empty-set edge case from S4.1).

use crate::tree::{NodeKind, SyntaxTree};

const GENERIC_PARAM_THRESHOLD: usize = 3;
const NESTED_GENERIC_THRESHOLD: usize = 2;
const UNION_WIDTH_THRESHOLD: usize = 5;
const CONDITIONAL_TYPE_THRESHOLD: usize = 3;
const DECORATOR_STACK_THRESHOLD: usize = 3;

const GENERIC_PARAM_PENALTY: f64 = 2.0;
const NESTED_GENERIC_PENALTY: f64 = 2.0;
const UNION_WIDTH_PENALTY: f64 = 1.0;
const INTERSECTION_PENALTY: f64 = 1.0;
const CONDITIONAL_TYPE_PENALTY: f64 = 1.0;
const MAPPED_TYPE_PENALTY: f64 = 1.0;
const TYPE_PREDICATE_PENALTY: f64 = 1.0;
const DECORATOR_STACK_PENALTY: f64 = 5.0;

#[derive(Debug, Clone, Default)]
pub struct TypePenaltyResult {
    pub total_penalty: f64,
    pub excessive_generic_params: bool,
    pub deeply_nested_generics: bool,
    pub extreme_union_width: bool,
    pub conditional_type_violation: bool,
    pub decorator_stack_violation: bool,
}

impl TypePenaltyResult {
    /// Does the aggregate type penalty exceed bounds on its own, independent
    /// of whether any single function's folded concept count crosses the
    /// threshold (spec.md S4.2f's separate "aggregate type-penalty exceeds
    /// bounds" trigger)?
    pub fn exceeds_bounds(&self) -> bool {
        self.excessive_generic_params
            || self.deeply_nested_generics
            || self.extreme_union_width
            || self.conditional_type_violation
            || self.decorator_stack_violation
    }
}

pub fn analyze(tree: &SyntaxTree) -> TypePenaltyResult {
    let mut result = TypePenaltyResult::default();

    for (_, node) in tree.nodes_of_kind(NodeKind::GenericParamList) {
        let param_count = node.text.matches(',').count() + 1;
        if param_count > GENERIC_PARAM_THRESHOLD {
            result.excessive_generic_params = true;
            result.total_penalty += GENERIC_PARAM_PENALTY;
        }
        let depth = angle_bracket_depth(&node.text);
        if depth > NESTED_GENERIC_THRESHOLD {
            result.deeply_nested_generics = true;
            result.total_penalty += NESTED_GENERIC_PENALTY;
        }
    }

    for (_, node) in tree.nodes_of_kind(NodeKind::UnionType) {
        let width = node.text.matches('|').count() + 1;
        if width > UNION_WIDTH_THRESHOLD {
            result.extreme_union_width = true;
        }
        result.total_penalty += UNION_WIDTH_PENALTY * width as f64;
    }

    let intersection_count = tree.nodes_of_kind(NodeKind::IntersectionType).count();
    result.total_penalty += intersection_count as f64 * INTERSECTION_PENALTY;

    let conditional_count = tree.nodes_of_kind(NodeKind::ConditionalType).count();
    if conditional_count > CONDITIONAL_TYPE_THRESHOLD {
        result.conditional_type_violation = true;
    }
    result.total_penalty += conditional_count as f64 * CONDITIONAL_TYPE_PENALTY;

    let mapped_count = tree.nodes_of_kind(NodeKind::MappedType).count();
    result.total_penalty += mapped_count as f64 * MAPPED_TYPE_PENALTY;

    let predicate_count = tree.nodes_of_kind(NodeKind::TypePredicate).count();
    result.total_penalty += predicate_count as f64 * TYPE_PREDICATE_PENALTY;

    if has_decorator_stack(tree) {
        result.decorator_stack_violation = true;
        result.total_penalty += DECORATOR_STACK_PENALTY;
    }

    result
}

fn angle_bracket_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut max_depth = 0usize;
    for ch in text.chars() {
        match ch {
            '<' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            '>' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max_depth
}

/// Three or more decorators applied to the same declaration, with no other
/// tagged node between them in source order (spec.md S4.2c).
fn has_decorator_stack(tree: &SyntaxTree) -> bool {
    let mut by_parent: std::collections::HashMap<Option<usize>, Vec<usize>> =
        std::collections::HashMap::new();
    for (i, node) in tree.nodes_of_kind(NodeKind::DecoratorApplication) {
        by_parent.entry(node.parent).or_default().push(i);
    }
    for group in by_parent.values() {
        let mut lines: Vec<usize> = group.iter().map(|&i| tree.nodes[i].start_line).collect();
        lines.sort_unstable();
        let mut run = 1;
        for w in lines.windows(2) {
            if w[1].saturating_sub(w[0]) <= 1 {
                run += 1;
                if run >= DECORATOR_STACK_THRESHOLD {
                    return true;
                }
            } else {
                run = 1;
            }
        }
    }
    false
}
