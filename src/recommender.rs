//! Gradient Recommender (spec.md S4.7): turns a canonical deviation into a
//! short, prioritized list of refactoring actions.

use crate::analyzer::cheese::CheeseReport;
use crate::simplex::CanonicalDeviation;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Default cap on recommendation count (spec.md S4.7).
pub const DEFAULT_K: usize = 3;

const DEVIATION_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Direction::Increase => "increase",
            Direction::Decrease => "decrease",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub axis: String,
    pub priority: usize,
    pub action: String,
    pub reason: String,
    pub expected_impact: f64,
    pub targets_equilibrium: bool,
}

/// Fixed action table keyed by (axis, direction); constants of the system
/// (spec.md S4.7).
fn action_table() -> &'static [((&'static str, Direction), &'static str)] {
    static TABLE: OnceLock<Vec<((&'static str, Direction), &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            (("bread", Direction::Increase), "Add explicit trust boundary"),
            (("bread", Direction::Decrease), "Consolidate redundant boundary checks"),
            (("cheese", Direction::Increase), "Extract cohesive concepts into named helpers"),
            (("cheese", Direction::Decrease), "Flatten nesting via early return"),
            (("ham", Direction::Increase), "Add golden tests for critical paths"),
            (("ham", Direction::Decrease), "Trim redundant test scaffolding"),
        ]
    })
}

fn action_for(axis: &str, direction: Direction) -> &'static str {
    action_table()
        .iter()
        .find(|((a, d), _)| *a == axis && *d == direction)
        .map(|(_, action)| *action)
        .unwrap_or("Rebalance this axis toward its canonical profile")
}

pub fn recommend(deviation: &CanonicalDeviation, cheese: &CheeseReport, k: usize) -> Vec<Recommendation> {
    if cheese.state_async_retry.violated {
        return vec![Recommendation {
            axis: "cheese".to_string(),
            priority: 0,
            action: "Separate state, async, and retry logic into distinct scopes".to_string(),
            reason: "State, async, and retry coexist in the same function or module (SAR invariant)"
                .to_string(),
            expected_impact: -20.0,
            targets_equilibrium: true,
        }]
        .into_iter()
        .take(k)
        .collect();
    }

    let mut axes = [
        ("bread", deviation.bread),
        ("cheese", deviation.cheese),
        ("ham", deviation.ham),
    ];
    axes.sort_by(|a, b| b.1.abs().partial_cmp(&a.1.abs()).unwrap());

    let mut recommendations = Vec::new();
    for (axis, dev) in axes {
        if recommendations.len() >= k {
            break;
        }
        if dev.abs() < DEVIATION_THRESHOLD {
            continue;
        }
        let direction = if dev < 0.0 { Direction::Increase } else { Direction::Decrease };
        let action = action_for(axis, direction);
        recommendations.push(Recommendation {
            axis: axis.to_string(),
            priority: recommendations.len() + 1,
            action: action.to_string(),
            reason: format!(
                "{} is {} its canonical share by {:.2}",
                axis,
                direction.label(),
                dev.abs()
            ),
            expected_impact: 100.0 * dev.abs() * if direction == Direction::Increase { 1.0 } else { -1.0 },
            targets_equilibrium: true,
        });
    }
    recommendations
}
