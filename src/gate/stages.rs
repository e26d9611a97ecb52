//! Gate-stage threshold tables (spec.md S4.8). Constants of the system.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStage {
    #[serde(rename = "poc")]
    PoC,
    #[serde(rename = "mvp")]
    Mvp,
    Production,
}

#[derive(Debug, Clone, Copy)]
pub struct StageThresholds {
    pub nesting_max: usize,
    pub concepts_per_fn: f64,
    pub golden_test_min: f64,
    pub hidden_deps_max: usize,
    pub allows_waiver: bool,
}

impl GateStage {
    pub fn thresholds(self) -> StageThresholds {
        match self {
            GateStage::PoC => StageThresholds {
                nesting_max: 6,
                concepts_per_fn: 12.0,
                golden_test_min: 0.50,
                hidden_deps_max: 2,
                allows_waiver: false,
            },
            GateStage::Mvp => StageThresholds {
                nesting_max: 4,
                concepts_per_fn: 9.0,
                golden_test_min: 0.80,
                hidden_deps_max: 2,
                allows_waiver: false,
            },
            GateStage::Production => StageThresholds {
                nesting_max: 3,
                concepts_per_fn: 7.0,
                golden_test_min: 0.95,
                hidden_deps_max: 2,
                allows_waiver: true,
            },
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "poc" => Some(GateStage::PoC),
            "mvp" => Some(GateStage::Mvp),
            "production" | "prod" => Some(GateStage::Production),
            _ => None,
        }
    }
}
