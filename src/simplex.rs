//! Simplex Normalizer, Canonical Deviation, Label, Equilibrium (spec.md
//! S4.6). Pure arithmetic over the raw triple; no I/O, no state.

use crate::RawTriple;
use serde::{Deserialize, Serialize};

/// Tolerance for equilibrium detection (spec.md S4.6 default `ε_eq = 0.1`).
pub const EQ_TOLERANCE: f64 = 0.1;

/// Tolerance for the "balanced" label band (spec.md S4.6 default `ε_bal = 0.05`).
pub const BAL_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplexPoint {
    pub bread: f64,
    pub cheese: f64,
    pub ham: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalDeviation {
    pub bread: f64,
    pub cheese: f64,
    pub ham: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DominantLabel {
    Bread,
    Cheese,
    Ham,
    Balanced,
}

/// `(b,c,h) -> (b/T, c/T, h/T)`, or `(1/3,1/3,1/3)` when `T = 0` (spec.md S4.6).
pub fn normalize(raw: &RawTriple) -> SimplexPoint {
    let total = raw.total();
    if total <= f64::EPSILON {
        return SimplexPoint {
            bread: 1.0 / 3.0,
            cheese: 1.0 / 3.0,
            ham: 1.0 / 3.0,
        };
    }
    SimplexPoint {
        bread: raw.bread / total,
        cheese: raw.cheese / total,
        ham: raw.ham / total,
    }
}

/// Componentwise signed difference `current - canonical`, plus the Euclidean
/// distance between the two points (spec.md S3/S4.6).
pub fn deviation(current: &SimplexPoint, canonical: &SimplexPoint) -> CanonicalDeviation {
    let bread = current.bread - canonical.bread;
    let cheese = current.cheese - canonical.cheese;
    let ham = current.ham - canonical.ham;
    let distance = (bread * bread + cheese * cheese + ham * ham).sqrt();
    CanonicalDeviation { bread, cheese, ham, distance }
}

/// Every component within `tolerance` of the canonical component (spec.md S4.6).
pub fn is_equilibrium(dev: &CanonicalDeviation, tolerance: f64) -> bool {
    dev.bread.abs() <= tolerance && dev.cheese.abs() <= tolerance && dev.ham.abs() <= tolerance
}

/// Argmax over `{bread, cheese, ham}`, ties broken bread > cheese > ham;
/// `Balanced` when `max - min <= BAL_TOLERANCE`. Confidence is
/// `(max - median) / max` for non-balanced labels, `1.0` for balanced.
pub fn dominant_label(point: &SimplexPoint) -> (DominantLabel, f64) {
    let mut values = [
        (DominantLabel::Bread, point.bread),
        (DominantLabel::Cheese, point.cheese),
        (DominantLabel::Ham, point.ham),
    ];
    values.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    let (max_label, max) = values[0];
    let (_, median) = values[1];
    let (_, min) = values[2];

    if max - min <= BAL_TOLERANCE {
        return (DominantLabel::Balanced, 1.0);
    }
    let confidence = if max > 0.0 { (max - median) / max } else { 0.0 };
    (max_label, confidence)
}
