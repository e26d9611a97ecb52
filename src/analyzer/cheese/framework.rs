//! Framework detection and the presentational-nesting weight table
//! (spec.md S4.2a). Per Design Notes S9, the detection order is an ordered
//! `Vec`, not a map -- evaluation order matters (more specific markers
//! checked before generic ones) and a map's undefined iteration order would
//! make detection flaky.

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framework {
    React,
    Vue,
    Angular,
    Svelte,
    None,
}

impl Framework {
    /// Presentational-nesting weight: `total effective nesting = logic +
    /// ceil(presentational * weight)` (spec.md S4.2a).
    pub fn presentational_weight(self) -> f64 {
        match self {
            Framework::React => 0.3,
            Framework::Vue => 0.3,
            Framework::Angular => 0.4,
            Framework::Svelte => 0.3,
            Framework::None => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Framework::React => "react",
            Framework::Vue => "vue",
            Framework::Angular => "angular",
            Framework::Svelte => "svelte",
            Framework::None => "none",
        }
    }
}

/// Ordered (marker-substring, framework) table. First match wins, scanned in
/// declaration order against import/require text -- the same "ordered
/// config table" discipline the teacher's `FrameworkDetector` uses for test
/// framework detection.
fn detection_order() -> &'static [(&'static str, Framework)] {
    static TABLE: OnceLock<Vec<(&'static str, Framework)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            ("@angular/core", Framework::Angular),
            ("svelte", Framework::Svelte),
            ("vue", Framework::Vue),
            ("react", Framework::React),
        ]
    })
}

pub fn detect_framework(source: &str) -> Framework {
    let lower = source.to_lowercase();
    for (marker, framework) in detection_order() {
        if lower.contains(marker) {
            return *framework;
        }
    }
    Framework::None
}

/// Hook/composition-API call names per framework, in evaluation order.
/// Calls to these names are concept-counted at `presentational_weight`
/// instead of full weight (spec.md S4.2b), and their result bindings are
/// excluded from the locally-bound-name concept set (spec.md S4.2b "locally
/// bound names that are neither framework-hook call results...").
pub fn hook_names(framework: Framework) -> &'static [&'static str] {
    match framework {
        Framework::React => &[
            "useState",
            "useReducer",
            "useEffect",
            "useMemo",
            "useCallback",
            "useRef",
            "useContext",
            "useLayoutEffect",
        ],
        Framework::Vue => &["ref", "reactive", "computed", "watch", "watchEffect", "onMounted"],
        Framework::Angular => &["Input", "Output", "HostListener", "ViewChild"],
        Framework::Svelte => &["onMount", "onDestroy", "afterUpdate", "beforeUpdate"],
        Framework::None => &[],
    }
}

pub fn is_hook_call(framework: Framework, callee: &str) -> bool {
    hook_names(framework).iter().any(|h| *h == callee)
}
