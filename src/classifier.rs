//! Module Classifier (spec.md S4.5): maps a path to an [`ArchetypeTag`] by
//! ordered glob matching against a fixed pattern table. First match wins.

use crate::simplex::SimplexPoint;
use globset::Glob;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchetypeTag {
    ApiExternal,
    ApiInternal,
    App,
    LibDomain,
    LibInfra,
    Deploy,
    Default,
}

/// Ordered (glob, archetype) table; evaluated in declaration order so more
/// specific patterns are checked ahead of generic ones (deploy before the
/// catch-all `lib-infra`, per spec.md S4.5's stated evaluation order).
fn pattern_table() -> &'static [(&'static str, ArchetypeTag)] {
    static TABLE: OnceLock<Vec<(&'static str, ArchetypeTag)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            ("**/deploy/**", ArchetypeTag::Deploy),
            ("**/k8s/**", ArchetypeTag::Deploy),
            ("**/terraform/**", ArchetypeTag::Deploy),
            ("**/infra/deploy/**", ArchetypeTag::Deploy),
            ("**/api/external/**", ArchetypeTag::ApiExternal),
            ("**/routes/public/**", ArchetypeTag::ApiExternal),
            ("**/controllers/public/**", ArchetypeTag::ApiExternal),
            ("**/api/internal/**", ArchetypeTag::ApiInternal),
            ("**/routes/internal/**", ArchetypeTag::ApiInternal),
            ("**/api/**", ArchetypeTag::ApiInternal),
            ("**/app/**", ArchetypeTag::App),
            ("**/pages/**", ArchetypeTag::App),
            ("**/components/**", ArchetypeTag::App),
            ("**/lib/domain/**", ArchetypeTag::LibDomain),
            ("**/domain/**", ArchetypeTag::LibDomain),
            ("**/lib/infra/**", ArchetypeTag::LibInfra),
            ("**/lib/**", ArchetypeTag::LibInfra),
            ("**/infra/**", ArchetypeTag::LibInfra),
        ]
    })
}

pub fn classify(path: &Path) -> ArchetypeTag {
    let normalized = path.to_string_lossy().replace('\\', "/");
    for (pattern, tag) in pattern_table() {
        if let Ok(glob) = Glob::new(pattern) {
            if glob.compile_matcher().is_match(&normalized) {
                return *tag;
            }
        }
    }
    ArchetypeTag::Default
}

/// Fixed canonical profile per archetype (spec.md S3/S4.6). Constants of the
/// system -- api-external leans bread, lib-domain leans ham, app leans
/// cheese; `default` is the equal-thirds point.
pub fn canonical_profile(archetype: ArchetypeTag) -> SimplexPoint {
    match archetype {
        ArchetypeTag::ApiExternal => SimplexPoint { bread: 0.5, cheese: 0.25, ham: 0.25 },
        ArchetypeTag::ApiInternal => SimplexPoint { bread: 0.4, cheese: 0.3, ham: 0.3 },
        ArchetypeTag::App => SimplexPoint { bread: 0.25, cheese: 0.5, ham: 0.25 },
        ArchetypeTag::LibDomain => SimplexPoint { bread: 0.2, cheese: 0.3, ham: 0.5 },
        ArchetypeTag::LibInfra => SimplexPoint { bread: 0.3, cheese: 0.4, ham: 0.3 },
        ArchetypeTag::Deploy => SimplexPoint { bread: 0.5, cheese: 0.2, ham: 0.3 },
        ArchetypeTag::Default => SimplexPoint { bread: 1.0 / 3.0, cheese: 1.0 / 3.0, ham: 1.0 / 3.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_takes_priority_over_lib() {
        assert_eq!(classify(Path::new("infra/deploy/lib/apply.ts")), ArchetypeTag::Deploy);
    }

    #[test]
    fn api_external_matched_before_generic_api() {
        assert_eq!(classify(Path::new("src/api/external/billing.ts")), ArchetypeTag::ApiExternal);
        assert_eq!(classify(Path::new("src/api/internal/metrics.ts")), ArchetypeTag::ApiInternal);
    }

    #[test]
    fn unmatched_path_is_default() {
        assert_eq!(classify(Path::new("README.md")), ArchetypeTag::Default);
    }

    #[test]
    fn canonical_profiles_sum_to_one() {
        for tag in [
            ArchetypeTag::ApiExternal,
            ArchetypeTag::ApiInternal,
            ArchetypeTag::App,
            ArchetypeTag::LibDomain,
            ArchetypeTag::LibInfra,
            ArchetypeTag::Deploy,
            ArchetypeTag::Default,
        ] {
            let p = canonical_profile(tag);
            assert!((p.bread + p.cheese + p.ham - 1.0).abs() < 1e-9);
        }
    }
}
