//! Output formatting. Three renderings of the same [`SandwichResult`] /
//! [`GateVerdict`] pair: human-readable console, machine-readable JSON, and
//! SARIF 2.1.0 for GitHub Code Scanning.

pub mod console;
pub mod json;
pub mod sarif;

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use sarif::SarifReporter;

use crate::classifier::ArchetypeTag;

/// Human-facing label for an archetype; kept out of `classifier.rs` since
/// it's a display concern, not a classification one.
pub(crate) fn archetype_label(tag: ArchetypeTag) -> &'static str {
    match tag {
        ArchetypeTag::ApiExternal => "api-external",
        ArchetypeTag::ApiInternal => "api-internal",
        ArchetypeTag::App => "app",
        ArchetypeTag::LibDomain => "lib-domain",
        ArchetypeTag::LibInfra => "lib-infra",
        ArchetypeTag::Deploy => "deploy",
        ArchetypeTag::Default => "default",
    }
}
