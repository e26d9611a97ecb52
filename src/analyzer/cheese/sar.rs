//! State x Async x Retry invariant (spec.md S4.2d). Three boolean detectors
//! run over the whole tree/source; violated iff at least two are true.
//! Regex tables are precompiled once per process (Design Notes S9).

use crate::tree::{NodeKind, SyntaxTree};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateAsyncRetry {
    pub has_state: bool,
    pub has_async: bool,
    pub has_retry: bool,
    pub violated: bool,
}

fn state_library_markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"useState|useReducer|createStore|new\s+Observable|makeObservable|combineReducers")
            .unwrap()
    })
}

fn instance_field_assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:this|self)\.\w+\s*=[^=]").unwrap())
}

fn reassignable_binding() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:let|var)\s+(\w+)\b").unwrap())
}

fn reassignment_of(name: &str, source: &str) -> bool {
    let pattern = format!(r"\b{}\s*(?:=[^=]|\+\+|--|\+=|-=)", regex::escape(name));
    Regex::new(&pattern).map(|re| re.is_match(source)).unwrap_or(false)
}

fn async_markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"new\s+Promise|\.then\(|\.catch\(|\bspawn\(|\bfork\(|Worker\(").unwrap()
    })
}

fn retry_markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)retry|backoff|max_retries|p-retry|async-retry|exponentialBackoff|\battempt(s)?\b",
        )
        .unwrap()
    })
}

fn detect_state(tree: &SyntaxTree, source: &str) -> bool {
    if instance_field_assignment().is_match(source) {
        return true;
    }
    if state_library_markers().is_match(source) {
        return true;
    }
    for cap in reassignable_binding().captures_iter(source) {
        let name = &cap[1];
        if reassignment_of(name, source) {
            return true;
        }
    }
    let _ = tree;
    false
}

fn detect_async(tree: &SyntaxTree, source: &str) -> bool {
    if tree.nodes_of_kind(NodeKind::AsyncBlock).next().is_some()
        || tree.nodes_of_kind(NodeKind::Await).next().is_some()
        || tree.nodes_of_kind(NodeKind::GoroutineSpawn).next().is_some()
        || tree.nodes_of_kind(NodeKind::ChannelOp).next().is_some()
    {
        return true;
    }
    async_markers().is_match(source)
}

fn detect_retry(source: &str) -> bool {
    retry_markers().is_match(source)
}

pub fn analyze(tree: &SyntaxTree, source: &str) -> StateAsyncRetry {
    let has_state = detect_state(tree, source);
    let has_async = detect_async(tree, source);
    let has_retry = detect_retry(source);
    let count = [has_state, has_async, has_retry].iter().filter(|b| **b).count();
    StateAsyncRetry {
        has_state,
        has_async,
        has_retry,
        violated: count >= 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;
    use crate::Language;

    #[test]
    fn trivial_function_has_no_sar() {
        let src = "function add(a, b) { return a + b; }";
        let t = tree::parse(Language::TypeScript, src);
        let result = analyze(&t, src);
        assert!(!result.violated);
    }

    #[test]
    fn state_async_retry_all_present_is_violated() {
        let src = r#"
class Job {
  async run() {
    for (let attempt = 0; attempt < 3; attempt++) {
      this.result = await fetch("https://example.com");
    }
  }
}
"#;
        let t = tree::parse(Language::TypeScript, src);
        let result = analyze(&t, src);
        assert!(result.has_state);
        assert!(result.has_async);
        assert!(result.has_retry);
        assert!(result.violated);
    }

    #[test]
    fn two_of_three_still_violates() {
        let src = "async function f() { this.x = await g(); }";
        let t = tree::parse(Language::TypeScript, src);
        let result = analyze(&t, src);
        assert!(result.violated);
        assert!(!result.has_retry);
    }
}
