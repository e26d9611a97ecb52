//! Integration tests for the on-disk result cache: roundtrip through a real
//! temp directory, cross-process-shaped (drop and recreate) persistence,
//! and invalidation on content change.

use sandwich::cache::AnalysisCache;
use sandwich::{analyze_sandwich, SandwichResult};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn make_result(path: &str, source: &str) -> SandwichResult {
    analyze_sandwich(source, Path::new(path))
}

#[test]
fn cache_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let src = "function add(a, b) { return a + b; }";

    {
        let mut cache = AnalysisCache::new(dir.path());
        cache.set(Path::new("math.ts"), src, make_result("math.ts", src));
        cache.save().unwrap();
    }

    let cache = AnalysisCache::new(dir.path());
    let cached = cache.get(Path::new("math.ts"), src);
    assert!(cached.is_some());
    assert_eq!(cached.unwrap().file_path, Path::new("math.ts"));
}

#[test]
fn cache_miss_on_content_change_forces_reanalysis() {
    let dir = TempDir::new().unwrap();
    let mut cache = AnalysisCache::new(dir.path());
    cache.set(Path::new("math.ts"), "const x = 1;", make_result("math.ts", "const x = 1;"));

    assert!(cache.get(Path::new("math.ts"), "const x = 2;").is_none());
    assert!(cache.get(Path::new("math.ts"), "const x = 1;").is_some());
}

#[test]
fn stats_reflect_entry_count_and_enabled_flag() {
    let dir = TempDir::new().unwrap();
    let mut cache = AnalysisCache::new(dir.path());
    assert_eq!(cache.stats().entries, 0);
    assert!(cache.stats().enabled);

    cache.set(Path::new("a.ts"), "a", make_result("a.ts", "a"));
    cache.set(Path::new("b.ts"), "b", make_result("b.ts", "b"));
    assert_eq!(cache.stats().entries, 2);
}

#[test]
fn cleanup_removes_entries_for_deleted_files() {
    let dir = TempDir::new().unwrap();
    let mut cache = AnalysisCache::new(dir.path());
    cache.set(Path::new("a.ts"), "a", make_result("a.ts", "a"));
    cache.set(Path::new("stale.ts"), "s", make_result("stale.ts", "s"));

    cache.cleanup(&[PathBuf::from("a.ts")]);
    assert_eq!(cache.stats().entries, 1);
    assert!(cache.get(Path::new("stale.ts"), "s").is_none());
}

#[test]
fn disabled_cache_never_persists_anything() {
    let dir = TempDir::new().unwrap();
    let mut cache = AnalysisCache::disabled();
    cache.set(Path::new("a.ts"), "a", make_result("a.ts", "a"));
    cache.save().unwrap();
    assert!(!dir.path().join(".sandwich-cache.json").exists());
}
