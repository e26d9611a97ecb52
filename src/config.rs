//! Project-level configuration (`.sandwich.json`): default gate stage,
//! archetype path-pattern overrides, per-file violation ignores, and
//! `extends` chaining -- the sibling store to the waiver store (gate.rs
//! waivers suppress specific violations at Production; this governs which
//! violations are considered at all).

use crate::classifier::ArchetypeTag;
use crate::gate::GateStage;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = ".sandwich.json";

/// Per-path override: files matching `files` get a different default gate
/// stage and/or have some violation codes ignored outright.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverride {
    pub files: Vec<String>,
    #[serde(default)]
    pub default_stage: Option<GateStage>,
    #[serde(default)]
    pub ignore_violations: Vec<String>,
}

/// Force `classify`'s archetype guess for files matching `pattern`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeOverride {
    pub pattern: String,
    pub archetype: ArchetypeTag,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub extends: Option<String>,

    #[serde(default)]
    pub default_stage: Option<GateStage>,

    #[serde(default)]
    pub archetype_overrides: Vec<ArchetypeOverride>,

    /// Glob patterns for files to exclude from analysis entirely.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Violation codes ignored everywhere, regardless of path.
    #[serde(default)]
    pub ignore_violations: Vec<String>,

    #[serde(default)]
    pub overrides: Vec<ConfigOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extends: None,
            default_stage: None,
            archetype_overrides: Vec::new(),
            ignore: Vec::new(),
            ignore_violations: Vec::new(),
            overrides: Vec::new(),
        }
    }
}

/// Config resolved for one specific file after applying matching overrides.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub stage: Option<GateStage>,
    pub ignored_violations: HashSet<String>,
}

impl Config {
    pub fn effective_for_file(&self, file_path: &Path) -> EffectiveConfig {
        let mut effective = EffectiveConfig {
            stage: self.default_stage,
            ignored_violations: self.ignore_violations.iter().cloned().collect(),
        };

        for ov in &self.overrides {
            if matches_any(file_path, &ov.files) {
                if let Some(stage) = ov.default_stage {
                    effective.stage = Some(stage);
                }
                effective.ignored_violations.extend(ov.ignore_violations.iter().cloned());
            }
        }

        effective
    }

    /// Archetype override for `file_path`, if any pattern matches (first
    /// match wins, same order-sensitivity as the classifier's own table).
    pub fn archetype_for_file(&self, file_path: &Path) -> Option<ArchetypeTag> {
        self.archetype_overrides
            .iter()
            .find(|o| matches_any(file_path, std::slice::from_ref(&o.pattern)))
            .map(|o| o.archetype)
    }

    /// Merge another config into this one (for `extends`); this config's
    /// own values take precedence over the base's.
    fn merge_from(&mut self, base: Config) {
        if self.default_stage.is_none() {
            self.default_stage = base.default_stage;
        }
        if self.extends.is_none() {
            self.extends = base.extends;
        }

        let mut archetype_overrides = base.archetype_overrides;
        archetype_overrides.append(&mut self.archetype_overrides);
        self.archetype_overrides = archetype_overrides;

        let mut ignore = base.ignore;
        ignore.append(&mut self.ignore);
        self.ignore = ignore;

        let mut ignore_violations = base.ignore_violations;
        ignore_violations.append(&mut self.ignore_violations);
        self.ignore_violations = ignore_violations;

        let mut overrides = base.overrides;
        overrides.append(&mut self.overrides);
        self.overrides = overrides;
    }
}

fn matches_any(file_path: &Path, patterns: &[String]) -> bool {
    let normalized = file_path.to_string_lossy().replace('\\', "/");
    patterns.iter().any(|p| {
        Glob::new(p)
            .map(|g| g.compile_matcher().is_match(&normalized))
            .unwrap_or(false)
    })
}

/// Find and load `.sandwich.json` with extends resolution. Searches
/// `work_dir` then its parents, unless `custom_path` is given.
pub fn load_config(work_dir: &Path, custom_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        let path = if p.is_absolute() { p.to_path_buf() } else { work_dir.join(p) };
        if path.exists() {
            Some(path)
        } else {
            anyhow::bail!("Config file not found: {}", path.display());
        }
    } else {
        find_config_in_parents(work_dir)
    };

    match path {
        Some(path) => {
            log::debug!("loading config from {}", path.display());
            load_config_with_extends(&path, &mut HashSet::new())
        }
        None => {
            log::debug!("no {CONFIG_FILENAME} found under {}; using defaults", work_dir.display());
            Ok(Config::default())
        }
    }
}

fn load_config_with_extends(config_path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Config> {
    let canonical = config_path.canonicalize().unwrap_or_else(|_| config_path.to_path_buf());
    if visited.contains(&canonical) {
        anyhow::bail!("Circular extends detected in config: {}", config_path.display());
    }
    visited.insert(canonical);

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
    let mut config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in config: {}", config_path.display()))?;

    if let Some(extends) = config.extends.take() {
        let base = resolve_extends(config_path, &extends, visited)?;
        config.merge_from(base);
    }

    Ok(config)
}

fn resolve_extends(config_path: &Path, extends: &str, visited: &mut HashSet<PathBuf>) -> Result<Config> {
    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let extends_path = if extends.starts_with("./") || extends.starts_with("../") {
        config_dir.join(extends)
    } else if let Some(stripped) = extends.strip_prefix('/') {
        PathBuf::from("/").join(stripped)
    } else {
        config_dir.join(extends)
    };

    let extends_path = if extends_path.extension().is_none() {
        extends_path.with_extension("json")
    } else {
        extends_path
    };

    if !extends_path.exists() {
        anyhow::bail!(
            "Extended config not found: {} (referenced from {})",
            extends_path.display(),
            config_path.display()
        );
    }

    load_config_with_extends(&extends_path, visited)
}

fn find_config_in_parents(mut dir: &Path) -> Option<PathBuf> {
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

pub fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("Invalid ignore pattern: {}", pattern))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| anyhow::anyhow!("{}", e))
}

pub fn is_ignored(path: &Path, ignore_set: &GlobSet) -> bool {
    ignore_set.is_match(path)
}

/// Find the project root (first ancestor with `package.json`, `.git`, or
/// the config file itself).
pub fn find_project_root(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir;
    loop {
        if dir.join("package.json").exists() || dir.join(".git").exists() || dir.join(CONFIG_FILENAME).exists() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_no_overrides() {
        let config = Config::default();
        assert!(config.overrides.is_empty());
        assert!(config.default_stage.is_none());
    }

    #[test]
    fn is_ignored_matches_glob() {
        let set = build_ignore_set(&["**/generated/**".to_string()]).unwrap();
        assert!(is_ignored(Path::new("src/generated/foo.ts"), &set));
        assert!(!is_ignored(Path::new("src/foo.ts"), &set));
    }

    #[test]
    fn effective_for_file_applies_matching_override() {
        let config: Config = serde_json::from_str(
            r#"{
                "defaultStage": "mvp",
                "overrides": [
                    { "files": ["**/legacy/**"], "defaultStage": "poc", "ignoreViolations": ["nesting-exceeded"] }
                ]
            }"#,
        )
        .unwrap();

        let effective = config.effective_for_file(Path::new("src/legacy/old.ts"));
        assert_eq!(effective.stage, Some(GateStage::PoC));
        assert!(effective.ignored_violations.contains("nesting-exceeded"));

        let effective = config.effective_for_file(Path::new("src/new.ts"));
        assert_eq!(effective.stage, Some(GateStage::Mvp));
        assert!(effective.ignored_violations.is_empty());
    }

    #[test]
    fn archetype_override_forces_classification() {
        let config: Config = serde_json::from_str(
            r#"{ "archetypeOverrides": [{ "pattern": "**/scripts/**", "archetype": "deploy" }] }"#,
        )
        .unwrap();
        assert_eq!(
            config.archetype_for_file(Path::new("scripts/migrate.ts")),
            Some(ArchetypeTag::Deploy)
        );
        assert_eq!(config.archetype_for_file(Path::new("src/lib/foo.ts")), None);
    }

    #[test]
    fn config_extends_merges_base() {
        let dir = TempDir::new().unwrap();

        let base_path = dir.path().join("base.json");
        let mut base_file = fs::File::create(&base_path).unwrap();
        writeln!(base_file, r#"{{ "defaultStage": "poc", "ignore": ["**/vendor/**"] }}"#).unwrap();

        let child_path = dir.path().join(CONFIG_FILENAME);
        let mut child_file = fs::File::create(&child_path).unwrap();
        writeln!(child_file, r#"{{ "extends": "./base.json", "ignoreViolations": ["sar-coexistence"] }}"#).unwrap();

        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.default_stage, Some(GateStage::PoC));
        assert!(config.ignore.contains(&"**/vendor/**".to_string()));
        assert!(config.ignore_violations.contains(&"sar-coexistence".to_string()));
    }

    #[test]
    fn load_config_defaults_when_absent() {
        let dir = TempDir::new().unwrap();
        let config = load_config(dir.path(), None).unwrap();
        assert!(config.default_stage.is_none());
    }
}
