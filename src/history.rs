//! Trend tracking: append-only `.sandwich-history.json` of per-file
//! (bread, cheese, ham, label) results across runs, for score-delta-over-time
//! reporting. Pure ambient convenience -- spec.md is silent on this, but no
//! real crate in this lineage ships its scoring engine without it.

use crate::{DominantLabel, SandwichResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const HISTORY_FILENAME: &str = ".sandwich-history.json";
const MAX_RUNS: usize = 50;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct HistoryFile {
    pub runs: Vec<HistoryRun>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRun {
    pub timestamp: String,
    pub files: HashMap<String, FileTriple>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FileTriple {
    pub bread: f64,
    pub cheese: f64,
    pub ham: f64,
    pub label: DominantLabel,
}

pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() { start.parent()? } else { start };
    loop {
        if dir.join(HISTORY_FILENAME).exists() || dir.join("package.json").exists() || dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

pub fn load_history(project_root: &Path) -> HistoryFile {
    let path = project_root.join(HISTORY_FILENAME);
    if let Ok(content) = fs::read_to_string(&path) {
        if let Ok(history) = serde_json::from_str::<HistoryFile>(&content) {
            return history;
        }
    }
    HistoryFile::default()
}

pub fn save_history(project_root: &Path, history: &HistoryFile) -> std::io::Result<()> {
    let path = project_root.join(HISTORY_FILENAME);
    let content = serde_json::to_string_pretty(history).unwrap_or_else(|_| "{}".to_string());
    fs::write(path, content)
}

pub fn previous_triple(history: &HistoryFile, file_path: &Path) -> Option<FileTriple> {
    let run = history.runs.last()?;
    run.files.get(&file_path.to_string_lossy().to_string()).copied()
}

pub fn append_run(history: &mut HistoryFile, results: &[SandwichResult], timestamp: String) {
    let mut files = HashMap::new();
    for r in results {
        files.insert(
            r.file_path.to_string_lossy().to_string(),
            FileTriple {
                bread: r.raw.bread,
                cheese: r.raw.cheese,
                ham: r.raw.ham,
                label: r.label,
            },
        );
    }
    history.runs.push(HistoryRun { timestamp, files });
    if history.runs.len() > MAX_RUNS {
        history.runs.drain(0..history.runs.len() - MAX_RUNS);
    }
}

/// Format a score delta for console display, e.g. " [cheese was 4.0, up 2.0]".
pub fn format_delta(previous: Option<FileTriple>, current: &SandwichResult) -> String {
    let Some(prev) = previous else {
        return String::new();
    };
    let delta = current.raw.cheese - prev.cheese;
    if delta.abs() < f64::EPSILON {
        return format!(" [cheese unchanged at {:.1}]", current.raw.cheese);
    }
    if delta > 0.0 {
        format!(" [cheese was {:.1}, up {:.1}]", prev.cheese, delta)
    } else {
        format!(" [cheese was {:.1}, down {:.1}]", prev.cheese, -delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze_sandwich;

    #[test]
    fn append_run_records_and_caps_history() {
        let mut history = HistoryFile::default();
        for i in 0..(MAX_RUNS + 5) {
            let result = analyze_sandwich("function add(a, b) { return a + b; }", Path::new("a.ts"));
            append_run(&mut history, &[result], format!("run-{i}"));
        }
        assert_eq!(history.runs.len(), MAX_RUNS);
    }

    #[test]
    fn previous_triple_reads_the_latest_run() {
        let mut history = HistoryFile::default();
        let result = analyze_sandwich("function add(a, b) { return a + b; }", Path::new("a.ts"));
        append_run(&mut history, &[result], "run-1".to_string());
        let prev = previous_triple(&history, Path::new("a.ts"));
        assert!(prev.is_some());
        assert!(previous_triple(&history, Path::new("missing.ts")).is_none());
    }

    #[test]
    fn save_and_load_roundtrips() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut history = HistoryFile::default();
        let result = analyze_sandwich("function add(a, b) { return a + b; }", Path::new("a.ts"));
        append_run(&mut history, &[result], "run-1".to_string());
        save_history(dir.path(), &history).unwrap();

        let loaded = load_history(dir.path());
        assert_eq!(loaded.runs.len(), 1);
    }

    #[test]
    fn format_delta_empty_when_no_previous_run() {
        let result = analyze_sandwich("function add(a, b) { return a + b; }", Path::new("a.ts"));
        assert_eq!(format_delta(None, &result), "");
    }
}
