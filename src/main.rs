//! Sandwich CLI: static complexity analysis gated against release-readiness
//! stages. Thin wrapper over the `sandwich` library -- this binary owns file
//! discovery, config/cache/history plumbing, and output formatting; the
//! scoring and gating logic all lives in the library.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use sandwich::cache::AnalysisCache;
use sandwich::config::{build_ignore_set, find_project_root, is_ignored, load_config, CONFIG_FILENAME};
use sandwich::gate::{GateEngine, GateStage};
use sandwich::history::{append_run, find_project_root as find_history_root, format_delta, load_history, previous_triple, save_history};
use sandwich::reporter::{ConsoleReporter, JsonReporter, SarifReporter};
use sandwich::watcher::SourceWatcher;
use sandwich::{analyze_sandwich_file, SandwichResult};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "sandwich")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Source file or directory to analyze (omit when using a subcommand)
    #[arg(required_unless_present = "command")]
    path: Option<PathBuf>,

    /// Release-readiness gate stage to check against: poc, mvp, production
    #[arg(long, short, default_value = "mvp")]
    stage: String,

    /// Output format as JSON
    #[arg(long, short)]
    json: bool,

    /// Output in SARIF format (for GitHub Code Scanning)
    #[arg(long)]
    sarif: bool,

    /// Quiet mode (one line per file)
    #[arg(long, short)]
    quiet: bool,

    /// Verbose output (always show recommendations)
    #[arg(long, short)]
    verbose: bool,

    /// Path to config file (default: search .sandwich.json in current dir and parents)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Watch for file changes and re-analyze
    #[arg(long)]
    watch: bool,

    /// Disable caching (re-analyze all files even if unchanged)
    #[arg(long)]
    no_cache: bool,

    /// Clear the analysis cache before running
    #[arg(long)]
    clear_cache: bool,

    /// Run analysis in parallel (default for directories with many files)
    #[arg(long)]
    parallel: bool,

    /// Number of parallel threads (default: number of CPU cores)
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run MCP server for editor/agent integration (stdio JSON-RPC)
    Mcp,

    /// Create .sandwich.json with sensible defaults
    Init {
        /// Default gate stage: poc, mvp, production
        #[arg(long)]
        stage: Option<String>,

        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Check a single file against a gate stage and print the verdict as JSON
    CheckGate {
        file: PathBuf,
        #[arg(long, short, default_value = "mvp")]
        stage: String,
    },

    /// Print prioritized refactor recommendations for a single file as JSON
    SuggestRefactor {
        file: PathBuf,
        /// Override the path-derived archetype (kebab-case, e.g. api-external)
        #[arg(long)]
        archetype: Option<String>,
    },

    /// Compare a file before/after a change against its archetype budget
    CheckBudget { before: PathBuf, after: PathBuf },

    /// Print a file's dominant label, confidence, and simplex point as JSON
    GetLabel { file: PathBuf },

    /// Compare cheese reports before/after a change for regression indicators
    CheckDegradation { before: PathBuf, after: PathBuf },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    log::debug!("parsed args: {args:?}");

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::Mcp => sandwich::mcp::run_mcp_server()
                .map_err(|e| anyhow::anyhow!("{}", e))
                .and(Ok(ExitCode::SUCCESS)),
            Commands::Init { stage, dir } => run_init(stage, dir.as_deref()),
            Commands::CheckGate { file, stage } => run_check_gate_command(&file, &stage),
            Commands::SuggestRefactor { file, archetype } => {
                run_suggest_refactor_command(&file, archetype.as_deref())
            }
            Commands::CheckBudget { before, after } => run_check_budget_command(&before, &after),
            Commands::GetLabel { file } => run_get_label_command(&file),
            Commands::CheckDegradation { before, after } => run_check_degradation_command(&before, &after),
        };
    }

    let path = args.path.clone().expect("path required when not using subcommand");
    let stage = GateStage::from_str_loose(&args.stage)
        .ok_or_else(|| anyhow::anyhow!("Unknown gate stage: {}", args.stage))?;

    if args.watch {
        return run_watch(&args, &path, stage);
    }

    let work_dir = if path.is_file() { path.parent().unwrap_or(Path::new(".")) } else { path.as_path() };
    let config = load_config(work_dir, args.config.as_deref())?;
    let ignore_set = if config.ignore.is_empty() { None } else { Some(build_ignore_set(&config.ignore)?) };

    let files = collect_source_files(&path, ignore_set.as_ref())?;
    if files.is_empty() {
        eprintln!("{}: No source files found", "Warning".yellow());
        return Ok(ExitCode::from(2));
    }

    let project_root = find_project_root(work_dir).unwrap_or_else(|| work_dir.to_path_buf());
    let mut cache = if args.no_cache { AnalysisCache::disabled() } else { AnalysisCache::new(&project_root) };
    if args.clear_cache {
        cache.clear();
        if !args.quiet {
            eprintln!("{}: Cache cleared", "Info".blue());
        }
    }

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global().ok();
    }

    let use_parallel = args.parallel || files.len() > 10;
    let (results, had_errors) = if use_parallel {
        analyze_files_parallel_cached(&files, &cache, args.quiet)
    } else {
        analyze_files_sequential_cached(&files, &mut cache, args.quiet)
    };

    if let Err(e) = cache.save() {
        if !args.quiet {
            eprintln!("{}: Failed to save cache: {}", "Warning".yellow(), e);
        }
    }

    if results.is_empty() {
        eprintln!("{}: All files failed to analyze", "Error".red());
        return Ok(ExitCode::from(2));
    }

    let verdicts: Vec<_> = results
        .iter()
        .map(|r| {
            let effective = config.effective_for_file(&r.file_path);
            let effective_stage = effective.stage.unwrap_or(stage);
            let mut verdict = GateEngine::new().check_gate(effective_stage, r, &r.file_path, Some(&project_root));
            verdict.violations.retain(|v| !effective.ignored_violations.contains(v));
            verdict.passed = verdict.violations.is_empty();
            verdict
        })
        .collect();

    render(&args, &results, &verdicts, work_dir)?;

    let history_root = find_history_root(work_dir);
    if let Some(ref root) = history_root {
        let mut history = load_history(root);
        append_run(&mut history, &results, chrono::Local::now().to_rfc3339());
        let _ = save_history(root, &history);
    }

    let all_passed = verdicts.iter().all(|v| v.passed);
    if !all_passed {
        Ok(ExitCode::from(1))
    } else if had_errors {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn render(args: &Args, results: &[SandwichResult], verdicts: &[sandwich::gate::GateVerdict], work_dir: &Path) -> Result<()> {
    if args.sarif {
        let pairs: Vec<_> = results.iter().cloned().zip(verdicts.iter().cloned()).collect();
        println!("{}", SarifReporter::new().report(&pairs));
    } else if args.json {
        let reporter = JsonReporter::new().pretty();
        if results.len() == 1 {
            println!("{}", reporter.report_with_gate(&results[0], &verdicts[0]));
        } else {
            println!("{}", reporter.report_with_summary(results));
        }
    } else if args.quiet {
        let reporter = ConsoleReporter::new();
        let history_root = find_history_root(work_dir);
        let history = history_root.as_ref().map(|p| load_history(p));
        for result in results {
            if let Some(ref h) = history {
                let prev = previous_triple(h, &result.file_path);
                print!("{}", format_delta(prev, result));
            }
            reporter.report_quiet(result);
        }
    } else {
        let mut reporter = ConsoleReporter::new();
        if args.verbose {
            reporter = reporter.verbose();
        }
        for (result, verdict) in results.iter().zip(verdicts.iter()) {
            reporter.report_with_gate(result, verdict);
        }
        if results.len() > 1 {
            reporter.report_many(results);
        }
    }
    Ok(())
}

fn run_init(stage: Option<String>, dir: Option<&Path>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let stage = stage.as_deref().unwrap_or("mvp");
    let json = format!(
        r#"{{
  "defaultStage": "{}",
  "ignore": [
    "**/node_modules/**",
    "**/dist/**",
    "**/vendor/**"
  ],
  "archetypeOverrides": [],
  "overrides": []
}}
"#,
        stage
    );

    std::fs::write(&config_path, json)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!(
        "{}: Created {} with defaultStage={}",
        "Done".green().bold(),
        config_path.display(),
        stage
    );
    Ok(ExitCode::SUCCESS)
}

fn run_check_gate_command(file: &Path, stage: &str) -> Result<ExitCode> {
    let stage = GateStage::from_str_loose(stage).ok_or_else(|| anyhow::anyhow!("Unknown gate stage: {stage}"))?;
    let source = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let project_root = find_project_root(file.parent().unwrap_or(Path::new("."))).unwrap_or_else(|| PathBuf::from("."));
    let verdict = sandwich::check_gate(&source, stage, file, Some(&project_root));
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(if verdict.passed { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn run_suggest_refactor_command(file: &Path, archetype: Option<&str>) -> Result<ExitCode> {
    let source = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let archetype = archetype.map(parse_archetype).transpose()?;
    let recommendations = sandwich::suggest_refactor(&source, file, archetype);
    println!("{}", serde_json::to_string_pretty(&recommendations)?);
    Ok(ExitCode::SUCCESS)
}

fn run_check_budget_command(before: &Path, after: &Path) -> Result<ExitCode> {
    let before_source = std::fs::read_to_string(before).with_context(|| format!("Failed to read {}", before.display()))?;
    let after_source = std::fs::read_to_string(after).with_context(|| format!("Failed to read {}", after.display()))?;
    let verdict = sandwich::check_budget(&before_source, &after_source, after, None);
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(if verdict.within_budget { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn run_get_label_command(file: &Path) -> Result<ExitCode> {
    let source = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let (label, confidence, point) = sandwich::get_label(&source, file);
    println!("{}", serde_json::json!({ "label": label, "confidence": confidence, "simplex": point }));
    Ok(ExitCode::SUCCESS)
}

fn run_check_degradation_command(before: &Path, after: &Path) -> Result<ExitCode> {
    let before_source = std::fs::read_to_string(before).with_context(|| format!("Failed to read {}", before.display()))?;
    let after_source = std::fs::read_to_string(after).with_context(|| format!("Failed to read {}", after.display()))?;
    let report = sandwich::check_degradation(&before_source, &after_source, after);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

fn parse_archetype(s: &str) -> Result<sandwich::ArchetypeTag> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| anyhow::anyhow!("unknown archetype: {s}"))
}

fn run_watch(args: &Args, path: &Path, stage: GateStage) -> Result<ExitCode> {
    let work_dir = if path.is_file() { path.parent().unwrap_or(Path::new(".")) } else { path };
    let config = load_config(work_dir, args.config.as_deref())?;
    let ignore_set = if config.ignore.is_empty() { None } else { Some(build_ignore_set(&config.ignore)?) };
    let project_root = find_project_root(work_dir).unwrap_or_else(|| work_dir.to_path_buf());

    let watcher = SourceWatcher::watch(path).context("Failed to create file watcher")?;
    eprintln!("{}: Watching for changes... (Ctrl+C to stop)", "Info".blue());

    loop {
        let paths = watcher.next_changes();
        if paths.is_empty() {
            continue;
        }
        for changed in paths {
            if let Some(ref set) = ignore_set {
                if is_ignored(&changed, set) {
                    continue;
                }
            }
            match analyze_sandwich_file(&changed) {
                Ok(result) => {
                    let effective = config.effective_for_file(&result.file_path);
                    let effective_stage = effective.stage.unwrap_or(stage);
                    let verdict = GateEngine::new().check_gate(effective_stage, &result, &changed, Some(&project_root));
                    if args.quiet {
                        ConsoleReporter::new().report_quiet(&result);
                    } else {
                        ConsoleReporter::new().report_with_gate(&result, &verdict);
                    }
                }
                Err(e) => {
                    eprintln!("{}: {}: {}", "Error".red(), changed.display(), e);
                }
            }
        }
    }
}

fn is_source_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts") | Some("tsx") | Some("py") | Some("go")
    )
}

fn collect_source_files(path: &Path, ignore_set: Option<&globset::GlobSet>) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        if let Some(set) = ignore_set {
            if is_ignored(path, set) {
                return Ok(vec![]);
            }
        }
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true).into_iter().filter_map(|e| e.ok()) {
        let file_path = entry.path();
        if file_path.components().any(|c| c.as_os_str() == "node_modules") {
            continue;
        }
        if is_source_file(file_path) {
            if let Some(set) = ignore_set {
                if is_ignored(file_path, set) {
                    continue;
                }
            }
            files.push(file_path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn analyze_files_sequential_cached(
    files: &[PathBuf],
    cache: &mut AnalysisCache,
    quiet: bool,
) -> (Vec<SandwichResult>, bool) {
    let mut results = Vec::new();
    let mut had_errors = false;
    let mut cache_hits = 0;

    for file in files {
        let content = std::fs::read_to_string(file).ok();
        if let Some(ref content) = content {
            if let Some(cached) = cache.get(file, content) {
                results.push(cached);
                cache_hits += 1;
                continue;
            }
        }

        match content {
            Some(content) => {
                let result = sandwich::analyze_sandwich(&content, file);
                cache.set(file, &content, result.clone());
                results.push(result);
            }
            None => {
                had_errors = true;
                if !quiet {
                    eprintln!("{}: Failed to read {}", "Error".red(), file.display());
                }
            }
        }
    }

    log::debug!("sequential analysis: {cache_hits} cache hits of {} files", files.len());
    if !quiet && cache_hits > 0 {
        eprintln!("{}: {} files from cache, {} analyzed", "Cache".blue(), cache_hits, files.len() - cache_hits);
    }

    (results, had_errors)
}

fn analyze_files_parallel_cached(files: &[PathBuf], cache: &AnalysisCache, quiet: bool) -> (Vec<SandwichResult>, bool) {
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    let had_errors = AtomicBool::new(false);
    let cache_hits = AtomicUsize::new(0);

    let results: Vec<_> = files
        .par_iter()
        .filter_map(|file| {
            if let Ok(content) = std::fs::read_to_string(file) {
                if let Some(cached) = cache.get(file, &content) {
                    cache_hits.fetch_add(1, Ordering::Relaxed);
                    return Some(cached);
                }
                Some(sandwich::analyze_sandwich(&content, file))
            } else {
                had_errors.store(true, Ordering::Relaxed);
                if !quiet {
                    eprintln!("{}: Failed to read {}", "Error".red(), file.display());
                }
                None
            }
        })
        .collect();

    let hits = cache_hits.load(Ordering::Relaxed);
    log::debug!("parallel analysis: {hits} cache hits of {} files", files.len());
    if !quiet && hits > 0 {
        eprintln!("{}: {} files from cache, {} analyzed", "Cache".blue(), hits, files.len() - hits);
    }

    (results, had_errors.load(Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_source_file_recognizes_extensions() {
        assert!(is_source_file(Path::new("a.ts")));
        assert!(is_source_file(Path::new("a.go")));
        assert!(!is_source_file(Path::new("README.md")));
    }

    #[test]
    fn collect_source_files_finds_single_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("a.ts");
        std::fs::write(&file, "const x = 1;").unwrap();
        let files = collect_source_files(&file, None).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn collect_source_files_walks_directory_and_skips_node_modules() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.ts"), "const x = 1;").unwrap();
        let nm = dir.path().join("node_modules");
        std::fs::create_dir(&nm).unwrap();
        std::fs::write(nm.join("b.ts"), "const y = 1;").unwrap();

        let files = collect_source_files(dir.path(), None).unwrap();
        assert_eq!(files.len(), 1);
    }
}
