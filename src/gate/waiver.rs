//! Waiver Store (spec.md S4.8, S3, S6). `.waiver.json` is a tree document
//! with nullable date fields -- dates are modeled as calendar dates
//! (`chrono::NaiveDate`), never as arbitrary strings or wall-clock
//! timestamps, and `expiresAt: null` means "never expires" explicitly
//! (Design Notes S9).

use chrono::NaiveDate;
use globset::Glob;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Convergence {
    pub delta_phi: f64,
    pub epsilon: f64,
    pub iterations: u32,
    pub evidence_complete: bool,
}

impl Convergence {
    pub fn satisfied(&self) -> bool {
        self.delta_phi.abs() < self.epsilon && self.iterations >= 3 && self.evidence_complete
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaiverRecord {
    pub pattern: String,
    pub adr: String,
    pub justification: String,
    pub approved_at: NaiveDate,
    pub expires_at: Option<NaiveDate>,
    pub approver: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub convergence: Option<Convergence>,
}

impl WaiverRecord {
    /// Active iff `today <= expiresAt` (null meaning never-expires) and any
    /// declared convergence proof is internally satisfied (spec.md S3).
    pub fn is_active(&self, today: NaiveDate) -> bool {
        let not_expired = self.expires_at.map(|exp| today <= exp).unwrap_or(true);
        let convergence_ok = self.convergence.as_ref().map(|c| c.satisfied()).unwrap_or(true);
        not_expired && convergence_ok
    }

    /// `file_path` must already be project-root-relative (see
    /// [`relative_to_root`]) -- a waiver pattern like `"src/crypto/*.ts"`
    /// has no leading `**/` anchor, so `globset` only matches it against
    /// the start of the string, and an absolute or `./`-prefixed path would
    /// never match even though the file is plainly inside `src/crypto/`.
    pub fn matches(&self, file_path: &Path) -> bool {
        let normalized = file_path.to_string_lossy().replace('\\', "/");
        Glob::new(&self.pattern)
            .map(|g| g.compile_matcher().is_match(&normalized))
            .unwrap_or(false)
    }

    /// A waiver whose file's effective concept count exceeds the stage
    /// ceiling by more than one requires a satisfied convergence proof
    /// (spec.md S4.8, Open Questions).
    pub fn eligible_for(&self, concept_overage: f64, today: NaiveDate) -> bool {
        if !self.is_active(today) {
            return false;
        }
        if concept_overage > 1.0 {
            return self.convergence.as_ref().map(|c| c.satisfied()).unwrap_or(false);
        }
        true
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WaiverFile {
    #[allow(dead_code)]
    version: String,
    waivers: Vec<WaiverRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum WaiverError {
    #[error("malformed waiver file {path}: {source}")]
    Malformed {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Strip `Component::CurDir` (`.`) segments without touching the
/// filesystem, so `./src/crypto/aes.ts` normalizes to `src/crypto/aes.ts`.
fn normalize_components(p: &Path) -> PathBuf {
    p.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

/// Rebase `file_path` to be relative to `project_root`, the way a waiver
/// pattern expects (spec.md S4.8's patterns are written relative to the
/// project root, e.g. `"src/crypto/*.ts"`, never anchored to an absolute
/// filesystem path or a `./`-prefixed CLI argument).
///
/// Tries, in order: canonicalizing both sides and stripping (handles
/// `sandwich /home/user/proj` where `file_path` and `project_root` are both
/// absolute but may differ in symlink resolution or trailing separators),
/// then a plain `strip_prefix` on the paths as given, then falls back to
/// just normalizing away `./` (handles `sandwich .`, where there is no
/// useful `project_root` to strip at all). Never touches the result if none
/// of these apply -- an already-relative, already-rooted path passes
/// through unchanged.
pub fn relative_to_root(file_path: &Path, project_root: Option<&Path>) -> PathBuf {
    let Some(root) = project_root else {
        return normalize_components(file_path);
    };

    if let (Ok(canon_file), Ok(canon_root)) = (file_path.canonicalize(), root.canonicalize()) {
        if let Ok(rel) = canon_file.strip_prefix(&canon_root) {
            return rel.to_path_buf();
        }
    }

    if let Ok(rel) = file_path.strip_prefix(root) {
        return normalize_components(rel);
    }

    normalize_components(file_path)
}

type WaiverCache = Mutex<HashMap<PathBuf, (SystemTime, Vec<WaiverRecord>)>>;

fn waiver_cache() -> &'static WaiverCache {
    static CACHE: OnceLock<WaiverCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Walk upward from `file_path` to `project_root` looking for `.waiver.json`,
/// returning the parsed waiver list of the first one found. Per spec.md S7,
/// a missing or malformed file is not an error surfaced to the caller --
/// callers should treat `Ok(None)`/`Err` as "no waivers apply" and attach an
/// advisory note rather than fail the analysis.
///
/// Parsed waiver files are memoized per project root, keyed by the
/// discovered path and invalidated on mtime change (S5's "waiver-store
/// memoization", guarded by a single process-wide mutex since discovery is
/// cheap but re-parsing on every gate check across a large directory is not).
pub fn discover(file_path: &Path, project_root: Option<&Path>) -> Result<Option<Vec<WaiverRecord>>, WaiverError> {
    let mut dir = file_path.parent().map(Path::to_path_buf);
    let root = project_root.map(Path::to_path_buf);

    while let Some(d) = dir {
        let candidate = d.join(".waiver.json");
        if candidate.is_file() {
            let mtime = std::fs::metadata(&candidate).and_then(|m| m.modified()).ok();

            if let Some(mtime) = mtime {
                let mut cache = waiver_cache().lock().unwrap();
                if let Some((cached_mtime, waivers)) = cache.get(&candidate) {
                    if *cached_mtime == mtime {
                        return Ok(Some(waivers.clone()));
                    }
                }
                drop(cache);

                let contents = std::fs::read_to_string(&candidate).unwrap_or_default();
                let parsed: WaiverFile = serde_json::from_str(&contents)
                    .map_err(|source| WaiverError::Malformed { path: candidate.clone(), source })?;
                waiver_cache().lock().unwrap().insert(candidate, (mtime, parsed.waivers.clone()));
                return Ok(Some(parsed.waivers));
            }

            let contents = std::fs::read_to_string(&candidate).unwrap_or_default();
            let parsed: WaiverFile = serde_json::from_str(&contents)
                .map_err(|source| WaiverError::Malformed { path: candidate, source })?;
            return Ok(Some(parsed.waivers));
        }
        if Some(&d) == root.as_ref() {
            break;
        }
        match d.parent() {
            Some(p) => dir = Some(p.to_path_buf()),
            None => break,
        }
    }
    Ok(None)
}

/// Most-specific active waiver matching `file_path` (longest pattern wins
/// among candidates, per spec.md S4.8 "among them the most specific pattern
/// wins"). `file_path` must already be project-root-relative -- see
/// [`relative_to_root`]; callers (`GateEngine::check_gate`) rebase before
/// calling this.
pub fn find_active(
    waivers: &[WaiverRecord],
    file_path: &Path,
    today: NaiveDate,
) -> Option<&WaiverRecord> {
    waivers
        .iter()
        .filter(|w| w.matches(file_path) && w.is_active(today))
        .max_by_key(|w| w.pattern.len())
}
