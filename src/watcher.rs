//! File watch mode: re-run analysis whenever a source file changes.
//! Identical in design to the teacher's `TestWatcher` -- debounced,
//! `notify`-backed, channel-driven.

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

const DEBOUNCE_MS: u64 = 300;

pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<notify::Event>>,
}

fn is_create_or_modify(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

impl SourceWatcher {
    /// Start watching the given path (file or directory).
    pub fn watch(path: &Path) -> notify::Result<Self> {
        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_millis(DEBOUNCE_MS)),
        )?;

        if path.is_dir() {
            watcher.watch(path, RecursiveMode::Recursive)?;
        } else if let Some(parent) = path.parent() {
            watcher.watch(parent, RecursiveMode::Recursive)?;
        }

        Ok(Self { _watcher: watcher, receiver: rx })
    }

    /// Files this watcher cares about: recognized source extensions, never
    /// anything under `node_modules` or `.git`.
    pub fn is_watched_source(p: &Path) -> bool {
        let excluded = p.components().any(|c| {
            let s = c.as_os_str();
            s == "node_modules" || s == ".git" || s == "dist" || s == "target"
        });
        if excluded {
            return false;
        }
        matches!(
            p.extension().and_then(|e| e.to_str()),
            Some("ts") | Some("tsx") | Some("py") | Some("go")
        )
    }

    fn paths_from_event(event: &notify::Event) -> Vec<PathBuf> {
        if !is_create_or_modify(&event.kind) {
            return vec![];
        }
        event.paths.iter().filter(|p| Self::is_watched_source(p)).cloned().collect()
    }

    /// Block until at least one change arrives, then drain further events
    /// for `DEBOUNCE_MS` before returning the deduplicated batch.
    pub fn next_changes(&self) -> Vec<PathBuf> {
        let mut all = std::collections::HashSet::new();

        match self.receiver.recv_timeout(Duration::from_secs(3600)) {
            Ok(Ok(event)) => {
                for p in Self::paths_from_event(&event) {
                    all.insert(p);
                }
            }
            Ok(Err(e)) => {
                log::warn!("watcher event error: {e}");
                return vec![];
            }
            Err(_) => return vec![],
        }

        std::thread::sleep(Duration::from_millis(DEBOUNCE_MS));
        while let Ok(Ok(event)) = self.receiver.try_recv() {
            for p in Self::paths_from_event(&event) {
                all.insert(p);
            }
        }

        all.into_iter().collect()
    }
}
