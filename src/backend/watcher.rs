//! Schedule file watcher for hot reload.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::backend::file::Snapshot;
use crate::backend::loader::load_schedules;
use crate::observability::metrics;

/// Watches the schedule file and swaps in each valid new version.
///
/// The parent directory is watched so that editors which replace the file
/// by rename are still picked up. A schedule path that is a symlink is also
/// reloaded when any change in that directory retargets it, which is how
/// mounted config volumes publish a new version.
pub(crate) struct ScheduleWatcher {
    path: PathBuf,
    snapshot: Arc<ArcSwap<Snapshot>>,
}

impl ScheduleWatcher {
    pub(crate) fn new(path: &Path, snapshot: Arc<ArcSwap<Snapshot>>) -> Self {
        Self {
            path: path.to_path_buf(),
            snapshot,
        }
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub(crate) fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let file_name = self.path.file_name().map(OsString::from);
        let snapshot = self.snapshot;
        let mut target = resolve_target(&path);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_access() {
                        return;
                    }
                    let touches_file = (event.kind.is_modify() || event.kind.is_create())
                        && event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(OsString::from) == file_name);

                    let current_target = resolve_target(&path);
                    let retargeted = current_target.is_some() && current_target != target;
                    if !(touches_file || retargeted) {
                        return;
                    }

                    tracing::debug!(path = ?path, retargeted, "Schedule file change detected, reloading");
                    match load_schedules(&path) {
                        Ok(new_config) => {
                            snapshot.store(Arc::new(Snapshot::new(new_config)));
                            // Only a successful load moves the target, so a failed one is retried.
                            target = current_target;
                            metrics::record_reload(true);
                            tracing::info!(path = ?path, resolved = ?target, "Schedule file reloaded");
                        }
                        Err(e) => {
                            metrics::record_reload(false);
                            tracing::error!(
                                path = ?path,
                                error = %e,
                                "Failed to reload schedule file. Keeping current configuration."
                            );
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            NotifyConfig::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Schedule watcher started");
        Ok(watcher)
    }
}

/// The file `path` currently resolves to after following every symlink.
fn resolve_target(path: &Path) -> Option<PathBuf> {
    fs::canonicalize(path).ok()
}
