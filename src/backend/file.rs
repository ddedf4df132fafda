//! Local schedule file backend.
//!
//! # Responsibilities
//! - Load the schedule file at construction and fail fast if it is invalid
//! - Keep the current `Snapshot` behind an `ArcSwap`, replaced whole on reload
//! - Match blocks per request from a single snapshot, or serve its precomputed merge

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use notify::RecommendedWatcher;

use crate::backend::loader::load_schedules;
use crate::backend::watcher::ScheduleWatcher;
use crate::backend::BackendError;
use crate::matching::{match_resource, merge_all, Resource};
use crate::model::{Config, ConfigBlock, Fingerprint, Fingerprinted};
use crate::protocol::ConfigResponse;

/// Suggested client poll interval when none is configured.
pub const DEFAULT_WAIT_TIME_SECS: i32 = 30;

/// One loaded schedule file with its resource-independent merge precomputed.
pub(crate) struct Snapshot {
    config: Config,
    merged: ConfigBlock,
    fingerprint: Fingerprint,
}

impl Snapshot {
    pub(crate) fn new(config: Config) -> Self {
        let merged = merge_all(&config.blocks);
        let fingerprint = merged.fingerprint();
        Self {
            config,
            merged,
            fingerprint,
        }
    }

    pub(crate) fn block_count(&self) -> usize {
        self.config.blocks.len()
    }
}

pub struct FileBackend {
    path: PathBuf,
    snapshot: Arc<ArcSwap<Snapshot>>,
    wait_time: i32,
    resource_matching: bool,
    watcher: Mutex<Option<RecommendedWatcher>>,
    closed: AtomicBool,
}

impl FileBackend {
    /// Load `path` and start watching it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref().to_path_buf();

        let initial = load_schedules(&path).map_err(|source| BackendError::Load {
            path: path.clone(),
            source,
        })?;
        let snapshot = Arc::new(ArcSwap::from_pointee(Snapshot::new(initial)));

        let watcher = ScheduleWatcher::new(&path, snapshot.clone())
            .run()
            .map_err(|source| BackendError::Watch {
                path: path.clone(),
                source,
            })?;

        tracing::info!(
            path = ?path,
            blocks = snapshot.load().block_count(),
            "File backend loaded schedules"
        );

        Ok(Self {
            path,
            snapshot,
            wait_time: DEFAULT_WAIT_TIME_SECS,
            resource_matching: true,
            watcher: Mutex::new(Some(watcher)),
            closed: AtomicBool::new(false),
        })
    }

    /// Override the suggested wait time. Non-positive values are ignored.
    pub fn with_wait_time(mut self, seconds: i32) -> Self {
        if seconds > 0 {
            self.wait_time = seconds;
        }
        self
    }

    /// When disabled, every block is served to every resource.
    pub fn with_resource_matching(mut self, enabled: bool) -> Self {
        self.resource_matching = enabled;
        self
    }

    pub fn wait_time(&self) -> i32 {
        self.wait_time
    }

    fn snapshot(&self) -> Result<Arc<Snapshot>, BackendError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BackendError::Closed);
        }
        Ok(self.snapshot.load_full())
    }

    pub fn fingerprint(&self, resource: &Resource) -> Result<Vec<u8>, BackendError> {
        let snapshot = self.snapshot()?;
        if self.resource_matching {
            Ok(match_resource(resource, &snapshot.config.blocks).fingerprint().to_vec())
        } else {
            Ok(snapshot.fingerprint.to_vec())
        }
    }

    pub fn build_config_response(&self, resource: &Resource) -> Result<ConfigResponse, BackendError> {
        let snapshot = self.snapshot()?;
        if self.resource_matching {
            let block = match_resource(resource, &snapshot.config.blocks);
            Ok(ConfigResponse::from_block(&block, self.wait_time))
        } else {
            Ok(ConfigResponse::from_parts(
                &snapshot.fingerprint,
                &snapshot.merged,
                self.wait_time,
            ))
        }
    }

    /// Stop watching. Safe to call more than once.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Ok(mut watcher) = self.watcher.lock() {
            watcher.take();
        }
        tracing::info!(path = ?self.path, "File backend closed");
    }
}
