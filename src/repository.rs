//! # Run repository
//!
//! An explicitly constructed index and cache of canonical runs read from a data folder.
//!
//! * The **index** maps a run identity to the CSV file it comes from; it is built by
//!   [`scan_folder`](RunRepository::scan_folder) and rebuilt by
//!   [`set_data_folder`](RunRepository::set_data_folder).
//! * The **cache** holds one [`OnceCell`] per identity. Concurrent
//!   [`get_run`](RunRepository::get_run) calls for the same identity load the file once;
//!   the other callers block on the cell and share the result.
//!
//! Runs are handed out as [`Arc`]s. Clearing the cache or rescanning never invalidates a run
//! a caller already holds, but the repository will not refresh it either: fetch again by
//! identity after an invalidation.
//!
//! Example
//! -----------------
//! ```rust,no_run
//! use camino::Utf8Path;
//! use telecanon::repository::RunRepository;
//!
//! # fn run() -> Result<(), telecanon::telemetry_errors::TelemetryError> {
//! let repo = RunRepository::new();
//! repo.set_data_folder(Utf8Path::new("data/"))?;
//! for summary in repo.list_runs() {
//!     let run = repo.get_run(&summary.id)?;
//!     println!("{}: {} samples", summary.name, run.len());
//! }
//! # Ok(()) }
//! ```
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ahash::RandomState;
use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::adapters::parse_telemetry_file_with_params;
use crate::canonicalizer::CanonicalizeParams;
use crate::constants::RunId;
use crate::coordinates::OriginOverride;
use crate::raw::FileFingerprint;
use crate::run::summary::{sort_summaries, RunSummary};
use crate::run::TelemetryRun;
use crate::telemetry_errors::TelemetryError;

type RunCell = Arc<OnceCell<Arc<TelemetryRun>>>;

#[derive(Debug, Default)]
struct RepositoryState {
    data_folder: Option<Utf8PathBuf>,
    index: HashMap<RunId, Utf8PathBuf, RandomState>,
    cache: HashMap<RunId, RunCell, RandomState>,
}

/// Index and single-flight cache of the runs of a data folder.
#[derive(Debug, Default)]
pub struct RunRepository {
    params: CanonicalizeParams,
    state: Mutex<RepositoryState>,
}

impl RunRepository {
    /// An empty repository with default [`CanonicalizeParams`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: CanonicalizeParams) -> Self {
        RunRepository {
            params,
            state: Mutex::default(),
        }
    }

    pub fn params(&self) -> &CanonicalizeParams {
        &self.params
    }

    fn state(&self) -> MutexGuard<'_, RepositoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn data_folder(&self) -> Option<Utf8PathBuf> {
        self.state().data_folder.clone()
    }

    /// Number of indexed runs.
    pub fn len(&self) -> usize {
        self.state().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().index.is_empty()
    }

    /// Identities currently indexed, sorted.
    pub fn run_ids(&self) -> Vec<RunId> {
        let mut ids: Vec<RunId> = self.state().index.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Switch to a new data folder: drop the index and the cache, then scan `folder`.
    ///
    /// Return
    /// ----------
    /// * The number of files indexed.
    pub fn set_data_folder(&self, folder: &Utf8Path) -> Result<usize, TelemetryError> {
        {
            let mut state = self.state();
            state.data_folder = Some(folder.to_path_buf());
            state.index.clear();
            state.cache.clear();
        }
        self.scan_folder(folder)
    }

    /// Drop the index and the cache and scan the current data folder again.
    pub fn rescan(&self) -> Result<usize, TelemetryError> {
        match self.data_folder() {
            Some(folder) => self.set_data_folder(&folder),
            None => Ok(0),
        }
    }

    /// Index every `*.csv` regular file of `folder` (not recursive).
    ///
    /// A missing folder indexes nothing and is only logged. Files that cannot be stat'ed
    /// are skipped.
    ///
    /// Return
    /// ----------
    /// * The number of files indexed, or [`TelemetryError::IoFailure`] if the folder exists
    ///   but cannot be listed.
    pub fn scan_folder(&self, folder: &Utf8Path) -> Result<usize, TelemetryError> {
        if !folder.exists() {
            warn!(%folder, "data folder does not exist");
            return Ok(0);
        }

        let mut files: Vec<Utf8PathBuf> = std::fs::read_dir(folder)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| Utf8PathBuf::try_from(entry.path()).ok())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        files.sort();

        let mut indexed = Vec::with_capacity(files.len());
        for path in files {
            match FileFingerprint::from_path(&path) {
                Ok(fingerprint) => {
                    let id = fingerprint.run_id();
                    debug!(%id, %path, "indexed run");
                    indexed.push((id, path));
                }
                Err(e) => warn!(%path, error = %e, "cannot stat file, skipped"),
            }
        }

        let count = indexed.len();
        self.state().index.extend(indexed);
        info!(count, %folder, "scanned data folder");
        Ok(count)
    }

    fn path_of(&self, id: &str) -> Result<Utf8PathBuf, TelemetryError> {
        self.state()
            .index
            .get(id)
            .cloned()
            .ok_or_else(|| TelemetryError::RunNotFound(id.to_string()))
    }

    /// Parse a file and register the run under its own identity when it differs from the
    /// one it was requested under (the file changed since the scan).
    fn load(
        &self,
        requested: &str,
        path: &Utf8Path,
        origin: &OriginOverride,
    ) -> Result<Arc<TelemetryRun>, TelemetryError> {
        let run = Arc::new(parse_telemetry_file_with_params(path, origin, &self.params)?);
        info!(id = run.id(), %path, samples = run.len(), "loaded run");

        if run.id() != requested {
            let mut state = self.state();
            state
                .index
                .entry(run.id().to_string())
                .or_insert_with(|| path.to_path_buf());
            let cell = state.cache.entry(run.id().to_string()).or_default().clone();
            drop(state);
            // already set means another load won, keep it
            let _ = cell.set(run.clone());
        }
        Ok(run)
    }

    /// The run indexed under `id`, loaded on first access and cached.
    ///
    /// Concurrent callers asking for the same `id` wait for a single load.
    ///
    /// Errors
    /// ----------
    /// * [`TelemetryError::RunNotFound`] if `id` is not indexed.
    /// * Any adapter error raised while loading; nothing is cached in that case.
    pub fn get_run(&self, id: &str) -> Result<Arc<TelemetryRun>, TelemetryError> {
        let (path, cell) = {
            let mut state = self.state();
            let path = state
                .index
                .get(id)
                .cloned()
                .ok_or_else(|| TelemetryError::RunNotFound(id.to_string()))?;
            let cell = state.cache.entry(id.to_string()).or_default().clone();
            (path, cell)
        };

        cell.get_or_try_init(|| self.load(id, &path, &OriginOverride::auto()))
            .cloned()
    }

    /// The run whose source file stem is `name`.
    pub fn get_run_by_name(&self, name: &str) -> Result<Arc<TelemetryRun>, TelemetryError> {
        let id = self
            .state()
            .index
            .iter()
            .filter(|(_, path)| path.file_stem() == Some(name))
            .map(|(id, _)| id.clone())
            .min()
            .ok_or_else(|| TelemetryError::RunNotFound(name.to_string()))?;
        self.get_run(&id)
    }

    /// Load `id` again with an origin override and replace the cached run.
    ///
    /// Later [`get_run`](Self::get_run) calls return the reloaded run.
    pub fn reload_run(
        &self,
        id: &str,
        origin: &OriginOverride,
    ) -> Result<Arc<TelemetryRun>, TelemetryError> {
        let path = self.path_of(id)?;
        let cell: RunCell = Arc::default();
        self.state().cache.insert(id.to_string(), cell.clone());

        cell.get_or_try_init(|| self.load(id, &path, origin)).cloned()
    }

    /// Summaries of every indexed run, most recent first.
    ///
    /// Runs that fail to load are logged and left out.
    pub fn list_runs(&self) -> Vec<RunSummary> {
        let mut summaries: Vec<RunSummary> = self
            .run_ids()
            .into_iter()
            .filter_map(|id| match self.get_run(&id) {
                Ok(run) => Some(RunSummary::from_run(&run)),
                Err(e) => {
                    warn!(%id, error = %e, "failed to load run");
                    None
                }
            })
            .collect();
        sort_summaries(&mut summaries);
        summaries
    }

    /// Drop every cached run; the index is kept.
    pub fn clear_cache(&self) {
        self.state().cache.clear();
        info!("run cache cleared");
    }
}
