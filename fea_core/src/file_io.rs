//! # File I/O
//!
//! Everything that touches the disk:
//!
//! - `.fea` problem files (JSON) written atomically: serialize, write to a
//!   `.tmp` sibling, fsync, rename
//! - advisory locks (`.fea.lock`) so two users do not edit one problem
//! - job documents written into `<base>/<job>/` for a solver launcher
//!
//! ## Example
//!
//! ```rust,no_run
//! use fea_core::file_io::{load_problem, save_problem, FileLock};
//! use fea_core::model::Model;
//! use fea_core::problem::Problem;
//! use std::path::Path;
//!
//! let problem = Problem::new("bridge", Model::new("bridge"));
//! let path = Path::new("bridge.fea");
//!
//! let lock = FileLock::acquire(path, "analyst@example.com")?;
//! save_problem(&problem, path)?;
//! drop(lock);
//!
//! let reopened = load_problem(path)?;
//! assert_eq!(reopened.name, "bridge");
//! # Ok::<(), fea_core::errors::FeaError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::{FeaError, FeaResult};
use crate::job::{generate, BackendSerializer, JobPaths};
use crate::problem::{Problem, SCHEMA_VERSION};

/// Extension of problem files
pub const PROBLEM_EXTENSION: &str = "fea";

/// Locks older than this are taken over
const STALE_LOCK_HOURS: i64 = 24;

// ============================================================================
// Locking
// ============================================================================

/// Who holds a `.fea.lock` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Holder's process is gone, or the lock has outlived its grace period
    pub fn is_stale(&self) -> bool {
        if Utc::now() - self.locked_at > chrono::Duration::hours(STALE_LOCK_HOURS) {
            return true;
        }
        match hostname() {
            Some(machine) if machine == self.machine => !process_alive(self.pid),
            _ => false,
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Exclusive lock on a problem file, released on drop.
///
/// Holds an OS lock (fs2) on the lock file and records a [`LockInfo`] in
/// it so other users can see who is editing.
pub struct FileLock {
    problem_path: PathBuf,
    lock_path: PathBuf,
    _handle: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Lock `path` for `user_id`; fails with `FileLocked` if a live holder
    /// exists.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> FeaResult<Self> {
        if let Some(holder) = FileLock::check(path) {
            return Err(FeaError::file_locked(
                path.display().to_string(),
                format!("{} ({})", holder.user_id, holder.machine),
                holder.locked_at.to_rfc3339(),
            ));
        }

        let lock_path = lock_path_for(path);
        let io_err = |op: &str, e: std::io::Error| FeaError::file_error(op, lock_path.display().to_string(), e.to_string());

        // Content belongs to whoever holds the OS lock; clear it only after taking it.
        let mut handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| io_err("create lock", e))?;
        handle
            .try_lock_exclusive()
            .map_err(|_| FeaError::file_locked(path.display().to_string(), "another process", "unknown"))?;

        let info = LockInfo::new(user_id);
        let json = serde_json::to_string_pretty(&info).map_err(|e| FeaError::SerializationError {
            reason: e.to_string(),
        })?;
        handle.set_len(0).map_err(|e| io_err("clear lock", e))?;
        handle.seek(SeekFrom::Start(0)).map_err(|e| io_err("rewind lock", e))?;
        handle.write_all(json.as_bytes()).map_err(|e| io_err("write lock", e))?;
        handle.sync_all().map_err(|e| io_err("sync lock", e))?;

        tracing::debug!(path = %path.display(), user = %info.user_id, "lock acquired");
        Ok(FileLock {
            problem_path: path.to_path_buf(),
            lock_path,
            _handle: handle,
            info,
        })
    }

    /// Live holder of the lock on `path`, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let text = fs::read_to_string(lock_path_for(path)).ok()?;
        let info: LockInfo = serde_json::from_str(&text).ok()?;
        (!info.is_stale()).then_some(info)
    }

    pub fn problem_path(&self) -> &Path {
        &self.problem_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `problem.fea` -> `problem.fea.lock`
fn lock_path_for(path: &Path) -> PathBuf {
    let extension = path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    path.with_extension(extension)
}

// ============================================================================
// Writing
// ============================================================================

/// Write `bytes` to `path` through a synced `.tmp` sibling and a rename.
fn write_atomically(path: &Path, bytes: &[u8]) -> FeaResult<()> {
    let tmp_extension = path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    let tmp_path = path.with_extension(tmp_extension);
    let tmp_err = |op: &str, e: std::io::Error| FeaError::file_error(op, tmp_path.display().to_string(), e.to_string());

    let mut tmp = File::create(&tmp_path).map_err(|e| tmp_err("create temp file", e))?;
    tmp.write_all(bytes).map_err(|e| tmp_err("write temp file", e))?;
    tmp.sync_all().map_err(|e| tmp_err("sync temp file", e))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        FeaError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

/// Save a problem as pretty JSON with atomic write semantics.
pub fn save_problem(problem: &Problem, path: &Path) -> FeaResult<()> {
    let json = serde_json::to_string_pretty(problem).map_err(|e| FeaError::SerializationError {
        reason: e.to_string(),
    })?;
    write_atomically(path, json.as_bytes())?;
    tracing::info!(path = %path.display(), problem = %problem.name, "problem saved");
    Ok(())
}

/// Generate the job document and write it to `<base>/<job>/<job>.<ext>`.
///
/// Creates the working directory if needed; the solver launcher runs in it
/// and leaves its result files there.
pub fn write_input_file(problem: &Problem, backend: &dyn BackendSerializer, base: &Path) -> FeaResult<JobPaths> {
    let paths = JobPaths::new(base, &problem.name, backend);
    let document = generate(problem, backend)?;

    fs::create_dir_all(&paths.working_dir).map_err(|e| {
        FeaError::file_error("create working directory", paths.working_dir.display().to_string(), e.to_string())
    })?;
    write_atomically(&paths.document, document.as_bytes())?;

    tracing::info!(
        backend = backend.name(),
        path = %paths.document.display(),
        bytes = document.len(),
        "input file written"
    );
    Ok(paths)
}

// ============================================================================
// Reading
// ============================================================================

/// Load a problem file, checking its schema version.
pub fn load_problem(path: &Path) -> FeaResult<Problem> {
    let text =
        fs::read_to_string(path).map_err(|e| FeaError::file_error("read", path.display().to_string(), e.to_string()))?;
    let mut problem: Problem = serde_json::from_str(&text).map_err(|e| FeaError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;
    validate_version(&problem.version)?;
    problem.path = Some(path.to_path_buf());
    Ok(problem)
}

/// Load a problem along with the live lock on it, if another user holds one.
pub fn load_problem_with_lock_check(path: &Path) -> FeaResult<(Problem, Option<LockInfo>)> {
    let problem = load_problem(path)?;
    Ok((problem, FileLock::check(path)))
}

/// Major versions must match; within 0.x a newer minor is rejected.
fn validate_version(file_version: &str) -> FeaResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file = parse(file_version);
    let current = parse(SCHEMA_VERSION);
    let mismatch = || FeaError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    match (file.as_slice(), current.as_slice()) {
        ([], _) | (_, []) => Err(mismatch()),
        ([major, ..], [current_major, ..]) if major != current_major => Err(mismatch()),
        ([0, minor, ..], [0, current_minor, ..]) if minor > current_minor => Err(mismatch()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::backend_by_name;
    use crate::model::{Model, Node};
    use crate::problem::{BoundaryCondition, Support};
    use std::env::temp_dir;

    fn temp_problem_path(name: &str) -> PathBuf {
        temp_dir().join(format!("fea_io_test_{}_{}.fea", name, std::process::id()))
    }

    fn sample() -> Problem {
        let mut model = Model::new("column");
        let mut part = model.new_part("col");
        part.add_node(Node::new([0.0, 0.0, 0.0]));
        part.add_node(Node::new([0.0, 0.0, 3.0]));
        model.add_part(part);
        model.add_nodes_group("col-1", "foot", [0]).unwrap();
        let mut problem = Problem::new("column", model);
        problem.add_bc(BoundaryCondition::new("fix", "foot", Support::Fixed));
        problem
    }

    #[test]
    fn test_lock_path_generation() {
        assert_eq!(lock_path_for(Path::new("/work/bridge.fea")), Path::new("/work/bridge.fea.lock"));
    }

    #[test]
    fn test_save_and_load_keeps_graph() {
        let path = temp_problem_path("roundtrip");
        let problem = sample();
        save_problem(&problem, &path).unwrap();

        let loaded = load_problem(&path).unwrap();
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.model.part("col").unwrap().node_count(), 2);
        assert!(loaded.model.find_set("foot").is_some());
        assert_eq!(loaded.bcs().get("fix"), problem.bcs().get("fix"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let path = temp_problem_path("atomic");
        save_problem(&sample(), &path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("fea.tmp").exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_lock_blocks_second_holder() {
        let path = temp_problem_path("lock");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "a@example.com").unwrap();
        assert!(lock_path_for(&path).exists());
        assert_eq!(FileLock::check(&path).map(|i| i.user_id), Some("a@example.com".to_string()));

        let err = FileLock::acquire(&path, "b@example.com").err().unwrap();
        assert!(err.is_recoverable());

        drop(lock);
        assert!(!lock_path_for(&path).exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_failed_acquire_keeps_holder_record() {
        let path = temp_problem_path("lock_race");
        File::create(&path).unwrap();
        let lock = FileLock::acquire(&path, "a@example.com").unwrap();

        // Holder record looks stale, so only the OS lock stops the second caller.
        let mut old = LockInfo::new("a@example.com");
        old.locked_at = Utc::now() - chrono::Duration::hours(STALE_LOCK_HOURS + 1);
        let record = serde_json::to_string(&old).unwrap();
        fs::write(lock_path_for(&path), &record).unwrap();

        let err = FileLock::acquire(&path, "b@example.com").err().unwrap();
        assert_eq!(err.error_code(), "FILE_LOCKED");
        assert_eq!(fs::read_to_string(lock_path_for(&path)).unwrap(), record);

        drop(lock);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_old_lock_is_stale() {
        let mut info = LockInfo::new("someone");
        assert!(!info.is_stale());
        info.locked_at = Utc::now() - chrono::Duration::hours(STALE_LOCK_HOURS + 1);
        assert!(info.is_stale());
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("draft").is_err());
    }

    #[test]
    fn test_newer_file_rejected_on_load() {
        let path = temp_problem_path("newer");
        let mut problem = sample();
        problem.version = "0.9.0".into();
        save_problem(&problem, &path).unwrap();
        let err = load_problem(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_write_input_file_layout() {
        let base = temp_dir().join(format!("fea_io_jobs_{}", std::process::id()));
        let paths = write_input_file(&sample(), backend_by_name("opensees").unwrap(), &base).unwrap();
        assert_eq!(paths.document, base.join("column").join("column.tcl"));
        let text = fs::read_to_string(&paths.document).unwrap();
        assert!(text.contains("fix 1 1 1 1 1 1 1"));
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_load_with_lock_check() {
        let path = temp_problem_path("lock_check");
        save_problem(&sample(), &path).unwrap();
        let (loaded, holder) = load_problem_with_lock_check(&path).unwrap();
        assert_eq!(loaded.name, "column");
        assert!(holder.is_none());
        let _ = fs::remove_file(&path);
    }
}
