//! Storage targets and their provisioning.
//!
//! Every strategy writes into its own set of store files, and every store file is
//! written by exactly one worker. The layout below hands out those disjoint paths:
//!
//! ```text
//! <storage_dir>/single.db            single-worker strategy
//! <storage_dir>/multi_<i>.sqlite     one per thread of the multi-thread strategy
//! <storage_dir>/process_<i>.sqlite   one per process of the multi-process strategy
//! ```
//!
//! Provisioning deletes whatever sits at a target path and creates an empty store with
//! the `blobs` table and the throughput settings, so stale rows from an earlier run are
//! never appended to.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::config::BenchmarkConfig;
use crate::error::ProvisioningFailure;

/// Table every worker inserts into.
pub const BLOB_TABLE: &str = "blobs";

const CREATE_TABLE: &str = "CREATE TABLE blobs(id INTEGER PRIMARY KEY, data BLOB)";

/// Which strategy a store belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Single,
    ThreadShard,
    ProcessShard,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Single => write!(f, "single"),
            StorageKind::ThreadShard => write!(f, "thread-shard"),
            StorageKind::ProcessShard => write!(f, "process-shard"),
        }
    }
}

/// One physical store file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTarget {
    kind: StorageKind,
    index: Option<usize>,
    path: PathBuf,
}

impl StorageTarget {
    fn single(dir: &Path) -> Self {
        Self {
            kind: StorageKind::Single,
            index: None,
            path: dir.join("single.db"),
        }
    }

    fn shard(kind: StorageKind, prefix: &Path, index: usize) -> Self {
        Self {
            kind,
            index: Some(index),
            path: shard_path(prefix, index),
        }
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    /// Shard index; `None` for the single-worker store.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counts the rows currently stored in the blob table.
    pub fn row_count(&self) -> rusqlite::Result<u64> {
        let conn = Connection::open(&self.path)?;
        conn.query_row(&format!("SELECT COUNT(*) FROM {BLOB_TABLE}"), [], |row| {
            row.get(0)
        })
    }
}

/// Path of shard `index` under `prefix`: `<prefix>_<index>.sqlite`.
///
/// The multi-thread writer derives its per-thread files with this same function, so the
/// files it opens are exactly the ones the provisioner created.
pub fn shard_path(prefix: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(format!("_{index}.sqlite"));
    PathBuf::from(name)
}

/// Every store a run needs, grouped by strategy.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    single: StorageTarget,
    thread_prefix: PathBuf,
    thread_shards: Vec<StorageTarget>,
    process_shards: Vec<StorageTarget>,
}

impl StorageLayout {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let dir = config.storage_dir();
        let thread_prefix = dir.join("multi");
        let process_prefix = dir.join("process");

        let thread_shards = (0..config.threads())
            .map(|i| StorageTarget::shard(StorageKind::ThreadShard, &thread_prefix, i))
            .collect();
        let process_shards = (0..config.processes())
            .map(|i| StorageTarget::shard(StorageKind::ProcessShard, &process_prefix, i))
            .collect();

        Self {
            single: StorageTarget::single(dir),
            thread_prefix,
            thread_shards,
            process_shards,
        }
    }

    pub fn single(&self) -> &StorageTarget {
        &self.single
    }

    /// Prefix handed to the multi-thread writer; see [`shard_path`].
    pub fn thread_prefix(&self) -> &Path {
        &self.thread_prefix
    }

    pub fn thread_shards(&self) -> &[StorageTarget] {
        &self.thread_shards
    }

    pub fn process_shards(&self) -> &[StorageTarget] {
        &self.process_shards
    }

    /// All targets, single store first, then thread shards, then process shards.
    pub fn targets(&self) -> impl Iterator<Item = &StorageTarget> {
        std::iter::once(&self.single)
            .chain(&self.thread_shards)
            .chain(&self.process_shards)
    }
}

/// Engine settings reported back after tuning a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThroughputSettings {
    pub journal_mode: String,
    pub locking_mode: String,
    pub synchronous: i64,
}

/// Turns off journaling and sync fencing and takes the file lock exclusively.
///
/// Returns the values the engine reports after the change.
pub fn apply_throughput_settings(conn: &Connection) -> rusqlite::Result<ThroughputSettings> {
    let journal_mode: String =
        conn.query_row("PRAGMA journal_mode = OFF", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA synchronous = OFF")?;
    let locking_mode: String =
        conn.query_row("PRAGMA locking_mode = EXCLUSIVE", [], |row| row.get(0))?;
    let synchronous: i64 = conn.query_row("PRAGMA synchronous", [], |row| row.get(0))?;

    Ok(ThroughputSettings {
        journal_mode,
        locking_mode,
        synchronous,
    })
}

/// Resets one target to an empty, tuned store.
pub fn provision(target: &StorageTarget) -> Result<(), ProvisioningFailure> {
    let path = target.path();
    let io_failure = |source: io::Error| ProvisioningFailure::Io {
        path: path.to_path_buf(),
        source,
    };
    let statement_failure = |source: rusqlite::Error| ProvisioningFailure::Statement {
        path: path.to_path_buf(),
        source,
    };

    match fs::remove_file(path) {
        Ok(()) => log::debug!("removed previous store {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_failure(e)),
    }

    let conn = Connection::open(path).map_err(statement_failure)?;
    let settings = apply_throughput_settings(&conn).map_err(statement_failure)?;
    check_setting(path, "journal_mode", "off", &settings.journal_mode)?;
    check_setting(path, "locking_mode", "exclusive", &settings.locking_mode)?;
    check_setting(path, "synchronous", "0", &settings.synchronous.to_string())?;

    conn.execute(CREATE_TABLE, []).map_err(statement_failure)?;
    conn.close().map_err(|(_, e)| statement_failure(e))?;

    log::debug!("provisioned {} store {}", target.kind(), path.display());
    Ok(())
}

fn check_setting(
    path: &Path,
    pragma: &'static str,
    expected: &'static str,
    actual: &str,
) -> Result<(), ProvisioningFailure> {
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(ProvisioningFailure::Setting {
            path: path.to_path_buf(),
            pragma,
            expected,
            actual: actual.to_string(),
        })
    }
}

/// Provisions every target of the layout, stopping at the first failure.
pub fn provision_all(
    config: &BenchmarkConfig,
    layout: &StorageLayout,
) -> Result<(), ProvisioningFailure> {
    let dir = config.storage_dir();
    fs::create_dir_all(dir).map_err(|source| ProvisioningFailure::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut provisioned = 0;
    for target in layout.targets() {
        provision(target)?;
        provisioned += 1;
    }
    log::info!("provisioned {provisioned} stores in {}", dir.display());
    Ok(())
}
