#![allow(dead_code)]

use std::path::{Path, PathBuf};

use blob_bench::{
    BenchmarkConfig, BenchmarkConfigBuilder, StorageLayout, StorageTarget, provision_all,
};

/// Directory cargo placed the worker executables in for this test run.
pub fn worker_bin_dir() -> PathBuf {
    Path::new(env!("CARGO_BIN_EXE_single_writer"))
        .parent()
        .unwrap()
        .to_path_buf()
}

/// Builder pointing at the real workers and a private storage directory.
pub fn builder_in(storage_dir: &Path) -> BenchmarkConfigBuilder {
    BenchmarkConfig::builder()
        .blob_size(16)
        .storage_dir(storage_dir)
        .bin_dir(worker_bin_dir())
}

pub fn provisioned(config: &BenchmarkConfig) -> StorageLayout {
    let layout = StorageLayout::new(config);
    provision_all(config, &layout).unwrap();
    layout
}

pub fn row_counts<'a>(targets: impl IntoIterator<Item = &'a StorageTarget>) -> Vec<u64> {
    targets
        .into_iter()
        .map(|t| t.row_count().unwrap())
        .collect()
}

/// Writes an executable shell script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
