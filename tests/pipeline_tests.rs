//! End-to-end runs of the whole pipeline with prebuilt workers.

use blob_bench::{
    BenchError, BenchmarkRun, CargoToolchain, PrebuiltToolchain, RunState, Strategy,
    StorageLayout,
};
use std::fs;
use tempfile::TempDir;

mod common;
use common::*;

#[test]
fn test_full_run_reports_all_strategies() {
    let tmpdir = TempDir::new().unwrap();
    let config = builder_in(tmpdir.path())
        .total_blobs(2_000)
        .threads(3)
        .processes(4)
        .build()
        .unwrap();

    let mut run = BenchmarkRun::new(&config, &PrebuiltToolchain);
    let report = run.execute().unwrap();

    assert_eq!(run.state(), RunState::Done);
    let order: Vec<Strategy> = report.results().iter().map(|r| r.strategy()).collect();
    assert_eq!(
        order,
        [Strategy::Single, Strategy::MultiThread, Strategy::MultiProcess]
    );
    assert!(report.results().iter().all(|r| r.success()));

    let rendered = report.to_string();
    assert!(rendered.contains("Single-threaded: "));
    assert!(rendered.contains("Multi-threaded: "));
    assert!(rendered.contains("Multi-process: "));

    // Stores are left behind for inspection.
    let layout = StorageLayout::new(&config);
    assert_eq!(layout.single().row_count().unwrap(), 2_000);
    assert_eq!(
        row_counts(layout.thread_shards()).iter().sum::<u64>(),
        2_000
    );
    assert_eq!(row_counts(layout.process_shards()), vec![500; 4]);
}

#[test]
fn test_rerun_does_not_append() {
    let tmpdir = TempDir::new().unwrap();
    let config = builder_in(tmpdir.path())
        .total_blobs(300)
        .threads(2)
        .processes(2)
        .build()
        .unwrap();

    blob_bench::run(&config, &PrebuiltToolchain).unwrap();
    blob_bench::run(&config, &PrebuiltToolchain).unwrap();

    let layout = StorageLayout::new(&config);
    assert_eq!(layout.single().row_count().unwrap(), 300);
    assert_eq!(row_counts(layout.process_shards()), vec![150, 150]);
}

#[test]
fn test_provisioning_failure_prevents_every_strategy() {
    let tmpdir = TempDir::new().unwrap();
    let config = builder_in(tmpdir.path())
        .total_blobs(100)
        .threads(2)
        .processes(3)
        .build()
        .unwrap();
    let layout = StorageLayout::new(&config);
    fs::create_dir_all(layout.process_shards()[2].path()).unwrap();

    let mut run = BenchmarkRun::new(&config, &PrebuiltToolchain);
    let err = run.execute().unwrap_err();

    assert!(matches!(err, BenchError::Provisioning(_)));
    assert_eq!(run.state(), RunState::Failed);
    // The single store was provisioned but never written to.
    assert_eq!(layout.single().row_count().unwrap(), 0);
}

#[cfg(unix)]
#[test]
fn test_compilation_failure_prevents_provisioning() {
    let tmpdir = TempDir::new().unwrap();
    let storage_dir = tmpdir.path().join("dbs");
    let config = builder_in(&storage_dir)
        .bin_dir(tmpdir.path().join("bin"))
        .build()
        .unwrap();

    for program in ["false", "true"] {
        let toolchain = CargoToolchain::with_program(program, tmpdir.path().join("target"));
        let mut run = BenchmarkRun::new(&config, &toolchain);
        let err = run.execute().unwrap_err();

        assert!(matches!(err, BenchError::Compilation(_)), "{program}: {err}");
        assert_eq!(run.state(), RunState::Failed);
        assert!(!storage_dir.exists());
    }
}

#[cfg(unix)]
#[test]
fn test_execution_failure_stops_later_strategies() {
    let tmpdir = TempDir::new().unwrap();
    let bin_dir = tmpdir.path().join("bin");
    fs::create_dir_all(&bin_dir).unwrap();
    fs::copy(
        env!("CARGO_BIN_EXE_single_writer"),
        bin_dir.join("single_writer"),
    )
    .unwrap();
    write_script(&bin_dir, "multi_writer", "exit 1");

    let config = builder_in(&tmpdir.path().join("dbs"))
        .bin_dir(&bin_dir)
        .total_blobs(100)
        .threads(2)
        .processes(2)
        .build()
        .unwrap();

    let mut run = BenchmarkRun::new(&config, &PrebuiltToolchain);
    match run.execute() {
        Err(BenchError::Execution(e)) => assert_eq!(e.strategy(), Strategy::MultiThread),
        other => panic!("expected execution failure, got {other:?}"),
    }
    assert_eq!(run.state(), RunState::Failed);

    let layout = StorageLayout::new(&config);
    assert_eq!(layout.single().row_count().unwrap(), 100);
    assert_eq!(row_counts(layout.process_shards()), vec![0, 0]);
}
