//! Write path shared by the `single_writer` and `multi_writer` executables.
//!
//! The harness never calls into this module; it only launches the executables built
//! from it.

use std::path::Path;
use std::thread;

use rusqlite::{Connection, OpenFlags, TransactionBehavior, params};

use crate::error::WriterError;
use crate::partition::WorkPartition;
use crate::storage::{apply_throughput_settings, shard_path};

/// Builds blob number `number`: `blob_size` zero bytes with the number stored
/// little-endian at the front, truncated if the blob is shorter than eight bytes.
pub fn generate_blob(number: u64, blob_size: usize) -> Vec<u8> {
    let mut blob = vec![0u8; blob_size];
    let bytes = number.to_le_bytes();
    let len = bytes.len().min(blob_size);
    blob[..len].copy_from_slice(&bytes[..len]);
    blob
}

/// Opens a store created by the provisioner. Missing stores are an error.
fn open_store(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    apply_throughput_settings(&conn)?;
    conn.execute_batch("PRAGMA cache_size = -2000; PRAGMA temp_store = MEMORY;")?;
    Ok(conn)
}

/// Numbers `first`, `first + 1`, ... for `count` blobs, without computing the end bound.
fn blob_numbers(first: u64, count: u64) -> impl Iterator<Item = u64> {
    (0..count).map(move |offset| first + offset)
}

/// Inserts `count` blobs numbered from `first` into the store at `path` inside a single
/// immediate transaction.
pub fn insert_blobs(
    path: &Path,
    first: u64,
    count: u64,
    blob_size: usize,
) -> Result<(), WriterError> {
    let mut conn = open_store(path)?;
    let txn = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    {
        let mut stmt = txn.prepare("INSERT INTO blobs (data) VALUES (?)")?;
        for number in blob_numbers(first, count) {
            stmt.execute(params![generate_blob(number, blob_size)])?;
        }
    }
    txn.commit()?;
    Ok(())
}

/// Splits `total` blobs across `threads` threads, each writing its share into
/// `<prefix>_<index>.sqlite`. Threads with nothing to write are not started.
///
/// Every thread runs to completion; the first error by thread index is returned.
pub fn insert_sharded(
    prefix: &Path,
    total: u64,
    blob_size: usize,
    threads: usize,
) -> Result<(), WriterError> {
    let partition = WorkPartition::new(total, threads);

    thread::scope(|s| {
        let handles: Vec<_> = partition
            .shares()
            .iter()
            .filter(|share| share.count > 0)
            .map(|share| {
                let path = shard_path(prefix, share.index);
                let handle = s.spawn(move || {
                    insert_blobs(&path, share.first, share.count, blob_size).inspect_err(|e| {
                        log::error!("thread {}: {e}", share.index);
                    })
                });
                (share.index, handle)
            })
            .collect();

        let mut first_error = None;
        for (index, handle) in handles {
            let outcome = handle
                .join()
                .unwrap_or_else(|_| Err(WriterError::ThreadPanicked(index)));
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    })
}
