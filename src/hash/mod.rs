//! Streaming SHA-256 content hashing
//!
//! Files are read in fixed-size chunks through a buffer borrowed from a
//! [`BufferPool`], so arbitrarily large files never have to fit in memory and
//! many concurrent hashes do not allocate a fresh buffer each.

pub mod pool;

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::error::HashError;

pub use pool::{BufferPool, PooledBuffer};

/// Size of each read chunk (64 KiB)
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Hash a file's contents, returning the lowercase hex digest
pub fn hash_file(path: &Path, pool: &BufferPool) -> Result<String, HashError> {
    let mut file = File::open(path).map_err(|source| HashError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut buffer = pool.checkout();
    let mut hasher = Sha256::new();

    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(HashError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
