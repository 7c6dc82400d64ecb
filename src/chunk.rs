//! Chunk naming and persistence.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::source::{FileSource, SourceError};

/// Deterministic naming and persistence of sorted runs.
///
/// Chunks are flat text files (one decimal integer per line, ascending)
/// named `chunk_<index>.tmp` inside the store directory. The store never
/// renames, rewrites, or deletes a chunk; cleanup of temporary files is
/// left to surrounding tooling.
pub struct ChunkStore {
    dir: PathBuf,
    rw_buf_size: Option<usize>,
}

impl ChunkStore {
    /// Creates a store rooted at `dir`. `rw_buf_size` overrides the default
    /// chunk file read/write buffer size.
    pub fn new(dir: impl Into<PathBuf>, rw_buf_size: Option<usize>) -> Self {
        ChunkStore {
            dir: dir.into(),
            rw_buf_size,
        }
    }

    /// File name of the chunk with the given index: `chunk_<index>.tmp`,
    /// base-10, no leading zeros.
    pub fn name_for(index: usize) -> String {
        format!("chunk_{}.tmp", index)
    }

    /// Full path of the chunk with the given index.
    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(Self::name_for(index))
    }

    /// Creates a new chunk file, truncating any previous file of that name,
    /// and returns a buffered writer over it.
    pub fn create(&self, index: usize) -> io::Result<io::BufWriter<fs::File>> {
        let file = fs::File::create(self.path_for(index))?;

        let writer = match self.rw_buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
            None => io::BufWriter::new(file),
        };

        return Ok(writer);
    }

    /// Opens the chunk with the given index for sequential reading.
    pub fn open(&self, index: usize) -> Result<FileSource, SourceError> {
        FileSource::open_buffered(self.path_for(index), self.rw_buf_size)
    }
}
