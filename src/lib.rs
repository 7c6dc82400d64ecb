//! `esort` is a two-phase external sort for integer streams.
//!
//! External sorting handles data sets too large to fit in main memory. Sorting
//! runs in two passes: during the first pass values are pulled from a data
//! source into a bounded buffer that is sorted and spilled to disk as a chunk
//! every time it fills, during the second pass the sorted chunks are merged
//! together into one globally sorted stream. For more information see
//! [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! `esort` is built from four parts:
//!
//! * **Data sources:**
//!   anything producing integers one at a time can drive the sorter through
//!   the [`DataSource`] trait; a file-backed source for persisted chunks and
//!   an iterator adapter are provided. Exhaustion is signalled out of band,
//!   so every integer (including `-1`) is a legitimate value.
//! * **Sort buffer:**
//!   a bounded container accumulating one chunk's worth of values, sorted in
//!   place and reused between chunks.
//! * **Chunk store:**
//!   deterministic `chunk_<N>.tmp` naming and persistence of sorted runs as
//!   flat text files, one decimal integer per line.
//! * **Chunk merger:**
//!   a k-way merge of the persisted chunks through a min-heap keyed by
//!   (value, chunk index), exposed as an iterator over the sorted stream.
//!
//! # Example
//!
//! ```no_run
//! use std::fs;
//! use std::io;
//! use std::path::Path;
//!
//! use esort::{ExternalSorterBuilder, FileSource, OUTPUT_FILE_NAME};
//!
//! fn main() {
//!     let sorter = ExternalSorterBuilder::new()
//!         .with_buffer_capacity(1000)
//!         .with_chunk_dir(Path::new("./"))
//!         .build()
//!         .unwrap();
//!
//!     let mut source = FileSource::open("input.txt").unwrap();
//!     let mut output = io::BufWriter::new(fs::File::create(OUTPUT_FILE_NAME).unwrap());
//!
//!     sorter.sort_to(&mut source, &mut output).unwrap();
//! }
//! ```

pub mod buffer;
pub mod chunk;
pub mod merger;
pub mod sort;
pub mod source;

pub use buffer::{BufferFull, SortBuffer};
pub use chunk::ChunkStore;
pub use merger::ChunkMerger;
pub use sort::{ExternalSorter, ExternalSorterBuilder, SortError, OUTPUT_FILE_NAME};
pub use source::{DataSource, FileSource, IterSource, SourceError};
