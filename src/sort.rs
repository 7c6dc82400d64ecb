//! External sorter.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use log;

use crate::buffer::{BufferFull, SortBuffer};
use crate::chunk::ChunkStore;
use crate::merger::ChunkMerger;
use crate::source::{DataSource, FileSource, SourceError};

/// Conventional name of the merged output file.
pub const OUTPUT_FILE_NAME: &str = "output.sorted.txt";

const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// The configured buffer capacity is not positive.
    InvalidCapacity(usize),
    /// A data source could not be opened, read, or parsed.
    Source(SourceError),
    /// The sort buffer rejected a value.
    Buffer(BufferFull),
    /// A chunk could not be persisted. Fatal for the run; the partially
    /// written chunk is left in place for inspection.
    Persistence(io::Error),
    /// The merged output could not be written.
    Output(io::Error),
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SortError::InvalidCapacity(_) => None,
            SortError::Source(err) => Some(err),
            SortError::Buffer(err) => Some(err),
            SortError::Persistence(err) => Some(err),
            SortError::Output(err) => Some(err),
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::InvalidCapacity(capacity) => {
                write!(f, "buffer capacity must be positive, got {}", capacity)
            }
            SortError::Source(err) => write!(f, "data source error: {}", err),
            SortError::Buffer(err) => write!(f, "sort buffer overflow: {}", err),
            SortError::Persistence(err) => write!(f, "chunk persistence failed: {}", err),
            SortError::Output(err) => write!(f, "output writing failed: {}", err),
        }
    }
}

/// External sorter builder. Provides methods for [`ExternalSorter`]
/// initialization.
#[derive(Clone)]
pub struct ExternalSorterBuilder {
    /// Number of values the sort buffer holds before a chunk is spilled.
    buffer_capacity: usize,
    /// Directory chunk files are written to and merged from.
    chunk_dir: PathBuf,
    /// Chunk file read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl ExternalSorterBuilder {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Builds an [`ExternalSorter`] instance using provided configuration.
    pub fn build(self) -> Result<ExternalSorter, SortError> {
        ExternalSorter::new(self.buffer_capacity, self.chunk_dir, self.rw_buf_size)
    }

    /// Sets the number of values accumulated before a chunk is spilled.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> ExternalSorterBuilder {
        self.buffer_capacity = capacity;
        return self;
    }

    /// Sets the directory chunk files are stored in.
    pub fn with_chunk_dir(mut self, path: &Path) -> ExternalSorterBuilder {
        self.chunk_dir = path.into();
        return self;
    }

    /// Sets chunk file read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> ExternalSorterBuilder {
        self.rw_buf_size = Some(buf_size);
        return self;
    }
}

impl Default for ExternalSorterBuilder {
    fn default() -> Self {
        ExternalSorterBuilder {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            chunk_dir: PathBuf::from("."),
            rw_buf_size: None,
        }
    }
}

/// Two-phase external sorter: bounded-memory acquisition into sorted chunks,
/// followed by a k-way merge of the chunks into one ascending stream.
///
/// Both phases run strictly sequentially on the calling thread; acquisition
/// completes before the merge begins.
pub struct ExternalSorter {
    /// Sort buffer capacity.
    buffer_capacity: usize,
    /// Chunk naming and persistence.
    store: ChunkStore,
}

impl ExternalSorter {
    /// Creates a new external sorter instance.
    ///
    /// # Arguments
    /// * `buffer_capacity` - Number of values accumulated in memory before a
    ///   chunk is spilled. Must be positive.
    /// * `chunk_dir` - Directory chunk files are written to and merged from.
    /// * `rw_buf_size` - Chunk file read/write buffer size.
    pub fn new(
        buffer_capacity: usize,
        chunk_dir: impl Into<PathBuf>,
        rw_buf_size: Option<usize>,
    ) -> Result<Self, SortError> {
        if buffer_capacity == 0 {
            return Err(SortError::InvalidCapacity(buffer_capacity));
        }

        return Ok(ExternalSorter {
            buffer_capacity,
            store: ChunkStore::new(chunk_dir, rw_buf_size),
        });
    }

    /// Runs the acquisition phase: pulls values from the source into the
    /// sort buffer, spilling a sorted chunk every time the buffer fills,
    /// plus one final partial chunk if values remain after exhaustion.
    /// Returns the number of chunks written.
    pub fn acquire<S: DataSource>(&self, source: &mut S) -> Result<usize, SortError> {
        log::info!("acquisition started (buffer capacity: {})", self.buffer_capacity);

        let mut buffer = SortBuffer::new(self.buffer_capacity);
        let mut chunk_count = 0;

        while source.has_more() {
            let value = match source.produce_next().map_err(SortError::Source)? {
                Some(value) => value,
                None => break,
            };

            buffer.insert(value).map_err(SortError::Buffer)?;

            if buffer.is_full() {
                log::debug!("buffer full, spilling chunk {}", chunk_count);
                self.spill(&mut buffer, chunk_count)?;
                chunk_count += 1;
            }
        }

        if !buffer.is_empty() {
            log::debug!("spilling final partial chunk {}", chunk_count);
            self.spill(&mut buffer, chunk_count)?;
            chunk_count += 1;
        }

        log::info!("acquisition done, {} chunks written", chunk_count);
        return Ok(chunk_count);
    }

    /// Sorts and persists the buffered values as the chunk with the given
    /// index, then clears the buffer for reuse.
    fn spill(&self, buffer: &mut SortBuffer, index: usize) -> Result<(), SortError> {
        buffer.sort_in_place();
        log::trace!("sorted buffer: {:?}", buffer.snapshot());

        let mut writer = self.store.create(index).map_err(SortError::Persistence)?;
        buffer.write_to(&mut writer).map_err(SortError::Persistence)?;
        writer.flush().map_err(SortError::Persistence)?;

        buffer.clear();
        return Ok(());
    }

    /// Runs the merge phase: opens chunks `0..chunk_count` and returns an
    /// iterator over the globally sorted stream. Zero chunks yield an
    /// immediately empty merger.
    pub fn merge(&self, chunk_count: usize) -> Result<ChunkMerger<FileSource>, SortError> {
        log::info!("merging {} chunks", chunk_count);

        let sources = (0..chunk_count)
            .map(|index| self.store.open(index))
            .collect::<Result<Vec<_>, _>>()
            .map_err(SortError::Source)?;

        return Ok(ChunkMerger::new(sources));
    }

    /// Sorts data from the source.
    /// Returns an iterator that can be used to get the sorted data stream.
    pub fn sort<S: DataSource>(&self, source: &mut S) -> Result<ChunkMerger<FileSource>, SortError> {
        let chunk_count = self.acquire(source)?;
        self.merge(chunk_count)
    }

    /// Sorts data from the source and writes the merged stream to the sink,
    /// one decimal integer per line.
    pub fn sort_to<S, W>(&self, source: &mut S, sink: &mut W) -> Result<(), SortError>
    where
        S: DataSource,
        W: Write,
    {
        for value in self.sort(source)? {
            let value = value.map_err(SortError::Source)?;
            writeln!(sink, "{}", value).map_err(SortError::Output)?;
        }

        sink.flush().map_err(SortError::Output)?;
        return Ok(());
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use rand::seq::SliceRandom;
    use rstest::*;

    use crate::source::IterSource;

    use super::{ExternalSorter, ExternalSorterBuilder, SortError};

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn build_sorter(tmp_dir: &tempfile::TempDir, capacity: usize) -> ExternalSorter {
        ExternalSorterBuilder::new()
            .with_buffer_capacity(capacity)
            .with_chunk_dir(tmp_dir.path())
            .build()
            .unwrap()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = ExternalSorterBuilder::new().with_buffer_capacity(0).build();
        assert!(matches!(result, Err(SortError::InvalidCapacity(0))));
    }

    #[rstest]
    fn test_two_chunk_scenario(tmp_dir: tempfile::TempDir) {
        let sorter = build_sorter(&tmp_dir, 3);

        let mut source = IterSource::new(vec![5, 3, 8, 1, 9, 2]);
        let chunk_count = sorter.acquire(&mut source).unwrap();
        assert_eq!(chunk_count, 2);

        let chunk_0 = fs::read_to_string(tmp_dir.path().join("chunk_0.tmp")).unwrap();
        assert_eq!(chunk_0, "3\n5\n8\n");
        let chunk_1 = fs::read_to_string(tmp_dir.path().join("chunk_1.tmp")).unwrap();
        assert_eq!(chunk_1, "1\n2\n9\n");

        let merged: Result<Vec<i64>, _> = sorter.merge(chunk_count).unwrap().collect();
        assert_eq!(merged.unwrap(), vec![1, 2, 3, 5, 8, 9]);
    }

    #[rstest]
    fn test_empty_input(tmp_dir: tempfile::TempDir) {
        let sorter = build_sorter(&tmp_dir, 3);

        let mut source = IterSource::new(Vec::new());
        let chunk_count = sorter.acquire(&mut source).unwrap();
        assert_eq!(chunk_count, 0);
        assert!(!tmp_dir.path().join("chunk_0.tmp").exists());

        let merged: Result<Vec<i64>, _> = sorter.merge(chunk_count).unwrap().collect();
        assert_eq!(merged.unwrap(), Vec::<i64>::new());
    }

    #[rstest]
    #[case(1, 5, 5)]
    #[case(5, 5, 1)]
    #[case(6, 4, 2)]
    #[case(7, 3, 3)]
    #[case(100, 8, 13)]
    fn test_chunk_partitioning(
        tmp_dir: tempfile::TempDir,
        #[case] input_len: usize,
        #[case] capacity: usize,
        #[case] expected_chunks: usize,
    ) {
        let sorter = build_sorter(&tmp_dir, capacity);

        let mut source = IterSource::new((0..input_len as i64).rev().collect::<Vec<_>>());
        let chunk_count = sorter.acquire(&mut source).unwrap();

        assert_eq!(chunk_count, expected_chunks);
        // no partial chunk beyond the expected ones
        assert!(!tmp_dir.path().join(format!("chunk_{}.tmp", expected_chunks)).exists());
    }

    #[rstest]
    fn test_exact_multiple_leaves_no_partial_chunk(tmp_dir: tempfile::TempDir) {
        let sorter = build_sorter(&tmp_dir, 3);

        let mut source = IterSource::new(vec![6, 5, 4, 3, 2, 1]);
        let chunk_count = sorter.acquire(&mut source).unwrap();

        assert_eq!(chunk_count, 2);
        assert!(!tmp_dir.path().join("chunk_2.tmp").exists());
    }

    #[rstest]
    fn test_all_equal_values(tmp_dir: tempfile::TempDir) {
        let sorter = build_sorter(&tmp_dir, 5);

        let mut source = IterSource::new(vec![7, 7, 7, 7, 7]);
        let chunk_count = sorter.acquire(&mut source).unwrap();
        assert_eq!(chunk_count, 1);

        let chunk_0 = fs::read_to_string(tmp_dir.path().join("chunk_0.tmp")).unwrap();
        assert_eq!(chunk_0, "7\n7\n7\n7\n7\n");

        let merged: Result<Vec<i64>, _> = sorter.merge(chunk_count).unwrap().collect();
        assert_eq!(merged.unwrap(), vec![7, 7, 7, 7, 7]);
    }

    #[rstest]
    fn test_per_chunk_ordering(tmp_dir: tempfile::TempDir) {
        let sorter = build_sorter(&tmp_dir, 8);

        let mut input = Vec::from_iter(0..50);
        input.shuffle(&mut rand::thread_rng());

        let mut source = IterSource::new(input);
        let chunk_count = sorter.acquire(&mut source).unwrap();

        for index in 0..chunk_count {
            let content = fs::read_to_string(tmp_dir.path().join(format!("chunk_{}.tmp", index))).unwrap();
            let values: Vec<i64> = content.lines().map(|line| line.parse().unwrap()).collect();
            assert!(values.windows(2).all(|pair| pair[0] <= pair[1]), "chunk {} not ascending", index);
        }
    }

    #[rstest]
    fn test_shuffled_input_round_trip(tmp_dir: tempfile::TempDir) {
        let sorter = build_sorter(&tmp_dir, 8);

        let input_sorted = Vec::from_iter(-50..50);
        let mut input_shuffled = input_sorted.clone();
        input_shuffled.shuffle(&mut rand::thread_rng());

        let mut source = IterSource::new(input_shuffled);
        let result = sorter.sort(&mut source).unwrap();

        let actual_result: Result<Vec<i64>, _> = result.collect();
        assert_eq!(actual_result.unwrap(), input_sorted);
    }

    #[rstest]
    fn test_duplicates_preserved(tmp_dir: tempfile::TempDir) {
        let sorter = build_sorter(&tmp_dir, 2);

        let mut source = IterSource::new(vec![3, 1, 3, -1, 3, -1]);
        let result = sorter.sort(&mut source).unwrap();

        let actual_result: Result<Vec<i64>, _> = result.collect();
        assert_eq!(actual_result.unwrap(), vec![-1, -1, 1, 3, 3, 3]);
    }

    #[rstest]
    fn test_remerge_is_idempotent(tmp_dir: tempfile::TempDir) {
        let sorter = build_sorter(&tmp_dir, 4);

        let mut source = IterSource::new(vec![9, 2, 2, 8, 0, -4, 11, 5, 3]);
        let chunk_count = sorter.acquire(&mut source).unwrap();

        let mut first = Vec::new();
        sorter
            .merge(chunk_count)
            .unwrap()
            .try_for_each(|value| -> Result<(), crate::source::SourceError> {
                first.extend(format!("{}\n", value?).into_bytes());
                Ok(())
            })
            .unwrap();

        let mut second = Vec::new();
        sorter
            .merge(chunk_count)
            .unwrap()
            .try_for_each(|value| -> Result<(), crate::source::SourceError> {
                second.extend(format!("{}\n", value?).into_bytes());
                Ok(())
            })
            .unwrap();

        assert_eq!(first, second);
    }

    #[rstest]
    fn test_sort_to_writes_line_format(tmp_dir: tempfile::TempDir) {
        let sorter = build_sorter(&tmp_dir, 3);

        let mut source = IterSource::new(vec![5, 3, 8, 1, 9, 2]);
        let mut sink = Vec::new();
        sorter.sort_to(&mut source, &mut sink).unwrap();

        assert_eq!(String::from_utf8(sink).unwrap(), "1\n2\n3\n5\n8\n9\n");
    }

    #[rstest]
    fn test_minus_one_is_ordinary_data(tmp_dir: tempfile::TempDir) {
        let sorter = build_sorter(&tmp_dir, 2);

        let mut source = IterSource::new(vec![0, -1, 5, -1]);
        let result = sorter.sort(&mut source).unwrap();

        let actual_result: Result<Vec<i64>, _> = result.collect();
        assert_eq!(actual_result.unwrap(), vec![-1, -1, 0, 5]);
    }
}
