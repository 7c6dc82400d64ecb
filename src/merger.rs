//! K-way chunk merger.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::source::{DataSource, SourceError};

/// Merges K independently sorted data sources into one ascending stream.
///
/// The merge frontier is a min-heap keyed by (value, chunk index): every
/// step pops the globally smallest head value in log(K), ties resolving to
/// the lowest chunk index so the output is deterministic. A source drops out
/// of the frontier once it reports exhaustion. Values must be ascending
/// within each source, otherwise the result is undefined.
pub struct ChunkMerger<S: DataSource> {
    // BinaryHeap is a max-heap, Reverse turns it into a min-heap over
    // (value, chunk index) pairs
    frontier: BinaryHeap<Reverse<(i64, usize)>>,
    sources: Vec<S>,
    initiated: bool,
}

impl<S: DataSource> ChunkMerger<S> {
    /// Creates a merger over the given sources.
    pub fn new<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        let sources = Vec::from_iter(sources);
        let frontier = BinaryHeap::with_capacity(sources.len());

        return ChunkMerger {
            frontier,
            sources,
            initiated: false,
        };
    }

    /// Reads the next value of chunk `idx` into the frontier. A chunk with
    /// no further value drops out of the merge.
    fn advance(&mut self, idx: usize) -> Result<(), SourceError> {
        if let Some(value) = self.sources[idx].produce_next()? {
            self.frontier.push(Reverse((value, idx)));
        }

        return Ok(());
    }
}

impl<S: DataSource> Iterator for ChunkMerger<S> {
    type Item = Result<i64, SourceError>;

    /// Returns the next merged value in ascending order.
    fn next(&mut self) -> Option<Self::Item> {
        if !self.initiated {
            self.initiated = true;
            for idx in 0..self.sources.len() {
                if let Err(err) = self.advance(idx) {
                    return Some(Err(err));
                }
            }
        }

        let Reverse((value, idx)) = self.frontier.pop()?;
        if let Err(err) = self.advance(idx) {
            return Some(Err(err));
        }

        return Some(Ok(value));
    }
}

#[cfg(test)]
mod test {
    use rstest::*;

    use crate::source::IterSource;

    use super::ChunkMerger;

    #[rstest]
    #[case(
        vec![],
        vec![],
    )]
    #[case(
        vec![
            vec![],
            vec![],
        ],
        vec![],
    )]
    #[case(
        vec![
            vec![4, 5, 7],
            vec![1, 6],
            vec![3],
            vec![],
        ],
        vec![1, 3, 4, 5, 6, 7],
    )]
    #[case(
        vec![
            vec![-3, 0, 2],
        ],
        vec![-3, 0, 2],
    )]
    #[case(
        vec![
            vec![1, 3, 3],
            vec![3, 4],
            vec![2, 3],
        ],
        vec![1, 2, 3, 3, 3, 3, 4],
    )]
    #[case(
        vec![
            vec![-1, -1],
            vec![-5, -1],
        ],
        vec![-5, -1, -1, -1],
    )]
    fn test_merger(#[case] chunks: Vec<Vec<i64>>, #[case] expected: Vec<i64>) {
        let merger = ChunkMerger::new(chunks.into_iter().map(IterSource::new));

        let merged: Result<Vec<i64>, _> = merger.collect();
        assert_eq!(merged.unwrap(), expected);
    }

    #[test]
    fn test_merger_is_deterministic() {
        let chunks = vec![vec![1, 2, 2, 8], vec![2, 2, 5], vec![2, 9]];

        let first: Result<Vec<i64>, _> =
            ChunkMerger::new(chunks.clone().into_iter().map(IterSource::new)).collect();
        let second: Result<Vec<i64>, _> =
            ChunkMerger::new(chunks.into_iter().map(IterSource::new)).collect();

        assert_eq!(first.unwrap(), second.unwrap());
    }
}
