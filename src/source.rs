//! Data source abstractions.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;

use log;

/// Data source error.
#[derive(Debug)]
pub enum SourceError {
    /// The underlying file or device could not be opened.
    Unavailable(io::Error),
    /// The underlying stream failed mid-read.
    Io(io::Error),
    /// A token could not be parsed as a decimal integer.
    MalformedToken(String),
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SourceError::Unavailable(err) => Some(err),
            SourceError::Io(err) => Some(err),
            SourceError::MalformedToken(_) => None,
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Unavailable(err) => write!(f, "source could not be opened: {}", err),
            SourceError::Io(err) => write!(f, "source read failed: {}", err),
            SourceError::MalformedToken(token) => write!(f, "malformed integer token: {:?}", token),
        }
    }
}

/// Integer stream interface. A source yields values one at a time and signals
/// exhaustion out of band: `produce_next` returns `Ok(None)` once no further
/// value exists, so every integer (including `-1`) is a legitimate data value.
///
/// Sources are single-pass and exclusively own their underlying resource,
/// releasing it on drop.
pub trait DataSource {
    /// Produces the next value, or `None` once the source is exhausted.
    fn produce_next(&mut self) -> Result<Option<i64>, SourceError>;

    /// Whether a subsequent [`DataSource::produce_next`] call is expected to
    /// yield a value (or a reportable error).
    fn has_more(&self) -> bool;
}

/// File-backed data source. Streams whitespace-delimited decimal integers
/// from a persisted chunk (or any line-oriented integer file) in file order.
///
/// One value of lookahead is kept so [`DataSource::has_more`] is accurate at
/// all times. A malformed token is reported once through `produce_next` and
/// the source then behaves as exhausted.
pub struct FileSource {
    reader: io::BufReader<fs::File>,
    tokens: VecDeque<String>,
    lookahead: Option<Result<i64, SourceError>>,
}

impl FileSource {
    /// Opens a source over the given file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        Self::open_buffered(path, None)
    }

    /// Opens a source over the given file with an explicit read buffer size.
    pub fn open_buffered(path: impl AsRef<Path>, buf_size: Option<usize>) -> Result<Self, SourceError> {
        let file = fs::File::open(path.as_ref()).map_err(SourceError::Unavailable)?;
        let reader = match buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        let mut source = FileSource {
            reader,
            tokens: VecDeque::new(),
            lookahead: None,
        };
        source.lookahead = source.fetch();

        return Ok(source);
    }

    /// Reads the next token from the stream and parses it. `None` at
    /// end-of-input.
    fn fetch(&mut self) -> Option<Result<i64, SourceError>> {
        loop {
            if let Some(token) = self.tokens.pop_front() {
                return Some(token.parse::<i64>().map_err(|_| {
                    log::warn!("malformed token {:?}, treating source as exhausted", token);
                    SourceError::MalformedToken(token)
                }));
            }

            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => self.tokens.extend(line.split_whitespace().map(str::to_owned)),
                Err(err) => return Some(Err(SourceError::Io(err))),
            }
        }
    }
}

impl DataSource for FileSource {
    fn produce_next(&mut self) -> Result<Option<i64>, SourceError> {
        match self.lookahead.take() {
            None => Ok(None),
            Some(Err(err)) => Err(err),
            Some(Ok(value)) => {
                self.lookahead = self.fetch();
                Ok(Some(value))
            }
        }
    }

    fn has_more(&self) -> bool {
        self.lookahead.is_some()
    }
}

/// In-memory data source over any integer iterator. Stands in for a live
/// transport when feeding the sorter from memory or from tests.
pub struct IterSource<I: Iterator<Item = i64>> {
    iter: I,
    lookahead: Option<i64>,
}

impl<I: Iterator<Item = i64>> IterSource<I> {
    /// Wraps an integer iterator as a data source.
    pub fn new<T>(values: T) -> Self
    where
        T: IntoIterator<Item = i64, IntoIter = I>,
    {
        let mut iter = values.into_iter();
        let lookahead = iter.next();

        IterSource { iter, lookahead }
    }
}

impl<I: Iterator<Item = i64>> DataSource for IterSource<I> {
    fn produce_next(&mut self) -> Result<Option<i64>, SourceError> {
        let value = self.lookahead.take();
        if value.is_some() {
            self.lookahead = self.iter.next();
        }

        Ok(value)
    }

    fn has_more(&self) -> bool {
        self.lookahead.is_some()
    }
}
