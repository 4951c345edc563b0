//! Decoded metric corpus and its ancestor index.
//!
//! ## Wire Format
//!
//! ```text
//! entry   := uvarint(N) path[N]
//! corpus  := entry*
//! ```
//!
//! `uvarint` is unsigned LEB128: seven bits per byte, least significant group
//! first, high bit set on every byte but the last, at most 10 bytes. Entries
//! follow each other without delimiters and must consume the buffer exactly.
//!
//! The buffer is the batch arena: decoded paths borrow from it, nothing is
//! copied, and the corpus cannot outlive it.

use std::collections::{BTreeSet, HashMap};

use memchr::memrchr;
use thiserror::Error;
use winnow::error::{ContextError, ErrMode, ModalResult};
use winnow::prelude::*;
use winnow::token::{any, take};

use crate::TagId;

const MAX_VARINT_LEN: usize = 10;

/// Errors raised while decoding a metric corpus buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated length prefix at offset {offset}")]
    TruncatedLength { offset: usize },

    #[error("length prefix at offset {offset} overflows 64 bits")]
    VarintOverflow { offset: usize },

    #[error(
        "entry at offset {offset} declares {declared} bytes but only {remaining} remain"
    )]
    LengthExceedsBuffer {
        offset: usize,
        declared: u64,
        remaining: usize,
    },

    #[error("duplicate metric path '{path}'")]
    DuplicatePath { path: String },
}

/// One corpus entry: a dot-delimited path and the tags it carries.
///
/// A trailing dot marks a directory node. Tag sets only ever grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric<'a> {
    path: &'a [u8],
    pub(crate) tags: BTreeSet<TagId>,
}

impl<'a> Metric<'a> {
    fn new(path: &'a [u8]) -> Self {
        Self {
            path,
            tags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &'a [u8] {
        self.path
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<TagId> {
        &self.tags
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.path.last() == Some(&b'.')
    }
}

/// Path to metric position, keyed by the path exactly as stored (directories
/// keep their trailing dot).
#[derive(Debug, Clone, Default)]
pub struct AncestorIndex<'a> {
    by_path: HashMap<&'a [u8], usize>,
}

impl<'a> AncestorIndex<'a> {
    #[must_use]
    pub fn get(&self, path: &[u8]) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    /// Positions of every ancestor of `path` present in the corpus, nearest first.
    ///
    /// A single trailing dot is stripped, then the path is cut at each `.` from
    /// the right; every cut, dot included, is looked up directly. Missing
    /// intermediate directories are skipped without breaking the chain.
    #[must_use]
    pub fn ancestors<'i, 'p>(&'i self, path: &'p [u8]) -> Ancestors<'i, 'a, 'p> {
        let rest = path.strip_suffix(b".").unwrap_or(path);
        Ancestors { index: self, rest }
    }
}

/// Iterator returned by [`AncestorIndex::ancestors()`].
#[derive(Debug, Clone)]
pub struct Ancestors<'i, 'a, 'p> {
    index: &'i AncestorIndex<'a>,
    rest: &'p [u8],
}

impl Iterator for Ancestors<'_, '_, '_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            let dot = memrchr(b'.', self.rest)?;
            let key = &self.rest[..=dot];
            self.rest = &self.rest[..dot];
            if let Some(found) = self.index.get(key) {
                return Some(found);
            }
        }
    }
}

/// The full set of metrics processed in one batch.
///
/// Built once, never resized: matching and propagation only grow tag sets.
#[derive(Debug, Clone, Default)]
pub struct Corpus<'a> {
    metrics: Vec<Metric<'a>>,
    index: AncestorIndex<'a>,
}

impl<'a> Corpus<'a> {
    /// Decode a length-prefixed corpus buffer. Paths borrow from `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if a length prefix is cut short or overflows,
    /// if a declared length runs past the end of the buffer (which is also how
    /// trailing garbage shows up), or if a path occurs twice.
    pub fn decode(buf: &'a [u8]) -> Result<Self, DecodeError> {
        let mut input = buf;
        let mut paths = Vec::new();

        while !input.is_empty() {
            let offset = buf.len() - input.len();
            let declared = uvarint(&mut input).map_err(|e| match e {
                ErrMode::Cut(_) => DecodeError::VarintOverflow { offset },
                _ => DecodeError::TruncatedLength { offset },
            })?;
            let remaining = input.len();
            let too_long = DecodeError::LengthExceedsBuffer {
                offset,
                declared,
                remaining,
            };
            let len = match usize::try_from(declared) {
                Ok(len) if len <= remaining => len,
                _ => return Err(too_long),
            };
            let path = take::<_, _, ErrMode<ContextError>>(len)
                .parse_next(&mut input)
                .map_err(|_| too_long)?;
            paths.push(path);
        }

        Self::from_paths(paths)
    }

    /// Build a corpus from already decoded paths, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::DuplicatePath`] if a path occurs twice.
    pub fn from_paths(paths: impl IntoIterator<Item = &'a [u8]>) -> Result<Self, DecodeError> {
        let metrics: Vec<Metric<'a>> = paths.into_iter().map(Metric::new).collect();
        let mut by_path = HashMap::with_capacity(metrics.len());
        for (i, metric) in metrics.iter().enumerate() {
            if by_path.insert(metric.path, i).is_some() {
                return Err(DecodeError::DuplicatePath {
                    path: String::from_utf8_lossy(metric.path).into_owned(),
                });
            }
        }
        Ok(Self {
            metrics,
            index: AncestorIndex { by_path },
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// All metrics in corpus order.
    #[must_use]
    pub fn metrics(&self) -> &[Metric<'a>] {
        &self.metrics
    }

    /// Look up a metric by its exact path.
    #[must_use]
    pub fn get(&self, path: &[u8]) -> Option<&Metric<'a>> {
        self.index.get(path).map(|i| &self.metrics[i])
    }

    /// Positions of the ancestors of the metric at `position`, nearest first.
    ///
    /// # Panics
    ///
    /// Panics if `position` is out of range.
    pub fn ancestors(&self, position: usize) -> Ancestors<'_, 'a, 'a> {
        self.index.ancestors(self.metrics[position].path)
    }

    /// Metrics with a non-empty tag set, in corpus order.
    pub fn tagged(&self) -> impl Iterator<Item = &Metric<'a>> {
        self.metrics.iter().filter(|m| !m.tags.is_empty())
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut [Metric<'a>] {
        &mut self.metrics
    }

    /// Mutable metrics alongside the read-only index, so propagation can walk
    /// ancestors while writing tag sets.
    pub(crate) fn split_mut(&mut self) -> (&mut [Metric<'a>], &AncestorIndex<'a>) {
        (&mut self.metrics, &self.index)
    }
}

fn uvarint(input: &mut &[u8]) -> ModalResult<u64> {
    let mut value = 0_u64;
    for i in 0..MAX_VARINT_LEN {
        let byte = any::<_, ErrMode<ContextError>>(input)?;
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(ErrMode::Cut(ContextError::new()));
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(ErrMode::Cut(ContextError::new()))
}

/// Encode paths into the corpus wire format.
pub fn encode_paths<P: AsRef<[u8]>>(paths: impl IntoIterator<Item = P>) -> Vec<u8> {
    let mut out = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let mut len = path.len() as u64;
        while len >= 0x80 {
            out.push((len as u8 & 0x7f) | 0x80);
            len >>= 7;
        }
        out.push(len as u8);
        out.extend_from_slice(path);
    }
    out
}
