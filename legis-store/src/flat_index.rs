//! Exhaustive (non-approximate) nearest-neighbor index over squared Euclidean distance.

use std::cmp::Ordering;

use crate::errors::{Result, StoreError};
use crate::record::Neighbor;

/// Row-major store of fixed-dimension vectors. Row `i` is the vector with id `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatL2Index {
    dim: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Empty index for vectors of `dim` components.
    ///
    /// # Errors
    /// [`StoreError::InvalidIndex`] when `dim == 0`.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(StoreError::InvalidIndex("dimension must be > 0"));
        }
        Ok(Self {
            dim,
            data: Vec::new(),
        })
    }

    /// Builds an index whose dimension is taken from the first vector.
    ///
    /// # Errors
    /// [`StoreError::InvalidIndex`] for an empty batch, [`StoreError::VectorSizeMismatch`]
    /// when the vectors are not uniform.
    pub fn from_vectors(vectors: &[Vec<f32>]) -> Result<Self> {
        let first = vectors
            .first()
            .ok_or(StoreError::InvalidIndex("no vectors to index"))?;
        let mut index = Self::new(first.len())?;
        index.data.reserve(vectors.len() * index.dim);
        for v in vectors {
            index.add(v)?;
        }
        Ok(index)
    }

    /// Rebuilds an index from a raw row-major buffer.
    pub(crate) fn from_raw(dim: usize, data: Vec<f32>) -> Result<Self> {
        if dim == 0 {
            return Err(StoreError::InvalidIndex("dimension must be > 0"));
        }
        if data.len() % dim != 0 {
            return Err(StoreError::InvalidIndex("buffer is not a whole number of rows"));
        }
        Ok(Self { dim, data })
    }

    /// Appends one vector and returns its id.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dim {
            return Err(StoreError::VectorSizeMismatch {
                got: vector.len(),
                want: self.dim,
            });
        }
        let id = self.len();
        self.data.extend_from_slice(vector);
        Ok(id)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Vector stored under `id`.
    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        let start = id.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    pub(crate) fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Yields exactly `k` slots ordered by ascending squared L2 distance.
    ///
    /// Slots beyond the number of stored vectors are `None`. Padding is produced
    /// lazily, so a `k` far above [`Self::len`] costs nothing until consumed.
    /// Equal distances are ordered by id so results are deterministic.
    ///
    /// # Errors
    /// [`StoreError::VectorSizeMismatch`] when the query has the wrong dimension.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<impl ExactSizeIterator<Item = Option<Neighbor>> + use<>> {
        if query.len() != self.dim {
            return Err(StoreError::VectorSizeMismatch {
                got: query.len(),
                want: self.dim,
            });
        }

        let mut scored: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(id, row)| Neighbor {
                id,
                distance: squared_l2(query, row),
            })
            .collect();

        scored.sort_by(|a, b| match a.distance.total_cmp(&b.distance) {
            Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        });
        scored.truncate(k);

        let padding = k - scored.len();
        Ok(Slots {
            filled: scored.into_iter(),
            padding,
        })
    }
}

/// Filled slots first, then `padding` empty ones.
struct Slots {
    filled: std::vec::IntoIter<Neighbor>,
    padding: usize,
}

impl Iterator for Slots {
    type Item = Option<Neighbor>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(n) = self.filled.next() {
            return Some(Some(n));
        }
        if self.padding == 0 {
            return None;
        }
        self.padding -= 1;
        Some(None)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.filled.len().saturating_add(self.padding);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Slots {}

/// Squared Euclidean distance between two equally sized vectors.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
