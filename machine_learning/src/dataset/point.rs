use ndarray::{Array1, ArrayView1, s};

use crate::{MlErr, Result};

/// A sparse feature vector with sorted, unique indices and an explicit dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVec {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f32>,
}

impl SparseVec {
    /// Creates a new `SparseVec`.
    ///
    /// Entries may come in any order, repeated indices are summed and zeros are dropped.
    ///
    /// # Arguments
    /// * `dim` - The dimension of the vector.
    /// * `entries` - The `(index, value)` pairs.
    ///
    /// # Returns
    /// An error if an index doesn't fit in `dim`.
    pub fn new(dim: usize, mut entries: Vec<(usize, f32)>) -> Result<Self> {
        if let Some(&(index, _)) = entries.iter().find(|(i, _)| *i >= dim) {
            return Err(MlErr::SizeMismatch {
                what: "sparse feature index",
                got: index + 1,
                expected: dim,
            });
        }

        entries.sort_by_key(|&(i, _)| i);
        entries.dedup_by(|next, kept| {
            let same = next.0 == kept.0;
            if same {
                kept.1 += next.1;
            }
            same
        });
        entries.retain(|&(_, v)| v != 0.);

        let (indices, values) = entries.into_iter().unzip();
        Ok(Self {
            dim,
            indices,
            values,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The amount of explicitly stored entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Dot product against a dense slice, entries past its end count as zero.
    pub fn dot(&self, dense: &[f32]) -> f32 {
        self.iter()
            .filter_map(|(i, v)| dense.get(i).map(|w| w * v))
            .sum()
    }
}

/// The features of a single record.
#[derive(Debug, Clone, PartialEq)]
pub enum Features {
    Dense(Array1<f32>),
    Sparse(SparseVec),
}

impl Features {
    pub fn dim(&self) -> usize {
        match self {
            Features::Dense(x) => x.len(),
            Features::Sparse(x) => x.dim(),
        }
    }

    /// Dot product against a dense slice, truncated to the shortest of both.
    pub fn dot(&self, dense: &[f32]) -> f32 {
        match self {
            Features::Dense(x) => {
                let n = x.len().min(dense.len());
                x.slice(s![..n]).dot(&ArrayView1::from(&dense[..n]))
            }
            Features::Sparse(x) => x.dot(dense),
        }
    }

    /// Calls `f` with every nonzero `(index, value)` pair in ascending index order.
    pub fn for_each_nonzero<F: FnMut(usize, f32)>(&self, mut f: F) {
        match self {
            Features::Dense(x) => x
                .iter()
                .enumerate()
                .filter(|&(_, &v)| v != 0.)
                .for_each(|(i, &v)| f(i, v)),
            Features::Sparse(x) => x.iter().for_each(|(i, v)| f(i, v)),
        }
    }

    pub fn to_dense(&self) -> Array1<f32> {
        match self {
            Features::Dense(x) => x.clone(),
            Features::Sparse(x) => {
                let mut dense = Array1::zeros(x.dim());
                x.iter().for_each(|(i, v)| dense[i] = v);
                dense
            }
        }
    }
}

impl From<Array1<f32>> for Features {
    fn from(value: Array1<f32>) -> Self {
        Self::Dense(value)
    }
}

impl From<SparseVec> for Features {
    fn from(value: SparseVec) -> Self {
        Self::Sparse(value)
    }
}

/// A record made of features and a label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPoint {
    pub x: Features,
    pub y: f32,
}

impl LabeledPoint {
    pub fn new(x: impl Into<Features>, y: f32) -> Self {
        Self { x: x.into(), y }
    }

    pub fn dim(&self) -> usize {
        self.x.dim()
    }

    /// Evaluates the linear function `w·x + b`, where `params` holds `w` followed by `b`.
    pub fn decision_value(&self, params: &[f32]) -> f32 {
        match params.split_last() {
            Some((bias, weights)) => self.x.dot(weights) + bias,
            None => 0.,
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_sparse_new_sorts_and_merges() {
        let x = SparseVec::new(5, vec![(3, 1.), (0, 2.), (3, 0.5), (1, 0.)]).unwrap();

        assert_eq!(x.iter().collect::<Vec<_>>(), vec![(0, 2.), (3, 1.5)]);
        assert_eq!(x.nnz(), 2);
        assert_eq!(x.dim(), 5);
    }

    #[test]
    fn test_sparse_new_rejects_out_of_range() {
        let err = SparseVec::new(2, vec![(2, 1.)]).unwrap_err();
        assert!(matches!(
            err,
            MlErr::SizeMismatch {
                got: 3,
                expected: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_dense_and_sparse_agree() {
        let dense = Features::from(array![1., 0., -2.]);
        let sparse = Features::from(SparseVec::new(3, vec![(0, 1.), (2, -2.)]).unwrap());
        let w = [0.5, 3., 1.];

        assert_eq!(dense.dot(&w), -1.5);
        assert_eq!(sparse.dot(&w), -1.5);
        assert_eq!(sparse.to_dense(), array![1., 0., -2.]);

        let mut nonzero = Vec::new();
        dense.for_each_nonzero(|i, v| nonzero.push((i, v)));
        assert_eq!(nonzero, vec![(0, 1.), (2, -2.)]);
    }

    #[test]
    fn test_decision_value_uses_last_param_as_bias() {
        let point = LabeledPoint::new(array![1f32, 2.], 1.);

        assert_eq!(point.decision_value(&[1., 1., 0.5]), 3.5);
        assert_eq!(point.decision_value(&[]), 0.);
    }
}
