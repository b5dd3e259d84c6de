//! Dense `[layer][column][row]` storage for per-cell grid settings.

use crate::{BuildError, Result};
use std::ops::Index;

/// Owned 3D array in row-major order: `(d, i, j) -> (d * nx + i) * nz + j`.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid<T> {
    shape: [usize; 3],
    data: Vec<T>,
}

impl<T> CellGrid<T> {
    /// Wrap a buffer; its length must equal the product of `shape`.
    pub fn from_vec(shape: [usize; 3], data: Vec<T>) -> Result<Self> {
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .unwrap_or(usize::MAX);
        if data.len() != expected {
            return Err(BuildError::Shape {
                shape,
                expected,
                found: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Fill every `(d, i, j)` from `f`, stopping at the first error.
    pub fn try_from_fn<E, F>(shape: [usize; 3], mut f: F) -> std::result::Result<Self, E>
    where
        F: FnMut(usize, usize, usize) -> std::result::Result<T, E>,
    {
        let [nd, nx, nz] = shape;
        let mut data = Vec::with_capacity(nd * nx * nz);
        for d in 0..nd {
            for i in 0..nx {
                for j in 0..nz {
                    data.push(f(d, i, j)?);
                }
            }
        }
        debug_assert_eq!(data.len(), nd * nx * nz);
        Ok(Self { shape, data })
    }

    /// Empty grid with `nd == 0`.
    pub fn empty(nx: usize, nz: usize) -> Self {
        Self {
            shape: [0, nx, nz],
            data: Vec::new(),
        }
    }

    /// `[layers, columns, rows]`.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the grid holds nothing.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Entry at `(d, i, j)`.
    pub fn get(&self, d: usize, i: usize, j: usize) -> Option<&T> {
        self.offset(d, i, j).map(|k| &self.data[k])
    }

    /// Entries with their indices, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize, usize), &T)> {
        let [_, nx, nz] = self.shape;
        self.data.iter().enumerate().map(move |(k, v)| {
            let j = k % nz;
            let i = (k / nz) % nx;
            let d = k / (nz * nx);
            ((d, i, j), v)
        })
    }

    fn offset(&self, d: usize, i: usize, j: usize) -> Option<usize> {
        let [nd, nx, nz] = self.shape;
        (d < nd && i < nx && j < nz).then(|| (d * nx + i) * nz + j)
    }
}

impl<T> Index<(usize, usize, usize)> for CellGrid<T> {
    type Output = T;

    fn index(&self, (d, i, j): (usize, usize, usize)) -> &T {
        match self.offset(d, i, j) {
            Some(k) => &self.data[k],
            None => panic!(
                "grid index ({d}, {i}, {j}) out of range for shape {:?}",
                self.shape
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_layout() {
        let g: CellGrid<(usize, usize, usize)> =
            CellGrid::try_from_fn([2, 3, 2], |d, i, j| Ok::<_, ()>((d, i, j))).unwrap();
        assert_eq!(g.shape(), [2, 3, 2]);
        assert_eq!(g.len(), 12);
        assert_eq!(g[(1, 2, 0)], (1, 2, 0));
        assert_eq!(g.get(0, 1, 1), Some(&(0, 1, 1)));
        assert_eq!(g.get(2, 0, 0), None);
        assert_eq!(g.get(0, 3, 0), None);
        for (idx, v) in g.iter() {
            assert_eq!(idx, *v);
        }
    }

    #[test]
    fn test_from_vec_shape_checked() {
        assert!(CellGrid::from_vec([1, 2, 2], vec![0; 4]).is_ok());
        match CellGrid::from_vec([1, 2, 2], vec![0; 5]) {
            Err(BuildError::Shape {
                expected, found, ..
            }) => {
                assert_eq!(expected, 4);
                assert_eq!(found, 5);
            }
            other => panic!("expected shape error, got {other:?}"),
        }
        assert!(matches!(
            CellGrid::from_vec([usize::MAX, 2, 1], vec![0u8; 2]),
            Err(BuildError::Shape { .. })
        ));
    }

    #[test]
    fn test_from_fn_stops_on_error() {
        let mut calls = 0;
        let r: std::result::Result<CellGrid<u8>, &str> = CellGrid::try_from_fn([1, 2, 2], |_, i, j| {
            calls += 1;
            if i == 1 && j == 0 {
                Err("boom")
            } else {
                Ok(0)
            }
        });
        assert_eq!(r, Err("boom"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_empty() {
        let g: CellGrid<f64> = CellGrid::empty(3, 2);
        assert_eq!(g.shape(), [0, 3, 2]);
        assert!(g.is_empty());
        assert_eq!(g.iter().count(), 0);
    }
}
