//! Linkage matrices from agglomerative clustering.
//!
//! A linkage matrix over `n` items holds `n - 1` merge records. Record `i`
//! joins two clusters `a` and `b` at some distance, producing cluster `n + i`
//! with `count` original items (SciPy/MATLAB labeling):
//!
//! ```text
//!         6 (row 2)
//!        / \
//!       4   5 (rows 0, 1)
//!      / \ / \
//!     0  1 2  3 (items)
//! ```

use crate::error::{Error, Result};

/// A single merge record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeRecord {
    /// First merged cluster (raw reference).
    pub a: usize,
    /// Second merged cluster (raw reference).
    pub b: usize,
    /// Distance at which the merge happened.
    pub distance: f64,
    /// Number of original items in the merged cluster.
    pub count: usize,
}

impl MergeRecord {
    /// The raw reference on one side (0 = `a`, 1 = `b`).
    pub fn side(&self, side: usize) -> usize {
        if side == 0 {
            self.a
        } else {
            self.b
        }
    }
}

/// What a raw reference value points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// An original item index.
    Item(usize),
    /// An earlier merge record, by row index.
    Merge(usize),
}

/// A merge history over `n_items` original items.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkageMatrix {
    merges: Vec<MergeRecord>,
    n_items: usize,
}

impl LinkageMatrix {
    /// Create an empty matrix for `n_items` items.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge.
    pub fn add_merge(&mut self, a: usize, b: usize, distance: f64, count: usize) {
        self.merges.push(MergeRecord {
            a,
            b,
            distance,
            count,
        });
    }

    /// Build from SciPy-style float rows `[a, b, distance, count]`.
    ///
    /// The item count is inferred as `rows.len() + 1`.
    pub fn from_rows(rows: &[[f64; 4]]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut linkage = Self::new(rows.len() + 1);
        for (row, r) in rows.iter().enumerate() {
            let a = as_index(r[0], row)?;
            let b = as_index(r[1], row)?;
            let count = as_index(r[3], row)?;
            linkage.add_merge(a, b, r[2], count);
        }
        linkage.validate()?;
        Ok(linkage)
    }

    /// Parse whitespace-separated text, one merge per line (`numpy.savetxt` output).
    pub fn parse_text(text: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let values = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<f64>()
                        .map_err(|e| Error::Other(format!("bad linkage value {s:?}: {e}")))
                })
                .collect::<Result<Vec<f64>>>()?;
            if values.len() != 4 {
                return Err(Error::DimensionMismatch {
                    expected: 4,
                    found: values.len(),
                });
            }
            rows.push([values[0], values[1], values[2], values[3]]);
        }
        Self::from_rows(&rows)
    }

    /// Check the structural contract: `n - 1` rows, and every row only
    /// references items or earlier merges.
    pub fn validate(&self) -> Result<()> {
        if self.n_items < 2 {
            return Err(Error::EmptyInput);
        }
        if self.merges.len() != self.n_items - 1 {
            return Err(Error::InputShapeMismatch {
                field: "linkage rows",
                expected: self.n_items - 1,
                found: self.merges.len(),
            });
        }
        for (row, merge) in self.merges.iter().enumerate() {
            for reference in [merge.a, merge.b] {
                if reference >= self.n_items + row {
                    return Err(Error::ReferenceResolution {
                        reference,
                        row,
                        reason: "reference is not an item or an earlier merge",
                    });
                }
            }
            if merge.a == merge.b {
                return Err(Error::ReferenceResolution {
                    reference: merge.a,
                    row,
                    reason: "merge joins a cluster with itself",
                });
            }
        }
        Ok(())
    }

    /// Classify a raw reference: `r < n` is an item, `r >= n` is merge `r - n`.
    pub fn reference(&self, raw: usize) -> Reference {
        if raw < self.n_items {
            Reference::Item(raw)
        } else {
            Reference::Merge(raw - self.n_items)
        }
    }

    /// Raw reference value of merge row `row`.
    pub fn merge_reference(&self, row: usize) -> usize {
        self.n_items + row
    }

    /// Merge at `row`.
    pub fn get(&self, row: usize) -> Option<&MergeRecord> {
        self.merges.get(row)
    }

    /// Index of the final, root-level merge.
    pub fn root_row(&self) -> Option<usize> {
        self.merges.len().checked_sub(1)
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterate over merges.
    pub fn merges(&self) -> impl Iterator<Item = &MergeRecord> {
        self.merges.iter()
    }

    /// Get the merge distances.
    pub fn distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }
}

fn as_index(value: f64, row: usize) -> Result<usize> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(Error::ReferenceResolution {
            reference: 0,
            row,
            reason: "linkage entry is not a non-negative integer",
        });
    }
    Ok(value as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linkage_creation() {
        let linkage = LinkageMatrix::new(5);
        assert_eq!(linkage.n_items(), 5);
        assert_eq!(linkage.n_merges(), 0);
        assert_eq!(linkage.root_row(), None);
    }

    #[test]
    fn test_reference_boundary() {
        let linkage = LinkageMatrix::new(4);
        assert_eq!(linkage.reference(3), Reference::Item(3));
        assert_eq!(linkage.reference(4), Reference::Merge(0));
        assert_eq!(linkage.reference(5), Reference::Merge(1));
    }

    #[test]
    fn test_from_rows() -> Result<()> {
        let linkage = LinkageMatrix::from_rows(&[
            [0.0, 1.0, 0.5, 2.0],
            [2.0, 3.0, 0.7, 2.0],
            [4.0, 5.0, 1.0, 4.0],
        ])?;
        assert_eq!(linkage.n_items(), 4);
        assert_eq!(linkage.n_merges(), 3);
        assert_eq!(linkage.root_row(), Some(2));
        assert_eq!(linkage.distances(), vec![0.5, 0.7, 1.0]);
        Ok(())
    }

    #[test]
    fn test_forward_reference_rejected() {
        // Row 0 cannot reference merge 0 (itself) or later merges.
        let err = LinkageMatrix::from_rows(&[[0.0, 3.0, 0.5, 2.0], [1.0, 2.0, 0.7, 3.0]])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ReferenceResolution {
                reference: 3,
                row: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_savetxt_format() -> Result<()> {
        let text = "0.000000000000000000e+00 1.000000000000000000e+00 2.5e-01 2.0e+00\n\
                    2.000000000000000000e+00 3.000000000000000000e+00 5.0e-01 3.0e+00\n";
        let linkage = LinkageMatrix::parse_text(text)?;
        assert_eq!(linkage.n_items(), 3);
        assert_eq!(linkage.get(1).map(|m| m.count), Some(3));
        Ok(())
    }

    #[test]
    fn test_fractional_reference_rejected() {
        assert!(LinkageMatrix::from_rows(&[[0.5, 1.0, 0.1, 2.0]]).is_err());
    }
}
