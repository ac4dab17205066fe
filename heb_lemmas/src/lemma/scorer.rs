use std::sync::Arc;

use super::Batch;
use crate::{Error, Result};

/// Row-major matrix of scores, one row per position of an assembled batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    data: Vec<f32>,
    width: usize,
}

impl ScoreMatrix {
    /// Wraps flat `data` holding rows of `width` scores each.
    pub fn new(data: Vec<f32>, width: usize) -> Result<Self> {
        if width == 0 || data.len() % width != 0 {
            return Err(Error::inference(format!(
                "{} scores do not form rows of width {}",
                data.len(),
                width
            )));
        }
        Ok(ScoreMatrix { data, width })
    }

    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(Error::inference("score rows differ in width"));
        }
        Self::new(rows.into_iter().flatten().collect(), width)
    }

    pub fn rows(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, idx: usize) -> Option<&[f32]> {
        let start = idx.checked_mul(self.width)?;
        self.data.get(start..start + self.width)
    }
}

/// A sequence-labeling model scoring every vocabulary entry at every position.
///
/// Implementations must allow concurrent calls, serializing internally when the
/// underlying engine is not reentrant.
pub trait Scorer: Send + Sync {
    fn run(&self, batch: &Batch) -> Result<ScoreMatrix>;
}

impl<S> Scorer for Box<S>
where
    S: Scorer + ?Sized,
{
    fn run(&self, batch: &Batch) -> Result<ScoreMatrix> {
        (**self).run(batch)
    }
}

impl<S> Scorer for Arc<S>
where
    S: Scorer + ?Sized,
{
    fn run(&self, batch: &Batch) -> Result<ScoreMatrix> {
        (**self).run(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::ScoreMatrix;

    #[test]
    fn rows_are_addressable() {
        let matrix = ScoreMatrix::new(vec![0., 1., 2., 3., 4., 5.], 3).unwrap();
        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.row(1), Some(&[3., 4., 5.][..]));
        assert_eq!(matrix.row(2), None);
    }

    #[test]
    fn rejects_ragged_data() {
        assert!(ScoreMatrix::new(vec![0., 1., 2.], 2).is_err());
        assert!(ScoreMatrix::new(vec![], 0).is_err());
        assert!(ScoreMatrix::from_rows(vec![vec![0.], vec![1., 2.]]).is_err());
    }
}
