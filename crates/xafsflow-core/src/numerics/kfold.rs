//! K-fold splitting for cross-validated regularisation selection.
//!
//! Folds are contiguous blocks of the (optionally shuffled) row order. The
//! first `n % k` folds hold one extra row.

/// Minimal LCG used for seeded fold shuffling and random coordinate order.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    /// Uniform index in `0..bound`; `bound` must be non-zero.
    pub fn next_index(&mut self, bound: usize) -> usize {
        (self.next_u32() as usize) % bound
    }

    pub fn shuffle<T>(&mut self, values: &mut [T]) {
        for i in (1..values.len()).rev() {
            let j = self.next_index(i + 1);
            values.swap(i, j);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CrossValidationError {
    #[error("k-fold cross-validation requires at least 2 folds, got {folds}")]
    TooFewFolds { folds: usize },
    #[error("cannot split {samples} samples into {folds} folds")]
    InsufficientSamples { samples: usize, folds: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    folds: usize,
    seed: Option<u64>,
}

/// Train/test row indices of one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl KFold {
    pub fn new(folds: usize) -> Self {
        Self { folds, seed: None }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    pub fn split(&self, samples: usize) -> Result<Vec<FoldSplit>, CrossValidationError> {
        if self.folds < 2 {
            return Err(CrossValidationError::TooFewFolds { folds: self.folds });
        }
        if samples < self.folds {
            return Err(CrossValidationError::InsufficientSamples {
                samples,
                folds: self.folds,
            });
        }

        let mut order: Vec<usize> = (0..samples).collect();
        if let Some(seed) = self.seed {
            SimpleRng::new(seed).shuffle(&mut order);
        }

        let base = samples / self.folds;
        let extra = samples % self.folds;
        let mut splits = Vec::with_capacity(self.folds);
        let mut start = 0;
        for fold in 0..self.folds {
            let size = base + usize::from(fold < extra);
            let end = start + size;
            let test = order[start..end].to_vec();
            let train = order[..start]
                .iter()
                .chain(&order[end..])
                .copied()
                .collect();
            splits.push(FoldSplit { train, test });
            start = end;
        }

        Ok(splits)
    }
}
