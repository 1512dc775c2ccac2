// src/core/selector.rs

use std::collections::HashSet;
use std::fmt;

use rand::Rng;

use crate::models::assessment::AssessmentConfig;

/// Failures while deriving a presented question set from a pool.
#[derive(Debug, PartialEq, Eq)]
pub enum SelectError {
    /// `total_questions` must be a positive integer.
    InvalidCount(i64),

    /// Range bounds fall outside `[1, pool_len]` or are inverted.
    InvalidRange {
        range_from: i64,
        range_to: i64,
        pool_len: usize,
    },

    /// The range restriction yields zero questions (empty pool).
    EmptyRange,
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectError::InvalidCount(n) => {
                write!(f, "totalQuestions must be positive, got {}", n)
            }
            SelectError::InvalidRange {
                range_from,
                range_to,
                pool_len,
            } => write!(
                f,
                "range [{}, {}] is invalid for a pool of {} questions",
                range_from, range_to, pool_len
            ),
            SelectError::EmptyRange => write!(f, "question range selects nothing"),
        }
    }
}

impl std::error::Error for SelectError {}

/// Failures while validating a stored order array for reconstruction.
#[derive(Debug, PartialEq, Eq)]
pub enum ReconstructError {
    Empty,
    OutOfBounds { index: usize, pool_len: usize },
    Duplicate(usize),
}

impl fmt::Display for ReconstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconstructError::Empty => write!(f, "stored question order is empty"),
            ReconstructError::OutOfBounds { index, pool_len } => write!(
                f,
                "stored question order references index {} but the pool has {} questions",
                index, pool_len
            ),
            ReconstructError::Duplicate(index) => {
                write!(f, "stored question order repeats index {}", index)
            }
        }
    }
}

impl std::error::Error for ReconstructError {}

/// Derives the presented subset of a question pool as an order array of
/// original-pool indices: `presented[i] = pool[order[i]]`.
///
/// The pool is first restricted to the 1-indexed inclusive range
/// `[range_from, range_to]`, then cut down to `total_questions` entries
/// (silently clamped to the restricted length). With `randomize` set, the
/// cut is a uniform draw without replacement; otherwise the first entries
/// of the range are kept in pool order.
pub fn select(
    pool_len: usize,
    config: &AssessmentConfig,
    rng: &mut impl Rng,
) -> Result<Vec<usize>, SelectError> {
    if config.total_questions < 1 {
        return Err(SelectError::InvalidCount(config.total_questions));
    }
    if pool_len == 0 {
        return Err(SelectError::EmptyRange);
    }
    if config.range_from < 1
        || config.range_to < config.range_from
        || config.range_to > pool_len as i64
    {
        return Err(SelectError::InvalidRange {
            range_from: config.range_from,
            range_to: config.range_to,
            pool_len,
        });
    }

    // 1-indexed inclusive bounds become a 0-indexed half-open window.
    let lo = (config.range_from - 1) as usize;
    let hi = config.range_to as usize;
    let mut window: Vec<usize> = (lo..hi).collect();

    let take = (config.total_questions as usize).min(window.len());
    if config.randomize {
        // Partial Fisher-Yates: the first `take` slots end up a uniform
        // permutation prefix of the window, with no index drawn twice.
        for i in 0..take {
            let j = rng.random_range(i..window.len());
            window.swap(i, j);
        }
    }
    window.truncate(take);

    Ok(window)
}

/// Validates a stored order array against the current pool. Reconstruction
/// itself is a direct indexed lookup and never re-randomizes; a malformed
/// order is a hard failure rather than a silent re-draw, since re-drawing
/// would present a different set than the one any stored verdicts refer to.
pub fn reconstruct(pool_len: usize, order: &[usize]) -> Result<(), ReconstructError> {
    if order.is_empty() {
        return Err(ReconstructError::Empty);
    }
    let mut seen = HashSet::with_capacity(order.len());
    for &index in order {
        if index >= pool_len {
            return Err(ReconstructError::OutOfBounds { index, pool_len });
        }
        if !seen.insert(index) {
            return Err(ReconstructError::Duplicate(index));
        }
    }
    Ok(())
}
