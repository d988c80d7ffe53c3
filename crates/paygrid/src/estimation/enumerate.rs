//! Cross-product enumeration shared by inverse search and grids.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use itertools::Itertools;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use super::error::PredictionError;

/// Upper bound on scored combinations per call unless configured otherwise.
pub const DEFAULT_MAX_COMBINATIONS: usize = 5_000;

/// Cooperative stop signal checked before every scoring call.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Bounds applied to a single enumeration.
#[derive(Debug, Clone)]
pub struct EnumerationLimits {
    pub max_combinations: usize,
    pub cancel: Option<CancellationToken>,
    /// Return the rows scored before cancellation instead of failing.
    pub allow_partial: bool,
}

impl Default for EnumerationLimits {
    fn default() -> Self {
        Self {
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            cancel: None,
            allow_partial: false,
        }
    }
}

impl EnumerationLimits {
    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    pub(crate) fn ensure_within(&self, requested: usize) -> Result<(), PredictionError> {
        if requested > self.max_combinations {
            warn!(
                requested,
                limit = self.max_combinations,
                "enumeration rejected"
            );
            return Err(PredictionError::TooManyCombinations {
                requested,
                limit: self.max_combinations,
            });
        }
        Ok(())
    }
}

/// Rows in enumeration order; `partial` is set when cancellation cut the run short.
#[derive(Debug)]
pub(crate) struct Scored<T> {
    pub(crate) rows: Vec<T>,
    pub(crate) partial: bool,
}

/// Number of combinations for the given axis sizes, saturating on overflow.
pub(crate) fn combination_count(sizes: &[usize]) -> usize {
    sizes
        .iter()
        .try_fold(1usize, |acc, &len| acc.checked_mul(len))
        .unwrap_or(usize::MAX)
}

/// Index tuples over the axes, last axis varying fastest. No axes yields a
/// single empty tuple; any empty axis yields nothing.
pub(crate) fn index_combinations(sizes: &[usize]) -> Vec<Vec<usize>> {
    if sizes.is_empty() {
        return vec![Vec::new()];
    }
    if sizes.contains(&0) {
        return Vec::new();
    }

    sizes
        .iter()
        .map(|&len| 0..len)
        .multi_cartesian_product()
        .collect()
}

/// Scores every combination, keeping enumeration order and failing on the
/// first error in that order.
pub(crate) fn score_all<C, T, F>(
    combinations: Vec<C>,
    limits: &EnumerationLimits,
    score: F,
) -> Result<Scored<T>, PredictionError>
where
    C: Send,
    T: Send,
    F: Fn(C) -> Result<T, PredictionError> + Send + Sync,
{
    let total = combinations.len();
    let started = Instant::now();

    #[cfg(feature = "parallel")]
    let outcomes: Vec<Option<Result<T, PredictionError>>> = combinations
        .into_par_iter()
        .map(|combination| (!limits.cancelled()).then(|| score(combination)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<Option<Result<T, PredictionError>>> = {
        let mut outcomes = Vec::with_capacity(total);
        for combination in combinations {
            if limits.cancelled() {
                break;
            }
            let outcome = score(combination);
            let failed = outcome.is_err();
            outcomes.push(Some(outcome));
            if failed {
                break;
            }
        }
        outcomes
    };

    let mut rows = Vec::with_capacity(total);
    let mut interrupted = false;
    for outcome in outcomes {
        match outcome {
            Some(Ok(row)) => rows.push(row),
            Some(Err(err)) => return Err(err),
            None => interrupted = true,
        }
    }
    interrupted |= rows.len() < total;

    debug!(
        total,
        scored = rows.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "combinations scored"
    );

    if !interrupted {
        return Ok(Scored {
            rows,
            partial: false,
        });
    }

    if limits.allow_partial {
        warn!(total, scored = rows.len(), "enumeration cancelled, returning partial rows");
        Ok(Scored {
            rows,
            partial: true,
        })
    } else {
        Err(PredictionError::Cancelled {
            scored: rows.len(),
            total,
        })
    }
}
