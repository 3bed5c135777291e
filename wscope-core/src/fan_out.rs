//! Bounded, order-preserving concurrent execution.
//!
//! Used for the per-item detail lookups some chains need (one request per
//! transaction hash or signature). At most `limit` futures are in flight at
//! once and results come back in input order, not completion order.
//!
//! The group itself never decides what a failure means: it returns every
//! success and every failure, and the caller picks the policy.

use futures_util::stream::{self, StreamExt};
use std::future::Future;

/// A concurrent task group with a fixed concurrency limit.
#[derive(Debug, Clone, Copy)]
pub struct FanOut {
    limit: usize,
}

/// A failed branch, with its position in the input.
#[derive(Debug)]
pub struct FanOutFailure<E> {
    pub index: usize,
    pub error: E,
}

/// Result of a fan-out: successes in input order, plus every failure.
#[derive(Debug)]
pub struct FanOutOutcome<T, E> {
    pub successes: Vec<T>,
    pub failures: Vec<FanOutFailure<E>>,
}

impl FanOut {
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `task` on every item with at most `limit` running concurrently.
    ///
    /// Suspends until every branch has finished.
    pub async fn run<I, F, Fut, T, E>(&self, items: I, task: F) -> FanOutOutcome<T, E>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let results: Vec<Result<T, E>> = stream::iter(items)
            .map(task)
            .buffered(self.limit)
            .collect()
            .await;

        let mut outcome = FanOutOutcome {
            successes: Vec::with_capacity(results.len()),
            failures: Vec::new(),
        };
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(value) => outcome.successes.push(value),
                Err(error) => outcome.failures.push(FanOutFailure { index, error }),
            }
        }
        outcome
    }
}

impl<T, E> FanOutOutcome<T, E> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// All-or-nothing: the first failure (by input position) fails the batch.
    pub fn into_all(self) -> Result<Vec<T>, E> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.successes),
        }
    }

    /// Keep the successes; hand each failure to `on_failure` (usually a log).
    pub fn into_successes(self, mut on_failure: impl FnMut(FanOutFailure<E>)) -> Vec<T> {
        self.failures.into_iter().for_each(&mut on_failure);
        self.successes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_preserves_input_order() {
        // Earlier items sleep longer, so completion order is reversed.
        let delays = vec![40u64, 30, 20, 10, 0];
        let outcome: FanOutOutcome<u64, ()> = FanOut::new(5)
            .run(delays.clone(), |ms| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(ms)
            })
            .await;
        assert!(outcome.is_complete());
        assert_eq!(outcome.successes, delays);
    }

    #[tokio::test]
    async fn test_respects_concurrency_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let outcome: FanOutOutcome<usize, ()> = FanOut::new(2)
            .run(0..8usize, |i| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                }
            })
            .await;

        assert_eq!(outcome.successes.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_failures_are_reported_with_index() {
        let outcome = FanOut::new(3)
            .run(vec![1, 2, 3, 4], |n| async move {
                if n % 2 == 0 { Err(format!("bad {n}")) } else { Ok(n) }
            })
            .await;

        assert!(!outcome.is_complete());
        assert_eq!(outcome.successes, vec![1, 3]);
        let indices: Vec<usize> = outcome.failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_into_all_fails_on_first_failure() {
        let outcome = FanOut::new(3)
            .run(vec![1, 2, 3, 4], |n| async move {
                if n >= 3 { Err(format!("bad {n}")) } else { Ok(n) }
            })
            .await;
        assert_eq!(outcome.into_all(), Err("bad 3".to_string()));
    }

    #[tokio::test]
    async fn test_into_successes_collects_failures() {
        let outcome = FanOut::new(1)
            .run(vec![1, 2, 3], |n| async move {
                if n == 2 { Err("bad") } else { Ok(n) }
            })
            .await;
        let mut seen = Vec::new();
        let ok = outcome.into_successes(|f| seen.push(f.index));
        assert_eq!(ok, vec![1, 3]);
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        assert_eq!(FanOut::new(0).limit(), 1);
    }
}
