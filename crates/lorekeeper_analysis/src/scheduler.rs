//! Fan-out strategies for per-chapter work.

use futures::stream::{self, Stream, StreamExt};
use std::future::Future;

/// How per-chapter work is dispatched.
///
/// Both strategies yield one output per item. [`Scheduler::Bounded`] yields
/// in completion order; [`Scheduler::Sequential`] runs one item at a time
/// and yields in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduler {
    /// Up to `limit` items in flight at once
    Bounded {
        /// Maximum concurrent workers, at least 1
        limit: usize,
    },
    /// One item at a time, each result yielded before the next starts
    Sequential,
}

impl Scheduler {
    /// Bounded scheduler with the given width.
    pub fn bounded(limit: usize) -> Self {
        Self::Bounded { limit }
    }

    /// Run `worker` over `items`.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::StreamExt;
    /// use lorekeeper_analysis::Scheduler;
    ///
    /// # futures::executor::block_on(async {
    /// let doubled: Vec<_> = Scheduler::Sequential
    ///     .map(vec![1, 2, 3], |n| async move { n * 2 })
    ///     .collect()
    ///     .await;
    /// assert_eq!(doubled, vec![2, 4, 6]);
    /// # });
    /// ```
    pub fn map<'a, I, T, F, Fut>(self, items: I, worker: F) -> impl Stream<Item = T> + 'a
    where
        I: IntoIterator + 'a,
        I::IntoIter: 'a,
        T: 'a,
        F: FnMut(I::Item) -> Fut + 'a,
        Fut: Future<Output = T> + 'a,
    {
        match self {
            Self::Bounded { limit } => stream::iter(items)
                .map(worker)
                .buffer_unordered(limit.max(1))
                .left_stream(),
            Self::Sequential => stream::iter(items).then(worker).right_stream(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn run(scheduler: Scheduler, items: Vec<usize>) -> (Vec<usize>, usize) {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let results = scheduler
            .map(items, |n| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    n
                }
            })
            .collect::<Vec<_>>()
            .await;
        (results, peak.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn sequential_keeps_order_one_at_a_time() {
        let (results, peak) = run(Scheduler::Sequential, (0..6).collect()).await;
        assert_eq!(results, (0..6).collect::<Vec<_>>());
        assert_eq!(peak, 1);
    }

    #[tokio::test]
    async fn bounded_respects_limit() {
        let (mut results, peak) = run(Scheduler::bounded(2), (0..6).collect()).await;
        results.sort_unstable();
        assert_eq!(results, (0..6).collect::<Vec<_>>());
        assert!(peak <= 2);
    }

    #[tokio::test]
    async fn zero_limit_still_makes_progress() {
        let (results, _) = run(Scheduler::bounded(0), vec![7]).await;
        assert_eq!(results, vec![7]);
    }
}
