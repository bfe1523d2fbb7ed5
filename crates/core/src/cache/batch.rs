//! Bounded-concurrency batch helper.

use std::future::Future;

use futures::future::join_all;

/// Run `f` over `items` in chunks of `batch_size`.
///
/// Futures within a chunk run concurrently; the next chunk starts only after
/// the previous one has fully completed. Results keep the input order. A
/// `batch_size` of zero is treated as one.
pub async fn in_batches<T, R, F, Fut>(items: Vec<T>, batch_size: usize, mut f: F) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let batch_size = batch_size.max(1);
    let mut results = Vec::with_capacity(items.len());
    let mut items = items.into_iter().peekable();

    while items.peek().is_some() {
        let chunk: Vec<Fut> = items.by_ref().take(batch_size).map(&mut f).collect();
        results.extend(join_all(chunk).await);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_keeps_order() {
        let out = in_batches((0..7).collect(), 3, |i| async move { i * 10 }).await;
        assert_eq!(out, vec![0, 10, 20, 30, 40, 50, 60]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_exceeds_batch_size() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        in_batches((0..45).collect::<Vec<u32>>(), 20, |_| {
            let running = running.clone();
            let peak = peak.clone();
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(peak.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn test_empty_and_zero_batch() {
        let out: Vec<u8> = in_batches(Vec::<u8>::new(), 5, |i| async move { i }).await;
        assert!(out.is_empty());
        let out = in_batches(vec![1, 2], 0, |i| async move { i }).await;
        assert_eq!(out, vec![1, 2]);
    }
}
