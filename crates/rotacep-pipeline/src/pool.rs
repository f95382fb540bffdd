//! Bounded concurrent resolution over a batch of postal codes.
//!
//! One implementation serves both batch and interactive callers: the
//! final result is always returned, and an optional progress callback is
//! invoked at fixed checkpoints for operational visibility.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};

use rotacep_core::GeocodeRecord;

/// Progress observer: `(resolved_so_far, total)`.
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// Resolves every postal code through `resolve`, at most `width` in
/// flight at a time.
///
/// Results arrive in completion order; callers that need input order
/// must key on the returned postal code. Per-item failures come back as
/// `None`; the batch always runs to completion. `progress` (and an info
/// log) fires every `progress_every` completed items.
pub async fn resolve_many<F, Fut>(
    postal_codes: Vec<String>,
    width: usize,
    progress_every: usize,
    resolve: F,
    progress: Option<ProgressFn<'_>>,
) -> Vec<(String, Option<GeocodeRecord>)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Option<GeocodeRecord>>,
{
    let total = postal_codes.len();
    let width = width.max(1);
    let every = progress_every.max(1);
    let done = AtomicUsize::new(0);
    let done = &done;

    stream::iter(postal_codes)
        .map(|postal_code| {
            let fut = resolve(postal_code.clone());
            async move {
                let record = fut.await;
                let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                if finished % every == 0 {
                    tracing::info!(finished, total, "resolved {finished}/{total} postal codes");
                    if let Some(callback) = progress {
                        callback(finished, total);
                    }
                }
                (postal_code, record)
            }
        })
        .buffer_unordered(width)
        .collect()
        .await
}
