//! Concurrency helper: limit the number of comment fetches in flight.

use rayon::prelude::*;

/// Map `items` through `f` with at most `limit` calls in flight, preserving input order.
/// `limit <= 1` runs strictly sequentially on the calling thread.
pub fn map_ordered_limited<T, R, F>(items: &[T], limit: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Sync + Fn(&T) -> R,
{
    if limit <= 1 {
        return items.iter().map(&f).collect();
    }
    let mut out = Vec::with_capacity(items.len());
    for chunk in items.chunks(limit) {
        // indexed collect keeps chunk order
        let part: Vec<R> = chunk.par_iter().map(&f).collect();
        out.extend(part);
    }
    out
}
