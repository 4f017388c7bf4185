/// Display ordering policy for the thread list
/// Pure and stateless; recomputed fresh on each render pass
use std::cmp::Ordering;

use crate::Thread;

/// Total order: unresolved before resolved, then newest first
///
/// Threads equal on both keys compare equal, so a stable sort keeps them in
/// the order the input presented them.
pub fn compare_threads(a: &Thread, b: &Thread) -> Ordering {
    match (a.metadata.resolved, b.metadata.resolved) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => b.created_at.cmp(&a.created_at),
    }
}

/// Sorted copy of the thread collection for display
pub fn sorted_for_display(threads: &[Thread]) -> Vec<Thread> {
    let mut sorted = threads.to_vec();
    sorted.sort_by(compare_threads);
    sorted
}
