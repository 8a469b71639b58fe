use std::sync::atomic::{AtomicUsize, Ordering};

/// Upper bound on fetch attempts for one discovery run.
///
/// `try_acquire` is a compare-and-swap loop, so concurrent callers can never push
/// `used` past `limit`.
#[derive(Debug)]
pub struct FetchBudget {
    limit: usize,
    used: AtomicUsize,
}

impl FetchBudget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            used: AtomicUsize::new(0),
        }
    }

    pub fn try_acquire(&self) -> bool {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .is_ok()
    }

    pub fn used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used())
    }
}
