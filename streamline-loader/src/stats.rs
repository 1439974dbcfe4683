use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

// Shared by the streamer, both workers and the dispatch stage
#[derive(Default)]
pub(crate) struct StreamerCounters {
    pub(crate) committed: AtomicU64,
    pub(crate) deserialized: AtomicU64,
    pub(crate) processed: AtomicU64,
    pub(crate) dispatched: AtomicU64,
    pub(crate) deserialization_errors: AtomicU64,
    pub(crate) processing_errors: AtomicU64,
    pub(crate) failed_dispatches: AtomicU64,
    // Raised before a resource is marked Loading, lowered after its loader is released
    pub(crate) in_flight: AtomicUsize,
}

impl StreamerCounters {
    pub(crate) fn increment(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Point-in-time snapshot of pipeline activity. Counters are cumulative since the streamer was
/// created. Values are read individually, so a snapshot taken while work is moving may be
/// slightly inconsistent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamerStats {
    pub committed: u64,
    pub deserialized: u64,
    pub processed: u64,
    pub dispatched: u64,
    pub deserialization_errors: u64,
    pub processing_errors: u64,
    pub failed_dispatches: u64,
    pub in_flight: usize,
    pub deserialization_queue_len: usize,
    pub processing_queue_len: usize,
    pub dispatch_queue_len: usize,
}

impl StreamerStats {
    pub(crate) fn from_counters(counters: &StreamerCounters) -> Self {
        StreamerStats {
            committed: counters.committed.load(Ordering::Relaxed),
            deserialized: counters.deserialized.load(Ordering::Relaxed),
            processed: counters.processed.load(Ordering::Relaxed),
            dispatched: counters.dispatched.load(Ordering::Relaxed),
            deserialization_errors: counters.deserialization_errors.load(Ordering::Relaxed),
            processing_errors: counters.processing_errors.load(Ordering::Relaxed),
            failed_dispatches: counters.failed_dispatches.load(Ordering::Relaxed),
            in_flight: counters.in_flight(),
            ..Default::default()
        }
    }
}
