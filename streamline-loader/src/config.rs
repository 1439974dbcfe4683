use std::time::Duration;

/// Caps how much finished work a single [`dispatch`](crate::ResourceStreamer::dispatch) call
/// hands to the renderer backend. The cap is checked after each request, so every call that finds
/// work dispatches at least one request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispatchBudget {
    // Drain the dispatch queue completely every frame
    Unbounded,
    MaxRequests(usize),
    MaxDuration(Duration),
}

impl DispatchBudget {
    pub(crate) fn is_exhausted(
        &self,
        dispatched: usize,
        elapsed: Duration,
    ) -> bool {
        match *self {
            DispatchBudget::Unbounded => false,
            DispatchBudget::MaxRequests(max_requests) => dispatched >= max_requests,
            DispatchBudget::MaxDuration(max_duration) => elapsed >= max_duration,
        }
    }
}

impl Default for DispatchBudget {
    fn default() -> Self {
        DispatchBudget::Unbounded
    }
}

#[derive(Clone, Debug)]
pub struct ResourceStreamerConfig {
    /// Worker threads are named "<prefix> deserialization" and "<prefix> processing"
    pub thread_name_prefix: String,
    pub dispatch_budget: DispatchBudget,
}

impl Default for ResourceStreamerConfig {
    fn default() -> Self {
        ResourceStreamerConfig {
            thread_name_prefix: "streamline".to_string(),
            dispatch_budget: DispatchBudget::Unbounded,
        }
    }
}
