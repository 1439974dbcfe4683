use crate::stats::StreamerCounters;
use crate::{DispatchBudget, LoadRequest, StageQueue};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use streamline_base::LoadState;

// The last stage. Runs on the render thread because it is the only one allowed to touch the
// graphics device.
pub(crate) struct DispatchStage {
    queue: Arc<StageQueue<LoadRequest>>,
    budget: DispatchBudget,
    counters: Arc<StreamerCounters>,
}

impl DispatchStage {
    pub(crate) fn new(
        queue: Arc<StageQueue<LoadRequest>>,
        budget: DispatchBudget,
        counters: Arc<StreamerCounters>,
    ) -> Self {
        DispatchStage {
            queue,
            budget,
            counters,
        }
    }

    pub(crate) fn queue(&self) -> &StageQueue<LoadRequest> {
        &self.queue
    }

    // Returns how many requests were completed. Never blocks on an empty queue.
    pub(crate) fn dispatch(&self) -> usize {
        let start = Instant::now();
        let mut dispatched = 0;

        for request in self.queue.drain_nonblocking() {
            self.finish_request(request);
            dispatched += 1;

            if self.budget.is_exhausted(dispatched, start.elapsed()) {
                if !self.queue.is_empty() {
                    log::trace!(
                        "Dispatch budget {:?} used up, {} requests wait for the next frame",
                        self.budget,
                        self.queue.len()
                    );
                }
                break;
            }
        }

        dispatched
    }

    fn finish_request(
        &self,
        mut request: LoadRequest,
    ) {
        let resource_id = request.resource_id();
        log::trace!("Start dispatch {:?}", resource_id);

        let result = {
            profiling::scope!("ResourceLoader::on_renderer_backend_dispatch");
            request.resource_loader.on_renderer_backend_dispatch()
        };

        let final_state = match result {
            Ok(()) => LoadState::Loaded,
            Err(error) => {
                StreamerCounters::increment(&self.counters.failed_dispatches);
                log::warn!(
                    "Renderer backend dispatch failed for {:?} {:?}: {}",
                    resource_id,
                    request.resource.debug_name(),
                    error
                );
                LoadState::Failed
            }
        };

        if !request
            .resource
            .load_state_cell()
            .finish_loading(final_state)
        {
            log::warn!(
                "Load state of {:?} changed while its request was in flight, now {:?}",
                resource_id,
                request.resource.load_state()
            );
        }

        let resource = request.release_loader();
        StreamerCounters::increment(&self.counters.dispatched);
        self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
        log::trace!("Finished {:?} as {:?}", resource.resource_id(), final_state);
    }
}
