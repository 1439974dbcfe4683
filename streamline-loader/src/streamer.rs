use crate::dispatch::DispatchStage;
use crate::stage_worker::{StageWorkerThread, WorkerStage};
use crate::stats::{StreamerCounters, StreamerStats};
use crate::{LoadRequest, ResourceStreamerConfig, StageQueue, StreamerError, StreamerResult};
use std::sync::atomic::Ordering;
use std::sync::Arc;

//
// Requests move through three stages:
//
//   commit_load_request (any thread)
//     -> [deserialization queue] -> deserialization worker (background thread)
//     -> [processing queue]      -> processing worker (background thread)
//     -> [dispatch queue]        -> dispatch() (render thread, once per frame)
//
// Only the queues are shared between threads. A request is popped from one queue before it is
// pushed to the next, so the loader it carries has exactly one owner at a time and needs no
// locking of its own.
//
pub struct ResourceStreamer {
    config: ResourceStreamerConfig,
    deserialization_queue: Arc<StageQueue<LoadRequest>>,
    processing_queue: Arc<StageQueue<LoadRequest>>,
    dispatch_stage: DispatchStage,
    counters: Arc<StreamerCounters>,
    // None once shut down
    workers: Option<Vec<StageWorkerThread>>,
}

impl ResourceStreamer {
    /// Starts both worker threads. They sleep until the first request is committed.
    pub fn new(config: ResourceStreamerConfig) -> StreamerResult<Self> {
        let counters = Arc::new(StreamerCounters::default());
        let deserialization_queue = Arc::new(StageQueue::new("deserialization"));
        let processing_queue = Arc::new(StageQueue::new("processing"));
        let dispatch_queue = Arc::new(StageQueue::new("dispatch"));
        let dispatch_stage =
            DispatchStage::new(dispatch_queue.clone(), config.dispatch_budget, counters.clone());

        let mut streamer = ResourceStreamer {
            config,
            deserialization_queue,
            processing_queue,
            dispatch_stage,
            counters,
            workers: Some(Vec::with_capacity(2)),
        };

        // If the second spawn fails, dropping the streamer stops the first worker
        let deserialization_queue = streamer.deserialization_queue.clone();
        let processing_queue = streamer.processing_queue.clone();
        streamer.spawn_worker(
            WorkerStage::Deserialization,
            deserialization_queue,
            processing_queue.clone(),
        )?;
        streamer.spawn_worker(WorkerStage::Processing, processing_queue, dispatch_queue)?;

        log::debug!(
            "ResourceStreamer started with dispatch budget {:?}",
            streamer.config.dispatch_budget
        );
        Ok(streamer)
    }

    pub fn with_defaults() -> StreamerResult<Self> {
        ResourceStreamer::new(ResourceStreamerConfig::default())
    }

    fn spawn_worker(
        &mut self,
        stage: WorkerStage,
        input: Arc<StageQueue<LoadRequest>>,
        output: Arc<StageQueue<LoadRequest>>,
    ) -> StreamerResult<()> {
        let thread_name = format!("{} {}", self.config.thread_name_prefix, stage.name());
        let worker =
            StageWorkerThread::new(stage, thread_name, input, output, self.counters.clone())?;
        if let Some(workers) = &mut self.workers {
            workers.push(worker);
        }
        Ok(())
    }

    pub fn config(&self) -> &ResourceStreamerConfig {
        &self.config
    }

    /// Queues a resource for loading. Safe to call from any number of threads.
    ///
    /// The resource is marked `Loading` before this returns. If it already is `Loading` the
    /// request is refused, its loader goes straight back to its manager and
    /// [`StreamerError::AlreadyInFlight`] is returned.
    pub fn commit_load_request(
        &self,
        request: LoadRequest,
    ) -> StreamerResult<()> {
        let resource_id = request.resource_id();

        // Raised first so that a resource is never Loading while in_flight reads zero
        self.counters.in_flight.fetch_add(1, Ordering::AcqRel);
        if request.resource.load_state_cell().begin_loading().is_err() {
            self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
            log::warn!(
                "Refusing load request for {:?} {:?}, it is already loading",
                resource_id,
                request.resource.debug_name()
            );
            request.release_loader();
            return Err(StreamerError::AlreadyInFlight(resource_id));
        }

        StreamerCounters::increment(&self.counters.committed);
        log::trace!("Commit load request {:?}", resource_id);
        self.deserialization_queue.push(request);
        Ok(())
    }

    /// Hands finished requests to the renderer backend and marks their resources `Loaded` (or
    /// `Failed`). Call once per frame from the render thread. Never blocks, returns the number of
    /// requests completed.
    #[profiling::function]
    pub fn dispatch(&self) -> usize {
        self.dispatch_stage.dispatch()
    }

    /// Number of committed requests whose loader has not been released yet
    pub fn in_flight_count(&self) -> usize {
        self.counters.in_flight()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight_count() == 0
    }

    pub fn stats(&self) -> StreamerStats {
        StreamerStats {
            deserialization_queue_len: self.deserialization_queue.len(),
            processing_queue_len: self.processing_queue.len(),
            dispatch_queue_len: self.dispatch_stage.queue().len(),
            ..StreamerStats::from_counters(&self.counters)
        }
    }

    /// Stops and joins both workers. Requests still in the pipeline are dropped without being
    /// dispatched and without returning their loaders.
    pub fn shutdown(mut self) -> StreamerResult<()> {
        self.stop_workers()
    }

    fn stop_workers(&mut self) -> StreamerResult<()> {
        let workers = match self.workers.take() {
            Some(workers) => workers,
            None => return Ok(()),
        };

        // Signal everyone before joining anyone so the workers wind down in parallel
        for worker in &workers {
            worker.request_shutdown();
        }

        let mut result = Ok(());
        for worker in workers {
            let stage = worker.stage();
            if !worker.join() {
                log::error!("{} worker thread panicked", stage.name());
                result = Err(StreamerError::WorkerPanicked(stage.name()));
            }
        }

        let abandoned = self.counters.in_flight();
        if abandoned > 0 {
            log::debug!(
                "ResourceStreamer shut down with {} requests in flight",
                abandoned
            );
        }

        result
    }
}

impl Drop for ResourceStreamer {
    fn drop(&mut self) {
        if let Err(error) = self.stop_workers() {
            log::error!("ResourceStreamer shutdown: {}", error);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{LoadResult, Resource, ResourceLoader, ResourceManager};
    use std::time::{Duration, Instant};
    use streamline_base::{LoadState, LoadStateCell, ResourceId};

    struct PlainResource {
        id: ResourceId,
        state: LoadStateCell,
    }

    impl Resource for PlainResource {
        fn resource_id(&self) -> ResourceId {
            self.id
        }

        fn load_state_cell(&self) -> &LoadStateCell {
            &self.state
        }
    }

    // No manager, so the loader is dropped once dispatched
    struct UnmanagedLoader;

    impl ResourceLoader for UnmanagedLoader {
        fn on_deserialization(&mut self) -> LoadResult<()> {
            Ok(())
        }

        fn on_processing(&mut self) -> LoadResult<()> {
            Ok(())
        }

        fn on_renderer_backend_dispatch(&mut self) -> LoadResult<()> {
            Ok(())
        }

        fn resource_manager(&self) -> Option<Arc<dyn ResourceManager>> {
            None
        }
    }

    fn request() -> (Arc<PlainResource>, LoadRequest) {
        let resource = Arc::new(PlainResource {
            id: ResourceId::random(),
            state: LoadStateCell::default(),
        });
        let request = LoadRequest::new(resource.clone(), Box::new(UnmanagedLoader));
        (resource, request)
    }

    #[test]
    fn test_new_streamer_is_idle() {
        let streamer = ResourceStreamer::with_defaults().unwrap();
        assert!(streamer.is_idle());
        assert_eq!(streamer.dispatch(), 0);
        assert_eq!(streamer.stats(), StreamerStats::default());
        streamer.shutdown().unwrap();
    }

    #[test]
    fn test_single_request_is_loaded() {
        let streamer = ResourceStreamer::with_defaults().unwrap();
        let (resource, request) = request();

        streamer.commit_load_request(request).unwrap();
        assert_eq!(resource.load_state(), LoadState::Loading);
        assert_eq!(streamer.in_flight_count(), 1);

        let deadline = Instant::now() + Duration::from_secs(10);
        while !streamer.is_idle() && Instant::now() < deadline {
            streamer.dispatch();
            std::thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(resource.load_state(), LoadState::Loaded);
        let stats = streamer.stats();
        assert_eq!(stats.committed, 1);
        assert_eq!(stats.deserialized, 1);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.dispatched, 1);
        assert_eq!(stats.in_flight, 0);
    }

    #[test]
    fn test_refused_commit_is_not_counted() {
        let streamer = ResourceStreamer::with_defaults().unwrap();
        let (resource, _) = request();
        assert_eq!(resource.state.begin_loading(), Ok(LoadState::Unloaded));

        let request = LoadRequest::new(resource.clone(), Box::new(UnmanagedLoader));
        match streamer.commit_load_request(request) {
            Err(StreamerError::AlreadyInFlight(id)) => assert_eq!(id, resource.id),
            other => panic!("unexpected result {:?}", other),
        }

        assert!(streamer.is_idle());
        assert_eq!(streamer.stats().committed, 0);
        assert_eq!(resource.load_state(), LoadState::Loading);
    }
}
