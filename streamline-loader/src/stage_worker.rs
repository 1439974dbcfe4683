use crate::stats::StreamerCounters;
use crate::{LoadRequest, LoadResult, ShutdownSignal, StageQueue};
use std::sync::Arc;
use std::thread::JoinHandle;

/// The two pipeline stages that run off the render thread
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerStage {
    // IO bound: read and parse source data
    Deserialization,
    // CPU bound: make the data backend-ready
    Processing,
}

impl WorkerStage {
    pub fn name(self) -> &'static str {
        match self {
            WorkerStage::Deserialization => "deserialization",
            WorkerStage::Processing => "processing",
        }
    }

    fn run(
        self,
        request: &mut LoadRequest,
    ) -> LoadResult<()> {
        match self {
            WorkerStage::Deserialization => {
                profiling::scope!("ResourceLoader::on_deserialization");
                request.resource_loader.on_deserialization()
            }
            WorkerStage::Processing => {
                profiling::scope!("ResourceLoader::on_processing");
                request.resource_loader.on_processing()
            }
        }
    }

    fn completed_counter(
        self,
        counters: &StreamerCounters,
    ) -> &std::sync::atomic::AtomicU64 {
        match self {
            WorkerStage::Deserialization => &counters.deserialized,
            WorkerStage::Processing => &counters.processed,
        }
    }

    fn error_counter(
        self,
        counters: &StreamerCounters,
    ) -> &std::sync::atomic::AtomicU64 {
        match self {
            WorkerStage::Deserialization => &counters.deserialization_errors,
            WorkerStage::Processing => &counters.processing_errors,
        }
    }
}

// Runs one stage on a request and forwards it to the next queue. A failing loader doesn't stop
// the request, the loader is expected to remember the failure and no-op in later stages.
fn handle_request(
    stage: WorkerStage,
    mut request: LoadRequest,
    output: &StageQueue<LoadRequest>,
    counters: &StreamerCounters,
) {
    log::trace!("Start {} {:?}", stage.name(), request.resource_id());
    if let Err(error) = stage.run(&mut request) {
        StreamerCounters::increment(stage.error_counter(counters));
        log::warn!(
            "{} failed for {:?} {:?}: {}",
            stage.name(),
            request.resource_id(),
            request.resource.debug_name(),
            error
        );
    }

    StreamerCounters::increment(stage.completed_counter(counters));
    output.push(request);
}

// Thread that pulls requests out of one stage queue and pushes them into the next until its
// shutdown signal is raised
pub(crate) struct StageWorkerThread {
    stage: WorkerStage,
    shutdown: Arc<ShutdownSignal>,
    join_handle: JoinHandle<()>,
}

impl StageWorkerThread {
    pub(crate) fn new(
        stage: WorkerStage,
        thread_name: String,
        input: Arc<StageQueue<LoadRequest>>,
        output: Arc<StageQueue<LoadRequest>>,
        counters: Arc<StreamerCounters>,
    ) -> std::io::Result<Self> {
        let shutdown = Arc::new(ShutdownSignal::new());
        let thread_shutdown = shutdown.clone();
        let join_handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                profiling::register_thread!(&format!("StageWorkerThread {}", stage.name()));
                log::debug!("{} worker started", stage.name());
                while input.pop_all_or_wait(&thread_shutdown, |request| {
                    handle_request(stage, request, &output, &counters)
                }) {}

                log::debug!(
                    "{} worker stopped, abandoning {} queued requests",
                    stage.name(),
                    input.len()
                );
            })?;

        Ok(StageWorkerThread {
            stage,
            shutdown,
            join_handle,
        })
    }

    pub(crate) fn stage(&self) -> WorkerStage {
        self.stage
    }

    pub(crate) fn request_shutdown(&self) {
        self.shutdown.request();
    }

    /// Blocks until the thread exits. Must be preceded by `request_shutdown`, otherwise this
    /// waits forever on an idle worker. Returns false if the thread panicked.
    pub(crate) fn join(self) -> bool {
        self.join_handle.join().is_ok()
    }
}
