//! Background streaming of resource data into renderer-ready form.
//!
//! A [`ResourceStreamer`] moves [`LoadRequest`]s through three stages: deserialization and
//! processing on two background threads, then dispatch to the renderer backend on the render
//! thread. The pipeline knows nothing about resource types, all real work is done by the
//! [`ResourceLoader`] each request carries.

mod config;
pub use config::{DispatchBudget, ResourceStreamerConfig};

mod error;
pub use error::{LoadError, LoadResult, StreamerError, StreamerResult};

mod stage_queue;
pub use stage_queue::{ShutdownSignal, StageQueue};

mod resource;
pub use resource::{IntoAnyLoader, Resource, ResourceLoader, ResourceManager};

mod request;
pub use request::LoadRequest;

mod loader_pool;
pub use loader_pool::LoaderPool;

mod stats;
pub use stats::StreamerStats;

mod stage_worker;
pub use stage_worker::WorkerStage;

mod dispatch;

mod streamer;
pub use streamer::ResourceStreamer;

pub use streamline_base::{LoadState, LoadStateCell, ResourceId};
