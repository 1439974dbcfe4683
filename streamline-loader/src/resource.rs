//
// Interfaces the streamer needs from the rest of the engine
//
// - Resource: the object being populated (a mesh, a texture, ...). The streamer only touches
//   its load state.
// - ResourceLoader: a stateful, per-resource-type strategy that does the actual work. The three
//   stage operations are called in order, each from a different thread, but never concurrently.
//   Whoever holds the LoadRequest owns the loader.
// - ResourceManager: owns a pool of loader instances for one resource type. The dispatch stage
//   hands each loader back exactly once when its request completes.
//
use crate::LoadResult;
use std::any::Any;
use std::sync::Arc;
use streamline_base::{LoadState, LoadStateCell, ResourceId};

pub trait Resource: Send + Sync {
    fn resource_id(&self) -> ResourceId;

    fn load_state_cell(&self) -> &LoadStateCell;

    fn load_state(&self) -> LoadState {
        self.load_state_cell().get()
    }

    // for debugging/convenience, not actually required
    fn debug_name(&self) -> Option<&str> {
        None
    }
}

/// Lets a [`ResourceManager`] get its concrete loader type back out of a `Box<dyn ResourceLoader>`.
/// Implemented for every `'static + Send` type, loaders never implement it by hand.
pub trait IntoAnyLoader {
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T: Any + Send> IntoAnyLoader for T {
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

pub trait ResourceLoader: IntoAnyLoader + Send {
    /// Runs on the deserialization thread. Reads and parses source data, blocking IO is fine here.
    fn on_deserialization(&mut self) -> LoadResult<()>;

    /// Runs on the processing thread. Turns deserialized data into something the renderer
    /// backend can take directly (decompression, validation, mip generation...)
    fn on_processing(&mut self) -> LoadResult<()>;

    /// Runs on the render thread during [`ResourceStreamer::dispatch`](crate::ResourceStreamer::dispatch).
    /// Keep it short, it eats into frame time.
    fn on_renderer_backend_dispatch(&mut self) -> LoadResult<()>;

    /// The manager this instance is returned to once dispatched. `None` if the manager has been
    /// dropped, in which case the loader is dropped too.
    fn resource_manager(&self) -> Option<Arc<dyn ResourceManager>>;
}

pub trait ResourceManager: Send + Sync {
    fn release_resource_loader_instance(
        &self,
        loader: Box<dyn ResourceLoader>,
    );
}
