use crate::{Resource, ResourceLoader};
use std::sync::Arc;
use streamline_base::ResourceId;

/// A resource paired with the loader that will fill it in. Moves by value from queue to queue, so
/// exactly one stage can reach the loader at any time.
pub struct LoadRequest {
    pub resource: Arc<dyn Resource>,
    pub resource_loader: Box<dyn ResourceLoader>,
}

impl LoadRequest {
    pub fn new(
        resource: Arc<dyn Resource>,
        resource_loader: Box<dyn ResourceLoader>,
    ) -> Self {
        LoadRequest {
            resource,
            resource_loader,
        }
    }

    pub fn resource_id(&self) -> ResourceId {
        self.resource.resource_id()
    }

    // Hands the loader back to its manager. Consumes the request so this can only happen once.
    pub(crate) fn release_loader(self) -> Arc<dyn Resource> {
        let LoadRequest {
            resource,
            resource_loader,
        } = self;

        match resource_loader.resource_manager() {
            Some(resource_manager) => {
                resource_manager.release_resource_loader_instance(resource_loader)
            }
            None => log::debug!(
                "Resource manager for {:?} is gone, dropping its loader",
                resource.resource_id()
            ),
        }

        resource
    }
}

impl std::fmt::Debug for LoadRequest {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LoadRequest")
            .field("resource_id", &self.resource.resource_id())
            .field("debug_name", &self.resource.debug_name())
            .field("load_state", &self.resource.load_state())
            .finish()
    }
}
