use crate::assets::{asset_path, MeshData};
use crate::backend::{GpuBufferId, SharedBackend};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Weak};
use streamline::base::{LoadStateCell, ResourceId};
use streamline::loader::{
    LoadError, LoadRequest, LoadResult, LoaderPool, Resource, ResourceLoader, ResourceManager,
};

pub struct MeshResource {
    id: ResourceId,
    name: String,
    state: LoadStateCell,
    gpu: Mutex<Option<(GpuBufferId, GpuBufferId)>>,
}

impl MeshResource {
    pub fn new(
        id: ResourceId,
        name: &str,
    ) -> Arc<MeshResource> {
        Arc::new(MeshResource {
            id,
            name: name.to_string(),
            state: LoadStateCell::default(),
            gpu: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // (vertex buffer, index buffer) once loaded
    pub fn gpu_buffers(&self) -> Option<(GpuBufferId, GpuBufferId)> {
        *self.gpu.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Resource for MeshResource {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn load_state_cell(&self) -> &LoadStateCell {
        &self.state
    }

    fn debug_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

pub struct MeshLoader {
    manager: Weak<dyn ResourceManager>,
    backend: SharedBackend,
    resource: Option<Arc<MeshResource>>,
    path: PathBuf,
    mesh: Option<MeshData>,
    vertex_bytes: Vec<u8>,
    index_bytes: Vec<u8>,
    // First failure, later stages skip their work if set
    error: Option<LoadError>,
}

impl MeshLoader {
    fn reset(
        &mut self,
        resource: Arc<MeshResource>,
        path: PathBuf,
    ) {
        self.resource = Some(resource);
        self.path = path;
        self.mesh = None;
        self.vertex_bytes.clear();
        self.index_bytes.clear();
        self.error = None;
    }

    fn record<T>(
        &mut self,
        result: LoadResult<T>,
    ) -> LoadResult<T> {
        if let Err(error) = &result {
            self.error = Some(error.clone());
        }
        result
    }
}

impl ResourceLoader for MeshLoader {
    fn on_deserialization(&mut self) -> LoadResult<()> {
        profiling::scope!("MeshLoader::on_deserialization");
        let result = std::fs::read(&self.path)
            .map_err(LoadError::from)
            .and_then(|bytes| {
                bincode::deserialize::<MeshData>(&bytes).map_err(|e| LoadError::from(e.to_string()))
            });

        let mesh = self.record(result)?;
        self.mesh = Some(mesh);
        Ok(())
    }

    fn on_processing(&mut self) -> LoadResult<()> {
        profiling::scope!("MeshLoader::on_processing");
        if self.error.is_some() {
            return Ok(());
        }

        let mesh = match self.mesh.take() {
            Some(mesh) => mesh,
            None => return self.record(Err("no mesh data to process".into())),
        };

        let vertex_count = mesh.positions.len();
        if let Some(bad_index) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
            let message = format!("index {} out of range for {} vertices", bad_index, vertex_count);
            return self.record(Err(message.into()));
        }

        for position in &mesh.positions {
            for component in position {
                self.vertex_bytes.extend_from_slice(&component.to_le_bytes());
            }
        }
        for index in &mesh.indices {
            self.index_bytes.extend_from_slice(&index.to_le_bytes());
        }

        Ok(())
    }

    fn on_renderer_backend_dispatch(&mut self) -> LoadResult<()> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        let resource = match &self.resource {
            Some(resource) => resource,
            None => return Err("mesh loader was not bound to a resource".into()),
        };

        let buffers = {
            let mut backend = self.backend.lock();
            (
                backend.create_buffer(&self.vertex_bytes),
                backend.create_buffer(&self.index_bytes),
            )
        };
        *resource.gpu.lock().unwrap_or_else(|e| e.into_inner()) = Some(buffers);
        Ok(())
    }

    fn resource_manager(&self) -> Option<Arc<dyn ResourceManager>> {
        self.manager.upgrade()
    }
}

pub struct MeshManager {
    weak_self: Weak<MeshManager>,
    backend: SharedBackend,
    asset_root: PathBuf,
    pool: LoaderPool<MeshLoader>,
}

impl MeshManager {
    pub fn new(
        backend: SharedBackend,
        asset_root: PathBuf,
    ) -> Arc<MeshManager> {
        Arc::new_cyclic(|weak_self| MeshManager {
            weak_self: weak_self.clone(),
            backend,
            asset_root,
            pool: LoaderPool::new(),
        })
    }

    pub fn load_request(
        &self,
        resource: &Arc<MeshResource>,
    ) -> LoadRequest {
        let manager: Weak<dyn ResourceManager> = self.weak_self.clone();
        let mut loader = self.pool.acquire_with(|| MeshLoader {
            manager,
            backend: self.backend.clone(),
            resource: None,
            path: PathBuf::default(),
            mesh: None,
            vertex_bytes: Vec::default(),
            index_bytes: Vec::default(),
            error: None,
        });
        loader.reset(
            resource.clone(),
            asset_path(&self.asset_root, resource.resource_id()),
        );
        LoadRequest::new(resource.clone(), loader)
    }

    pub fn pool(&self) -> &LoaderPool<MeshLoader> {
        &self.pool
    }
}

impl ResourceManager for MeshManager {
    fn release_resource_loader_instance(
        &self,
        loader: Box<dyn ResourceLoader>,
    ) {
        self.pool.release(loader);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn loader_with(mesh: MeshData) -> MeshLoader {
        let manager: Weak<dyn ResourceManager> = Weak::<MeshManager>::new();
        MeshLoader {
            manager,
            backend: SharedBackend::default(),
            resource: None,
            path: PathBuf::default(),
            mesh: Some(mesh),
            vertex_bytes: Vec::default(),
            index_bytes: Vec::default(),
            error: None,
        }
    }

    #[test]
    fn out_of_range_index_fails_processing() {
        let mut loader = loader_with(MeshData {
            positions: vec![[0.0; 3]; 3],
            indices: vec![0, 1, 3],
        });

        assert!(loader.on_processing().is_err());
        assert!(loader.error.is_some());
        assert!(loader.on_renderer_backend_dispatch().is_err());
    }

    #[test]
    fn processing_packs_little_endian_buffers() {
        let mut loader = loader_with(MeshData {
            positions: vec![[1.0, 2.0, 3.0]],
            indices: vec![0, 0, 0],
        });

        loader.on_processing().unwrap();
        assert_eq!(loader.vertex_bytes.len(), 12);
        assert_eq!(&loader.vertex_bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(loader.index_bytes, vec![0u8; 12]);
    }
}
