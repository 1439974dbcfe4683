use crate::assets::{asset_path, TextureData};
use crate::backend::{GpuTextureId, SharedBackend};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Weak};
use streamline::base::{LoadStateCell, ResourceId};
use streamline::loader::{
    LoadError, LoadRequest, LoadResult, LoaderPool, Resource, ResourceLoader, ResourceManager,
};

pub struct TextureResource {
    id: ResourceId,
    name: String,
    state: LoadStateCell,
    gpu: Mutex<Option<GpuTextureId>>,
}

impl TextureResource {
    pub fn new(
        id: ResourceId,
        name: &str,
    ) -> Arc<TextureResource> {
        Arc::new(TextureResource {
            id,
            name: name.to_string(),
            state: LoadStateCell::default(),
            gpu: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gpu_texture(&self) -> Option<GpuTextureId> {
        *self.gpu.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Resource for TextureResource {
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

// Halves an RGBA8 image with a 2x2 box filter
fn downsample(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> (u32, u32, Vec<u8>) {
    let half_width = (width / 2).max(1);
    let half_height = (height / 2).max(1);
    let mut out = Vec::with_capacity(half_width as usize * half_height as usize * 4);
    for y in 0..half_height {
        for x in 0..half_width {
            for channel in 0..4 {
                let mut sum = 0u32;
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let sx = (x * 2 + dx).min(width - 1);
                    let sy = (y * 2 + dy).min(height - 1);
                    let index = (sy as usize * width as usize + sx as usize) * 4 + channel;
                    sum += pixels[index] as u32;
                }
                out.push((sum / 4) as u8);
            }
        }
    }

    (half_width, half_height, out)
}

// Byte size of a width x height RGBA8 image, None if it can't be addressed
fn rgba8_len(
    width: u32,
    height: u32,
) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(4)
}

pub struct TextureLoader {
    manager: Weak<dyn ResourceManager>,
    backend: SharedBackend,
    resource: Option<Arc<TextureResource>>,
    path: PathBuf,
    texture: Option<TextureData>,
    mips: Vec<Vec<u8>>,
    error: Option<LoadError>,
}

impl TextureLoader {
    fn reset(
        &mut self,
        resource: Arc<TextureResource>,
        path: PathBuf,
    ) {
        self.resource = Some(resource);
        self.path = path;
        self.texture = None;
        self.mips.clear();
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

impl ResourceLoader for TextureLoader {
    fn on_deserialization(&mut self) -> LoadResult<()> {
        profiling::scope!("TextureLoader::on_deserialization");
        let result = std::fs::read(&self.path)
            .map_err(LoadError::from)
            .and_then(|bytes| {
                bincode::deserialize::<TextureData>(&bytes)
                    .map_err(|e| LoadError::from(e.to_string()))
            });

        let texture = self.record(result)?;
        self.texture = Some(texture);
        Ok(())
    }

    fn on_processing(&mut self) -> LoadResult<()> {
        profiling::scope!("TextureLoader::on_processing");
        if self.error.is_some() {
            return Ok(());
        }

        let texture = match &self.texture {
            Some(texture) => texture,
            None => return self.record(Err("no texture data to process".into())),
        };

        let expected_len = rgba8_len(texture.width, texture.height);
        if texture.width == 0 || texture.height == 0 || expected_len != Some(texture.pixels.len()) {
            let message = format!(
                "texture is {}x{} but has {} bytes of pixel data",
                texture.width,
                texture.height,
                texture.pixels.len()
            );
            return self.record(Err(message.into()));
        }

        let mut mips = vec![texture.pixels.clone()];
        let (mut width, mut height) = (texture.width, texture.height);
        while width > 1 || height > 1 {
            let (w, h, pixels) = downsample(width, height, &mips[mips.len() - 1]);
            mips.push(pixels);
            width = w;
            height = h;
        }

        self.mips = mips;
        Ok(())
    }

    fn on_renderer_backend_dispatch(&mut self) -> LoadResult<()> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        let (resource, texture) = match (&self.resource, &self.texture) {
            (Some(resource), Some(texture)) => (resource, texture),
            _ => return Err("texture loader has nothing to dispatch".into()),
        };

        let id = self
            .backend
            .lock()
            .create_texture(texture.width, texture.height, &self.mips);
        *resource.gpu.lock().unwrap_or_else(|e| e.into_inner()) = Some(id);
        Ok(())
    }

    fn resource_manager(&self) -> Option<Arc<dyn ResourceManager>> {
        self.manager.upgrade()
    }
}

pub struct TextureManager {
    weak_self: Weak<TextureManager>,
    backend: SharedBackend,
    asset_root: PathBuf,
    pool: LoaderPool<TextureLoader>,
}

impl TextureManager {
    pub fn new(
        backend: SharedBackend,
        asset_root: PathBuf,
    ) -> Arc<TextureManager> {
        Arc::new_cyclic(|weak_self| TextureManager {
            weak_self: weak_self.clone(),
            backend,
            asset_root,
            pool: LoaderPool::new(),
        })
    }

    pub fn load_request(
        &self,
        resource: &Arc<TextureResource>,
    ) -> LoadRequest {
        let manager: Weak<dyn ResourceManager> = self.weak_self.clone();
        let mut loader = self.pool.acquire_with(|| TextureLoader {
            manager,
            backend: self.backend.clone(),
            resource: None,
            path: PathBuf::default(),
            texture: None,
            mips: Vec::default(),
            error: None,
        });
        loader.reset(
            resource.clone(),
            asset_path(&self.asset_root, resource.resource_id()),
        );
        LoadRequest::new(resource.clone(), loader)
    }

    pub fn pool(&self) -> &LoaderPool<TextureLoader> {
        &self.pool
    }
}

impl ResourceManager for TextureManager {
    fn release_resource_loader_instance(
        &self,
        loader: Box<dyn ResourceLoader>,
    ) {
        self.pool.release(loader);
    }
}
