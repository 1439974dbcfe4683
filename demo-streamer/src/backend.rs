use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Stands in for a graphics device. Everything here would normally have to happen on the thread
// that owns the device, which is why loaders only call it from the dispatch stage.
#[derive(Default, Debug)]
pub struct FakeRendererBackend {
    next_id: u64,
    pub buffers_created: u32,
    pub textures_created: u32,
    pub bytes_uploaded: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GpuBufferId(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GpuTextureId(pub u64);

impl FakeRendererBackend {
    pub fn create_buffer(
        &mut self,
        data: &[u8],
    ) -> GpuBufferId {
        self.next_id += 1;
        self.buffers_created += 1;
        self.bytes_uploaded += data.len();
        GpuBufferId(self.next_id)
    }

    pub fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        mips: &[Vec<u8>],
    ) -> GpuTextureId {
        log::trace!("create_texture {}x{} with {} mips", width, height, mips.len());
        self.next_id += 1;
        self.textures_created += 1;
        self.bytes_uploaded += mips.iter().map(|mip| mip.len()).sum::<usize>();
        GpuTextureId(self.next_id)
    }
}

#[derive(Clone, Default)]
pub struct SharedBackend(Arc<Mutex<FakeRendererBackend>>);

impl SharedBackend {
    pub fn lock(&self) -> MutexGuard<'_, FakeRendererBackend> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
