mod assets;
mod backend;
mod mesh;
mod texture;

use backend::SharedBackend;
use mesh::{MeshManager, MeshResource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use streamline::base::{LoadState, ResourceId};
use streamline::loader::{
    DispatchBudget, Resource, ResourceStreamer, ResourceStreamerConfig, StreamerResult,
};
use texture::{TextureManager, TextureResource};

pub fn asset_root_path() -> PathBuf {
    std::env::temp_dir().join("streamline-demo")
}

fn write_demo_assets(
    root: &Path,
    meshes: &[Arc<MeshResource>],
    textures: &[Arc<TextureResource>],
) -> std::io::Result<()> {
    std::fs::create_dir_all(root)?;
    for (i, mesh) in meshes.iter().enumerate() {
        assets::write_asset(root, mesh.resource_id(), &assets::grid_mesh(4 + i as u32 * 8))?;
    }

    // The last texture is left off disk so its load fails
    for (i, texture) in textures.iter().enumerate().take(textures.len().saturating_sub(1)) {
        assets::write_asset(
            root,
            texture.resource_id(),
            &assets::checker_texture(32 << i),
        )?;
    }
    if let Some(missing) = textures.last() {
        let _ = std::fs::remove_file(assets::asset_path(root, missing.resource_id()));
    }

    Ok(())
}

fn run() -> StreamerResult<()> {
    let root = asset_root_path();
    let backend = SharedBackend::default();

    let meshes: Vec<_> = ["terrain", "rock", "tree"]
        .iter()
        .map(|name| MeshResource::new(ResourceId::random(), name))
        .collect();
    let textures: Vec<_> = ["grass", "bark", "missing"]
        .iter()
        .map(|name| TextureResource::new(ResourceId::random(), name))
        .collect();
    write_demo_assets(&root, &meshes, &textures)?;

    let mesh_manager = MeshManager::new(backend.clone(), root.clone());
    let texture_manager = TextureManager::new(backend.clone(), root.clone());

    let streamer = ResourceStreamer::new(ResourceStreamerConfig {
        dispatch_budget: DispatchBudget::MaxDuration(Duration::from_millis(2)),
        ..Default::default()
    })?;

    for mesh in &meshes {
        streamer.commit_load_request(mesh_manager.load_request(mesh))?;
    }
    for texture in &textures {
        streamer.commit_load_request(texture_manager.load_request(texture))?;
    }

    let start = Instant::now();
    let mut frame = 0;
    while !streamer.is_idle() {
        std::thread::sleep(Duration::from_millis(15));
        let dispatched = streamer.dispatch();
        frame += 1;
        profiling::finish_frame!();

        if dispatched > 0 {
            log::info!("frame {}: dispatched {} resources", frame, dispatched);
        }

        if start.elapsed() > Duration::from_secs(10) {
            log::error!("Gave up waiting on the streamer: {:?}", streamer.stats());
            break;
        }
    }

    for mesh in &meshes {
        println!(
            "mesh {:<10} {:?} buffers {:?}",
            mesh.name(),
            mesh.load_state(),
            mesh.gpu_buffers()
        );
    }
    for texture in &textures {
        println!(
            "texture {:<7} {:?} texture {:?}",
            texture.name(),
            texture.load_state(),
            texture.gpu_texture()
        );
    }

    let failed = meshes
        .iter()
        .map(|x| x.load_state())
        .chain(textures.iter().map(|x| x.load_state()))
        .filter(|state| *state == LoadState::Failed)
        .count();
    println!("{} resources failed to load", failed);
    println!("streamer stats {:?}", streamer.stats());
    println!(
        "pooled loaders: {} mesh, {} texture",
        mesh_manager.pool().available(),
        texture_manager.pool().available()
    );
    println!("backend {:?}", *backend.lock());

    streamer.shutdown()
}

fn main() {
    // Setup logging
    env_logger::Builder::default()
        .write_style(env_logger::WriteStyle::Always)
        .filter_level(log::LevelFilter::Debug)
        .init();

    if let Err(error) = run() {
        log::error!("demo failed: {}", error);
        std::process::exit(1);
    }
}
