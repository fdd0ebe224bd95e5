//! Tagged work items, replacing dynamic dispatch across subsystem
//! boundaries with a sum type: one variant per work kind, dispatched to a
//! per-subsystem handler rather than a vtable of "worker objects".

use dare_assets::{AssetId, MeshStaging, TextureStaging};
use std::path::PathBuf;

pub enum WorkItem {
    /// Stage 1: read and dispatch-by-extension, submitted to the
    /// `asset_loading` subsystem.
    AssetLoading { id: AssetId, path: std::sync::Arc<str> },
    /// Stage 2: GPU resource construction or a descriptor/shader publish,
    /// submitted to the `gpu_work` subsystem.
    GpuWork(GpuJob),
    /// A filesystem change event, submitted to the `hot_reload` subsystem.
    HotReload { path: PathBuf },
    /// Escape hatch for work that doesn't fit the fixed taxonomy above.
    Custom(Box<dyn FnOnce() + Send>),
}

pub enum GpuJob {
    Texture(TextureStaging),
    Mesh(MeshStaging),
    PublishShader { path: PathBuf, spirv: Vec<u32> },
}
