use crate::ids::AssetId;
use std::path::PathBuf;
use std::time::Duration;

/// Short-lived record owned by the loader from the moment an I/O worker
/// populates it until the GPU worker consumes it. Never observed by any
/// other component.
#[derive(Debug)]
pub struct TextureStaging {
    pub id: AssetId,
    pub bytes: Vec<u8>,
    pub load_duration: Duration,
}

#[derive(Debug)]
pub struct MeshStaging {
    pub id: AssetId,
    pub source: String,
    /// Needed for relative resource lookup (referenced textures, etc).
    pub path: PathBuf,
    pub load_duration: Duration,
}
