//! The graphics-context boundary.
//!
//! Device, queue, command-pool, and memory-allocator bootstrap live entirely
//! outside this crate — they are an external collaborator this core never
//! constructs itself. [`GfxContext`] is the narrow surface the asset pipeline
//! actually calls through: opaque constructors that may fail.

use crate::error::DagalError;
use crate::resource::{Buffer, Model, Texture};

/// Declared pixel format for a decoded texture payload. The loader assumes
/// RGBA8 for all image-file sources; other formats are accepted for
/// synthetic/fallback textures (e.g. the 1x1 white pixel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8Unorm,
    Rgba8Srgb,
}

/// The graphics context's opaque surface, as consumed by the Loader's GPU
/// stage and by Manager startup (fallback set, host-visible material buffer).
///
/// Implementations own the real Vulkan device/allocator; this core never
/// reaches past this trait. Mesh and image decoding both happen inside
/// these calls — the asset pipeline never sees decoded pixels or a parsed
/// vertex buffer, only the resulting GPU resource.
pub trait GfxContext: Send + Sync {
    /// Decode and upload `bytes` (an entire encoded image file, e.g. PNG or
    /// JPEG) as a 2D texture. `format` declares how the decoded pixels
    /// should be interpreted; dimensions are discovered from the bytes
    /// themselves and recorded on the returned [`Texture`].
    fn create_texture(&self, bytes: &[u8], format: PixelFormat) -> Result<Texture, DagalError>;

    /// Parse `source` (OBJ or glTF text) and upload the resulting
    /// vertex/index data to GPU buffers, one
    /// [`Mesh`](crate::resource::Mesh) per submesh the source describes.
    fn create_model(&self, source: &str) -> Result<Model, DagalError>;

    /// Construct the single procedurally generated cube used for every
    /// fallback-mesh role. Bypasses source parsing entirely.
    fn create_cube_model(&self) -> Result<Model, DagalError>;

    /// Allocate a host-visible storage buffer of `size` bytes, used for the
    /// material parameter buffer and its generational retire list.
    fn allocate_host_visible_buffer(&self, size: usize) -> Result<Buffer, DagalError>;
}
