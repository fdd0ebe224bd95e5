//! A zero-functionality [`GfxContext`] for tests and headless runs.
//!
//! An allocator with no real backing device, used only so higher layers can
//! be exercised without a live Vulkan instance. Returns real, inspectable
//! values instead of `unimplemented!()` since the asset pipeline's tests
//! assert on what comes back from these calls.

use crate::context::{GfxContext, PixelFormat};
use crate::error::DagalError;
use crate::resource::{Buffer, Image, ImageView, Mesh, Model, ParsedModel, Texture};
use ash::vk;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out monotonically increasing fake Vulkan handles and never fails.
#[derive(Debug, Default)]
pub struct NullGfxContext {
    next_handle: AtomicU64,
}

impl NullGfxContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn mesh_from_triangle_count(&self, triangle_count: u32) -> Mesh {
        let triangle_count = triangle_count.max(1);
        let index_count = triangle_count * 3;
        Mesh {
            vertex_buffer: Buffer::new(
                vk::Buffer::from_raw(self.next()),
                index_count as usize * std::mem::size_of::<crate::resource::Vertex>(),
            ),
            index_buffer: Buffer::new(
                vk::Buffer::from_raw(self.next()),
                index_count as usize * std::mem::size_of::<u32>(),
            ),
            index_count,
        }
    }
}

impl GfxContext for NullGfxContext {
    fn create_texture(&self, bytes: &[u8], _format: PixelFormat) -> Result<Texture, DagalError> {
        // No real decoder backs this stub; a square RGBA8 image is assumed
        // so tests can still assert something meaningful about dimensions.
        let pixel_count = (bytes.len() / 4).max(1);
        let side = (pixel_count as f64).sqrt().round() as u32;
        let (width, height) = (side.max(1), side.max(1));
        let image = Image::new(
            vk::Image::from_raw(self.next()),
            vk::Format::R8G8B8A8_UNORM,
            vk::Extent3D {
                width,
                height,
                depth: 1,
            },
        );
        let image_view = ImageView::new(vk::ImageView::from_raw(self.next()));
        Ok(Texture {
            image,
            image_view,
            width,
            height,
        })
    }

    fn create_model(&self, source: &str) -> Result<Model, DagalError> {
        if source.trim().is_empty() {
            return Err(DagalError::MeshConstruction("empty mesh source".into()));
        }
        // No real OBJ/glTF parser backs this stub; one submesh per
        // non-empty blank-line-delimited paragraph is close enough to make
        // multi-mesh sources observable in tests.
        let submesh_count = source
            .split("\n\n")
            .filter(|chunk| !chunk.trim().is_empty())
            .count()
            .max(1) as u32;
        let meshes = (0..submesh_count)
            .map(|_| self.mesh_from_triangle_count(1))
            .collect();
        Ok(Model { meshes })
    }

    fn create_cube_model(&self) -> Result<Model, DagalError> {
        let cube = ParsedModel::cube();
        let meshes = cube
            .submeshes
            .iter()
            .map(|submesh| Mesh {
                vertex_buffer: Buffer::new(
                    vk::Buffer::from_raw(self.next()),
                    submesh.vertices.len() * std::mem::size_of::<crate::resource::Vertex>(),
                ),
                index_buffer: Buffer::new(
                    vk::Buffer::from_raw(self.next()),
                    submesh.indices.len() * std::mem::size_of::<u32>(),
                ),
                index_count: submesh.indices.len() as u32,
            })
            .collect();
        Ok(Model { meshes })
    }

    fn allocate_host_visible_buffer(&self, size: usize) -> Result<Buffer, DagalError> {
        Ok(Buffer::new(vk::Buffer::from_raw(self.next()), size))
    }
}
