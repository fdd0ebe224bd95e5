use ash::vk;

/// A host-visible storage buffer allocated through [`crate::context::GfxContext::allocate_host_visible_buffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    handle: vk::Buffer,
    size: usize,
}

impl Buffer {
    pub fn new(handle: vk::Buffer, size: usize) -> Self {
        Self { handle, size }
    }

    pub fn handle(&self) -> vk::Buffer {
        self.handle
    }

    pub fn size(&self) -> usize {
        self.size
    }
}
