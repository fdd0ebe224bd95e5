use ash::vk;

/// An owned Vulkan image. Device-lifetime is managed by whichever allocator
/// handed out the backing memory; this core only ever holds it by value inside
/// a [`super::Texture`] and never touches the handle directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    handle: vk::Image,
    format: vk::Format,
    extent: vk::Extent3D,
}

impl Image {
    pub fn new(handle: vk::Image, format: vk::Format, extent: vk::Extent3D) -> Self {
        Self {
            handle,
            format,
            extent,
        }
    }

    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn extent(&self) -> vk::Extent3D {
        self.extent
    }
}
