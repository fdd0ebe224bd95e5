use ash::vk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageView {
    handle: vk::ImageView,
}

impl ImageView {
    pub fn new(handle: vk::ImageView) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> vk::ImageView {
        self.handle
    }
}
