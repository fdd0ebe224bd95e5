use super::{Image, ImageView};

/// A simple abstraction that combines an [`Image`] and [`ImageView`] into one
/// resident GPU resource. Installed into the Manager's texture slot table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub image: Image,
    pub image_view: ImageView,
    pub width: u32,
    pub height: u32,
}
