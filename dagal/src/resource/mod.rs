pub mod buffer;
pub mod image;
pub mod image_view;
pub mod model;
pub mod texture;

pub use buffer::Buffer;
pub use image::Image;
pub use image_view::ImageView;
pub use model::{Mesh, Model, ParsedGeometry, ParsedModel, Vertex};
pub use texture::Texture;
