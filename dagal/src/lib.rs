pub mod context;
pub mod error;
pub mod null;
pub mod prelude;
pub mod resource;
pub mod shader;

pub use error::DagalError;

pub use ash;
#[cfg(feature = "gpu-allocator")]
pub use gpu_allocator;
