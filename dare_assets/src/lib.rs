pub mod error;
pub mod fallback;
pub mod ids;
pub mod manager;
pub mod registry;
pub mod staging;

pub use error::{LoaderError, RegistryError};
pub use fallback::FallbackSet;
pub use ids::{AssetId, AssetKind, AssetState, WorkPriority, INVALID_ASSET_ID};
pub use manager::{Descriptor, Manager, Material, MaterialParams, SlotTable};
pub use registry::{AssetMetadata, Registry};
pub use staging::{MeshStaging, TextureStaging};
