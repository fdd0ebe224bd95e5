//! The Thread Pool contract and its conforming in-process implementation,
//! the two-stage asset Loader built on top of it, and the hot-reload
//! bridge (generic + shader-specialized) that feeds both from filesystem
//! change events.

pub mod hot_reload;
pub mod loader;
pub mod pipeline;
pub mod shader_reload;
pub mod thread_pool;
pub mod watcher;
pub mod work_item;

pub use hot_reload::HotReloadCoordinator;
pub use loader::{Loader, LoaderStats};
pub use pipeline::AssetPipeline;
pub use shader_reload::ShaderHotReloadCoordinator;
pub use thread_pool::ThreadPool;
pub use watcher::FileWatcher;
pub use work_item::{GpuJob, WorkItem};
