//! Top-level wiring: the pool, the two-stage loader, the hot-reload bridge
//! and its shader specialization, and the filesystem watcher that feeds
//! them, assembled together by one constructor.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use dagal::context::GfxContext;
use dagal::shader::ShaderCompiler;
use dare_assets::{AssetId, AssetKind, AssetState, Manager, Registry, WorkPriority};

use crate::hot_reload::HotReloadCoordinator;
use crate::loader::Loader;
use crate::shader_reload::ShaderHotReloadCoordinator;
use crate::thread_pool::ThreadPool;
use crate::watcher::FileWatcher;

/// Owns every moving part of the asset ingestion pipeline. Dropping this
/// joins the pool's worker threads and stops the filesystem watcher.
pub struct AssetPipeline {
    pool: Arc<ThreadPool>,
    registry: Arc<Registry>,
    manager: Arc<Manager>,
    loader: Arc<Loader>,
    hot_reload: Arc<HotReloadCoordinator>,
    watcher: Mutex<FileWatcher>,
}

impl AssetPipeline {
    pub fn new(gfx: Arc<dyn GfxContext>, compiler: Arc<dyn ShaderCompiler>) -> Result<Self> {
        let pool = Arc::new(ThreadPool::new());
        let registry = Arc::new(Registry::new());
        let manager = Arc::new(Manager::new(registry.clone(), gfx.as_ref()));
        let loader = Loader::new(pool.clone(), registry.clone(), manager.clone(), gfx);
        let shader_path = ShaderHotReloadCoordinator::new(pool.clone(), compiler);
        let hot_reload = HotReloadCoordinator::new(pool.clone(), registry.clone(), loader.clone(), shader_path);
        let watcher = FileWatcher::new(pool.clone());

        Ok(Self {
            pool,
            registry,
            manager,
            loader,
            hot_reload,
            watcher: Mutex::new(watcher),
        })
    }

    pub fn pool(&self) -> &Arc<ThreadPool> {
        &self.pool
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn manager(&self) -> &Arc<Manager> {
        &self.manager
    }

    pub fn loader(&self) -> &Arc<Loader> {
        &self.loader
    }

    pub fn hot_reload(&self) -> &Arc<HotReloadCoordinator> {
        &self.hot_reload
    }

    /// `load_async` per spec §4.3: interns `path` as `kind` and requests a
    /// load at `priority` on every call. Dedup for an id already in flight
    /// or done happens entirely inside `Loader::request`'s
    /// `try_begin_loading` check — the loader's own `total_requests` stat
    /// counts every call here, while its `submitted` stat counts only the
    /// one that actually won the race, matching the spec's duplicate
    /// -submission scenario.
    pub fn load_async(&self, path: &str, kind: AssetKind, priority: WorkPriority) -> AssetId {
        let id = self
            .registry
            .intern(path, kind)
            .expect("interning under a fresh path/kind pair cannot fail here");
        self.loader.request(id, priority);
        id
    }

    /// The safe resolver rendering code calls. Composes
    /// `Manager::resolve_for_rendering` with the one case it cannot decide
    /// on its own: an `Unloaded` asset must have a load submitted for it
    /// (spec §4.3's `resolve_for_rendering` contract) before the missing
    /// placeholder is handed back, and only this crate holds the `Loader`
    /// the `dare_assets` crate doesn't depend on.
    pub fn resolve_for_rendering(&self, id: AssetId) -> AssetId {
        if let Some(meta) = self.registry.lookup_by_id(id) {
            if meta.state == AssetState::Unloaded {
                self.loader.request(id, WorkPriority::Critical);
            }
        }
        self.manager.resolve_for_rendering(id)
    }

    /// Interns `path` as `kind`, requests a load at `priority`, and
    /// registers the path with both the hot-reload coordinator and the
    /// filesystem watcher so subsequent edits re-ingest it.
    pub fn load_and_watch(&self, path: &str, kind: AssetKind, priority: WorkPriority) -> AssetId {
        let id = self.load_async(path, kind, priority);

        if kind == AssetKind::Shader {
            self.hot_reload.shader_path().register(path);
        } else {
            self.hot_reload.register(id, path, kind);
        }
        self.watch_path(Path::new(path));
        id
    }

    fn watch_path(&self, path: &Path) {
        self.watcher.lock().unwrap().watch(path, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagal::null::NullGfxContext;
    use dagal::shader::{CompileOptions, ShaderCompiler, ShaderKind};
    use std::io::Write;

    struct StubCompiler;
    impl ShaderCompiler for StubCompiler {
        fn compile(
            &self,
            _source: &str,
            _kind: ShaderKind,
            _shader_name: &str,
            _options: &CompileOptions,
        ) -> Result<Vec<u32>, dagal::DagalError> {
            Ok(vec![0x07230203])
        }
    }

    #[test]
    fn new_wires_every_subsystem_and_registers_minimum_workers() {
        let gfx: Arc<dyn GfxContext> = Arc::new(NullGfxContext::new());
        let pipeline = AssetPipeline::new(gfx, Arc::new(StubCompiler)).unwrap();

        assert!(pipeline.pool().min_workers("asset_loading") >= 1);
        assert!(pipeline.pool().min_workers("gpu_work") >= 1);
        assert!(pipeline.pool().min_workers("hot_reload") >= 1);
    }

    fn temp_png() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brick.png");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[1, 2, 3, 4])
            .unwrap();
        (dir, path)
    }

    #[test]
    fn load_and_watch_interns_and_submits_the_asset() {
        let gfx: Arc<dyn GfxContext> = Arc::new(NullGfxContext::new());
        let pipeline = AssetPipeline::new(gfx, Arc::new(StubCompiler)).unwrap();
        let (_dir, path) = temp_png();

        let id = pipeline.load_and_watch(path.to_str().unwrap(), AssetKind::Texture, WorkPriority::Normal);

        for _ in 0..200 {
            if pipeline.registry().lookup_by_id(id).unwrap().state == dare_assets::AssetState::Loaded {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("asset never reached Loaded");
    }

    #[test]
    fn resolve_for_rendering_falls_back_then_resolves_to_self_once_loaded() {
        let gfx: Arc<dyn GfxContext> = Arc::new(NullGfxContext::new());
        let pipeline = AssetPipeline::new(gfx, Arc::new(StubCompiler)).unwrap();
        let (_dir, path) = temp_png();

        let id = pipeline.load_async(path.to_str().unwrap(), AssetKind::Texture, WorkPriority::Normal);
        assert_ne!(pipeline.resolve_for_rendering(id), id);

        for _ in 0..200 {
            if pipeline.registry().lookup_by_id(id).unwrap().state == dare_assets::AssetState::Loaded {
                assert_eq!(pipeline.resolve_for_rendering(id), id);
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("asset never reached Loaded");
    }

    #[test]
    fn resolve_for_rendering_submits_a_load_for_an_unloaded_asset() {
        let gfx: Arc<dyn GfxContext> = Arc::new(NullGfxContext::new());
        let pipeline = AssetPipeline::new(gfx, Arc::new(StubCompiler)).unwrap();
        let (_dir, path) = temp_png();

        // Interning alone leaves the asset Unloaded; no load has been
        // requested yet.
        let id = pipeline
            .registry()
            .intern(path.to_str().unwrap(), AssetKind::Texture)
            .unwrap();
        assert_eq!(
            pipeline.registry().lookup_by_id(id).unwrap().state,
            dare_assets::AssetState::Unloaded
        );

        pipeline.resolve_for_rendering(id);

        for _ in 0..200 {
            if pipeline.registry().lookup_by_id(id).unwrap().state == dare_assets::AssetState::Loaded {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("resolve_for_rendering never submitted a load for the unloaded asset");
    }

    #[test]
    fn load_async_called_four_times_submits_exactly_once() {
        let gfx: Arc<dyn GfxContext> = Arc::new(NullGfxContext::new());
        let pipeline = AssetPipeline::new(gfx, Arc::new(StubCompiler)).unwrap();
        let (_dir, path) = temp_png();

        let mut id = AssetId::default();
        for _ in 0..4 {
            id = pipeline.load_async(path.to_str().unwrap(), AssetKind::Texture, WorkPriority::Normal);
        }

        for _ in 0..200 {
            if pipeline.registry().lookup_by_id(id).unwrap().state == dare_assets::AssetState::Loaded {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let stats = pipeline.loader().stats();
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.submitted, 1);
    }
}
