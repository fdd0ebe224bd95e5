//! The two-stage CPU-read-then-GPU-upload pipeline. Each stage is a plain
//! method receiving an owned work item; no coroutine/async-await machinery
//! is involved — blocking worker threads over a futures-based pipeline.

use dagal::context::{GfxContext, PixelFormat};
use dare_assets::{
    AssetId, AssetKind, LoaderError, Manager, MeshStaging, Registry, TextureStaging, WorkPriority,
};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::thread_pool::ThreadPool;
use crate::work_item::{GpuJob, WorkItem};

const TEXTURE_SIZE_CAP: u64 = 100 * 1024 * 1024;
const SCRIPT_SIZE_CAP: u64 = 64 * 1024;

#[derive(Default)]
struct Stats {
    total_requests: AtomicU64,
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    total_load_micros: AtomicU64,
    completed_for_average: AtomicU64,
}

/// Observational counters, maintained with relaxed atomics. Not
/// authoritative — a caller should never branch on these for correctness.
#[derive(Debug, Clone, Copy)]
pub struct LoaderStats {
    pub total_requests: u64,
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub active_io_workers: usize,
    pub active_gpu_workers: usize,
    pub avg_load_time_micros: u64,
}

/// Orchestrates CPU-side read/decode on I/O workers, then hands off to GPU
/// workers for resource creation.
pub struct Loader {
    pool: Arc<ThreadPool>,
    registry: Arc<Registry>,
    manager: Arc<Manager>,
    gfx: Arc<dyn GfxContext>,
    stats: Stats,
}

fn read_capped(path: &Path, cap: u64) -> Result<Vec<u8>, LoaderError> {
    let file = fs::File::open(path)?;
    let mut limited = file.take(cap + 1);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes)?;
    if bytes.len() as u64 > cap {
        return Err(LoaderError::ReadFailure { cap: cap as usize });
    }
    Ok(bytes)
}

impl Loader {
    pub fn new(
        pool: Arc<ThreadPool>,
        registry: Arc<Registry>,
        manager: Arc<Manager>,
        gfx: Arc<dyn GfxContext>,
    ) -> Arc<Self> {
        let loader = Arc::new(Self {
            pool,
            registry,
            manager,
            gfx,
            stats: Stats::default(),
        });
        loader.register_subsystems();
        loader
    }

    fn register_subsystems(self: &Arc<Self>) {
        let io_loader = self.clone();
        self.pool
            .register_subsystem("asset_loading", 1, 6, move |item| io_loader.run_io_stage(item));
        let gpu_loader = self.clone();
        self.pool
            .register_subsystem("gpu_work", 1, 4, move |item| gpu_loader.run_gpu_stage(item));
    }

    pub fn pool(&self) -> &Arc<ThreadPool> {
        &self.pool
    }

    /// If the registry's `try_begin_loading` returns false (already in
    /// flight or done), returns silently — this is the dedup path.
    pub fn request(&self, id: AssetId, priority: WorkPriority) {
        self.stats.total_requests.fetch_add(1, Ordering::Relaxed);
        let began = self.registry.try_begin_loading(id).unwrap_or(false);
        if !began {
            tracing::trace!(?id, "load request deduplicated, already in flight or done");
            return;
        }
        self.pool
            .request_workers("asset_loading", priority.io_worker_budget());
        let path = match self.registry.lookup_by_id(id) {
            Some(meta) => meta.path,
            None => return,
        };
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(?id, %path, ?priority, "submitting asset for I/O stage");
        self.pool.submit(
            "asset_loading",
            priority,
            WorkItem::AssetLoading { id, path },
        );
    }

    fn run_io_stage(&self, item: WorkItem) {
        let WorkItem::AssetLoading { id, path } = item else {
            return;
        };
        let start = Instant::now();
        let path_buf = PathBuf::from(&*path);
        let extension = path_buf
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match AssetKind::from_extension(&extension) {
            Some(AssetKind::Texture) => self.read_texture(id, &path_buf, start),
            Some(AssetKind::Mesh) => self.read_mesh(id, &path_buf, start),
            Some(AssetKind::Script) => self.read_script(id, &path_buf),
            // Shader extensions classify as an AssetKind but never reach
            // this stage: shaders are ingested through the hot-reload
            // coordinator's inline compile-and-publish path instead.
            Some(AssetKind::Shader) | None => {
                let error = LoaderError::UnsupportedAssetType(extension.clone());
                tracing::warn!(?id, extension, "{error}");
                self.registry.mark_failed(id, error.to_string()).ok();
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn read_texture(&self, id: AssetId, path: &Path, start: Instant) {
        match read_capped(path, TEXTURE_SIZE_CAP) {
            Ok(bytes) => {
                let size = bytes.len() as u64;
                self.registry
                    .mark_staged(id, size)
                    .expect("asset was begun loading before its I/O stage was submitted");
                self.pool.request_workers("gpu_work", 2);
                self.pool.submit(
                    "gpu_work",
                    WorkPriority::Critical,
                    WorkItem::GpuWork(GpuJob::Texture(TextureStaging {
                        id,
                        bytes,
                        load_duration: start.elapsed(),
                    })),
                );
            }
            Err(e) => self.fail_read(id, e),
        }
    }

    fn read_mesh(&self, id: AssetId, path: &Path, start: Instant) {
        match read_capped(path, TEXTURE_SIZE_CAP) {
            Ok(bytes) => {
                let source = match String::from_utf8(bytes) {
                    Ok(s) => s,
                    Err(e) => {
                        let error = LoaderError::DecodeFailure(e.to_string());
                        tracing::warn!(?id, "{error}");
                        self.registry.mark_failed(id, error.to_string()).ok();
                        self.stats.failed.fetch_add(1, Ordering::Relaxed);
                        return;
                    }
                };
                let size = source.len() as u64;
                self.registry
                    .mark_staged(id, size)
                    .expect("asset was begun loading before its I/O stage was submitted");
                self.pool.request_workers("gpu_work", 2);
                self.pool.submit(
                    "gpu_work",
                    WorkPriority::Critical,
                    WorkItem::GpuWork(GpuJob::Mesh(MeshStaging {
                        id,
                        source,
                        path: path.to_path_buf(),
                        load_duration: start.elapsed(),
                    })),
                );
            }
            Err(e) => self.fail_read(id, e),
        }
    }

    fn read_script(&self, id: AssetId, path: &Path) {
        match read_capped(path, SCRIPT_SIZE_CAP) {
            Ok(bytes) => {
                let size = bytes.len() as u64;
                self.manager.install_script(id, bytes);
                self.registry
                    .mark_staged(id, size)
                    .expect("asset was begun loading before its I/O stage was submitted");
                self.registry
                    .mark_loaded(id, size)
                    .expect("script was just marked Staged above");
                self.stats.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => self.fail_read(id, e),
        }
    }

    fn fail_read(&self, id: AssetId, error: LoaderError) {
        tracing::warn!(?id, "{error}");
        self.registry.mark_failed(id, error.to_string()).ok();
        self.stats.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn run_gpu_stage(&self, item: WorkItem) {
        let WorkItem::GpuWork(job) = item else {
            return;
        };
        match job {
            GpuJob::Texture(staging) => self.build_texture(staging),
            GpuJob::Mesh(staging) => self.build_mesh(staging),
            GpuJob::PublishShader { .. } => {
                // Publication is handled by the hot-reload shader path's
                // own handler registration; this loader never sees it.
            }
        }
    }

    fn build_texture(&self, staging: TextureStaging) {
        let start = Instant::now();
        match self.gfx.create_texture(&staging.bytes, PixelFormat::Rgba8Unorm) {
            Ok(texture) => {
                let size = staging.bytes.len() as u64;
                self.manager.install_texture(staging.id, texture);
                self.registry
                    .mark_loaded(staging.id, size)
                    .expect("texture was staged before its GPU stage was submitted");
                self.record_completion(staging.load_duration + start.elapsed());
            }
            Err(e) => {
                let error = LoaderError::from(e);
                tracing::warn!(id = ?staging.id, "{error}");
                self.registry.mark_failed(staging.id, error.to_string()).ok();
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn build_mesh(&self, staging: MeshStaging) {
        let start = Instant::now();
        match self.gfx.create_model(&staging.source) {
            Ok(model) => {
                let size = staging.source.len() as u64;
                self.manager.install_mesh(staging.id, model);
                self.registry
                    .mark_loaded(staging.id, size)
                    .expect("mesh was staged before its GPU stage was submitted");
                self.record_completion(staging.load_duration + start.elapsed());
            }
            Err(e) => {
                let error = LoaderError::from(e);
                tracing::warn!(id = ?staging.id, "{error}");
                self.registry.mark_failed(staging.id, error.to_string()).ok();
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn record_completion(&self, duration: std::time::Duration) {
        tracing::trace!(?duration, "asset reached Loaded");
        self.stats.completed.fetch_add(1, Ordering::Relaxed);
        self.stats
            .total_load_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.stats
            .completed_for_average
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> LoaderStats {
        let completed_for_average = self.stats.completed_for_average.load(Ordering::Relaxed).max(1);
        LoaderStats {
            total_requests: self.stats.total_requests.load(Ordering::Relaxed),
            submitted: self.stats.submitted.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            active_io_workers: self.pool.worker_count("asset_loading"),
            active_gpu_workers: self.pool.worker_count("gpu_work"),
            avg_load_time_micros: self.stats.total_load_micros.load(Ordering::Relaxed) / completed_for_average,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagal::null::NullGfxContext;
    use dare_assets::{AssetKind, Registry};
    use std::io::Write;

    fn test_loader() -> (Arc<Loader>, Arc<Registry>, Arc<Manager>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = Arc::new(ThreadPool::new());
        let registry = Arc::new(Registry::new());
        let gfx: Arc<dyn GfxContext> = Arc::new(NullGfxContext::new());
        let manager = Arc::new(Manager::new(registry.clone(), gfx.as_ref()));
        let loader = Loader::new(pool, registry.clone(), manager.clone(), gfx);
        (loader, registry, manager, dir)
    }

    #[test]
    fn loading_a_texture_reaches_loaded_state() {
        let (loader, registry, _manager, dir) = test_loader();
        let path = dir.path().join("brick.png");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[1, 2, 3, 4])
            .unwrap();

        let id = registry
            .intern(path.to_str().unwrap(), AssetKind::Texture)
            .unwrap();
        loader.request(id, WorkPriority::Normal);

        wait_until_loaded(&registry, id);
        assert_eq!(registry.lookup_by_id(id).unwrap().state, dare_assets::AssetState::Loaded);
    }

    #[test]
    fn unknown_extension_fails_immediately() {
        let (loader, registry, _manager, dir) = test_loader();
        let path = dir.path().join("thing.bin");
        std::fs::File::create(&path).unwrap();
        let id = registry
            .intern(path.to_str().unwrap(), AssetKind::Script)
            .unwrap();
        loader.request(id, WorkPriority::Normal);

        wait_until_terminal(&registry, id);
        assert_eq!(registry.lookup_by_id(id).unwrap().state, dare_assets::AssetState::Failed);
    }

    #[test]
    fn duplicate_requests_submit_once() {
        let (loader, registry, _manager, dir) = test_loader();
        let path = dir.path().join("brick.png");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[1, 2, 3, 4])
            .unwrap();
        let id = registry
            .intern(path.to_str().unwrap(), AssetKind::Texture)
            .unwrap();

        for _ in 0..4 {
            loader.request(id, WorkPriority::Normal);
        }
        wait_until_loaded(&registry, id);

        let stats = loader.stats();
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.submitted, 1);
    }

    fn wait_until_loaded(registry: &Registry, id: AssetId) {
        for _ in 0..200 {
            if registry.lookup_by_id(id).unwrap().state == dare_assets::AssetState::Loaded {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("asset never reached Loaded");
    }

    fn wait_until_terminal(registry: &Registry, id: AssetId) {
        for _ in 0..200 {
            let state = registry.lookup_by_id(id).unwrap().state;
            if state == dare_assets::AssetState::Loaded || state == dare_assets::AssetState::Failed {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("asset never reached a terminal state");
    }
}
