//! Bridges filesystem change events to re-ingestion. Registers itself as
//! the `hot_reload` subsystem's handler; the filesystem watcher
//! (`crate::watcher::FileWatcher`) is the only producer of `HotReload`
//! work items.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dare_assets::{AssetId, AssetKind, Registry, WorkPriority};

use crate::loader::Loader;
use crate::shader_reload::ShaderHotReloadCoordinator;
use crate::thread_pool::ThreadPool;
use crate::work_item::WorkItem;

struct Registration {
    id: AssetId,
    kind: AssetKind,
    in_progress: AtomicBool,
}

/// Receives `hot_reload` work items, deduplicates in-flight reloads per
/// asset, and forces re-ingestion through the Loader. Shader sources are
/// handed off to `shader_path` instead: they never go through
/// `Registry::force_unload`/`Loader::request` at all, since shader rebuild
/// is routed through its own fast path rather than the asset loader.
pub struct HotReloadCoordinator {
    registry: Arc<Registry>,
    loader: Arc<Loader>,
    registrations: Mutex<HashMap<PathBuf, Arc<Registration>>>,
    shader_path: ShaderHotReloadCoordinator,
}

impl HotReloadCoordinator {
    pub fn new(
        pool: Arc<ThreadPool>,
        registry: Arc<Registry>,
        loader: Arc<Loader>,
        shader_path: ShaderHotReloadCoordinator,
    ) -> Arc<Self> {
        let coordinator = Arc::new(Self {
            registry,
            loader,
            registrations: Mutex::new(HashMap::new()),
            shader_path,
        });
        let handler_target = coordinator.clone();
        pool.register_subsystem("hot_reload", 1, 2, move |item| {
            handler_target.on_work_item(item)
        });
        coordinator
    }

    /// Records the id↔path mapping for a non-shader asset. Shader sources
    /// should instead be registered with `shader_path()` directly — they
    /// are not Registry-tracked assets from the hot-reload path's point of
    /// view.
    pub fn register(&self, id: AssetId, path: impl Into<PathBuf>, kind: AssetKind) {
        let path = path.into();
        self.registrations.lock().unwrap().insert(
            path,
            Arc::new(Registration {
                id,
                kind,
                in_progress: AtomicBool::new(false),
            }),
        );
    }

    pub fn shader_path(&self) -> &ShaderHotReloadCoordinator {
        &self.shader_path
    }

    fn on_work_item(&self, item: WorkItem) {
        let WorkItem::HotReload { path } = item else {
            return;
        };
        self.on_file_event(&path);
    }

    /// Dispatches a single changed path. Directories are not enumerated by
    /// this coordinator — rescanning a directory for newly dropped files is
    /// the responsibility of whatever calls `register` for each file it
    /// discovers; this coordinator only reacts to paths it already knows.
    pub fn on_file_event(&self, path: &Path) {
        if self.shader_path.is_registered(path) {
            self.shader_path.on_file_event(path);
            return;
        }

        let registration = {
            let registrations = self.registrations.lock().unwrap();
            match registrations.get(path) {
                Some(r) => r.clone(),
                None => return,
            }
        };

        if registration
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        self.registry
            .force_unload(registration.id)
            .expect("registered asset is always found in the registry");
        let priority = reload_priority(registration.kind, path);
        self.loader.request(registration.id, priority);
        registration.in_progress.store(false, Ordering::Release);
    }
}

fn reload_priority(kind: AssetKind, path: &Path) -> WorkPriority {
    let path_str = path.to_string_lossy();
    if path_str.contains("ui") {
        WorkPriority::Critical
    } else if kind == AssetKind::Texture {
        WorkPriority::High
    } else if kind == AssetKind::Mesh {
        WorkPriority::Normal
    } else {
        WorkPriority::Low
    }
}
