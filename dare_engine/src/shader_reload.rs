//! The shader hot-reload fast path: compiles source inline on the worker
//! thread that received the file event, rather than routing through the
//! generic two-stage asset Loader pipeline.
//!
//! Driven directly by [`crate::hot_reload::HotReloadCoordinator`], not by
//! its own thread-pool subsystem — shader assets never pass through the
//! Registry's Loading/Staged lifecycle at all.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dare_assets::WorkPriority;

use dagal::shader::{CompileOptions, ShaderCompiler, ShaderKind};

use crate::thread_pool::ThreadPool;
use crate::work_item::{GpuJob, WorkItem};

struct ShaderRegistration {
    kind: ShaderKind,
    in_progress: AtomicBool,
}

fn shader_kind_from_extension(path: &Path) -> Option<ShaderKind> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("vert") => Some(ShaderKind::Vertex),
        Some(ext) if ext.eq_ignore_ascii_case("frag") => Some(ShaderKind::Fragment),
        Some(ext) if ext.eq_ignore_ascii_case("comp") => Some(ShaderKind::Compute),
        Some(ext) if ext.eq_ignore_ascii_case("geom") => Some(ShaderKind::Geometry),
        Some(ext) if ext.eq_ignore_ascii_case("glsl") => Some(ShaderKind::Fragment),
        _ => None,
    }
}

pub struct ShaderHotReloadCoordinator {
    pool: Arc<ThreadPool>,
    compiler: Arc<dyn ShaderCompiler>,
    registrations: Mutex<HashMap<PathBuf, Arc<ShaderRegistration>>>,
}

impl ShaderHotReloadCoordinator {
    pub fn new(pool: Arc<ThreadPool>, compiler: Arc<dyn ShaderCompiler>) -> Self {
        Self {
            pool,
            compiler,
            registrations: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `path` if its extension is a recognized shader source
    /// kind; otherwise a no-op, so callers can register every watched path
    /// unconditionally and let this coordinator filter.
    pub fn register(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        if let Some(kind) = shader_kind_from_extension(&path) {
            self.registrations.lock().unwrap().insert(
                path,
                Arc::new(ShaderRegistration {
                    kind,
                    in_progress: AtomicBool::new(false),
                }),
            );
        }
    }

    pub fn is_registered(&self, path: &Path) -> bool {
        self.registrations.lock().unwrap().contains_key(path)
    }

    /// Compiles the changed source and submits a `High`-priority publish
    /// job. On any failure the in-progress flag is cleared so the next
    /// file event retries; no Registry mutation happens on this path.
    pub fn on_file_event(&self, path: &Path) {
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

        if let Err(e) = self.compile_and_publish(path, registration.kind) {
            tracing::warn!("shader recompile failed for {}: {e}", path.display());
        }
        registration.in_progress.store(false, Ordering::Release);
    }

    fn compile_and_publish(&self, path: &Path, kind: ShaderKind) -> Result<(), dagal::DagalError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| dagal::DagalError::ShadercError(e.to_string()))?;
        let shader_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("shader");
        let spirv = self
            .compiler
            .compile(&source, kind, shader_name, &CompileOptions::default())?;
        self.pool.submit(
            "gpu_work",
            WorkPriority::High,
            WorkItem::GpuWork(GpuJob::PublishShader {
                path: path.to_path_buf(),
                spirv,
            }),
        );
        Ok(())
    }
}
