use crate::error::RegistryError;
use crate::ids::{AssetId, AssetKind, AssetState};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Per-asset record. Created on first [`Registry::intern`] and never
/// removed; reference counting governs eligibility for unload, not
/// metadata lifetime.
#[derive(Debug, Clone)]
pub struct AssetMetadata {
    pub id: AssetId,
    pub kind: AssetKind,
    pub path: Arc<str>,
    pub state: AssetState,
    pub byte_size: u64,
    pub dependencies: Vec<AssetId>,
    pub dependents: Vec<AssetId>,
    pub ref_count: u32,
    pub last_loaded: Option<Instant>,
    pub last_error: Option<String>,
}

impl AssetMetadata {
    fn new(id: AssetId, kind: AssetKind, path: Arc<str>) -> Self {
        Self {
            id,
            kind,
            path,
            state: AssetState::Unloaded,
            byte_size: 0,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            ref_count: 0,
            last_loaded: None,
            last_error: None,
        }
    }
}

struct Inner {
    by_path: HashMap<Arc<str>, AssetId>,
    metadata: Vec<AssetMetadata>,
}

/// The authoritative directory of every asset the process knows about.
///
/// All mutating operations acquire a single registry-wide lock; reads take
/// a shared lock. Contention is expected to be low relative to I/O, so a
/// coarse lock is sufficient and keeps the state machine's serialization
/// point (`try_begin_loading`) trivially correct.
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                by_path: HashMap::new(),
                metadata: Vec::new(),
            }),
        }
    }

    /// Returns the existing id if `path` is already interned (asserting the
    /// recorded kind matches), otherwise assigns a fresh id in `Unloaded`
    /// state.
    pub fn intern(&self, path: &str, kind: AssetKind) -> Result<AssetId, RegistryError> {
        let mut inner = self.inner.write().unwrap();
        if let Some(&id) = inner.by_path.get(path) {
            let existing_kind = inner.metadata[id.index() as usize].kind;
            if existing_kind != kind {
                return Err(RegistryError::KindConflict {
                    path: path.to_string(),
                });
            }
            return Ok(id);
        }
        let index = inner.metadata.len() as u32;
        let id = AssetId::new(index, 0);
        let interned_path: Arc<str> = Arc::from(path);
        inner
            .by_path
            .insert(interned_path.clone(), id);
        inner.metadata.push(AssetMetadata::new(id, kind, interned_path));
        Ok(id)
    }

    pub fn lookup_by_id(&self, id: AssetId) -> Option<AssetMetadata> {
        let inner = self.inner.read().unwrap();
        inner.metadata.get(id.index() as usize).cloned()
    }

    pub fn lookup_by_path(&self, path: &str) -> Option<AssetMetadata> {
        let inner = self.inner.read().unwrap();
        let id = *inner.by_path.get(path)?;
        inner.metadata.get(id.index() as usize).cloned()
    }

    fn with_metadata_mut<R>(
        &self,
        id: AssetId,
        f: impl FnOnce(&mut AssetMetadata) -> R,
    ) -> Result<R, RegistryError> {
        let mut inner = self.inner.write().unwrap();
        let meta = inner
            .metadata
            .get_mut(id.index() as usize)
            .ok_or(RegistryError::NotFound(id))?;
        Ok(f(meta))
    }

    /// Atomically transitions `Unloaded -> Loading`. Returns `true` iff the
    /// caller now owns the load; this is the single serialization point
    /// preventing duplicate work for the same id.
    pub fn try_begin_loading(&self, id: AssetId) -> Result<bool, RegistryError> {
        let began = self.with_metadata_mut(id, |meta| {
            if meta.state == AssetState::Unloaded {
                meta.state = AssetState::Loading;
                true
            } else {
                false
            }
        })?;
        if began {
            tracing::trace!(?id, "Unloaded -> Loading");
        }
        Ok(began)
    }

    /// Precondition: `id`'s state is `Loading`. A caller observing any other
    /// state here has a bug — this is `StateViolation`, "programmer error,
    /// not runtime-recoverable" per the state machine contract — so it
    /// panics rather than returning a `Result` the caller could swallow.
    pub fn mark_staged(&self, id: AssetId, size: u64) -> Result<(), RegistryError> {
        self.with_metadata_mut(id, |meta| {
            assert_eq!(
                meta.state,
                AssetState::Loading,
                "StateViolation: asset {id:?} must be Loading to be marked Staged, was {:?}",
                meta.state
            );
            meta.state = AssetState::Staged;
            meta.byte_size = size;
        })?;
        tracing::trace!(?id, size, "Loading -> Staged");
        Ok(())
    }

    /// Precondition: `id`'s state is `Staged`. See [`Registry::mark_staged`]
    /// for why a violation panics instead of returning an `Err`.
    pub fn mark_loaded(&self, id: AssetId, size: u64) -> Result<(), RegistryError> {
        self.with_metadata_mut(id, |meta| {
            assert_eq!(
                meta.state,
                AssetState::Staged,
                "StateViolation: asset {id:?} must be Staged to be marked Loaded, was {:?}",
                meta.state
            );
            meta.state = AssetState::Loaded;
            meta.byte_size = size;
            meta.last_loaded = Some(Instant::now());
            meta.last_error = None;
        })?;
        tracing::debug!(?id, size, "asset Loaded");
        Ok(())
    }

    pub fn mark_failed(&self, id: AssetId, reason: impl Into<String>) -> Result<(), RegistryError> {
        let reason = reason.into();
        tracing::warn!(?id, %reason, "asset marked Failed");
        self.with_metadata_mut(id, |meta| {
            meta.state = AssetState::Failed;
            meta.last_error = Some(reason);
        })
    }

    /// Used by hot reload: transitions `Loaded -> Unloaded` so a subsequent
    /// `try_begin_loading` succeeds.
    ///
    /// Precondition: `id`'s state is not `Loading` (a load must not be in
    /// flight). See [`Registry::mark_staged`] for why a violation panics.
    pub fn force_unload(&self, id: AssetId) -> Result<(), RegistryError> {
        self.with_metadata_mut(id, |meta| {
            assert_ne!(
                meta.state,
                AssetState::Loading,
                "StateViolation: asset {id:?} cannot be force-unloaded while Loading"
            );
            meta.state = AssetState::Unloaded;
        })?;
        tracing::debug!(?id, "force unloaded for hot reload");
        Ok(())
    }

    pub fn add_dependency(&self, a: AssetId, b: AssetId) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().unwrap();
        {
            let meta_a = inner
                .metadata
                .get_mut(a.index() as usize)
                .ok_or(RegistryError::NotFound(a))?;
            if !meta_a.dependencies.contains(&b) {
                meta_a.dependencies.push(b);
            }
        }
        let meta_b = inner
            .metadata
            .get_mut(b.index() as usize)
            .ok_or(RegistryError::NotFound(b))?;
        if !meta_b.dependents.contains(&a) {
            meta_b.dependents.push(a);
        }
        Ok(())
    }

    pub fn remove_dependency(&self, a: AssetId, b: AssetId) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().unwrap();
        {
            let meta_a = inner
                .metadata
                .get_mut(a.index() as usize)
                .ok_or(RegistryError::NotFound(a))?;
            meta_a.dependencies.retain(|&d| d != b);
        }
        let meta_b = inner
            .metadata
            .get_mut(b.index() as usize)
            .ok_or(RegistryError::NotFound(b))?;
        meta_b.dependents.retain(|&d| d != a);
        Ok(())
    }

    pub fn incref(&self, id: AssetId) -> Result<(), RegistryError> {
        self.with_metadata_mut(id, |meta| meta.ref_count += 1)
    }

    /// Returns `true` if the reference count reached zero.
    pub fn decref(&self, id: AssetId) -> Result<bool, RegistryError> {
        self.with_metadata_mut(id, |meta| {
            meta.ref_count = meta.ref_count.saturating_sub(1);
            meta.ref_count == 0
        })
    }

    pub fn dependencies_of(&self, id: AssetId) -> Vec<AssetId> {
        self.lookup_by_id(id).map(|m| m.dependencies).unwrap_or_default()
    }

    pub fn dependents_of(&self, id: AssetId) -> Vec<AssetId> {
        self.lookup_by_id(id).map(|m| m.dependents).unwrap_or_default()
    }
}
