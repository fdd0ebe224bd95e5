use crate::fallback::FallbackSet;
use crate::ids::{AssetId, AssetKind, AssetState};
use crate::registry::Registry;
use dagal::context::GfxContext;
use dagal::resource::{Buffer, Model, Texture};
use dare_containers::prelude::{DefaultSlot, SlotMap};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Dense indexed sequence of resident artifacts for one asset kind, plus
/// the hash map that decouples it from sparse `AssetId`s. Never reclaims a
/// slot: an install for an id that already has one replaces the value in
/// place so dependents see the replacement without rewiring.
pub struct SlotTable<T> {
    slots: SlotMap<T>,
    by_id: HashMap<AssetId, DefaultSlot<T>>,
}

impl<T> Default for SlotTable<T> {
    fn default() -> Self {
        Self {
            slots: SlotMap::default(),
            by_id: HashMap::new(),
        }
    }
}

impl<T> SlotTable<T> {
    /// Installs `value` for `id`. Returns the dense slot index.
    fn install(&mut self, id: AssetId, value: T) -> u64 {
        if let Some(slot) = self.by_id.get(&id).cloned() {
            if let Some(existing) = self.slots.get_mut(slot.clone()) {
                *existing = value;
                return slot.id;
            }
        }
        let slot = self.slots.insert(value);
        let index = slot.id;
        self.by_id.insert(id, slot);
        index
    }

    fn get(&self, id: AssetId) -> Option<&T> {
        let slot = self.by_id.get(&id)?;
        self.slots.get(slot.clone())
    }

    /// The dense 0-based position exposed to GPU code as an integer
    /// attribute, decoupled from the sparse `AssetId`. Stable for the
    /// lifetime of the id: `SlotTable` never removes a slot, only replaces
    /// its value in place, so this never changes once assigned.
    fn slot_index(&self, id: AssetId) -> Option<u64> {
        self.by_id.get(&id).map(|slot| slot.id)
    }

    fn len(&self) -> usize {
        self.slots.iter().count()
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().map(|(value, _)| value)
    }
}

/// Parameters that fully determine a material's identity. Two materials
/// with identical parameters hash to the same synthetic path and therefore
/// deduplicate at the interning step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    pub base_color_texture: AssetId,
    pub secondary_texture: AssetId,
    pub color: [f32; 4],
    pub roughness: f32,
    pub metallic: f32,
    pub emissive: f32,
}

fn hash_material_params(params: &MaterialParams) -> u64 {
    let mut hasher = DefaultHasher::new();
    params.base_color_texture.to_bits().hash(&mut hasher);
    params.secondary_texture.to_bits().hash(&mut hasher);
    for component in params.color {
        component.to_bits().hash(&mut hasher);
    }
    params.roughness.to_bits().hash(&mut hasher);
    params.metallic.to_bits().hash(&mut hasher);
    params.emissive.to_bits().hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub params: MaterialParams,
}

/// The host-visible material parameter buffer and the generational retire
/// list backing it. `rebuild_material_buffer` never frees the buffer it
/// replaces: in-flight frames recorded against the old buffer may still be
/// reading it, and this crate has no fence to wait on, so the superseded
/// buffer is pushed onto `retired` for the caller to reclaim once it knows
/// from its own frame/fence bookkeeping that it's safe.
#[derive(Default)]
struct MaterialBuffer {
    current: Option<Buffer>,
    retired: Vec<Buffer>,
}

/// Device-visible descriptor for one resident texture slot.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    pub image_view: ash::vk::ImageView,
}

/// `AssetId`s of the texture fallback family, registered in the Registry
/// at startup so `resolve_for_rendering` can substitute them by id.
#[derive(Debug, Clone, Copy, Default)]
struct FallbackTextureIds {
    missing: Option<AssetId>,
    loading: Option<AssetId>,
    failed: Option<AssetId>,
}

/// Owns resident artifacts, the fallback-substitution policy, and the
/// dirty-flag protocol that tells downstream rebuild jobs when the
/// descriptor array or material buffer must be re-recorded.
pub struct Manager {
    registry: Arc<Registry>,
    textures: Mutex<SlotTable<Texture>>,
    meshes: Mutex<SlotTable<Model>>,
    materials: Mutex<SlotTable<Material>>,
    scripts: Mutex<SlotTable<Vec<u8>>>,
    descriptor_array: Mutex<Vec<Descriptor>>,
    material_buffer: Mutex<MaterialBuffer>,
    fallback_texture_ids: FallbackTextureIds,
    fallback_mesh_id: Option<AssetId>,
    pub texture_descriptors_dirty: AtomicBool,
    pub texture_descriptors_updating: AtomicBool,
    pub materials_dirty: AtomicBool,
    pub materials_updating: AtomicBool,
}

impl Manager {
    pub fn new(registry: Arc<Registry>, ctx: &dyn dagal::context::GfxContext) -> Self {
        let mut textures = SlotTable::default();
        let mut meshes = SlotTable::default();
        let fallback = FallbackSet::load(ctx);

        // Slot 0 is reserved for the neutral 1x1 white pixel, so shader
        // indices of "no texture = 0" are always safe.
        if let Some(default_texture) = fallback.default_texture.clone() {
            textures.slots.insert(default_texture);
        }

        let mut fallback_texture_ids = FallbackTextureIds::default();
        let mut intern_fallback_texture =
            |path: &str, texture: Option<Texture>, textures: &mut SlotTable<Texture>| {
                let texture = texture?;
                let id = registry.intern(path, AssetKind::Texture).ok()?;
                registry
                    .try_begin_loading(id)
                    .expect("freshly interned fallback asset is always found");
                registry
                    .mark_staged(id, 0)
                    .expect("fallback asset was just begun loading");
                registry
                    .mark_loaded(id, 0)
                    .expect("fallback asset was just staged");
                textures.install(id, texture);
                Some(id)
            };
        fallback_texture_ids.missing =
            intern_fallback_texture("fallback://texture/missing", fallback.missing_texture.clone(), &mut textures);
        fallback_texture_ids.loading =
            intern_fallback_texture("fallback://texture/loading", fallback.loading_texture.clone(), &mut textures);
        fallback_texture_ids.failed =
            intern_fallback_texture("fallback://texture/failed", fallback.failed_texture.clone(), &mut textures);

        let fallback_mesh_id = registry.intern("fallback://mesh/cube", AssetKind::Mesh).ok();
        if let Some(id) = fallback_mesh_id {
            registry
                .try_begin_loading(id)
                .expect("freshly interned fallback asset is always found");
            registry
                .mark_staged(id, 0)
                .expect("fallback asset was just begun loading");
            registry
                .mark_loaded(id, 0)
                .expect("fallback asset was just staged");
            meshes.install(id, fallback.cube_mesh.clone());
        }

        Self {
            registry,
            textures: Mutex::new(textures),
            meshes: Mutex::new(meshes),
            materials: Mutex::new(SlotTable::default()),
            scripts: Mutex::new(SlotTable::default()),
            descriptor_array: Mutex::new(Vec::new()),
            material_buffer: Mutex::new(MaterialBuffer::default()),
            fallback_texture_ids,
            fallback_mesh_id,
            texture_descriptors_dirty: AtomicBool::new(true),
            texture_descriptors_updating: AtomicBool::new(false),
            materials_dirty: AtomicBool::new(false),
            materials_updating: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn get_texture(&self, id: AssetId) -> Option<Texture> {
        let textures = self.textures.lock().unwrap();
        textures.get(id).cloned().or_else(|| {
            self.fallback_texture_ids
                .missing
                .and_then(|missing| textures.get(missing).cloned())
        })
    }

    pub fn get_mesh(&self, id: AssetId) -> Option<Model> {
        let meshes = self.meshes.lock().unwrap();
        meshes.get(id).cloned().or_else(|| {
            self.fallback_mesh_id
                .and_then(|cube| meshes.get(cube).cloned())
        })
    }

    /// The safe resolver used by rendering code. Never returns an id whose
    /// kind differs from `id`'s own kind: the substituted id is always one
    /// of the texture fallback family for texture kinds, cascading
    /// missing -> original id if no fallback loaded.
    ///
    /// This crate has no `Loader` to submit a load through, so the spec's
    /// `Unloaded -> submit a Critical load` clause is handled one layer up
    /// by `dare_engine::AssetPipeline::resolve_for_rendering`, which wraps
    /// this method. Called directly (as in this crate's own tests), an
    /// `Unloaded` id simply resolves to the missing placeholder without
    /// side effects.
    pub fn resolve_for_rendering(&self, id: AssetId) -> AssetId {
        let Some(meta) = self.registry.lookup_by_id(id) else {
            return id;
        };
        if meta.kind == AssetKind::Mesh {
            return match meta.state {
                AssetState::Loaded => id,
                _ => self.fallback_mesh_id.unwrap_or(id),
            };
        }
        if meta.kind != AssetKind::Texture {
            return id;
        }
        match meta.state {
            AssetState::Loaded => id,
            AssetState::Staged | AssetState::Loading => self
                .fallback_texture_ids
                .loading
                .or(self.fallback_texture_ids.missing)
                .unwrap_or(id),
            AssetState::Failed => self
                .fallback_texture_ids
                .failed
                .or(self.fallback_texture_ids.missing)
                .unwrap_or(id),
            AssetState::Unloaded => self.fallback_texture_ids.missing.unwrap_or(id),
        }
    }

    pub fn install_texture(&self, id: AssetId, texture: Texture) {
        let index = self.textures.lock().unwrap().install(id, texture);
        let _ = index;
        self.texture_descriptors_dirty.store(true, Ordering::Release);
    }

    pub fn install_mesh(&self, id: AssetId, model: Model) {
        self.meshes.lock().unwrap().install(id, model);
    }

    pub fn install_script(&self, id: AssetId, bytes: Vec<u8>) {
        self.scripts.lock().unwrap().install(id, bytes);
    }

    /// Recomputes the descriptor slice from the current texture slot table.
    /// Safe to call only after the caller has claimed
    /// `texture_descriptors_updating`.
    pub fn rebuild_texture_descriptor_array(&self) {
        debug_assert!(self.texture_descriptors_updating.load(Ordering::Acquire));
        let textures = self.textures.lock().unwrap();
        let descriptors: Vec<Descriptor> = textures
            .iter()
            .map(|texture| Descriptor {
                image_view: texture.image_view.handle(),
            })
            .collect();
        *self.descriptor_array.lock().unwrap() = descriptors;
        self.texture_descriptors_dirty.store(false, Ordering::Release);
    }

    pub fn texture_descriptor_array(&self) -> Vec<Descriptor> {
        self.descriptor_array.lock().unwrap().clone()
    }

    pub fn texture_slot_count(&self) -> usize {
        self.textures.lock().unwrap().len()
    }

    /// The texture's dense slot index, if it has one. Spec §8 scenario 4
    /// ("hot-reload replaces slot in place") is expressed in terms of this
    /// index staying stable across a reload.
    pub fn texture_slot_index(&self, id: AssetId) -> Option<u64> {
        self.textures.lock().unwrap().slot_index(id)
    }

    /// The mesh's dense slot index, if it has one. See
    /// [`Manager::texture_slot_index`].
    pub fn mesh_slot_index(&self, id: AssetId) -> Option<u64> {
        self.meshes.lock().unwrap().slot_index(id)
    }

    /// Materials are derivative assets with a synthetic `material://…`
    /// path encoding their parameters, so identical materials deduplicate
    /// via the interning step rather than via a separate equality check.
    pub fn create_material(&self, params: MaterialParams) -> AssetId {
        let hash = hash_material_params(&params);
        let path = format!("material://{hash:016x}");
        let id = self
            .registry
            .intern(&path, AssetKind::Material)
            .expect("synthetic material paths never conflict in kind");

        if self.registry.try_begin_loading(id).unwrap_or(false) {
            if params.base_color_texture.is_valid() {
                let _ = self.registry.add_dependency(id, params.base_color_texture);
            }
            if params.secondary_texture.is_valid() {
                let _ = self.registry.add_dependency(id, params.secondary_texture);
            }
            self.materials.lock().unwrap().install(id, Material { params });
            self.registry.mark_staged(id, 0).unwrap();
            self.registry.mark_loaded(id, 0).unwrap();
            self.materials_dirty.store(true, Ordering::Release);
        }
        id
    }

    pub fn material_count(&self) -> usize {
        self.materials.lock().unwrap().len()
    }

    /// Recomputes the host-visible material parameter buffer from the
    /// current material slot table and swaps it in. Safe to call only after
    /// the caller has claimed `materials_updating`. Locks `material_buffer`
    /// separately from `materials`, per the spec's "separate lock" for the
    /// material buffer: the parameter table and the GPU buffer reflecting it
    /// are allowed to be momentarily out of step, never corrupted.
    ///
    /// The buffer being replaced is not freed: it's pushed onto the
    /// generational retire list and returned to the caller only via
    /// `drain_retired_material_buffers`, once the caller's own fence
    /// bookkeeping says no in-flight frame can still be reading it.
    pub fn rebuild_material_buffer(&self, ctx: &dyn GfxContext) {
        debug_assert!(self.materials_updating.load(Ordering::Acquire));
        let byte_len = {
            let materials = self.materials.lock().unwrap();
            materials.len() * std::mem::size_of::<MaterialParams>()
        };
        let new_buffer = match ctx.allocate_host_visible_buffer(byte_len.max(1)) {
            Ok(buffer) => buffer,
            Err(e) => {
                tracing::warn!("failed to allocate material buffer: {e}");
                return;
            }
        };

        let mut material_buffer = self.material_buffer.lock().unwrap();
        if let Some(old) = material_buffer.current.replace(new_buffer) {
            material_buffer.retired.push(old);
        }
        drop(material_buffer);
        self.materials_dirty.store(false, Ordering::Release);
    }

    /// The material buffer currently considered live, if one has been built.
    pub fn material_buffer(&self) -> Option<Buffer> {
        self.material_buffer.lock().unwrap().current.clone()
    }

    /// Takes every buffer superseded since the last call, handing ownership
    /// to the caller to free once its own fences confirm no frame still
    /// references them. An empty return means nothing is waiting to be
    /// reclaimed.
    pub fn drain_retired_material_buffers(&self) -> Vec<Buffer> {
        std::mem::take(&mut self.material_buffer.lock().unwrap().retired)
    }

    /// Requests the priority that the hot-reload coordinator should use is
    /// computed from kind; `load_async` itself merely interns and, on a
    /// cache miss, records that a load should be requested by the caller
    /// (the [`crate::loader`]-equivalent lives in the `dare_engine` crate,
    /// which owns the thread pool).
    pub fn load_async(&self, path: &str, kind: AssetKind) -> (AssetId, bool) {
        let id = self.registry.intern(path, kind).expect("intern failed");
        let meta = self.registry.lookup_by_id(id).expect("just interned");
        let cache_hit = matches!(
            meta.state,
            AssetState::Loading | AssetState::Staged | AssetState::Loaded
        );
        (id, cache_hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagal::null::NullGfxContext;

    fn manager() -> Manager {
        let registry = Arc::new(Registry::new());
        let ctx = NullGfxContext::new();
        Manager::new(registry, &ctx)
    }

    #[test]
    fn slot_zero_is_reserved_for_default_texture() {
        let mgr = manager();
        assert_eq!(mgr.texture_slot_count(), 1);
    }

    #[test]
    fn install_texture_replaces_in_place() {
        let mgr = manager();
        let ctx = NullGfxContext::new();
        use dagal::context::GfxContext;
        let id = mgr.registry().intern("t/brick.png", AssetKind::Texture).unwrap();
        let first = ctx.create_texture(&[1, 2, 3, 4], dagal::context::PixelFormat::Rgba8Unorm).unwrap();
        mgr.install_texture(id, first.clone());
        let before = mgr.texture_slot_count();
        let slot_before = mgr.texture_slot_index(id);
        let second = ctx.create_texture(&[5, 6, 7, 8], dagal::context::PixelFormat::Rgba8Unorm).unwrap();
        mgr.install_texture(id, second.clone());
        assert_eq!(mgr.texture_slot_count(), before);
        assert_eq!(mgr.texture_slot_index(id), slot_before);
        assert_eq!(mgr.get_texture(id), Some(second));
    }

    #[test]
    fn rebuild_clears_dirty_flag_after_install() {
        let mgr = manager();
        let ctx = NullGfxContext::new();
        use dagal::context::GfxContext;
        let id = mgr.registry().intern("t/brick.png", AssetKind::Texture).unwrap();
        let texture = ctx
            .create_texture(&[1, 2, 3, 4], dagal::context::PixelFormat::Rgba8Unorm)
            .unwrap();

        mgr.install_texture(id, texture);
        assert!(mgr.texture_descriptors_dirty.load(Ordering::Acquire));

        mgr.texture_descriptors_updating.store(true, Ordering::Release);
        mgr.rebuild_texture_descriptor_array();
        mgr.texture_descriptors_updating.store(false, Ordering::Release);

        assert!(!mgr.texture_descriptors_dirty.load(Ordering::Acquire));
        assert_eq!(mgr.texture_descriptor_array().len(), mgr.texture_slot_count());
    }

    #[test]
    fn create_material_deduplicates_identical_params() {
        let mgr = manager();
        let params = MaterialParams {
            base_color_texture: AssetId::from_bits(1),
            secondary_texture: AssetId::from_bits(2),
            color: [1.0, 1.0, 1.0, 1.0],
            roughness: 0.5,
            metallic: 0.0,
            emissive: 0.0,
        };
        let a = mgr.create_material(params);
        let b = mgr.create_material(params);
        assert_eq!(a, b);
        assert_eq!(mgr.material_count(), 1);
    }

    #[test]
    fn resolve_for_rendering_returns_self_when_loaded() {
        let mgr = manager();
        let id = mgr.registry().intern("t/brick.png", AssetKind::Texture).unwrap();
        mgr.registry().try_begin_loading(id).unwrap();
        mgr.registry().mark_staged(id, 4).unwrap();
        mgr.registry().mark_loaded(id, 4).unwrap();
        assert_eq!(mgr.resolve_for_rendering(id), id);
    }

    #[test]
    fn resolve_for_rendering_substitutes_loading_placeholder_during_async_load() {
        let mgr = manager();
        let id = mgr.registry().intern("t/brick.png", AssetKind::Texture).unwrap();
        mgr.registry().try_begin_loading(id).unwrap();

        let resolved = mgr.resolve_for_rendering(id);
        assert_ne!(resolved, id);

        mgr.registry().mark_staged(id, 4).unwrap();
        mgr.registry().mark_loaded(id, 4).unwrap();
        assert_eq!(mgr.resolve_for_rendering(id), id);
    }

    #[test]
    fn failed_load_resolves_to_failed_placeholder_and_fetches_missing_texture() {
        let mgr = manager();
        let id = mgr.registry().intern("missing.png", AssetKind::Texture).unwrap();
        mgr.registry().try_begin_loading(id).unwrap();
        mgr.registry().mark_failed(id, "file not found").unwrap();

        assert_eq!(
            mgr.registry().lookup_by_id(id).unwrap().state,
            AssetState::Failed
        );
        assert_ne!(mgr.resolve_for_rendering(id), id);
        assert!(mgr.get_texture(id).is_some());
    }

    #[test]
    fn rebuild_material_buffer_retires_the_superseded_buffer() {
        let mgr = manager();
        let ctx = NullGfxContext::new();

        mgr.materials_updating.store(true, Ordering::Release);
        mgr.rebuild_material_buffer(&ctx);
        mgr.materials_updating.store(false, Ordering::Release);
        let first = mgr.material_buffer().expect("buffer should have been built");
        assert!(mgr.drain_retired_material_buffers().is_empty());

        let params = MaterialParams {
            base_color_texture: AssetId::from_bits(1),
            secondary_texture: AssetId::from_bits(2),
            color: [1.0, 1.0, 1.0, 1.0],
            roughness: 0.5,
            metallic: 0.0,
            emissive: 0.0,
        };
        mgr.create_material(params);
        assert!(mgr.materials_dirty.load(Ordering::Acquire));

        mgr.materials_updating.store(true, Ordering::Release);
        mgr.rebuild_material_buffer(&ctx);
        mgr.materials_updating.store(false, Ordering::Release);

        assert!(!mgr.materials_dirty.load(Ordering::Acquire));
        let second = mgr.material_buffer().expect("buffer should still be present");
        assert_ne!(first, second);

        let retired = mgr.drain_retired_material_buffers();
        assert_eq!(retired, vec![first]);
        assert!(mgr.drain_retired_material_buffers().is_empty());
    }
}
