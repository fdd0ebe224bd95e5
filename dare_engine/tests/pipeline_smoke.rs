//! Cross-crate smoke tests exercising the full Registry -> Loader -> Manager
//! pipeline end to end through `AssetPipeline`, the way a single inline
//! `#[cfg(test)]` module inside one crate cannot: these span `dare_assets`
//! and `dare_engine` together, closest in spirit to a real caller wiring
//! everything up through `AssetPipeline::new`.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use dagal::context::GfxContext;
use dagal::null::NullGfxContext;
use dagal::shader::{CompileOptions, ShaderCompiler, ShaderKind};
use dare_assets::{AssetKind, AssetState, WorkPriority};
use dare_engine::AssetPipeline;

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

fn temp_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::File::create(&path).unwrap().write_all(contents).unwrap();
    path
}

fn wait_until(mut predicate: impl FnMut() -> bool) -> bool {
    for _ in 0..300 {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

fn pipeline() -> AssetPipeline {
    let gfx: Arc<dyn GfxContext> = Arc::new(NullGfxContext::new());
    AssetPipeline::new(gfx, Arc::new(StubCompiler)).unwrap()
}

/// Spec §8 scenario 1: fallback substitution during an async load, then
/// resolution back to the real id once loaded.
#[test]
fn texture_resolves_through_loading_fallback_to_self() {
    let pipeline = pipeline();
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "brick.png", &[1, 2, 3, 4]);

    let id = pipeline.load_async(path.to_str().unwrap(), AssetKind::Texture, WorkPriority::Normal);
    let resolved_while_loading = pipeline.resolve_for_rendering(id);
    assert_ne!(resolved_while_loading, id);

    let reached_loaded = wait_until(|| {
        pipeline.registry().lookup_by_id(id).unwrap().state == AssetState::Loaded
    });
    assert!(reached_loaded, "texture never reached Loaded");
    assert_eq!(pipeline.resolve_for_rendering(id), id);
}

/// Spec §8 scenario 3: a read failure surfaces as the failed placeholder,
/// and `get_texture` still returns a usable (fallback) resource.
#[test]
fn missing_file_reaches_failed_state_and_surfaces_failed_placeholder() {
    let pipeline = pipeline();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does_not_exist.png");

    let id = pipeline.load_async(path.to_str().unwrap(), AssetKind::Texture, WorkPriority::Normal);

    let reached_failed = wait_until(|| {
        pipeline.registry().lookup_by_id(id).unwrap().state == AssetState::Failed
    });
    assert!(reached_failed, "texture never reached Failed");
    assert_ne!(pipeline.resolve_for_rendering(id), id);
    assert!(pipeline.manager().get_texture(id).is_some());
}

/// Spec §8 scenario 4: hot-reload replaces a texture's resident value in
/// place without moving its dense slot index.
#[test]
fn hot_reload_replaces_texture_in_place_without_moving_its_slot() {
    let pipeline = pipeline();
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "reload.png", &[1, 2, 3, 4]);

    let id = pipeline.load_and_watch(path.to_str().unwrap(), AssetKind::Texture, WorkPriority::Normal);
    assert!(wait_until(|| {
        pipeline.registry().lookup_by_id(id).unwrap().state == AssetState::Loaded
    }));
    let slot_before = pipeline.manager().texture_slot_index(id);

    std::fs::File::create(&path).unwrap().write_all(&[9, 9, 9, 9]).unwrap();
    pipeline.hot_reload().on_file_event(&path);

    assert!(wait_until(|| {
        pipeline.registry().lookup_by_id(id).unwrap().state == AssetState::Loaded
    }));
    assert_eq!(pipeline.manager().texture_slot_index(id), slot_before);
}

/// Spec §8 scenario 6: identical `create_material` parameters deduplicate
/// to the same synthetic asset id.
#[test]
fn create_material_is_idempotent_for_identical_parameters() {
    let pipeline = pipeline();
    let params = dare_assets::MaterialParams {
        base_color_texture: dare_assets::AssetId::from_bits(1),
        secondary_texture: dare_assets::AssetId::from_bits(2),
        color: [1.0, 1.0, 1.0, 1.0],
        roughness: 0.5,
        metallic: 0.0,
        emissive: 0.0,
    };
    let a = pipeline.manager().create_material(params);
    let b = pipeline.manager().create_material(params);
    assert_eq!(a, b);
    assert_eq!(pipeline.manager().material_count(), 1);
}
