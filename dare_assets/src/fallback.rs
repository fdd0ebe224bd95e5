use dagal::context::{GfxContext, PixelFormat};
use dagal::resource::{Model, Texture};

/// A fixed family of placeholder artifacts, resolved synchronously at
/// startup. These bypass the async pipeline entirely; they are resident
/// before any non-fallback load is accepted.
pub struct FallbackSet {
    pub missing_texture: Option<Texture>,
    pub loading_texture: Option<Texture>,
    pub failed_texture: Option<Texture>,
    pub default_texture: Option<Texture>,
    pub cube_mesh: Model,
}

const WHITE_PIXEL: [u8; 4] = [255, 255, 255, 255];
const MAGENTA_PIXEL: [u8; 4] = [255, 0, 255, 255];
const GRAY_PIXEL: [u8; 4] = [128, 128, 128, 255];
const RED_PIXEL: [u8; 4] = [255, 0, 0, 255];

impl FallbackSet {
    /// Loads the fixed placeholder family. An individual texture's failure
    /// to load is non-fatal; the slot is left `None` and callers cascade to
    /// the next placeholder in line.
    pub fn load(ctx: &dyn GfxContext) -> Self {
        Self {
            missing_texture: ctx.create_texture(&MAGENTA_PIXEL, PixelFormat::Rgba8Unorm).ok(),
            loading_texture: ctx.create_texture(&GRAY_PIXEL, PixelFormat::Rgba8Unorm).ok(),
            failed_texture: ctx.create_texture(&RED_PIXEL, PixelFormat::Rgba8Unorm).ok(),
            default_texture: ctx.create_texture(&WHITE_PIXEL, PixelFormat::Rgba8Unorm).ok(),
            cube_mesh: ctx
                .create_cube_model()
                .expect("fallback cube mesh must construct from a fixed in-memory source"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagal::null::NullGfxContext;

    #[test]
    fn fallback_set_loads_all_placeholders() {
        let ctx = NullGfxContext::new();
        let set = FallbackSet::load(&ctx);
        assert!(set.missing_texture.is_some());
        assert!(set.loading_texture.is_some());
        assert!(set.failed_texture.is_some());
        assert!(set.default_texture.is_some());
        assert_eq!(set.cube_mesh.meshes.len(), 1);
    }
}
