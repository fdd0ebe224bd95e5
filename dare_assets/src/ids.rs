use std::fmt;

/// Opaque 64-bit asset handle.
///
/// The lower 32 bits are an index into the registry's metadata table; the
/// upper 32 bits are a generation counter. Metadata is never removed once
/// interned, so in practice the generation is always 0 — the field exists
/// so `AssetId` can be stored in [`dare_containers::SlotMap`]-style tables
/// that do expect one, and so a future eviction policy would not need a
/// new handle shape.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u64);

/// Reserved value denoting "no asset".
pub const INVALID_ASSET_ID: AssetId = AssetId(u64::MAX);

impl AssetId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    pub fn index(self) -> u32 {
        self.0 as u32
    }

    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn is_valid(self) -> bool {
        self != INVALID_ASSET_ID
    }

    pub fn to_bits(self) -> u64 {
        self.0
    }

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl Default for AssetId {
    fn default() -> Self {
        INVALID_ASSET_ID
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "AssetId(invalid)");
        }
        write!(f, "AssetId({}#{})", self.index(), self.generation())
    }
}

/// Closed set of asset categories. Fixed at interning time; never changes
/// for the lifetime of the id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Texture,
    Mesh,
    Material,
    Shader,
    Script,
    Audio,
    Scene,
    Animation,
}

impl AssetKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" => Some(AssetKind::Texture),
            "obj" | "gltf" => Some(AssetKind::Mesh),
            "lua" | "txt" | "zs" => Some(AssetKind::Script),
            "vert" | "frag" | "comp" | "glsl" => Some(AssetKind::Shader),
            _ => None,
        }
    }
}

/// Lifecycle state machine. See the Registry contract for the legal
/// transitions; only the Registry may mutate a metadata record's state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AssetState {
    Unloaded,
    Loading,
    Staged,
    Loaded,
    Failed,
}

/// Ordering used both for work-queue priority and for the number of
/// workers the loader requests for a given submission.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkPriority {
    Low,
    Normal,
    High,
    Critical,
}

impl WorkPriority {
    /// Worker budget requested from the `asset_loading` subsystem for a
    /// submission at this priority.
    pub fn io_worker_budget(self) -> usize {
        match self {
            WorkPriority::Critical => 6,
            WorkPriority::High => 4,
            WorkPriority::Normal => 2,
            WorkPriority::Low => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_id_round_trips_through_bits() {
        let id = AssetId::new(7, 0);
        assert_eq!(AssetId::from_bits(id.to_bits()), id);
        assert_eq!(id.index(), 7);
        assert_eq!(id.generation(), 0);
    }

    #[test]
    fn invalid_id_is_not_valid() {
        assert!(!INVALID_ASSET_ID.is_valid());
        assert!(AssetId::new(0, 0).is_valid());
    }

    #[test]
    fn ids_are_totally_ordered() {
        let a = AssetId::new(1, 0);
        let b = AssetId::new(2, 0);
        assert!(a < b);
    }

    #[test]
    fn priority_orders_critical_above_low() {
        assert!(WorkPriority::Critical > WorkPriority::Low);
        assert!(WorkPriority::High > WorkPriority::Normal);
    }

    #[test]
    fn kind_from_extension_covers_known_extensions() {
        assert_eq!(AssetKind::from_extension("png"), Some(AssetKind::Texture));
        assert_eq!(AssetKind::from_extension("OBJ"), Some(AssetKind::Mesh));
        assert_eq!(AssetKind::from_extension("lua"), Some(AssetKind::Script));
        assert_eq!(AssetKind::from_extension("bin"), None);
    }
}
