pub use super::error;
pub use super::slot::{DefaultSlot, Slot, SlotWithGeneration};
pub use super::slot_map::SlotMap;
