use thiserror::Error;

/// Errors surfaced by the graphics-context and shader-compiler collaborators.
///
/// Both collaborators are treated as opaque constructors that may fail; callers
/// only need to know *that* construction failed, not the full Vulkan cause, so
/// each variant stays coarse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DagalError {
    #[error("GPU texture construction failed: {0}")]
    TextureConstruction(String),

    #[error("GPU mesh construction failed: {0}")]
    MeshConstruction(String),

    #[error("host-visible buffer allocation failed: {0}")]
    BufferAllocation(String),

    #[error("shaderc encountered an error: {0}")]
    ShadercError(String),

    #[error("shaderc compiler failed to initialize")]
    CompilerInit,
}
