use crate::error::DagalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
    Compute,
    Geometry,
}

/// Target environment for the compiled SPIR-V — always Vulkan for this
/// engine, kept explicit so the option is visible at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetEnv {
    Vulkan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptimizationLevel {
    None,
    Performance,
}

/// Fixed compile options for the hot-reload fast path: Vulkan target, no
/// optimization (reload needs to be fast, not fast-running), debug info on,
/// Vulkan semantics on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompileOptions {
    pub target_env: TargetEnv,
    pub optimization: OptimizationLevel,
    pub debug_info: bool,
    pub vulkan_semantics: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target_env: TargetEnv::Vulkan,
            optimization: OptimizationLevel::None,
            debug_info: true,
            vulkan_semantics: true,
        }
    }
}

/// Responsible for compiling shader source into SPIR-V.
pub trait ShaderCompiler: Send + Sync {
    fn compile(
        &self,
        source: &str,
        kind: ShaderKind,
        shader_name: &str,
        options: &CompileOptions,
    ) -> Result<Vec<u32>, DagalError>;
}
