use super::traits::{CompileOptions, OptimizationLevel, ShaderCompiler, ShaderKind, TargetEnv};
use crate::error::DagalError;

/// Implementation of [`ShaderCompiler`] backed by the `shaderc` crate.
pub struct ShaderCCompiler {
    handle: shaderc::Compiler,
}

impl ShaderCCompiler {
    pub fn new() -> Result<Self, DagalError> {
        Ok(Self {
            handle: shaderc::Compiler::new().ok_or(DagalError::CompilerInit)?,
        })
    }
}

impl ShaderCompiler for ShaderCCompiler {
    fn compile(
        &self,
        source: &str,
        kind: ShaderKind,
        shader_name: &str,
        options: &CompileOptions,
    ) -> Result<Vec<u32>, DagalError> {
        let mut compile_options = shaderc::CompileOptions::new()
            .ok_or_else(|| DagalError::ShadercError("failed to create options".into()))?;
        compile_options.set_target_env(
            match options.target_env {
                TargetEnv::Vulkan => shaderc::TargetEnv::Vulkan,
            },
            shaderc::EnvVersion::Vulkan1_2 as u32,
        );
        compile_options.set_optimization_level(match options.optimization {
            OptimizationLevel::None => shaderc::OptimizationLevel::Zero,
            OptimizationLevel::Performance => shaderc::OptimizationLevel::Performance,
        });
        if options.debug_info {
            compile_options.set_generate_debug_info();
        }
        compile_options.add_macro_definition("EP", Some("main"));

        let artifact = self
            .handle
            .compile_into_spirv(
                source,
                shaderc::ShaderKind::from(kind),
                shader_name,
                "main",
                Some(&compile_options),
            )
            .map_err(|e| DagalError::ShadercError(e.to_string()))?;

        Ok(artifact.as_binary().to_vec())
    }
}

impl From<ShaderKind> for shaderc::ShaderKind {
    fn from(value: ShaderKind) -> Self {
        match value {
            ShaderKind::Compute => shaderc::ShaderKind::Compute,
            ShaderKind::Geometry => shaderc::ShaderKind::Geometry,
            ShaderKind::Vertex => shaderc::ShaderKind::Vertex,
            ShaderKind::Fragment => shaderc::ShaderKind::Fragment,
        }
    }
}
