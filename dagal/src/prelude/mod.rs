pub use crate::context::{GfxContext, PixelFormat};
pub use crate::error::DagalError;
pub use crate::null::NullGfxContext;
pub use crate::resource::*;
pub use crate::shader::{CompileOptions, ShaderCCompiler, ShaderCompiler, ShaderKind};
