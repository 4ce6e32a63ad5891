//! Lumen - SPIR-V type interning and debug info for shader compilers
//!
//! # Overview
//!
//! A compilation owns one [`bumpalo::Bump`] arena and one [`SpirvContext`]
//! borrowing it. Every canonical type requested through the context is
//! unique, so types compare by pointer. Debug info for those types is
//! produced by running a [`DebugTypeVisitor`] over the module's debug
//! instructions.
//!
//! # Quick Start
//!
//! ```
//! use bumpalo::Bump;
//! use lumen::spirv::{DebugInfoFlags, SpirvBuilder, SpirvContext, SpirvModule, StorageClass};
//!
//! let arena = Bump::new();
//! let context = SpirvContext::new(&arena);
//!
//! let float4 = context.vector_type(context.float_type(32), 4);
//! assert!(core::ptr::eq(float4, context.vector_type(context.float_type(32), 4)));
//!
//! let info = context.debug_info_for("shader.hlsl");
//! let color = context.debug_global_variable(
//!     "color",
//!     info.source,
//!     3,
//!     8,
//!     info.compilation_unit,
//!     "color",
//!     DebugInfoFlags::IS_DEFINITION,
//!     Some(context.pointer_type(float4, StorageClass::Private)),
//! );
//!
//! let mut module = SpirvModule::new();
//! module.add_debug_info(color);
//! let builder = SpirvBuilder::new(&arena);
//! assert!(lumen::lower_debug_types(&context, &builder, &mut module));
//! assert_eq!(color.debug_type().unwrap().size_in_bits(), 128);
//! ```

// Re-export public API from lumen_core
pub use lumen_core::options::{ContextOptions, ShaderModelKind};
pub use lumen_core::{error, options, spirv};

// Re-export commonly used types
pub use lumen_core::spirv::{
    DebugRef, DebugTypeVisitor, SpirvBuilder, SpirvContext, SpirvModule, SpirvType, Ty,
};

// Re-export errors
pub use lumen_core::error::DebugInfoError;

/// Lowers the debug types of every variable and function in `module` and
/// appends the resulting debug type instructions to it.
///
/// Pass the same `builder` to every call of one compilation so all nodes
/// share a single `OpenCL.DebugInfo.100` import.
pub fn lower_debug_types<'a>(
    context: &SpirvContext<'a>,
    builder: &SpirvBuilder<'a>,
    module: &mut SpirvModule<'a>,
) -> bool {
    let mut visitor = DebugTypeVisitor::new(context, builder);
    module.invoke(&mut visitor)
}
