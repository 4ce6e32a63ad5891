//! SPIR-V type interning and debug-type lowering for a shader compiler
//! backend.
//!
//! [`spirv::SpirvContext`] owns every canonical type and debug-info node of
//! one compilation, allocated from a caller-provided [`bumpalo::Bump`].
//! [`spirv::DebugTypeVisitor`] turns canonical types into
//! `OpenCL.DebugInfo.100` debug types.

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

// Re-export for convenience so other modules don't need alloc:: prefix
#[allow(unused_imports)]
pub(crate) use alloc::{boxed::Box, format, string::String, string::ToString, vec, vec::Vec};

pub mod error;
pub mod options;
pub mod spirv;

pub use error::DebugInfoError;
pub use options::{ContextOptions, ShaderModelKind};
