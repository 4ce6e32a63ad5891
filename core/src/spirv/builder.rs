//! The slice of the instruction-emission builder that debug lowering needs:
//! literal constants for size and value operands, and the debug-info
//! extended instruction set import.

use bumpalo::Bump;
use core::cell::OnceCell;

use crate::spirv::types::{SpirvType, Ty};

/// Name of the extended instruction set every debug node belongs to.
pub const DEBUG_INFO_EXT_INST_SET: &str = "OpenCL.DebugInfo.100";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstantValue {
    Int(i64),
    Float(f64),
}

#[derive(Debug, PartialEq)]
pub struct SpirvConstant<'a> {
    pub ty: Ty<'a>,
    pub value: ConstantValue,
}

/// An `OpExtInstImport`.
#[derive(Debug, PartialEq, Eq)]
pub struct ExtInstSet<'a> {
    pub name: &'a str,
}

pub trait ConstantBuilder<'a> {
    fn constant_int(&self, ty: Ty<'a>, value: i64) -> &'a SpirvConstant<'a>;

    fn constant_float(&self, ty: Ty<'a>, value: f64) -> &'a SpirvConstant<'a>;

    /// The `OpenCL.DebugInfo.100` import. Repeated calls return the same
    /// instance.
    fn debug_info_ext_inst_set(&self) -> &'a ExtInstSet<'a>;
}

/// Arena-backed [`ConstantBuilder`].
#[derive(Debug)]
pub struct SpirvBuilder<'a> {
    arena: &'a Bump,
    debug_set: OnceCell<&'a ExtInstSet<'a>>,
}

impl<'a> SpirvBuilder<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            debug_set: OnceCell::new(),
        }
    }
}

impl<'a> ConstantBuilder<'a> for SpirvBuilder<'a> {
    fn constant_int(&self, ty: Ty<'a>, value: i64) -> &'a SpirvConstant<'a> {
        assert!(
            matches!(ty, SpirvType::Integer { .. }),
            "integer constant needs an integer type, got {}",
            ty
        );
        self.arena.alloc(SpirvConstant {
            ty,
            value: ConstantValue::Int(value),
        })
    }

    fn constant_float(&self, ty: Ty<'a>, value: f64) -> &'a SpirvConstant<'a> {
        assert!(ty.is_float(), "float constant needs a float type, got {}", ty);
        self.arena.alloc(SpirvConstant {
            ty,
            value: ConstantValue::Float(value),
        })
    }

    fn debug_info_ext_inst_set(&self) -> &'a ExtInstSet<'a> {
        *self.debug_set.get_or_init(|| {
            &*self.arena.alloc(ExtInstSet {
                name: DEBUG_INFO_EXT_INST_SET,
            })
        })
    }
}
