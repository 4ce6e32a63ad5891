//! Debug-info instructions (`OpenCL.DebugInfo.100`).
//!
//! Nodes live in the context arena and reference each other with plain
//! `&'a` borrows. The few things that change after creation (a composite's
//! member list and final size, its lazily attached template, the result
//! type and instruction set stamped by the lowering pass, and the debug
//! type resolved for a variable or function) sit behind `Cell`/`RefCell`.

use bitflags::bitflags;
use bumpalo::collections::Vec as BumpVec;
use core::cell::{Cell, Ref, RefCell};
use core::fmt;

use crate::spirv::builder::{ConstantValue, ExtInstSet, SpirvConstant};
use crate::Vec;
use crate::spirv::types::Ty;

pub type DebugRef<'a> = &'a SpirvDebugInstruction<'a>;

bitflags! {
    /// `DebugInfoFlags` from the extended instruction set.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct DebugInfoFlags: u32 {
        const IS_PROTECTED = 1;
        const IS_PRIVATE = 1 << 1;
        const IS_PUBLIC = Self::IS_PROTECTED.bits() | Self::IS_PRIVATE.bits();
        const IS_LOCAL = 1 << 2;
        const IS_DEFINITION = 1 << 3;
        const FWD_DECL = 1 << 4;
        const ARTIFICIAL = 1 << 5;
        const EXPLICIT = 1 << 6;
        const PROTOTYPED = 1 << 7;
        const OBJECT_POINTER = 1 << 8;
        const STATIC_MEMBER = 1 << 9;
        const INDIRECT_VARIABLE = 1 << 10;
        const LVALUE_REFERENCE = 1 << 11;
        const RVALUE_REFERENCE = 1 << 12;
        const IS_OPTIMIZED = 1 << 13;
    }
}

impl DebugInfoFlags {
    pub fn visibility(module_private: bool) -> Self {
        if module_private {
            DebugInfoFlags::IS_PRIVATE
        } else {
            DebugInfoFlags::IS_PUBLIC
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseTypeEncoding {
    Unspecified = 0,
    Address = 1,
    Boolean = 2,
    Float = 3,
    Signed = 4,
    SignedChar = 5,
    Unsigned = 6,
    UnsignedChar = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeTag {
    Class = 0,
    Structure = 1,
    Union = 2,
}

#[derive(Debug)]
pub struct DebugSource<'a> {
    pub file: &'a str,
    pub text: Option<&'a str>,
}

#[derive(Debug)]
pub struct DebugCompilationUnit<'a> {
    pub spirv_version: u32,
    pub dwarf_version: u32,
    pub source: DebugRef<'a>,
    pub language: u32,
}

#[derive(Debug)]
pub struct DebugLexicalBlock<'a> {
    pub source: DebugRef<'a>,
    pub line: u32,
    pub column: u32,
    pub parent: DebugRef<'a>,
}

#[derive(Debug)]
pub struct DebugFunction<'a> {
    pub name: &'a str,
    pub source: DebugRef<'a>,
    pub line: u32,
    pub column: u32,
    pub parent: DebugRef<'a>,
    pub linkage_name: &'a str,
    pub flags: DebugInfoFlags,
    pub scope_line: u32,
    /// Signature to lower into this function's debug type.
    pub function_type: Option<Ty<'a>>,
    debug_type: Cell<Option<DebugRef<'a>>>,
}

#[derive(Debug)]
pub struct DebugGlobalVariable<'a> {
    pub name: &'a str,
    pub source: DebugRef<'a>,
    pub line: u32,
    pub column: u32,
    pub parent: DebugRef<'a>,
    pub linkage_name: &'a str,
    pub flags: DebugInfoFlags,
    pub variable_type: Option<Ty<'a>>,
    debug_type: Cell<Option<DebugRef<'a>>>,
}

#[derive(Debug)]
pub struct DebugLocalVariable<'a> {
    pub name: &'a str,
    pub source: DebugRef<'a>,
    pub line: u32,
    pub column: u32,
    pub parent: DebugRef<'a>,
    pub flags: DebugInfoFlags,
    /// 1-based parameter index for function arguments.
    pub arg_number: Option<u32>,
    pub variable_type: Option<Ty<'a>>,
    debug_type: Cell<Option<DebugRef<'a>>>,
}

#[derive(Debug)]
pub struct DebugTypeBasic<'a> {
    pub name: &'a str,
    pub size: Option<&'a SpirvConstant<'a>>,
    pub encoding: BaseTypeEncoding,
}

pub struct DebugTypeComposite<'a> {
    pub name: &'a str,
    pub source: DebugRef<'a>,
    pub line: u32,
    pub column: u32,
    pub parent: DebugRef<'a>,
    pub linkage_name: &'a str,
    pub flags: DebugInfoFlags,
    pub tag: CompositeTag,
    size_in_bits: Cell<u32>,
    members: RefCell<BumpVec<'a, DebugRef<'a>>>,
    type_template: Cell<Option<DebugRef<'a>>>,
}

impl<'a> DebugTypeComposite<'a> {
    pub fn members(&self) -> Ref<'_, BumpVec<'a, DebugRef<'a>>> {
        self.members.borrow()
    }

    pub fn push_member(&self, member: DebugRef<'a>) {
        self.members.borrow_mut().push(member);
    }

    pub fn has_members(&self) -> bool {
        !self.members.borrow().is_empty()
    }

    pub fn size_in_bits(&self) -> u32 {
        self.size_in_bits.get()
    }

    pub fn set_size_in_bits(&self, size: u32) {
        self.size_in_bits.set(size);
    }

    pub fn type_template(&self) -> Option<DebugRef<'a>> {
        self.type_template.get()
    }

    pub(crate) fn set_type_template(&self, template: DebugRef<'a>) {
        debug_assert!(self.type_template.get().is_none());
        self.type_template.set(Some(template));
    }
}

pub struct DebugTypeMember<'a> {
    pub name: &'a str,
    pub debug_type: DebugRef<'a>,
    pub source: DebugRef<'a>,
    pub line: u32,
    pub column: u32,
    pub parent: DebugRef<'a>,
    pub offset_in_bits: u32,
    pub size_in_bits: u32,
    pub flags: DebugInfoFlags,
    pub value: Option<&'a SpirvConstant<'a>>,
}

// Members point back at their composite, so the two impls below print
// neighbours by name only.
impl fmt::Debug for DebugTypeComposite<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<_> = self.members.borrow().iter().map(|m| m.name()).collect();
        f.debug_struct("DebugTypeComposite")
            .field("name", &self.name)
            .field("line", &self.line)
            .field("column", &self.column)
            .field("linkage_name", &self.linkage_name)
            .field("flags", &self.flags)
            .field("tag", &self.tag)
            .field("size_in_bits", &self.size_in_bits.get())
            .field("members", &members)
            .field("has_template", &self.type_template.get().is_some())
            .finish()
    }
}

impl fmt::Debug for DebugTypeMember<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugTypeMember")
            .field("name", &self.name)
            .field("debug_type", &self.debug_type.name())
            .field("line", &self.line)
            .field("column", &self.column)
            .field("parent", &self.parent.name())
            .field("offset_in_bits", &self.offset_in_bits)
            .field("size_in_bits", &self.size_in_bits)
            .field("flags", &self.flags)
            .field("value", &self.value)
            .finish()
    }
}

#[derive(Debug)]
pub struct DebugTypeArray<'a> {
    pub element: DebugRef<'a>,
    pub counts: &'a [u32],
}

#[derive(Debug)]
pub struct DebugTypeVector<'a> {
    pub element: DebugRef<'a>,
    pub count: u32,
}

#[derive(Debug)]
pub struct DebugTypeFunction<'a> {
    pub flags: DebugInfoFlags,
    /// `None` for functions returning void.
    pub return_type: Option<DebugRef<'a>>,
    pub param_types: &'a [DebugRef<'a>],
}

pub struct DebugTypeTemplate<'a> {
    pub target: DebugRef<'a>,
    params: RefCell<BumpVec<'a, DebugRef<'a>>>,
}

impl fmt::Debug for DebugTypeTemplate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugTypeTemplate")
            .field("target", &self.target.name())
            .field("params", &self.params.borrow().len())
            .finish()
    }
}

impl<'a> DebugTypeTemplate<'a> {
    pub fn params(&self) -> Ref<'_, BumpVec<'a, DebugRef<'a>>> {
        self.params.borrow()
    }

    pub fn push_param(&self, param: DebugRef<'a>) {
        self.params.borrow_mut().push(param);
    }
}

#[derive(Debug)]
pub struct DebugTypeTemplateParameter<'a> {
    pub name: &'a str,
    pub actual_type: Option<Ty<'a>>,
    pub value: Option<&'a SpirvConstant<'a>>,
    pub source: DebugRef<'a>,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug)]
pub enum DebugKind<'a> {
    Source(DebugSource<'a>),
    CompilationUnit(DebugCompilationUnit<'a>),
    LexicalBlock(DebugLexicalBlock<'a>),
    Function(DebugFunction<'a>),
    GlobalVariable(DebugGlobalVariable<'a>),
    LocalVariable(DebugLocalVariable<'a>),
    TypeBasic(DebugTypeBasic<'a>),
    TypeComposite(DebugTypeComposite<'a>),
    TypeMember(DebugTypeMember<'a>),
    TypeArray(DebugTypeArray<'a>),
    TypeVector(DebugTypeVector<'a>),
    TypeFunction(DebugTypeFunction<'a>),
    TypeTemplate(DebugTypeTemplate<'a>),
    TypeTemplateParameter(DebugTypeTemplateParameter<'a>),
}

/// A debug-info `OpExtInst`.
#[derive(Debug)]
pub struct SpirvDebugInstruction<'a> {
    kind: DebugKind<'a>,
    result_type: Cell<Option<Ty<'a>>>,
    instruction_set: Cell<Option<&'a ExtInstSet<'a>>>,
}

impl<'a> SpirvDebugInstruction<'a> {
    pub fn new(kind: DebugKind<'a>) -> Self {
        Self {
            kind,
            result_type: Cell::new(None),
            instruction_set: Cell::new(None),
        }
    }

    pub fn kind(&self) -> &DebugKind<'a> {
        &self.kind
    }

    /// Instruction name as it appears in the extended instruction set.
    pub fn opcode(&self) -> &'static str {
        match self.kind {
            DebugKind::Source(_) => "DebugSource",
            DebugKind::CompilationUnit(_) => "DebugCompilationUnit",
            DebugKind::LexicalBlock(_) => "DebugLexicalBlock",
            DebugKind::Function(_) => "DebugFunction",
            DebugKind::GlobalVariable(_) => "DebugGlobalVariable",
            DebugKind::LocalVariable(_) => "DebugLocalVariable",
            DebugKind::TypeBasic(_) => "DebugTypeBasic",
            DebugKind::TypeComposite(_) => "DebugTypeComposite",
            DebugKind::TypeMember(_) => "DebugTypeMember",
            DebugKind::TypeArray(_) => "DebugTypeArray",
            DebugKind::TypeVector(_) => "DebugTypeVector",
            DebugKind::TypeFunction(_) => "DebugTypeFunction",
            DebugKind::TypeTemplate(_) => "DebugTypeTemplate",
            DebugKind::TypeTemplateParameter(_) => "DebugTypeTemplateParameter",
        }
    }

    pub fn result_type(&self) -> Option<Ty<'a>> {
        self.result_type.get()
    }

    pub fn set_result_type(&self, ty: Ty<'a>) {
        self.result_type.set(Some(ty));
    }

    pub fn instruction_set(&self) -> Option<&'a ExtInstSet<'a>> {
        self.instruction_set.get()
    }

    pub fn set_instruction_set(&self, set: &'a ExtInstSet<'a>) {
        self.instruction_set.set(Some(set));
    }

    pub fn is_debug_type(&self) -> bool {
        matches!(
            self.kind,
            DebugKind::TypeBasic(_)
                | DebugKind::TypeComposite(_)
                | DebugKind::TypeMember(_)
                | DebugKind::TypeArray(_)
                | DebugKind::TypeVector(_)
                | DebugKind::TypeFunction(_)
                | DebugKind::TypeTemplate(_)
                | DebugKind::TypeTemplateParameter(_)
        )
    }

    /// Size of the described type. Zero when it has none (functions,
    /// templates, non-type instructions). Wraps on `u32` overflow.
    pub fn size_in_bits(&self) -> u32 {
        match &self.kind {
            DebugKind::TypeBasic(basic) => match basic.size {
                Some(SpirvConstant {
                    value: ConstantValue::Int(bits),
                    ..
                }) => u32::try_from(*bits).unwrap_or(0),
                _ => 0,
            },
            DebugKind::TypeComposite(composite) => composite.size_in_bits(),
            DebugKind::TypeMember(member) => member.size_in_bits,
            DebugKind::TypeArray(array) => array
                .counts
                .iter()
                .fold(array.element.size_in_bits(), |acc, count| acc.wrapping_mul(*count)),
            DebugKind::TypeVector(vector) => {
                vector.element.size_in_bits().wrapping_mul(vector.count)
            }
            _ => 0,
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        match &self.kind {
            DebugKind::Source(source) => Some(source.file),
            DebugKind::Function(function) => Some(function.name),
            DebugKind::GlobalVariable(var) => Some(var.name),
            DebugKind::LocalVariable(var) => Some(var.name),
            DebugKind::TypeBasic(basic) => Some(basic.name),
            DebugKind::TypeComposite(composite) => Some(composite.name),
            DebugKind::TypeMember(member) => Some(member.name),
            DebugKind::TypeTemplateParameter(param) => Some(param.name),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&DebugTypeComposite<'a>> {
        match &self.kind {
            DebugKind::TypeComposite(composite) => Some(composite),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&DebugTypeMember<'a>> {
        match &self.kind {
            DebugKind::TypeMember(member) => Some(member),
            _ => None,
        }
    }

    pub fn as_template(&self) -> Option<&DebugTypeTemplate<'a>> {
        match &self.kind {
            DebugKind::TypeTemplate(template) => Some(template),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&DebugFunction<'a>> {
        match &self.kind {
            DebugKind::Function(function) => Some(function),
            _ => None,
        }
    }

    /// The debug type attached to a variable or function, once lowered.
    pub fn debug_type(&self) -> Option<DebugRef<'a>> {
        match &self.kind {
            DebugKind::Function(function) => function.debug_type.get(),
            DebugKind::GlobalVariable(var) => var.debug_type.get(),
            DebugKind::LocalVariable(var) => var.debug_type.get(),
            _ => None,
        }
    }

    pub fn set_debug_type(&self, debug_type: DebugRef<'a>) {
        match &self.kind {
            DebugKind::Function(function) => function.debug_type.set(Some(debug_type)),
            DebugKind::GlobalVariable(var) => var.debug_type.set(Some(debug_type)),
            DebugKind::LocalVariable(var) => var.debug_type.set(Some(debug_type)),
            other => panic!("{:?} does not carry a debug type", other),
        }
    }
}

// Constructors used by the context. Interior-mutable fields are not public,
// so every node that owns one is built here.

impl<'a> DebugFunction<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: &'a str,
        source: DebugRef<'a>,
        line: u32,
        column: u32,
        parent: DebugRef<'a>,
        linkage_name: &'a str,
        flags: DebugInfoFlags,
        scope_line: u32,
        function_type: Option<Ty<'a>>,
    ) -> Self {
        Self {
            name,
            source,
            line,
            column,
            parent,
            linkage_name,
            flags,
            scope_line,
            function_type,
            debug_type: Cell::new(None),
        }
    }
}

impl<'a> DebugGlobalVariable<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: &'a str,
        source: DebugRef<'a>,
        line: u32,
        column: u32,
        parent: DebugRef<'a>,
        linkage_name: &'a str,
        flags: DebugInfoFlags,
        variable_type: Option<Ty<'a>>,
    ) -> Self {
        Self {
            name,
            source,
            line,
            column,
            parent,
            linkage_name,
            flags,
            variable_type,
            debug_type: Cell::new(None),
        }
    }
}

impl<'a> DebugLocalVariable<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: &'a str,
        source: DebugRef<'a>,
        line: u32,
        column: u32,
        parent: DebugRef<'a>,
        flags: DebugInfoFlags,
        arg_number: Option<u32>,
        variable_type: Option<Ty<'a>>,
    ) -> Self {
        Self {
            name,
            source,
            line,
            column,
            parent,
            flags,
            arg_number,
            variable_type,
            debug_type: Cell::new(None),
        }
    }
}

impl<'a> DebugTypeComposite<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        arena: &'a bumpalo::Bump,
        name: &'a str,
        source: DebugRef<'a>,
        line: u32,
        column: u32,
        parent: DebugRef<'a>,
        linkage_name: &'a str,
        size_in_bits: u32,
        flags: DebugInfoFlags,
        tag: CompositeTag,
    ) -> Self {
        Self {
            name,
            source,
            line,
            column,
            parent,
            linkage_name,
            flags,
            tag,
            size_in_bits: Cell::new(size_in_bits),
            members: RefCell::new(BumpVec::new_in(arena)),
            type_template: Cell::new(None),
        }
    }
}

impl<'a> DebugTypeTemplate<'a> {
    pub(crate) fn new(arena: &'a bumpalo::Bump, target: DebugRef<'a>) -> Self {
        Self {
            target,
            params: RefCell::new(BumpVec::new_in(arena)),
        }
    }
}
