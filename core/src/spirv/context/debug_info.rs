//! Debug-info registry: per-file compilation units and scope stacks, the
//! type-keyed debug node table, and the overflow list for nodes that no
//! canonical type owns.

use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;
use core::cell::RefCell;
use tracing::trace;

use super::SpirvContext;
use crate::error::DebugInfoError;
use crate::spirv::builder::SpirvConstant;
use crate::spirv::debug::{
    BaseTypeEncoding, CompositeTag, DebugCompilationUnit, DebugFunction, DebugGlobalVariable,
    DebugInfoFlags, DebugKind, DebugLexicalBlock, DebugLocalVariable, DebugRef, DebugSource,
    DebugTypeArray, DebugTypeBasic, DebugTypeComposite, DebugTypeFunction, DebugTypeMember,
    DebugTypeTemplate, DebugTypeTemplateParameter, DebugTypeVector, SpirvDebugInstruction,
};
use crate::spirv::decl::MethodDecl;
use crate::spirv::types::{ById, Ty};
use crate::{ToString, Vec};

const SPIRV_VERSION_1_0: u32 = 0x0001_0000;
const SOURCE_LANGUAGE_HLSL: u32 = 5;

/// Debug info for one source file.
#[derive(Debug)]
pub struct RichDebugInfo<'a> {
    pub file: &'a str,
    pub source: DebugRef<'a>,
    pub compilation_unit: DebugRef<'a>,
    // Never empty: the compilation unit stays at the bottom.
    scope_stack: RefCell<BumpVec<'a, DebugRef<'a>>>,
}

impl<'a> RichDebugInfo<'a> {
    fn new(
        arena: &'a Bump,
        file: &'a str,
        source: DebugRef<'a>,
        compilation_unit: DebugRef<'a>,
    ) -> Self {
        let mut scope_stack = BumpVec::new_in(arena);
        scope_stack.push(compilation_unit);
        Self {
            file,
            source,
            compilation_unit,
            scope_stack: RefCell::new(scope_stack),
        }
    }

    pub fn scope_depth(&self) -> usize {
        self.scope_stack.borrow().len()
    }

    /// Innermost scope of this file.
    pub fn innermost_scope(&self) -> DebugRef<'a> {
        *self
            .scope_stack
            .borrow()
            .last()
            .expect("scope stack holds the compilation unit")
    }

    pub fn scopes(&self) -> Vec<DebugRef<'a>> {
        self.scope_stack.borrow().iter().copied().collect()
    }
}

impl<'a> SpirvContext<'a> {
    fn alloc_debug(&self, kind: DebugKind<'a>) -> DebugRef<'a> {
        let node: DebugRef<'a> = self.arena.alloc(SpirvDebugInstruction::new(kind));
        trace!(opcode = node.opcode(), name = node.name(), "created debug node");
        node
    }

    fn push_overflow(&self, node: DebugRef<'a>) -> DebugRef<'a> {
        self.tail_debug_types.borrow_mut().push(node);
        node
    }

    fn debug_type_or_insert_with(
        &self,
        key: Option<ById<'a>>,
        make: impl FnOnce() -> DebugKind<'a>,
    ) -> DebugRef<'a> {
        if let Some(&node) = self.debug_types.borrow().get(&key) {
            return node;
        }
        let node = self.alloc_debug(make());
        self.debug_types.borrow_mut().insert(key, node);
        node
    }

    // ========================================================================
    // Per-file info and lexical scopes
    // ========================================================================

    /// Returns the debug info for `file`, creating its source and compilation
    /// unit nodes on first use.
    pub fn debug_info_for(&self, file: &str) -> &'a RichDebugInfo<'a> {
        if let Some(&info) = self.debug_info.borrow().get(file) {
            return info;
        }

        let file = self.intern_str(file);
        let source = self.alloc_debug(DebugKind::Source(DebugSource { file, text: None }));
        let compilation_unit = self.alloc_debug(DebugKind::CompilationUnit(DebugCompilationUnit {
            spirv_version: SPIRV_VERSION_1_0,
            dwarf_version: self.options.get().dwarf_version,
            source,
            language: SOURCE_LANGUAGE_HLSL,
        }));
        let info: &'a RichDebugInfo<'a> = self
            .arena
            .alloc(RichDebugInfo::new(self.arena, file, source, compilation_unit));
        self.debug_info.borrow_mut().insert(file, info);
        info
    }

    /// Per-file debug info in the order files were first seen.
    pub fn debug_infos(&self) -> Vec<&'a RichDebugInfo<'a>> {
        self.debug_info.borrow().values().copied().collect()
    }

    pub fn push_debug_lexical_scope(&self, info: &RichDebugInfo<'a>, scope: DebugRef<'a>) {
        info.scope_stack.borrow_mut().push(scope);
        self.current_lexical_scope.set(Some(scope));
    }

    /// Pops the innermost scope of `info`. The compilation unit cannot be
    /// popped.
    pub fn pop_debug_lexical_scope(&self, info: &RichDebugInfo<'a>) -> Result<(), DebugInfoError> {
        let mut stack = info.scope_stack.borrow_mut();
        if stack.len() <= 1 {
            return Err(DebugInfoError::ScopeUnderflow {
                file: info.file.to_string(),
            });
        }
        stack.pop();
        self.current_lexical_scope.set(stack.last().copied());
        Ok(())
    }

    /// The most recently pushed (or restored) scope across all files.
    pub fn current_lexical_scope(&self) -> Option<DebugRef<'a>> {
        self.current_lexical_scope.get()
    }

    // ========================================================================
    // Method bookkeeping
    // ========================================================================

    pub fn save_function_info(&self, method: &'a MethodDecl<'a>, function: DebugRef<'a>) {
        self.method_debug_functions
            .borrow_mut()
            .insert(method as *const MethodDecl<'a>, function);
    }

    pub fn find_function_info(&self, method: &'a MethodDecl<'a>) -> Option<DebugRef<'a>> {
        self.method_debug_functions
            .borrow()
            .get(&(method as *const MethodDecl<'a>))
            .copied()
    }

    // ========================================================================
    // Instructions emitted for declarations
    // ========================================================================

    pub fn debug_lexical_block(
        &self,
        source: DebugRef<'a>,
        line: u32,
        column: u32,
        parent: DebugRef<'a>,
    ) -> DebugRef<'a> {
        self.alloc_debug(DebugKind::LexicalBlock(DebugLexicalBlock {
            source,
            line,
            column,
            parent,
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn debug_function(
        &self,
        name: &str,
        source: DebugRef<'a>,
        line: u32,
        column: u32,
        parent: DebugRef<'a>,
        linkage_name: &str,
        flags: DebugInfoFlags,
        scope_line: u32,
        function_type: Option<Ty<'a>>,
    ) -> DebugRef<'a> {
        self.alloc_debug(DebugKind::Function(DebugFunction::new(
            self.intern_str(name),
            source,
            line,
            column,
            parent,
            self.intern_str(linkage_name),
            flags,
            scope_line,
            function_type,
        )))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn debug_global_variable(
        &self,
        name: &str,
        source: DebugRef<'a>,
        line: u32,
        column: u32,
        parent: DebugRef<'a>,
        linkage_name: &str,
        flags: DebugInfoFlags,
        variable_type: Option<Ty<'a>>,
    ) -> DebugRef<'a> {
        self.alloc_debug(DebugKind::GlobalVariable(DebugGlobalVariable::new(
            self.intern_str(name),
            source,
            line,
            column,
            parent,
            self.intern_str(linkage_name),
            flags,
            variable_type,
        )))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn debug_local_variable(
        &self,
        name: &str,
        source: DebugRef<'a>,
        line: u32,
        column: u32,
        parent: DebugRef<'a>,
        flags: DebugInfoFlags,
        arg_number: Option<u32>,
        variable_type: Option<Ty<'a>>,
    ) -> DebugRef<'a> {
        self.alloc_debug(DebugKind::LocalVariable(DebugLocalVariable::new(
            self.intern_str(name),
            source,
            line,
            column,
            parent,
            flags,
            arg_number,
            variable_type,
        )))
    }

    // ========================================================================
    // Debug types
    // ========================================================================

    pub fn debug_type(&self, ty: Ty<'a>) -> Option<DebugRef<'a>> {
        self.debug_types.borrow().get(&Some(ById(ty))).copied()
    }

    pub fn record_debug_type(&self, ty: Ty<'a>, node: DebugRef<'a>) {
        self.debug_types.borrow_mut().insert(Some(ById(ty)), node);
    }

    /// Type-keyed debug nodes in creation order.
    pub fn debug_types(&self) -> Vec<DebugRef<'a>> {
        self.debug_types.borrow().values().copied().collect()
    }

    /// Members, templates and template parameters in creation order.
    pub fn overflow_debug_types(&self) -> Vec<DebugRef<'a>> {
        self.tail_debug_types.borrow().iter().copied().collect()
    }

    /// Basic type node. `ty == None` keys the shared placeholder for types
    /// that have no debug representation yet.
    pub fn debug_type_basic(
        &self,
        ty: Option<Ty<'a>>,
        name: &str,
        size: Option<&'a SpirvConstant<'a>>,
        encoding: BaseTypeEncoding,
    ) -> DebugRef<'a> {
        self.debug_type_or_insert_with(ty.map(ById), || {
            DebugKind::TypeBasic(DebugTypeBasic {
                name: self.intern_str(name),
                size,
                encoding,
            })
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn debug_type_composite(
        &self,
        ty: Ty<'a>,
        name: &str,
        source: DebugRef<'a>,
        line: u32,
        column: u32,
        parent: DebugRef<'a>,
        linkage_name: &str,
        size_in_bits: u32,
        flags: DebugInfoFlags,
        tag: CompositeTag,
    ) -> DebugRef<'a> {
        self.debug_type_or_insert_with(Some(ById(ty)), || {
            DebugKind::TypeComposite(DebugTypeComposite::new(
                self.arena,
                self.intern_str(name),
                source,
                line,
                column,
                parent,
                self.intern_str(linkage_name),
                size_in_bits,
                flags,
                tag,
            ))
        })
    }

    pub fn debug_type_array(&self, ty: Ty<'a>, element: DebugRef<'a>, counts: &[u32]) -> DebugRef<'a> {
        self.debug_type_or_insert_with(Some(ById(ty)), || {
            DebugKind::TypeArray(DebugTypeArray {
                element,
                counts: self.arena.alloc_slice_copy(counts),
            })
        })
    }

    pub fn debug_type_vector(&self, ty: Ty<'a>, element: DebugRef<'a>, count: u32) -> DebugRef<'a> {
        self.debug_type_or_insert_with(Some(ById(ty)), || {
            DebugKind::TypeVector(DebugTypeVector { element, count })
        })
    }

    pub fn debug_type_function(
        &self,
        ty: Ty<'a>,
        flags: DebugInfoFlags,
        return_type: Option<DebugRef<'a>>,
        param_types: &[DebugRef<'a>],
    ) -> DebugRef<'a> {
        self.debug_type_or_insert_with(Some(ById(ty)), || {
            DebugKind::TypeFunction(DebugTypeFunction {
                flags,
                return_type,
                param_types: self.arena.alloc_slice_copy(param_types),
            })
        })
    }

    /// Always creates a new member node; members are not keyed by type.
    #[allow(clippy::too_many_arguments)]
    pub fn debug_type_member(
        &self,
        name: &str,
        debug_type: DebugRef<'a>,
        source: DebugRef<'a>,
        line: u32,
        column: u32,
        parent: DebugRef<'a>,
        offset_in_bits: u32,
        size_in_bits: u32,
        flags: DebugInfoFlags,
        value: Option<&'a SpirvConstant<'a>>,
    ) -> DebugRef<'a> {
        let member = self.alloc_debug(DebugKind::TypeMember(DebugTypeMember {
            name: self.intern_str(name),
            debug_type,
            source,
            line,
            column,
            parent,
            offset_in_bits,
            size_in_bits,
            flags,
            value,
        }));
        self.push_overflow(member)
    }

    /// The template attached to the composite registered for `ty`, creating
    /// and attaching it on first request.
    pub fn debug_type_template(
        &self,
        ty: Ty<'a>,
        target: DebugRef<'a>,
    ) -> Result<DebugRef<'a>, DebugInfoError> {
        let node = self
            .debug_type(ty)
            .ok_or_else(|| DebugInfoError::UnregisteredType { ty: ty.to_string() })?;
        let composite = node
            .as_composite()
            .ok_or_else(|| DebugInfoError::NotAComposite { ty: ty.to_string() })?;

        if let Some(template) = composite.type_template() {
            return Ok(template);
        }
        let template = self.alloc_debug(DebugKind::TypeTemplate(DebugTypeTemplate::new(
            self.arena, target,
        )));
        composite.set_type_template(template);
        Ok(self.push_overflow(template))
    }

    /// Always creates a new parameter node.
    pub fn debug_type_template_parameter(
        &self,
        name: &str,
        actual_type: Option<Ty<'a>>,
        value: Option<&'a SpirvConstant<'a>>,
        source: DebugRef<'a>,
        line: u32,
        column: u32,
    ) -> DebugRef<'a> {
        let param = self.alloc_debug(DebugKind::TypeTemplateParameter(
            DebugTypeTemplateParameter {
                name: self.intern_str(name),
                actual_type,
                value,
                source,
                line,
                column,
            },
        ));
        self.push_overflow(param)
    }
}
