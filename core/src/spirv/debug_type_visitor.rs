//! Lowers canonical types into `OpenCL.DebugInfo.100` debug types.
//!
//! Lowering is memoized in the context: every canonical type gets at most one
//! debug node. Members, templates and template parameters are the exception
//! and go to the context's overflow list instead.

use smallvec::SmallVec;
use tracing::debug;

use crate::{ToString, format};
use crate::spirv::builder::ConstantBuilder;
use crate::spirv::context::SpirvContext;
use crate::spirv::debug::{BaseTypeEncoding, CompositeTag, DebugInfoFlags, DebugKind, DebugRef};
use crate::spirv::decl::{ConstValue, FieldDecl, MemberDecl, RecordDecl, TagKind};
use crate::spirv::module::{Phase, SpirvModule, Visitor};
use crate::spirv::types::{SpirvType, StructType, Ty};

pub struct DebugTypeVisitor<'c, 'a, B> {
    context: &'c SpirvContext<'a>,
    builder: &'c B,
}

impl<'c, 'a, B: ConstantBuilder<'a>> DebugTypeVisitor<'c, 'a, B> {
    pub fn new(context: &'c SpirvContext<'a>, builder: &'c B) -> Self {
        Self { context, builder }
    }

    /// Every debug instruction is an `OpExtInst` returning void.
    fn stamp(&self, node: DebugRef<'a>) {
        node.set_result_type(self.context.void_type());
        node.set_instruction_set(self.builder.debug_info_ext_inst_set());
    }

    fn basic(
        &self,
        ty: Ty<'a>,
        name: &str,
        size_in_bits: u32,
        encoding: BaseTypeEncoding,
    ) -> DebugRef<'a> {
        let size = self
            .builder
            .constant_int(self.context.uint_type(32), i64::from(size_in_bits));
        self.context
            .debug_type_basic(Some(ty), name, Some(size), encoding)
    }

    /// Returns the debug type for `ty`, lowering it on first request.
    ///
    /// Pointers have no debug representation and resolve to their pointee.
    /// Types that cannot be described yet share one `Unknown` placeholder.
    pub fn lower_to_debug_type(&self, ty: Ty<'a>) -> DebugRef<'a> {
        if let Some(node) = self.context.debug_type(ty) {
            return node;
        }

        let lowered = match ty {
            SpirvType::Bool => Some(self.basic(ty, "bool", 32, BaseTypeEncoding::Boolean)),
            SpirvType::Integer { bitwidth, signed } => {
                let prefix = if *signed { "int" } else { "uint" };
                let name = if *bitwidth == 32 {
                    prefix.to_string()
                } else {
                    format!("{}{}_t", prefix, bitwidth)
                };
                let encoding = if *signed {
                    BaseTypeEncoding::Signed
                } else {
                    BaseTypeEncoding::Unsigned
                };
                Some(self.basic(ty, &name, *bitwidth, encoding))
            }
            SpirvType::Float { bitwidth } => {
                let name = if *bitwidth == 32 {
                    "float".to_string()
                } else {
                    format!("float{}_t", bitwidth)
                };
                Some(self.basic(ty, &name, *bitwidth, BaseTypeEncoding::Float))
            }
            SpirvType::Struct(st) => match st.decl {
                Some(decl) if decl.is_enum() => self.lower_to_debug_type_enum(st),
                Some(decl) => Some(self.lower_to_debug_type_composite(ty, st, decl)),
                None => None,
            },
            SpirvType::Array { elem, count, .. } => {
                let element = self.lower_to_debug_type(*elem);
                Some(self.context.debug_type_array(ty, element, &[*count]))
            }
            SpirvType::Vector { elem, count } => {
                let element = self.lower_to_debug_type(*elem);
                Some(self.context.debug_type_vector(ty, element, *count))
            }
            SpirvType::Pointer { pointee, .. } => return self.lower_to_debug_type(*pointee),
            SpirvType::Function(fty) => {
                let return_type = if fty.return_type.is_void() {
                    None
                } else {
                    Some(self.lower_to_debug_type(fty.return_type))
                };
                let params: SmallVec<[DebugRef<'a>; 4]> = fty
                    .param_types
                    .iter()
                    .map(|&param| self.lower_to_debug_type(param))
                    .collect();
                Some(self.context.debug_type_function(
                    ty,
                    DebugInfoFlags::IS_PUBLIC,
                    return_type,
                    &params,
                ))
            }
            SpirvType::Void
            | SpirvType::Matrix { .. }
            | SpirvType::RuntimeArray { .. }
            | SpirvType::Image(_)
            | SpirvType::SampledImage { .. }
            | SpirvType::Sampler
            | SpirvType::AccelerationStructure
            | SpirvType::HybridPointer { .. }
            | SpirvType::HybridSampledImage { .. }
            | SpirvType::HybridStruct { .. } => None,
        };

        let node = lowered.unwrap_or_else(|| {
            debug!(ty = %ty, "no debug type representation, using placeholder");
            self.context
                .debug_type_basic(None, "Unknown", None, BaseTypeEncoding::Unspecified)
        });
        self.stamp(node);
        node
    }

    /// Enumerations have no debug lowering yet; callers fall back to the
    /// `Unknown` placeholder.
    pub fn lower_to_debug_type_enum(&self, _st: &StructType<'a>) -> Option<DebugRef<'a>> {
        None
    }

    pub fn lower_to_debug_type_composite(
        &self,
        ty: Ty<'a>,
        st: &StructType<'a>,
        decl: &'a RecordDecl<'a>,
    ) -> DebugRef<'a> {
        let tag = match decl.tag {
            TagKind::Struct => CompositeTag::Structure,
            TagKind::Class => CompositeTag::Class,
            TagKind::Union => CompositeTag::Union,
            TagKind::Enum => unreachable!("enum `{}` lowered as a composite", decl.name),
        };

        let info = self.context.debug_info_for(decl.location.file);
        // TODO: compute a mangled linkage name once records can be mangled.
        let node = self.context.debug_type_composite(
            ty,
            st.name,
            info.source,
            decl.location.line,
            decl.location.column,
            info.compilation_unit,
            st.name,
            0,
            DebugInfoFlags::visibility(decl.module_private),
            tag,
        );
        let Some(composite) = node.as_composite() else {
            panic!("debug type for struct `{}` is not a composite", st.name);
        };

        // Already populated by an earlier lowering.
        if composite.has_members() {
            return node;
        }

        let mut size_in_bits = 0u32;
        let mut offset_in_bits = 0u32;
        let mut visited: SmallVec<[*const FieldDecl<'a>; 4]> = SmallVec::new();
        let mut fields = st.fields.iter();

        for member in decl.members {
            let field_decl = match member {
                MemberDecl::Method(method) => {
                    let Some(function) = self.context.find_function_info(*method) else {
                        panic!(
                            "no debug function registered for method `{}::{}`",
                            decl.name, method.name
                        );
                    };
                    composite.push_member(function);
                    continue;
                }
                MemberDecl::Record(_) => continue,
                MemberDecl::Field(field_decl) => *field_decl,
            };

            let Some(field) = fields.next() else {
                panic!("struct `{}` has fewer fields than its declaration", st.name);
            };
            debug_assert!(
                field.decl.is_none_or(|d| core::ptr::eq(d, field_decl)),
                "field `{}` does not match its declaration",
                field_decl.name
            );

            let key: *const FieldDecl<'a> = field_decl;
            if visited.contains(&key) {
                continue;
            }
            visited.push(key);

            let field_type = self.lower_to_debug_type(field.ty);
            let field_size = field_type.size_in_bits();
            let field_offset = field
                .offset
                .map_or(offset_in_bits, |bytes| bytes.wrapping_mul(8));
            let value = field_decl.evaluate_value().and_then(|value| match value {
                ConstValue::Int(v) => Some(self.builder.constant_int(self.context.sint_type(32), v)),
                ConstValue::Float(v) => {
                    Some(self.builder.constant_float(self.context.float_type(32), v))
                }
                ConstValue::Bool(v) => {
                    Some(self.builder.constant_int(self.context.sint_type(32), i64::from(v)))
                }
                ConstValue::Other => None,
            });

            let location = field_decl.location;
            let member_node = self.context.debug_type_member(
                field.name.unwrap_or(field_decl.name),
                field_type,
                self.context.debug_info_for(location.file).source,
                location.line,
                location.column,
                node,
                field_offset,
                field_size,
                DebugInfoFlags::visibility(field_decl.module_private),
                value,
            );
            self.stamp(member_node);
            composite.push_member(member_node);

            offset_in_bits = field_offset.wrapping_add(field_size);
            size_in_bits = size_in_bits.max(offset_in_bits);
        }

        composite.set_size_in_bits(size_in_bits);
        debug!(
            name = st.name,
            members = composite.members().len(),
            size_in_bits,
            "lowered composite"
        );
        node
    }

    /// Appends the lowered debug types to `module`: type-keyed nodes first,
    /// then overflow nodes, each in creation order.
    fn flush(&self, module: &mut SpirvModule<'a>) {
        for node in self.context.debug_types() {
            module.add_debug_info(node);
        }
        for node in self.context.overflow_debug_types() {
            module.add_debug_info(node);
        }
    }
}

impl<'c, 'a, B: ConstantBuilder<'a>> Visitor<'a> for DebugTypeVisitor<'c, 'a, B> {
    fn visit_module(&mut self, module: &mut SpirvModule<'a>, phase: Phase) -> bool {
        if phase == Phase::Done {
            self.flush(module);
        }
        true
    }

    fn visit_instruction(&mut self, instruction: DebugRef<'a>) -> bool {
        self.stamp(instruction);

        // Only variables and functions refer to a type that needs lowering.
        let ty = match instruction.kind() {
            DebugKind::GlobalVariable(var) => var.variable_type,
            DebugKind::LocalVariable(var) => var.variable_type,
            DebugKind::Function(function) => function.function_type,
            _ => None,
        };
        if let Some(ty) = ty {
            let debug_type = self.lower_to_debug_type(ty);
            instruction.set_debug_type(debug_type);
        }
        true
    }
}
