use super::context::SpirvContext;
use super::debug::{BaseTypeEncoding, CompositeTag, DebugInfoFlags, DebugKind};
use super::decl::{MethodDecl, RecordDecl, SourceLocation, SourceType, TagKind};
use super::types::{
    Dim, HybridField, ImageFormat, SpirvType, StorageClass, StructField, StructInterfaceType,
    WithDepth, WithSampler,
};
use crate::error::DebugInfoError;
use crate::options::{ContextOptions, ShaderModelKind};
use crate::test_utils::init_test_logging;
use alloc::string::ToString;
use bumpalo::Bump;
use pretty_assertions::assert_eq;

#[test]
fn test_interning_scalars() {
    init_test_logging();
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let int32 = context.sint_type(32);
    let uint32 = context.uint_type(32);
    assert!(!core::ptr::eq(int32, uint32));
    assert!(core::ptr::eq(int32, context.sint_type(32)));
    assert_eq!(context.types().len(), 2);

    let half = context.float_type(16);
    let double = context.float_type(64);
    assert!(!core::ptr::eq(half, double));
    assert!(core::ptr::eq(double, context.float_type(64)));
    assert_eq!(
        *context.uint_type(64),
        SpirvType::Integer {
            bitwidth: 64,
            signed: false
        }
    );
}

#[test]
fn test_singletons() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    assert!(core::ptr::eq(context.void_type(), context.void_type()));
    assert!(core::ptr::eq(context.bool_type(), context.bool_type()));
    assert!(core::ptr::eq(context.sampler_type(), context.sampler_type()));
    assert!(core::ptr::eq(
        context.acceleration_structure_type(),
        context.acceleration_structure_type()
    ));
    assert_eq!(context.types().len(), 4);
}

#[test]
#[should_panic(expected = "unsupported bitwidth")]
fn test_eight_bit_integer_is_rejected() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    context.sint_type(8);
}

#[test]
#[should_panic(expected = "unsupported bitwidth")]
fn test_non_power_of_two_float_is_rejected() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    context.float_type(24);
}

#[test]
fn test_interning_vectors() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let float = context.float_type(32);
    let v3 = context.vector_type(float, 3);
    let v4 = context.vector_type(float, 4);
    assert!(core::ptr::eq(v3, context.vector_type(float, 3)));
    assert!(!core::ptr::eq(v3, v4));
    assert!(!core::ptr::eq(v3, context.vector_type(context.sint_type(32), 3)));
    assert_eq!(v3.to_string(), "v3float");
}

#[test]
#[should_panic(expected = "vector element must be a scalar")]
fn test_vector_of_vectors_is_rejected() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    let v2 = context.vector_type(context.float_type(32), 2);
    context.vector_type(v2, 2);
}

#[test]
#[should_panic(expected = "vector must have 2, 3 or 4 components")]
fn test_five_component_vector_is_rejected() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    context.vector_type(context.float_type(32), 5);
}

#[test]
fn test_matrix_redirection() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let int3 = context.vector_type(context.sint_type(32), 3);
    let int_matrix = context.matrix_type(int3, 3);
    assert!(core::ptr::eq(int_matrix, context.array_type(int3, 3, None)));
    assert!(matches!(int_matrix, SpirvType::Array { count: 3, .. }));

    let float3 = context.vector_type(context.float_type(32), 3);
    let float_matrix = context.matrix_type(float3, 3);
    assert!(matches!(float_matrix, SpirvType::Matrix { count: 3, .. }));
    assert!(core::ptr::eq(float_matrix, context.matrix_type(float3, 3)));
    assert!(!core::ptr::eq(float_matrix, context.matrix_type(float3, 4)));
    assert!(!core::ptr::eq(
        float_matrix,
        context.array_type(float3, 3, None)
    ));
}

#[test]
#[should_panic(expected = "matrix column must be a vector")]
fn test_matrix_of_scalars_is_rejected() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    context.matrix_type(context.float_type(32), 2);
}

#[test]
fn test_interning_arrays() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let float = context.float_type(32);
    let arr = context.array_type(float, 4, None);
    assert!(core::ptr::eq(arr, context.array_type(float, 4, None)));
    assert!(!core::ptr::eq(arr, context.array_type(float, 4, Some(16))));
    assert!(!core::ptr::eq(arr, context.array_type(float, 8, None)));

    let runtime = context.runtime_array_type(float, Some(4));
    assert!(core::ptr::eq(runtime, context.runtime_array_type(float, Some(4))));
    assert!(!core::ptr::eq(runtime, context.runtime_array_type(float, None)));
    assert_eq!(arr.to_string(), "_arr_float_4");
}

#[test]
fn test_interning_images() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let float = context.float_type(32);
    let texture = context.image_type(
        float,
        Dim::Dim2D,
        WithDepth::No,
        false,
        false,
        WithSampler::Yes,
        ImageFormat::Unknown,
    );
    let same = context.image_type(
        float,
        Dim::Dim2D,
        WithDepth::No,
        false,
        false,
        WithSampler::Yes,
        ImageFormat::Unknown,
    );
    let arrayed = context.image_type(
        float,
        Dim::Dim2D,
        WithDepth::No,
        true,
        false,
        WithSampler::Yes,
        ImageFormat::Unknown,
    );
    assert!(core::ptr::eq(texture, same));
    assert!(!core::ptr::eq(texture, arrayed));

    let sampled = context.sampled_image_type(texture);
    assert!(core::ptr::eq(sampled, context.sampled_image_type(texture)));
    assert!(!core::ptr::eq(sampled, context.sampled_image_type(arrayed)));
}

#[test]
#[should_panic(expected = "image sampled type must be an integer or float")]
fn test_image_of_bool_is_rejected() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    context.image_type(
        context.bool_type(),
        Dim::Dim2D,
        WithDepth::No,
        false,
        false,
        WithSampler::Yes,
        ImageFormat::Unknown,
    );
}

#[test]
fn test_interning_structs() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let int = context.sint_type(32);
    let float = context.float_type(32);
    let fields = [
        StructField::new(int, Some("a"), None),
        StructField::new(float, Some("b"), None),
    ];

    let s = context.struct_type(&fields, "S", false, StructInterfaceType::InternalStorage);
    let fields_again = [
        StructField::new(int, Some("a"), None),
        StructField::new(float, Some("b"), None),
    ];
    assert!(core::ptr::eq(
        s,
        context.struct_type(&fields_again, "S", false, StructInterfaceType::InternalStorage)
    ));

    // Name, interface and access all take part in identity.
    assert!(!core::ptr::eq(
        s,
        context.struct_type(&fields, "T", false, StructInterfaceType::InternalStorage)
    ));
    assert!(!core::ptr::eq(
        s,
        context.struct_type(&fields, "S", false, StructInterfaceType::UniformBuffer)
    ));
    assert!(!core::ptr::eq(
        s,
        context.struct_type(&fields, "S", true, StructInterfaceType::InternalStorage)
    ));

    let decl: &RecordDecl = bump.alloc(RecordDecl::new(
        "S",
        TagKind::Struct,
        SourceLocation::new("s.hlsl", 1, 8),
        &[],
    ));
    let from_record = context.record_struct_type(
        decl,
        &fields,
        "S",
        false,
        StructInterfaceType::InternalStorage,
    );
    assert!(core::ptr::eq(s, from_record));
}

#[test]
fn test_interning_pointers() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let int = context.sint_type(32);
    let function_ptr = context.pointer_type(int, StorageClass::Function);
    assert!(core::ptr::eq(
        function_ptr,
        context.pointer_type(int, StorageClass::Function)
    ));
    assert!(!core::ptr::eq(
        function_ptr,
        context.pointer_type(int, StorageClass::Private)
    ));
    assert!(!core::ptr::eq(
        function_ptr,
        context.pointer_type(context.uint_type(32), StorageClass::Function)
    ));
    assert_eq!(function_ptr.to_string(), "_ptr_Function_int");
}

#[test]
fn test_interning_functions() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let void = context.void_type();
    let int = context.sint_type(32);
    let float = context.float_type(32);

    let f = {
        let params = vec![int, float];
        context.function_type(void, &params, false)
    };
    let g = {
        let params = vec![int, float];
        context.function_type(void, &params, false)
    };
    assert!(core::ptr::eq(f, g));
    assert!(!core::ptr::eq(f, context.function_type(void, &[int, float], true)));
    assert!(!core::ptr::eq(f, context.function_type(void, &[float, int], false)));
    assert!(!core::ptr::eq(f, context.function_type(int, &[int, float], false)));
    assert_eq!(f.to_string(), "fn(int, float) -> void");
}

#[test]
fn test_hybrid_types_are_not_interned() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let pointee = SourceType::Named("float4");
    let a = context.hybrid_pointer_type(pointee, StorageClass::Private);
    let b = context.hybrid_pointer_type(pointee, StorageClass::Private);
    assert!(!core::ptr::eq(a, b));
    assert_eq!(a, b);
    assert!(a.is_hybrid());

    let fields = [HybridField {
        source_type: SourceType::Named("float4"),
        name: Some("color"),
        offset: None,
    }];
    let s = context.hybrid_struct_type(&fields, "PSInput", false, StructInterfaceType::InternalStorage);
    let t = context.hybrid_struct_type(&fields, "PSInput", false, StructInterfaceType::InternalStorage);
    assert!(!core::ptr::eq(s, t));

    let image = context.hybrid_sampled_image_type(SourceType::Named("Texture2D<float4>"));
    assert_eq!(image.to_string(), "type.sampled.Texture2D<float4>");

    assert!(context.types().is_empty());
}

#[test]
fn test_byte_address_buffers() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let rw = context.byte_address_buffer_type(true);
    let ro = context.byte_address_buffer_type(false);
    assert!(!core::ptr::eq(rw, ro));
    assert!(core::ptr::eq(rw, context.byte_address_buffer_type(true)));

    let rw_struct = rw.as_struct().unwrap();
    assert_eq!(rw_struct.name, "type.RWByteAddressBuffer");
    assert!(!rw_struct.read_only);
    assert_eq!(rw_struct.interface, StructInterfaceType::StorageBuffer);
    assert_eq!(rw_struct.fields.len(), 1);
    assert_eq!(rw_struct.fields[0].offset, Some(0));
    assert!(core::ptr::eq(
        rw_struct.fields[0].ty,
        context.runtime_array_type(context.uint_type(32), Some(4))
    ));

    let ro_struct = ro.as_struct().unwrap();
    assert_eq!(ro_struct.name, "type.ByteAddressBuffer");
    assert!(ro_struct.read_only);
}

#[test]
fn test_acs_buffer_counter() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let counter = context.acs_buffer_counter_type();
    assert!(core::ptr::eq(counter, context.acs_buffer_counter_type()));

    let st = counter.as_struct().unwrap();
    assert_eq!(st.name, "type.ACSBuffer.counter");
    assert_eq!(st.interface, StructInterfaceType::StorageBuffer);
    assert_eq!(st.fields[0].name, Some("counter"));
    assert!(core::ptr::eq(st.fields[0].ty, context.sint_type(32)));
}

#[test]
fn test_types_in_creation_order() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let float = context.float_type(32);
    let v4 = context.vector_type(float, 4);
    let ptr = context.pointer_type(v4, StorageClass::Input);
    context.vector_type(float, 4);

    let names: Vec<_> = context.types().iter().map(|ty| ty.to_string()).collect();
    assert_eq!(names, vec!["float", "v4float", "_ptr_Input_v4float"]);
    assert!(core::ptr::eq(context.types()[2], ptr));
}

#[test]
fn test_arena_helpers() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let a = context.intern_str("main");
    let owned = "main".to_string();
    assert!(core::ptr::eq(a, context.intern_str(&owned)));

    let block = context.allocate(24, 8);
    assert_eq!(block.as_ptr() as usize % 8, 0);
    context.deallocate(block);

    let value = context.alloc(42u64);
    assert_eq!(*value, 42);
}

#[test]
fn test_shader_model_options() {
    let bump = Bump::new();
    let context = SpirvContext::with_options(
        &bump,
        ContextOptions::with_profile(ShaderModelKind::Pixel, 6, 2),
    );
    assert!(context.is_ps());
    assert!(!context.is_vs());
    assert_eq!(context.major_version(), 6);
    assert_eq!(context.minor_version(), 2);

    context.set_current_shader_model_kind(ShaderModelKind::ClosestHit);
    context.set_minor_version(5);
    assert!(context.is_ray());
    assert!(!context.is_ps());
    assert_eq!(context.minor_version(), 5);
    assert_eq!(context.options().dwarf_version, 4);
}

// ============================================================================
// Debug-info registry
// ============================================================================

#[test]
fn test_debug_info_for_creates_compilation_unit() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    let info = context.debug_info_for("main.hlsl");
    assert!(core::ptr::eq(info, context.debug_info_for("main.hlsl")));
    assert_eq!(info.file, "main.hlsl");
    assert_eq!(info.scope_depth(), 1);
    assert!(core::ptr::eq(info.innermost_scope(), info.compilation_unit));

    match info.compilation_unit.kind() {
        DebugKind::CompilationUnit(cu) => {
            assert_eq!(cu.spirv_version, 0x10000);
            assert_eq!(cu.dwarf_version, 4);
            assert_eq!(cu.language, 5);
            assert!(core::ptr::eq(cu.source, info.source));
        }
        other => panic!("expected a compilation unit, got {:?}", other),
    }
}

#[test]
fn test_debug_infos_keep_first_touch_order() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);

    context.debug_info_for("b.hlsl");
    context.debug_info_for("a.hlsl");
    context.debug_info_for("b.hlsl");
    context.debug_info_for("c.hlsli");

    let files: Vec<_> = context.debug_infos().iter().map(|info| info.file).collect();
    assert_eq!(files, vec!["b.hlsl", "a.hlsl", "c.hlsli"]);
}

#[test]
fn test_scope_stack() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    let info = context.debug_info_for("main.hlsl");
    assert!(context.current_lexical_scope().is_none());

    let outer = context.debug_lexical_block(info.source, 3, 1, info.compilation_unit);
    let inner = context.debug_lexical_block(info.source, 4, 5, outer);
    context.push_debug_lexical_scope(info, outer);
    context.push_debug_lexical_scope(info, inner);
    assert_eq!(info.scope_depth(), 3);
    assert!(core::ptr::eq(context.current_lexical_scope().unwrap(), inner));

    context.pop_debug_lexical_scope(info).unwrap();
    assert_eq!(info.scope_depth(), 2);
    assert!(core::ptr::eq(context.current_lexical_scope().unwrap(), outer));

    context.pop_debug_lexical_scope(info).unwrap();
    assert_eq!(info.scope_depth(), 1);
    assert!(core::ptr::eq(
        context.current_lexical_scope().unwrap(),
        info.compilation_unit
    ));

    assert_eq!(
        context.pop_debug_lexical_scope(info),
        Err(DebugInfoError::ScopeUnderflow {
            file: "main.hlsl".to_string()
        })
    );
    assert_eq!(info.scope_depth(), 1);
}

#[test]
fn test_current_scope_is_shared_across_files() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    let a = context.debug_info_for("a.hlsl");
    let b = context.debug_info_for("b.hlsl");

    let block_a = context.debug_lexical_block(a.source, 1, 1, a.compilation_unit);
    let block_b = context.debug_lexical_block(b.source, 1, 1, b.compilation_unit);
    context.push_debug_lexical_scope(a, block_a);
    context.push_debug_lexical_scope(b, block_b);
    assert!(core::ptr::eq(context.current_lexical_scope().unwrap(), block_b));
    assert!(core::ptr::eq(a.innermost_scope(), block_a));
}

#[test]
fn test_basic_debug_types_are_reused() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    let int = context.sint_type(32);

    let node = context.debug_type_basic(Some(int), "int", None, BaseTypeEncoding::Signed);
    let again = context.debug_type_basic(Some(int), "ignored", None, BaseTypeEncoding::Signed);
    assert!(core::ptr::eq(node, again));
    assert!(core::ptr::eq(context.debug_type(int).unwrap(), node));

    let unknown = context.debug_type_basic(None, "Unknown", None, BaseTypeEncoding::Unspecified);
    assert!(core::ptr::eq(
        unknown,
        context.debug_type_basic(None, "Unknown", None, BaseTypeEncoding::Unspecified)
    ));
    assert_eq!(context.debug_types().len(), 2);
    assert!(context.overflow_debug_types().is_empty());
}

#[test]
fn test_record_debug_type() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    let float = context.float_type(32);
    let ptr = context.pointer_type(float, StorageClass::Function);

    assert!(context.debug_type(float).is_none());
    let node = context.debug_type_basic(Some(float), "float", None, BaseTypeEncoding::Float);
    context.record_debug_type(ptr, node);
    assert!(core::ptr::eq(context.debug_type(ptr).unwrap(), node));
}

#[test]
fn test_debug_type_template() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    let info = context.debug_info_for("t.hlsl");

    let int = context.sint_type(32);
    let fields = [StructField::new(int, Some("value"), None)];
    let box_ty = context.struct_type(&fields, "Box", false, StructInterfaceType::InternalStorage);
    let composite = context.debug_type_composite(
        box_ty,
        "Box",
        info.source,
        2,
        8,
        info.compilation_unit,
        "Box",
        0,
        DebugInfoFlags::IS_PUBLIC,
        CompositeTag::Structure,
    );

    let template = context.debug_type_template(box_ty, composite).unwrap();
    assert!(core::ptr::eq(
        template,
        context.debug_type_template(box_ty, composite).unwrap()
    ));
    assert!(core::ptr::eq(
        composite.as_composite().unwrap().type_template().unwrap(),
        template
    ));

    let param = context.debug_type_template_parameter("T", Some(int), None, info.source, 1, 10);
    template.as_template().unwrap().push_param(param);
    assert_eq!(template.as_template().unwrap().params().len(), 1);

    // Templates and parameters are not keyed by type.
    let overflow = context.overflow_debug_types();
    assert_eq!(overflow.len(), 2);
    assert!(core::ptr::eq(overflow[0], template));
    assert!(core::ptr::eq(overflow[1], param));
    assert_eq!(context.debug_types().len(), 1);
}

#[test]
fn test_debug_type_template_errors() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    let info = context.debug_info_for("t.hlsl");
    let int = context.sint_type(32);
    let uint = context.uint_type(32);

    let basic = context.debug_type_basic(Some(int), "int", None, BaseTypeEncoding::Signed);
    assert_eq!(
        context
            .debug_type_template(uint, info.compilation_unit)
            .unwrap_err(),
        DebugInfoError::UnregisteredType {
            ty: "uint".to_string()
        }
    );
    assert_eq!(
        context.debug_type_template(int, basic).unwrap_err(),
        DebugInfoError::NotAComposite {
            ty: "int".to_string()
        }
    );
    assert!(context.overflow_debug_types().is_empty());
}

#[test]
fn test_function_info() {
    let bump = Bump::new();
    let context = SpirvContext::new(&bump);
    let info = context.debug_info_for("m.hlsl");

    let method: &MethodDecl = bump.alloc(MethodDecl::new(
        "get",
        SourceLocation::new("m.hlsl", 4, 5),
    ));
    let other: &MethodDecl = bump.alloc(MethodDecl::new(
        "get",
        SourceLocation::new("m.hlsl", 4, 5),
    ));
    let function = context.debug_function(
        "get",
        info.source,
        4,
        5,
        info.compilation_unit,
        "get",
        DebugInfoFlags::IS_PUBLIC,
        4,
        None,
    );

    assert!(context.find_function_info(method).is_none());
    context.save_function_info(method, function);
    assert!(core::ptr::eq(context.find_function_info(method).unwrap(), function));
    assert!(context.find_function_info(other).is_none());
}
