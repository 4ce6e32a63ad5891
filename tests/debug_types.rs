use bumpalo::Bump;
use lumen::spirv::{
    DebugInfoFlags, FieldDecl, MemberDecl, RecordDecl, SourceLocation, SpirvBuilder, SpirvContext,
    SpirvModule, StorageClass, StructField, StructInterfaceType, TagKind,
};
use pretty_assertions::assert_eq;

#[test]
fn test_struct_of_int_and_float() {
    let arena = Bump::new();
    let context = SpirvContext::new(&arena);
    let info = context.debug_info_for("scene.hlsl");

    let a: &FieldDecl = arena.alloc(FieldDecl::new("a", SourceLocation::new("scene.hlsl", 2, 9)));
    let b: &FieldDecl = arena.alloc(FieldDecl::new("b", SourceLocation::new("scene.hlsl", 3, 11)));
    let members = arena.alloc_slice_copy(&[MemberDecl::Field(a), MemberDecl::Field(b)]);
    let decl: &RecordDecl = arena.alloc(RecordDecl::new(
        "S",
        TagKind::Struct,
        SourceLocation::new("scene.hlsl", 1, 8),
        members,
    ));
    let s = context.record_struct_type(
        decl,
        &[
            StructField::new(context.sint_type(32), Some("a"), None).with_decl(a),
            StructField::new(context.float_type(32), Some("b"), None).with_decl(b),
        ],
        "S",
        false,
        StructInterfaceType::InternalStorage,
    );

    let var = context.debug_local_variable(
        "s",
        info.source,
        6,
        7,
        info.compilation_unit,
        DebugInfoFlags::empty(),
        None,
        Some(context.pointer_type(s, StorageClass::Function)),
    );
    let builder = SpirvBuilder::new(&arena);
    let mut module = SpirvModule::new();
    module.add_debug_info(var);
    assert!(lumen::lower_debug_types(&context, &builder, &mut module));

    let node = var.debug_type().unwrap();
    let composite = node.as_composite().unwrap();
    assert_eq!(composite.size_in_bits(), 64);

    let layout: Vec<_> = composite
        .members()
        .iter()
        .map(|m| {
            let member = m.as_member().unwrap();
            (member.name, member.offset_in_bits, member.size_in_bits)
        })
        .collect();
    assert_eq!(layout, vec![("a", 0, 32), ("b", 32, 32)]);

    // The variable, then S, int and float, then both members.
    assert_eq!(module.debug_infos().len(), 6);
}

#[test]
fn test_lowering_twice_reuses_nodes() {
    let arena = Bump::new();
    let context = SpirvContext::new(&arena);
    let info = context.debug_info_for("a.hlsl");

    let float2 = context.vector_type(context.float_type(32), 2);
    let uv = context.debug_local_variable(
        "uv",
        info.source,
        1,
        1,
        info.compilation_unit,
        DebugInfoFlags::empty(),
        None,
        Some(float2),
    );
    let st = context.debug_local_variable(
        "st",
        info.source,
        2,
        1,
        info.compilation_unit,
        DebugInfoFlags::empty(),
        None,
        Some(float2),
    );

    let builder = SpirvBuilder::new(&arena);
    let mut module = SpirvModule::new();
    module.add_debug_info(uv);
    module.add_debug_info(st);
    assert!(lumen::lower_debug_types(&context, &builder, &mut module));

    assert!(core::ptr::eq(
        uv.debug_type().unwrap(),
        st.debug_type().unwrap()
    ));
    // float and float2
    assert_eq!(context.debug_types().len(), 2);
}

#[test]
fn test_passes_share_one_instruction_set() {
    let arena = Bump::new();
    let context = SpirvContext::new(&arena);
    let builder = SpirvBuilder::new(&arena);
    let info = context.debug_info_for("a.hlsl");

    let local = |name: &'static str, ty| {
        context.debug_local_variable(
            name,
            info.source,
            1,
            1,
            info.compilation_unit,
            DebugInfoFlags::empty(),
            None,
            Some(ty),
        )
    };
    let first = local("x", context.float_type(32));
    let second = local("n", context.sint_type(32));

    let mut module = SpirvModule::new();
    module.add_debug_info(first);
    assert!(lumen::lower_debug_types(&context, &builder, &mut module));

    let mut module = SpirvModule::new();
    module.add_debug_info(second);
    assert!(lumen::lower_debug_types(&context, &builder, &mut module));

    let set = first.instruction_set().unwrap();
    assert!(core::ptr::eq(second.instruction_set().unwrap(), set));
    assert!(core::ptr::eq(
        second.debug_type().unwrap().instruction_set().unwrap(),
        set
    ));
}

#[test]
fn test_scope_underflow_is_an_error() {
    let arena = Bump::new();
    let context = SpirvContext::new(&arena);
    let info = context.debug_info_for("a.hlsl");

    let err = context.pop_debug_lexical_scope(info).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot pop the compilation unit scope of `a.hlsl`"
    );
}
