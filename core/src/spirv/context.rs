use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;
use core::alloc::Layout;
use core::cell::{Cell, OnceCell, RefCell};
use core::ptr::NonNull;
use core::hash::{Hash, Hasher};
use hashbrown::{DefaultHashBuilder, Equivalent, HashMap, HashSet};
use indexmap::IndexMap;
use tracing::trace;

use crate::Vec;
use crate::options::{ContextOptions, ShaderModelKind};
use crate::spirv::debug::DebugRef;
use crate::spirv::decl::{MethodDecl, RecordDecl, SourceType};
use crate::spirv::types::{
    ById, Dim, FunctionType, HybridField, ImageFormat, ImageType, SpirvType, StorageClass,
    StructField, StructInterfaceType, StructType, Ty, WithDepth, WithSampler,
};

mod debug_info;

pub use debug_info::RichDebugInfo;

type ArenaMap<'a, K, V> = HashMap<K, V, DefaultHashBuilder, &'a Bump>;
type TypeSet<'a> = HashSet<Ty<'a>, DefaultHashBuilder, &'a Bump>;

/// Owns every SPIR-V type and debug-info node created during one compilation.
///
/// Everything is allocated from the borrowed arena and never freed
/// individually; the arena releases it all at once when the compilation is
/// over. Handles returned by the context are plain `&'a` references, and
/// canonical types can be compared with [`core::ptr::eq`].
///
/// The context is single-threaded: tables sit behind `RefCell`s and every
/// method runs to completion before returning.
pub struct SpirvContext<'a> {
    arena: &'a Bump,
    options: Cell<ContextOptions>,
    interned_strs: RefCell<ArenaMap<'a, &'a str, &'a str>>,
    // Every canonical type in creation order.
    all_types: RefCell<BumpVec<'a, Ty<'a>>>,

    void_type: OnceCell<Ty<'a>>,
    bool_type: OnceCell<Ty<'a>>,
    sampler_type: OnceCell<Ty<'a>>,
    acceleration_structure_type: OnceCell<Ty<'a>>,

    // Slot i holds the type of bitwidth 2^i. Slots 0..=3 stay empty.
    sint_types: [Cell<Option<Ty<'a>>>; 7],
    uint_types: [Cell<Option<Ty<'a>>>; 7],
    float_types: [Cell<Option<Ty<'a>>>; 7],

    // Indexed by component count; slots 0 and 1 stay empty.
    vec_types: RefCell<ArenaMap<'a, ById<'a>, [Option<Ty<'a>>; 5]>>,
    mat_types: RefCell<ArenaMap<'a, ById<'a>, BumpVec<'a, Ty<'a>>>>,
    image_types: RefCell<TypeSet<'a>>,
    sampled_image_types: RefCell<ArenaMap<'a, ById<'a>, Ty<'a>>>,
    array_types: RefCell<TypeSet<'a>>,
    runtime_array_types: RefCell<TypeSet<'a>>,
    struct_types: RefCell<BumpVec<'a, Ty<'a>>>,
    pointer_types: RefCell<ArenaMap<'a, ById<'a>, ArenaMap<'a, StorageClass, Ty<'a>>>>,
    function_types: RefCell<TypeSet<'a>>,

    // Per-file debug info, in first-touch order.
    debug_info: RefCell<IndexMap<&'a str, &'a RichDebugInfo<'a>, DefaultHashBuilder>>,
    current_lexical_scope: Cell<Option<DebugRef<'a>>>,
    // `None` keys the shared "Unknown" placeholder.
    debug_types: RefCell<IndexMap<Option<ById<'a>>, DebugRef<'a>, DefaultHashBuilder>>,
    // Members, templates and template parameters: nodes with no type of their own.
    tail_debug_types: RefCell<BumpVec<'a, DebugRef<'a>>>,
    method_debug_functions: RefCell<ArenaMap<'a, *const MethodDecl<'a>, DebugRef<'a>>>,
}

/// Structural lookup key for a type whose operands may not live in the arena
/// yet, such as a caller's parameter slice.
struct Probe<'p>(SpirvType<'p>);

impl Hash for Probe<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<'a> Equivalent<Ty<'a>> for Probe<'_> {
    fn equivalent(&self, key: &Ty<'a>) -> bool {
        self.0 == **key
    }
}

fn log2_for_bitwidth(bitwidth: u32) -> usize {
    assert!(
        (16..=64).contains(&bitwidth) && bitwidth.is_power_of_two(),
        "unsupported bitwidth {}",
        bitwidth
    );
    bitwidth.trailing_zeros() as usize
}

impl<'a> SpirvContext<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self::with_options(arena, ContextOptions::default())
    }

    pub fn with_options(arena: &'a Bump, options: ContextOptions) -> Self {
        Self {
            arena,
            options: Cell::new(options),
            interned_strs: RefCell::new(HashMap::new_in(arena)),
            all_types: RefCell::new(BumpVec::new_in(arena)),
            void_type: OnceCell::new(),
            bool_type: OnceCell::new(),
            sampler_type: OnceCell::new(),
            acceleration_structure_type: OnceCell::new(),
            sint_types: Default::default(),
            uint_types: Default::default(),
            float_types: Default::default(),
            vec_types: RefCell::new(HashMap::new_in(arena)),
            mat_types: RefCell::new(HashMap::new_in(arena)),
            image_types: RefCell::new(HashSet::new_in(arena)),
            sampled_image_types: RefCell::new(HashMap::new_in(arena)),
            array_types: RefCell::new(HashSet::new_in(arena)),
            runtime_array_types: RefCell::new(HashSet::new_in(arena)),
            struct_types: RefCell::new(BumpVec::new_in(arena)),
            pointer_types: RefCell::new(HashMap::new_in(arena)),
            function_types: RefCell::new(HashSet::new_in(arena)),
            debug_info: RefCell::new(IndexMap::with_hasher(DefaultHashBuilder::default())),
            current_lexical_scope: Cell::new(None),
            debug_types: RefCell::new(IndexMap::with_hasher(DefaultHashBuilder::default())),
            tail_debug_types: RefCell::new(BumpVec::new_in(arena)),
            method_debug_functions: RefCell::new(HashMap::new_in(arena)),
        }
    }

    // ========================================================================
    // Arena
    // ========================================================================

    pub fn arena(&self) -> &'a Bump {
        self.arena
    }

    /// Raw arena memory. The block lives until the arena is dropped.
    pub fn allocate(&self, size: usize, align: usize) -> NonNull<u8> {
        let layout = Layout::from_size_align(size, align).unwrap_or_else(|_| {
            panic!("invalid allocation layout: size {} align {}", size, align)
        });
        self.arena.alloc_layout(layout)
    }

    /// Arena memory is only released in bulk; this does nothing.
    pub fn deallocate(&self, _ptr: NonNull<u8>) {}

    pub fn alloc<T>(&self, value: T) -> &'a T {
        self.arena.alloc(value)
    }

    pub fn intern_str(&self, s: &str) -> &'a str {
        if let Some(&interned_str) = self.interned_strs.borrow().get(s) {
            return interned_str;
        }
        let arena_str = self.arena.alloc_str(s);
        self.interned_strs.borrow_mut().insert(arena_str, arena_str);
        arena_str
    }

    fn alloc_type(&self, ty: SpirvType<'a>) -> Ty<'a> {
        let arena_ty: Ty<'a> = self.arena.alloc(ty);
        self.all_types.borrow_mut().push(arena_ty);
        trace!(ty = %arena_ty, "interned type");
        arena_ty
    }

    fn intern_in(&self, table: &RefCell<TypeSet<'a>>, probe: SpirvType<'a>) -> Ty<'a> {
        if let Some(&interned_ty) = table.borrow().get(&probe) {
            return interned_ty;
        }
        let ty = self.alloc_type(probe);
        table.borrow_mut().insert(ty);
        ty
    }

    /// Every canonical type created so far, in creation order. Hybrid types
    /// are not included.
    pub fn types(&self) -> Vec<Ty<'a>> {
        self.all_types.borrow().iter().copied().collect()
    }

    // ========================================================================
    // Scalars and other singletons
    // ========================================================================

    pub fn void_type(&self) -> Ty<'a> {
        *self
            .void_type
            .get_or_init(|| self.alloc_type(SpirvType::Void))
    }

    pub fn bool_type(&self) -> Ty<'a> {
        *self
            .bool_type
            .get_or_init(|| self.alloc_type(SpirvType::Bool))
    }

    pub fn sampler_type(&self) -> Ty<'a> {
        *self
            .sampler_type
            .get_or_init(|| self.alloc_type(SpirvType::Sampler))
    }

    pub fn acceleration_structure_type(&self) -> Ty<'a> {
        *self
            .acceleration_structure_type
            .get_or_init(|| self.alloc_type(SpirvType::AccelerationStructure))
    }

    fn scalar_in(&self, slot: &Cell<Option<Ty<'a>>>, ty: SpirvType<'a>) -> Ty<'a> {
        if let Some(interned_ty) = slot.get() {
            return interned_ty;
        }
        let interned_ty = self.alloc_type(ty);
        slot.set(Some(interned_ty));
        interned_ty
    }

    pub fn sint_type(&self, bitwidth: u32) -> Ty<'a> {
        let slot = &self.sint_types[log2_for_bitwidth(bitwidth)];
        self.scalar_in(
            slot,
            SpirvType::Integer {
                bitwidth,
                signed: true,
            },
        )
    }

    pub fn uint_type(&self, bitwidth: u32) -> Ty<'a> {
        let slot = &self.uint_types[log2_for_bitwidth(bitwidth)];
        self.scalar_in(
            slot,
            SpirvType::Integer {
                bitwidth,
                signed: false,
            },
        )
    }

    pub fn float_type(&self, bitwidth: u32) -> Ty<'a> {
        let slot = &self.float_types[log2_for_bitwidth(bitwidth)];
        self.scalar_in(slot, SpirvType::Float { bitwidth })
    }

    // ========================================================================
    // Composite types
    // ========================================================================

    pub fn vector_type(&self, elem: Ty<'a>, count: u32) -> Ty<'a> {
        assert!(elem.is_scalar(), "vector element must be a scalar, got {}", elem);
        assert!(
            (2..=4).contains(&count),
            "vector must have 2, 3 or 4 components, got {}",
            count
        );

        if let Some(interned_ty) = self
            .vec_types
            .borrow()
            .get(&ById(elem))
            .and_then(|by_count| by_count[count as usize])
        {
            return interned_ty;
        }
        let ty = self.alloc_type(SpirvType::Vector { elem, count });
        self.vec_types
            .borrow_mut()
            .entry(ById(elem))
            .or_insert([None; 5])[count as usize] = Some(ty);
        ty
    }

    /// A matrix with `count` columns of type `vec`.
    ///
    /// SPIR-V only has float matrices. For any other component type this
    /// returns an array of `count` vectors instead.
    pub fn matrix_type(&self, vec: Ty<'a>, count: u32) -> Ty<'a> {
        let SpirvType::Vector { elem, .. } = vec else {
            panic!("matrix column must be a vector, got {}", vec);
        };
        assert!(
            (2..=4).contains(&count),
            "matrix must have 2, 3 or 4 columns, got {}",
            count
        );

        if !elem.is_float() {
            return self.array_type(vec, count, None);
        }

        let probe = SpirvType::Matrix { vec, count };
        if let Some(interned_ty) = self.mat_types.borrow().get(&ById(vec)).and_then(|cached| {
            cached
                .iter()
                .copied()
                .find(|cached_ty| **cached_ty == probe)
        }) {
            return interned_ty;
        }
        let ty = self.alloc_type(probe);
        self.mat_types
            .borrow_mut()
            .entry(ById(vec))
            .or_insert_with(|| BumpVec::new_in(self.arena))
            .push(ty);
        ty
    }

    #[allow(clippy::too_many_arguments)]
    pub fn image_type(
        &self,
        sampled_type: Ty<'a>,
        dim: Dim,
        depth: WithDepth,
        arrayed: bool,
        multisampled: bool,
        sampled: WithSampler,
        format: ImageFormat,
    ) -> Ty<'a> {
        assert!(
            sampled_type.is_numerical(),
            "image sampled type must be an integer or float, got {}",
            sampled_type
        );
        let probe = SpirvType::Image(ImageType {
            sampled_type,
            dim,
            depth,
            arrayed,
            multisampled,
            sampled,
            format,
        });
        self.intern_in(&self.image_types, probe)
    }

    pub fn sampled_image_type(&self, image: Ty<'a>) -> Ty<'a> {
        assert!(
            matches!(image, SpirvType::Image(_)),
            "sampled image must wrap an image, got {}",
            image
        );
        if let Some(&interned_ty) = self.sampled_image_types.borrow().get(&ById(image)) {
            return interned_ty;
        }
        let ty = self.alloc_type(SpirvType::SampledImage { image });
        self.sampled_image_types.borrow_mut().insert(ById(image), ty);
        ty
    }

    pub fn array_type(&self, elem: Ty<'a>, count: u32, stride: Option<u32>) -> Ty<'a> {
        self.intern_in(
            &self.array_types,
            SpirvType::Array {
                elem,
                count,
                stride,
            },
        )
    }

    pub fn runtime_array_type(&self, elem: Ty<'a>, stride: Option<u32>) -> Ty<'a> {
        self.intern_in(
            &self.runtime_array_types,
            SpirvType::RuntimeArray { elem, stride },
        )
    }

    pub fn struct_type(
        &self,
        fields: &[StructField<'a>],
        name: &str,
        read_only: bool,
        interface: StructInterfaceType,
    ) -> Ty<'a> {
        self.intern_struct(fields, name, read_only, interface, None)
    }

    /// Like [`struct_type`](Self::struct_type), also remembering the source
    /// record so the struct can be lowered to debug info.
    pub fn record_struct_type(
        &self,
        decl: &'a RecordDecl<'a>,
        fields: &[StructField<'a>],
        name: &str,
        read_only: bool,
        interface: StructInterfaceType,
    ) -> Ty<'a> {
        self.intern_struct(fields, name, read_only, interface, Some(decl))
    }

    fn intern_struct(
        &self,
        fields: &[StructField<'a>],
        name: &str,
        read_only: bool,
        interface: StructInterfaceType,
        decl: Option<&'a RecordDecl<'a>>,
    ) -> Ty<'a> {
        // Compare against a stack probe first so lookups never touch the arena.
        let probe = SpirvType::Struct(StructType {
            fields,
            name,
            read_only,
            interface,
            decl,
        });
        if let Some(interned_ty) = self
            .struct_types
            .borrow()
            .iter()
            .copied()
            .find(|cached_ty| **cached_ty == probe)
        {
            return interned_ty;
        }

        let ty = self.alloc_type(SpirvType::Struct(StructType {
            fields: self.arena.alloc_slice_copy(fields),
            name: self.intern_str(name),
            read_only,
            interface,
            decl,
        }));
        self.struct_types.borrow_mut().push(ty);
        ty
    }

    pub fn pointer_type(&self, pointee: Ty<'a>, storage_class: StorageClass) -> Ty<'a> {
        if let Some(&interned_ty) = self
            .pointer_types
            .borrow()
            .get(&ById(pointee))
            .and_then(|by_class| by_class.get(&storage_class))
        {
            return interned_ty;
        }
        let ty = self.alloc_type(SpirvType::Pointer {
            pointee,
            storage_class,
        });
        self.pointer_types
            .borrow_mut()
            .entry(ById(pointee))
            .or_insert_with(|| HashMap::new_in(self.arena))
            .insert(storage_class, ty);
        ty
    }

    pub fn function_type(
        &self,
        return_type: Ty<'a>,
        param_types: &[Ty<'a>],
        is_member: bool,
    ) -> Ty<'a> {
        let probe = Probe(SpirvType::Function(FunctionType {
            return_type,
            param_types,
            is_member,
        }));
        if let Some(&interned_ty) = self.function_types.borrow().get(&probe) {
            return interned_ty;
        }
        let ty = self.alloc_type(SpirvType::Function(FunctionType {
            return_type,
            param_types: self.arena.alloc_slice_copy(param_types),
            is_member,
        }));
        self.function_types.borrow_mut().insert(ty);
        ty
    }

    /// `(RW)ByteAddressBuffer`: a struct wrapping a runtime array of `uint`.
    pub fn byte_address_buffer_type(&self, is_writable: bool) -> Ty<'a> {
        let runtime_array = self.runtime_array_type(self.uint_type(32), Some(4));
        let name = if is_writable {
            "type.RWByteAddressBuffer"
        } else {
            "type.ByteAddressBuffer"
        };
        self.struct_type(
            &[StructField::new(runtime_array, Some(""), Some(0))],
            name,
            !is_writable,
            StructInterfaceType::StorageBuffer,
        )
    }

    /// Counter buffer attached to append/consume structured buffers.
    pub fn acs_buffer_counter_type(&self) -> Ty<'a> {
        let int32 = self.sint_type(32);
        self.struct_type(
            &[StructField::new(int32, Some("counter"), Some(0))],
            "type.ACSBuffer.counter",
            false,
            StructInterfaceType::StorageBuffer,
        )
    }

    // ========================================================================
    // Hybrid types
    // ========================================================================
    //
    // These wrap front-end types that are not lowered yet, so they cannot be
    // compared structurally. Every call allocates a fresh instance.

    pub fn hybrid_pointer_type(
        &self,
        pointee: SourceType<'a>,
        storage_class: StorageClass,
    ) -> Ty<'a> {
        self.arena.alloc(SpirvType::HybridPointer {
            pointee,
            storage_class,
        })
    }

    pub fn hybrid_sampled_image_type(&self, image: SourceType<'a>) -> Ty<'a> {
        self.arena.alloc(SpirvType::HybridSampledImage { image })
    }

    pub fn hybrid_struct_type(
        &self,
        fields: &[HybridField<'a>],
        name: &str,
        read_only: bool,
        interface: StructInterfaceType,
    ) -> Ty<'a> {
        self.arena.alloc(SpirvType::HybridStruct {
            fields: self.arena.alloc_slice_copy(fields),
            name: self.intern_str(name),
            read_only,
            interface,
        })
    }

    // ========================================================================
    // Options
    // ========================================================================

    pub fn options(&self) -> ContextOptions {
        self.options.get()
    }

    pub fn current_shader_model_kind(&self) -> ShaderModelKind {
        self.options.get().shader_model
    }

    pub fn set_current_shader_model_kind(&self, kind: ShaderModelKind) {
        self.options.set(ContextOptions {
            shader_model: kind,
            ..self.options.get()
        });
    }

    pub fn major_version(&self) -> u32 {
        self.options.get().major_version
    }

    pub fn set_major_version(&self, major: u32) {
        self.options.set(ContextOptions {
            major_version: major,
            ..self.options.get()
        });
    }

    pub fn minor_version(&self) -> u32 {
        self.options.get().minor_version
    }

    pub fn set_minor_version(&self, minor: u32) {
        self.options.set(ContextOptions {
            minor_version: minor,
            ..self.options.get()
        });
    }

    pub fn is_ps(&self) -> bool {
        self.current_shader_model_kind() == ShaderModelKind::Pixel
    }
    pub fn is_vs(&self) -> bool {
        self.current_shader_model_kind() == ShaderModelKind::Vertex
    }
    pub fn is_gs(&self) -> bool {
        self.current_shader_model_kind() == ShaderModelKind::Geometry
    }
    pub fn is_hs(&self) -> bool {
        self.current_shader_model_kind() == ShaderModelKind::Hull
    }
    pub fn is_ds(&self) -> bool {
        self.current_shader_model_kind() == ShaderModelKind::Domain
    }
    pub fn is_cs(&self) -> bool {
        self.current_shader_model_kind() == ShaderModelKind::Compute
    }
    pub fn is_lib(&self) -> bool {
        self.current_shader_model_kind() == ShaderModelKind::Library
    }
    pub fn is_ray(&self) -> bool {
        self.current_shader_model_kind().is_ray_tracing()
    }
    pub fn is_ms(&self) -> bool {
        self.current_shader_model_kind() == ShaderModelKind::Mesh
    }
    pub fn is_as(&self) -> bool {
        self.current_shader_model_kind() == ShaderModelKind::Amplification
    }
}
