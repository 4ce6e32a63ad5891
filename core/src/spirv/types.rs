use core::fmt::{self, Display};
use core::hash::{Hash, Hasher};

use crate::spirv::decl::{FieldDecl, RecordDecl, SourceType};

/// A canonical type reference. Two `Ty`s are the same type iff they are the
/// same pointer.
pub type Ty<'a> = &'a SpirvType<'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    UniformConstant = 0,
    Input = 1,
    Uniform = 2,
    Output = 3,
    Workgroup = 4,
    CrossWorkgroup = 5,
    Private = 6,
    Function = 7,
    Generic = 8,
    PushConstant = 9,
    AtomicCounter = 10,
    Image = 11,
    StorageBuffer = 12,
    CallableData = 5328,
    IncomingCallableData = 5329,
    RayPayload = 5338,
    HitAttribute = 5339,
    IncomingRayPayload = 5342,
    ShaderRecordBuffer = 5343,
    PhysicalStorageBuffer = 5349,
}

impl StorageClass {
    pub fn name(self) -> &'static str {
        match self {
            StorageClass::UniformConstant => "UniformConstant",
            StorageClass::Input => "Input",
            StorageClass::Uniform => "Uniform",
            StorageClass::Output => "Output",
            StorageClass::Workgroup => "Workgroup",
            StorageClass::CrossWorkgroup => "CrossWorkgroup",
            StorageClass::Private => "Private",
            StorageClass::Function => "Function",
            StorageClass::Generic => "Generic",
            StorageClass::PushConstant => "PushConstant",
            StorageClass::AtomicCounter => "AtomicCounter",
            StorageClass::Image => "Image",
            StorageClass::StorageBuffer => "StorageBuffer",
            StorageClass::CallableData => "CallableData",
            StorageClass::IncomingCallableData => "IncomingCallableData",
            StorageClass::RayPayload => "RayPayload",
            StorageClass::HitAttribute => "HitAttribute",
            StorageClass::IncomingRayPayload => "IncomingRayPayload",
            StorageClass::ShaderRecordBuffer => "ShaderRecordBuffer",
            StorageClass::PhysicalStorageBuffer => "PhysicalStorageBuffer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    Dim1D = 0,
    Dim2D = 1,
    Dim3D = 2,
    Cube = 3,
    Rect = 4,
    Buffer = 5,
    SubpassData = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Unknown = 0,
    Rgba32f = 1,
    Rgba16f = 2,
    R32f = 3,
    Rgba8 = 4,
    Rgba8Snorm = 5,
    Rg32f = 6,
    Rg16f = 7,
    R11fG11fB10f = 8,
    R16f = 9,
    Rgba16 = 10,
    Rgb10A2 = 11,
    Rg16 = 12,
    Rg8 = 13,
    R16 = 14,
    R8 = 15,
    Rgba16Snorm = 16,
    Rg16Snorm = 17,
    Rg8Snorm = 18,
    R16Snorm = 19,
    R8Snorm = 20,
    Rgba32i = 21,
    Rgba16i = 22,
    Rgba8i = 23,
    R32i = 24,
    Rg32i = 25,
    Rg16i = 26,
    Rg8i = 27,
    R16i = 28,
    R8i = 29,
    Rgba32ui = 30,
    Rgba16ui = 31,
    Rgba8ui = 32,
    R32ui = 33,
    Rgb10a2ui = 34,
    Rg32ui = 35,
    Rg16ui = 36,
    Rg8ui = 37,
    R16ui = 38,
    R8ui = 39,
}

/// Whether an image is known to be a depth image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WithDepth {
    No = 0,
    Yes = 1,
    Unknown = 2,
}

/// Whether an image is used with a sampler, as a storage image, or unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WithSampler {
    Unknown = 0,
    Yes = 1,
    No = 2,
}

/// How a struct is used at the shader interface. Structs that are otherwise
/// identical but differ here lower to distinct declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StructInterfaceType {
    #[default]
    InternalStorage,
    StorageBuffer,
    UniformBuffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageType<'a> {
    pub sampled_type: Ty<'a>,
    pub dim: Dim,
    pub depth: WithDepth,
    pub arrayed: bool,
    pub multisampled: bool,
    pub sampled: WithSampler,
    pub format: ImageFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionType<'a> {
    pub return_type: Ty<'a>,
    pub param_types: &'a [Ty<'a>],
    pub is_member: bool,
}

/// One field of a struct type.
///
/// `decl` points back at the front-end declaration and is only consulted by
/// debug lowering; it takes no part in type identity.
#[derive(Debug, Clone, Copy)]
pub struct StructField<'a> {
    pub ty: Ty<'a>,
    pub name: Option<&'a str>,
    /// Byte offset, when the layout pass assigned one.
    pub offset: Option<u32>,
    pub decl: Option<&'a FieldDecl<'a>>,
}

impl<'a> StructField<'a> {
    pub fn new(ty: Ty<'a>, name: Option<&'a str>, offset: Option<u32>) -> Self {
        Self {
            ty,
            name,
            offset,
            decl: None,
        }
    }

    pub fn with_decl(mut self, decl: &'a FieldDecl<'a>) -> Self {
        self.decl = Some(decl);
        self
    }
}

impl PartialEq for StructField<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.name == other.name && self.offset == other.offset
    }
}

impl Eq for StructField<'_> {}

impl Hash for StructField<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ty.hash(state);
        self.name.hash(state);
        self.offset.hash(state);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StructType<'a> {
    pub fields: &'a [StructField<'a>],
    pub name: &'a str,
    pub read_only: bool,
    pub interface: StructInterfaceType,
    /// Source record this struct was lowered from, if any.
    pub decl: Option<&'a RecordDecl<'a>>,
}

impl PartialEq for StructType<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.read_only == other.read_only
            && self.interface == other.interface
            && self.fields == other.fields
    }
}

impl Eq for StructType<'_> {}

impl Hash for StructType<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.read_only.hash(state);
        self.interface.hash(state);
        self.fields.hash(state);
    }
}

/// A field of a hybrid struct: its type is still a front-end type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HybridField<'a> {
    pub source_type: SourceType<'a>,
    pub name: Option<&'a str>,
    pub offset: Option<u32>,
}

/// SPIR-V types.
///
/// Children are canonical, so the derived structural equality agrees with
/// pointer identity for everything created through [`SpirvContext`].
/// The `Hybrid*` variants wrap unresolved front-end types and are never
/// interned.
///
/// [`SpirvContext`]: crate::spirv::SpirvContext
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpirvType<'a> {
    Void,
    Bool,
    Integer {
        bitwidth: u32,
        signed: bool,
    },
    Float {
        bitwidth: u32,
    },
    Vector {
        elem: Ty<'a>,
        count: u32,
    },
    /// Only float matrices exist; others are arrays of vectors.
    Matrix {
        vec: Ty<'a>,
        count: u32,
    },
    Array {
        elem: Ty<'a>,
        count: u32,
        stride: Option<u32>,
    },
    RuntimeArray {
        elem: Ty<'a>,
        stride: Option<u32>,
    },
    Image(ImageType<'a>),
    SampledImage {
        image: Ty<'a>,
    },
    Sampler,
    AccelerationStructure,
    Pointer {
        pointee: Ty<'a>,
        storage_class: StorageClass,
    },
    Function(FunctionType<'a>),
    Struct(StructType<'a>),

    HybridPointer {
        pointee: SourceType<'a>,
        storage_class: StorageClass,
    },
    HybridSampledImage {
        image: SourceType<'a>,
    },
    HybridStruct {
        fields: &'a [HybridField<'a>],
        name: &'a str,
        read_only: bool,
        interface: StructInterfaceType,
    },
}

impl<'a> SpirvType<'a> {
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            SpirvType::Bool | SpirvType::Integer { .. } | SpirvType::Float { .. }
        )
    }

    /// Integer or float scalar.
    pub fn is_numerical(&self) -> bool {
        matches!(self, SpirvType::Integer { .. } | SpirvType::Float { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SpirvType::Float { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self, SpirvType::Void)
    }

    pub fn is_hybrid(&self) -> bool {
        matches!(
            self,
            SpirvType::HybridPointer { .. }
                | SpirvType::HybridSampledImage { .. }
                | SpirvType::HybridStruct { .. }
        )
    }

    pub fn as_struct(&self) -> Option<&StructType<'a>> {
        match self {
            SpirvType::Struct(st) => Some(st),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType<'a>> {
        match self {
            SpirvType::Function(fty) => Some(fty),
            _ => None,
        }
    }
}

impl Display for SpirvType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpirvType::Void => write!(f, "void"),
            SpirvType::Bool => write!(f, "bool"),
            SpirvType::Integer { bitwidth, signed } => {
                let prefix = if *signed { "int" } else { "uint" };
                if *bitwidth == 32 {
                    write!(f, "{}", prefix)
                } else {
                    write!(f, "{}{}", prefix, bitwidth)
                }
            }
            SpirvType::Float { bitwidth } => {
                if *bitwidth == 32 {
                    write!(f, "float")
                } else {
                    write!(f, "float{}", bitwidth)
                }
            }
            SpirvType::Vector { elem, count } => write!(f, "v{}{}", count, elem),
            SpirvType::Matrix { vec, count } => write!(f, "mat{}{}", count, vec),
            SpirvType::Array { elem, count, .. } => write!(f, "_arr_{}_{}", elem, count),
            SpirvType::RuntimeArray { elem, .. } => write!(f, "_runtimearr_{}", elem),
            SpirvType::Image(image) => write!(f, "type.image.{}", image.sampled_type),
            SpirvType::SampledImage { image } => write!(f, "type.sampled.{}", image),
            SpirvType::Sampler => write!(f, "type.sampler"),
            SpirvType::AccelerationStructure => write!(f, "accelerationStructureNV"),
            SpirvType::Pointer {
                pointee,
                storage_class,
            } => write!(f, "_ptr_{}_{}", storage_class.name(), pointee),
            SpirvType::Function(fty) => {
                write!(f, "fn(")?;
                for (i, param) in fty.param_types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") -> {}", fty.return_type)
            }
            SpirvType::Struct(st) => write!(f, "{}", st.name),
            SpirvType::HybridPointer {
                pointee,
                storage_class,
            } => write!(f, "_ptr_{}_{}", storage_class.name(), pointee.name()),
            SpirvType::HybridSampledImage { image } => {
                write!(f, "type.sampled.{}", image.name())
            }
            SpirvType::HybridStruct { name, .. } => write!(f, "{}", name),
        }
    }
}

/// Hashes and compares a canonical type by address.
#[derive(Debug, Clone, Copy)]
pub struct ById<'a>(pub Ty<'a>);

impl PartialEq for ById<'_> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.0, other.0)
    }
}

impl Eq for ById<'_> {}

impl Hash for ById<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::ptr::hash(self.0, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToString;

    #[test]
    fn test_struct_identity_ignores_declarations() {
        let int = SpirvType::Integer {
            bitwidth: 32,
            signed: true,
        };
        let decl = FieldDecl::new("a", crate::spirv::decl::SourceLocation::new("a.hlsl", 1, 1));
        let plain = [StructField::new(&int, Some("a"), None)];
        let with_decl = [StructField::new(&int, Some("a"), None).with_decl(&decl)];

        let lhs = StructType {
            fields: &plain,
            name: "S",
            read_only: false,
            interface: StructInterfaceType::InternalStorage,
            decl: None,
        };
        let rhs = StructType {
            fields: &with_decl,
            ..lhs
        };
        assert_eq!(lhs, rhs);

        let buffer = StructType {
            interface: StructInterfaceType::StorageBuffer,
            ..lhs
        };
        assert_ne!(lhs, buffer);
    }

    #[test]
    fn test_display_names() {
        let int = SpirvType::Integer {
            bitwidth: 32,
            signed: true,
        };
        let half = SpirvType::Float { bitwidth: 16 };
        let v3 = SpirvType::Vector {
            elem: &half,
            count: 3,
        };
        let ptr = SpirvType::Pointer {
            pointee: &int,
            storage_class: StorageClass::Function,
        };
        assert_eq!(int.to_string(), "int");
        assert_eq!(v3.to_string(), "v3float16");
        assert_eq!(ptr.to_string(), "_ptr_Function_int");
    }
}
