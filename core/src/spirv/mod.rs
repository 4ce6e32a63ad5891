pub mod builder;
pub mod context;
pub mod debug;
pub mod debug_type_visitor;
pub mod decl;
pub mod module;
pub mod types;

pub use builder::{ConstantBuilder, ConstantValue, ExtInstSet, SpirvBuilder, SpirvConstant};
pub use context::{RichDebugInfo, SpirvContext};
pub use debug::{
    BaseTypeEncoding, CompositeTag, DebugInfoFlags, DebugKind, DebugRef, SpirvDebugInstruction,
};
pub use debug_type_visitor::DebugTypeVisitor;
pub use decl::{
    ConstValue, FieldDecl, MemberDecl, MethodDecl, RecordDecl, SourceLocation, SourceType,
    TagKind,
};
pub use module::{Phase, SpirvModule, Visitor};
pub use types::{
    ById, Dim, FunctionType, HybridField, ImageFormat, ImageType, SpirvType, StorageClass,
    StructField, StructInterfaceType, StructType, Ty, WithDepth, WithSampler,
};

#[cfg(test)]
mod context_test;
