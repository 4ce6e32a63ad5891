//! Source-level declarations handed over by the front end.
//!
//! These are the only parts of the front end's AST that type interning and
//! debug lowering look at: a record's kind, visibility, location and ordered
//! members, plus a field's evaluated constant value. The front end allocates
//! them in the same arena as the context, so they outlive every type that
//! refers back to them.

use core::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation<'a> {
    pub file: &'a str,
    pub line: u32,
    pub column: u32,
}

impl<'a> SourceLocation<'a> {
    pub const fn new(file: &'a str, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }
}

/// The kind keyword a record was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Struct,
    Class,
    Union,
    Enum,
}

/// A compile-time value produced by evaluating a constant initializer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Anything else the evaluator produced (vectors, structs, ...).
    Other,
}

#[derive(Debug)]
pub struct FieldDecl<'a> {
    pub name: &'a str,
    pub location: SourceLocation<'a>,
    pub module_private: bool,
    /// Set only for static members with a constant initializer.
    pub value: Option<ConstValue>,
}

impl<'a> FieldDecl<'a> {
    pub fn new(name: &'a str, location: SourceLocation<'a>) -> Self {
        Self {
            name,
            location,
            module_private: false,
            value: None,
        }
    }

    pub fn with_value(mut self, value: ConstValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn private(mut self) -> Self {
        self.module_private = true;
        self
    }

    pub fn evaluate_value(&self) -> Option<ConstValue> {
        self.value
    }
}

#[derive(Debug)]
pub struct MethodDecl<'a> {
    pub name: &'a str,
    pub location: SourceLocation<'a>,
}

impl<'a> MethodDecl<'a> {
    pub fn new(name: &'a str, location: SourceLocation<'a>) -> Self {
        Self { name, location }
    }
}

/// One entry in a record's member list, in declaration order.
#[derive(Debug, Clone, Copy)]
pub enum MemberDecl<'a> {
    Field(&'a FieldDecl<'a>),
    Method(&'a MethodDecl<'a>),
    /// A nested type declaration.
    Record(&'a RecordDecl<'a>),
}

#[derive(Debug)]
pub struct RecordDecl<'a> {
    pub name: &'a str,
    pub tag: TagKind,
    pub module_private: bool,
    pub location: SourceLocation<'a>,
    pub members: &'a [MemberDecl<'a>],
}

impl<'a> RecordDecl<'a> {
    pub fn new(
        name: &'a str,
        tag: TagKind,
        location: SourceLocation<'a>,
        members: &'a [MemberDecl<'a>],
    ) -> Self {
        Self {
            name,
            tag,
            module_private: false,
            location,
            members,
        }
    }

    pub fn private(mut self) -> Self {
        self.module_private = true;
        self
    }

    pub fn is_enum(&self) -> bool {
        self.tag == TagKind::Enum
    }
}

/// A front-end type that has not been lowered yet. Hybrid SPIR-V types wrap
/// one of these.
#[derive(Debug, Clone, Copy)]
pub enum SourceType<'a> {
    /// A builtin named type, e.g. `float4` or `Texture2D<float4>`.
    Named(&'a str),
    Record(&'a RecordDecl<'a>),
}

impl<'a> SourceType<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            SourceType::Named(name) => name,
            SourceType::Record(decl) => decl.name,
        }
    }
}

impl PartialEq for SourceType<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SourceType::Named(a), SourceType::Named(b)) => a == b,
            (SourceType::Record(a), SourceType::Record(b)) => core::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl Eq for SourceType<'_> {}

impl Hash for SourceType<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            SourceType::Named(name) => {
                0u8.hash(state);
                name.hash(state);
            }
            SourceType::Record(decl) => {
                1u8.hash(state);
                core::ptr::hash(*decl, state);
            }
        }
    }
}
