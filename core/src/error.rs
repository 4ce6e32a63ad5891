//! Errors for recoverable misuse of the debug-info registry.
//!
//! Contract violations in type interning (bad bit-widths, wrong element kinds)
//! are internal compiler bugs and panic instead.

use thiserror::Error;

use crate::String;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebugInfoError {
    /// The compilation unit at the bottom of a file's scope stack cannot be popped.
    #[error("cannot pop the compilation unit scope of `{file}`")]
    ScopeUnderflow { file: String },

    #[error("no debug type has been registered for `{ty}`")]
    UnregisteredType { ty: String },

    #[error("debug type for `{ty}` is not a composite")]
    NotAComposite { ty: String },
}
