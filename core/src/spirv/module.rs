//! The debug section of a module under construction, and the visitor
//! protocol passes use to walk it.

use crate::Vec;
use crate::spirv::debug::DebugRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Done,
}

/// A pass over a [`SpirvModule`].
///
/// Each method returns `false` to stop the walk early.
pub trait Visitor<'a> {
    fn visit_module(&mut self, _module: &mut SpirvModule<'a>, _phase: Phase) -> bool {
        true
    }

    fn visit_instruction(&mut self, _instruction: DebugRef<'a>) -> bool {
        true
    }
}

#[derive(Debug, Default)]
pub struct SpirvModule<'a> {
    debug_infos: Vec<DebugRef<'a>>,
}

impl<'a> SpirvModule<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_debug_info(&mut self, instruction: DebugRef<'a>) {
        self.debug_infos.push(instruction);
    }

    pub fn debug_infos(&self) -> &[DebugRef<'a>] {
        &self.debug_infos
    }

    /// Runs `visitor` over the module: `Init`, every instruction present when
    /// the walk starts, then `Done`. Instructions the visitor appends are not
    /// revisited.
    pub fn invoke<V: Visitor<'a>>(&mut self, visitor: &mut V) -> bool {
        if !visitor.visit_module(self, Phase::Init) {
            return false;
        }
        let instructions = self.debug_infos.clone();
        for instruction in instructions {
            if !visitor.visit_instruction(instruction) {
                return false;
            }
        }
        visitor.visit_module(self, Phase::Done)
    }
}
