//! Break targets of the loops currently being generated.

use inkwell::basic_block::BasicBlock;

/// Where a `break` jumps to, and how many defer frames were open when the
/// loop was entered.
#[derive(Debug, Clone, Copy)]
pub struct LoopExit<'a> {
    pub exit_block: BasicBlock<'a>,
    pub defer_depth: usize,
}

#[derive(Debug)]
pub struct LoopStack<B> {
    exits: Vec<B>,
}

impl<B> Default for LoopStack<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> LoopStack<B> {
    pub fn new() -> Self {
        LoopStack { exits: vec![] }
    }

    pub fn push(&mut self, exit: B) {
        self.exits.push(exit);
    }

    pub fn pop(&mut self) -> Option<B> {
        self.exits.pop()
    }

    /// The innermost loop's exit, without popping it.
    pub fn current(&self) -> Option<&B> {
        self.exits.last()
    }

    pub fn is_empty(&self) -> bool {
        self.exits.is_empty()
    }

    pub fn clear(&mut self) {
        self.exits.clear();
    }
}
