//! Deferred call bookkeeping.
//!
//! Each open block owns a frame of pending calls. Calls run in reverse
//! registration order whenever control leaves the block.

use inkwell::{
    builder::Builder,
    types::{AnyTypeEnum, FunctionType},
    values::{BasicMetadataValueEnum, CallableValue, FunctionValue, PointerValue},
};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

/// Checks that `pointer` points at a function of type `function_type` and
/// wraps it for `Builder::build_call`.
pub fn callable_pointer<'a>(
    function_type: FunctionType<'a>,
    pointer: PointerValue<'a>,
    position: Position,
) -> Result<CallableValue<'a>, Error> {
    let not_callable = || {
        Error::new(
            ErrorImpl::NotCallable {
                type_: pointer.get_type().print_to_string().to_string(),
            },
            position.clone(),
        )
    };

    if pointer.get_type().get_element_type() != AnyTypeEnum::from(function_type) {
        return Err(not_callable());
    }
    CallableValue::try_from(pointer).map_err(|_| not_callable())
}

#[derive(Debug, Clone)]
pub enum DeferredCall<'a> {
    /// Call a named function.
    Function {
        function: FunctionValue<'a>,
        arguments: Vec<BasicMetadataValueEnum<'a>>,
    },
    /// Call through a function pointer.
    FunctionPointer {
        function_type: FunctionType<'a>,
        callee: PointerValue<'a>,
        arguments: Vec<BasicMetadataValueEnum<'a>>,
    },
}

impl<'a> DeferredCall<'a> {
    /// Emits the call at the builder's position and discards its result.
    pub fn generate_call(&self, builder: &Builder<'a>) -> Result<(), Error> {
        match self {
            DeferredCall::Function {
                function,
                arguments,
            } => {
                builder.build_call(*function, arguments, "")?;
            }
            DeferredCall::FunctionPointer {
                function_type,
                callee,
                arguments,
            } => {
                let callee = callable_pointer(*function_type, *callee, Position::null())?;
                builder.build_call(callee, arguments, "")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct DeferRegistry<C> {
    frames: Vec<Vec<C>>,
}

impl<C> Default for DeferRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> DeferRegistry<C> {
    pub fn new() -> Self {
        DeferRegistry { frames: vec![] }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(vec![]);
    }

    pub fn pop_frame(&mut self) -> Option<Vec<C>> {
        self.frames.pop()
    }

    /// Records a call in the innermost frame.
    ///
    /// Returns the call back if no frame is open.
    pub fn register(&mut self, call: C) -> Result<(), C> {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.push(call);
                Ok(())
            }
            None => Err(call),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Calls of the innermost frame, last registered first.
    pub fn frame_calls(&self) -> impl Iterator<Item = &C> {
        self.frames.last().into_iter().flat_map(|frame| frame.iter().rev())
    }

    /// Calls of every frame above `depth`, innermost frame first and each
    /// frame last registered first.
    pub fn calls_above(&self, depth: usize) -> impl Iterator<Item = &C> {
        self.frames
            .iter()
            .skip(depth)
            .rev()
            .flat_map(|frame| frame.iter().rev())
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
