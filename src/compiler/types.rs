//! Lowering of language types to LLVM types.
//!
//! Every declared type becomes an IR type through [`TypeLowering`]; the code
//! generator never builds LLVM types for language types on its own.

use inkwell::{
    context::Context,
    types::{AnyType, AnyTypeEnum, BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType},
    values::BasicValueEnum,
    AddressSpace,
};

use crate::ast::types::{FunctionSignature, Type};

/// Pure mapping from [`Type`] to LLVM types of one context.
#[derive(Debug, Clone, Copy)]
pub struct TypeLowering<'a> {
    context: &'a Context,
}

impl<'a> TypeLowering<'a> {
    pub fn new(context: &'a Context) -> Self {
        TypeLowering { context }
    }

    /// Lowers a type to its native IR type. `void` maps to the LLVM void type
    /// and function signatures to LLVM function types.
    pub fn lower(&self, type_: &Type) -> AnyTypeEnum<'a> {
        match type_ {
            Type::Void => self.context.void_type().into(),
            Type::Function(signature) => self.function_type(signature).into(),
            other => self.convert_type(other).as_any_type_enum(),
        }
    }

    /// Lowers a type to the type of its storage slot.
    ///
    /// Functions are stored as function pointers. `void` has no storage; where
    /// one is structurally required (`*void`, `[n]void`) it is a byte.
    pub fn convert_type(&self, type_: &Type) -> BasicTypeEnum<'a> {
        match type_ {
            Type::Integer(1) => self.context.bool_type().into(),
            Type::Integer(8) => self.context.i8_type().into(),
            Type::Integer(16) => self.context.i16_type().into(),
            Type::Integer(32) => self.context.i32_type().into(),
            Type::Integer(64) => self.context.i64_type().into(),
            Type::Integer(width) => self.context.custom_width_int_type(*width).into(),
            Type::Float(32) => self.context.f32_type().into(),
            Type::Float(_) => self.context.f64_type().into(),
            Type::Void => self.context.i8_type().into(),
            Type::Array(element, length) => self.convert_type(element).array_type(*length).into(),
            Type::Pointer(pointee) => match pointee.as_ref() {
                Type::Function(signature) => self
                    .function_type(signature)
                    .ptr_type(AddressSpace::default())
                    .into(),
                other => self
                    .convert_type(other)
                    .ptr_type(AddressSpace::default())
                    .into(),
            },
            Type::Function(signature) => self
                .function_type(signature)
                .ptr_type(AddressSpace::default())
                .into(),
        }
    }

    pub fn function_type(&self, signature: &FunctionSignature) -> FunctionType<'a> {
        let params: Vec<BasicMetadataTypeEnum<'a>> = signature
            .parameters
            .iter()
            .map(|parameter| self.convert_type(parameter).into())
            .collect();

        if let Type::Void = signature.return_type.as_ref() {
            self.context
                .void_type()
                .fn_type(params.as_slice(), signature.is_variadic)
        } else {
            self.convert_type(&signature.return_type)
                .fn_type(params.as_slice(), signature.is_variadic)
        }
    }

    /// The all-zero value of a storage type.
    pub fn zero_value(&self, type_: BasicTypeEnum<'a>) -> BasicValueEnum<'a> {
        match type_ {
            BasicTypeEnum::ArrayType(array) => array.const_zero().into(),
            BasicTypeEnum::FloatType(float) => float.const_zero().into(),
            BasicTypeEnum::IntType(int) => int.const_zero().into(),
            BasicTypeEnum::PointerType(pointer) => pointer.const_null().into(),
            BasicTypeEnum::StructType(structure) => structure.const_zero().into(),
            BasicTypeEnum::VectorType(vector) => vector.const_zero().into(),
        }
    }
}
