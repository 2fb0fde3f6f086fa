//! Type model of the language.
//!
//! Every expression of a resolved tree carries exactly one of these types.
//! Lowering to LLVM types lives in `compiler::types`.

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Signed integer of the given bit width (1, 8, 16, 32 or 64).
    /// `Integer(1)` is the boolean type.
    Integer(u32),
    /// IEEE float of 32 or 64 bits.
    Float(u32),
    /// The null/void type.
    Void,
    Array(Box<Type>, u32),
    Pointer(Box<Type>),
    Function(FunctionSignature),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub parameters: Vec<Type>,
    pub return_type: Box<Type>,
    pub is_variadic: bool,
}

impl FunctionSignature {
    pub fn new(parameters: Vec<Type>, return_type: Type) -> Self {
        FunctionSignature {
            parameters,
            return_type: Box::new(return_type),
            is_variadic: false,
        }
    }
}

impl Type {
    pub fn boolean() -> Self {
        Type::Integer(1)
    }

    pub fn array(element: Type, length: u32) -> Self {
        Type::Array(Box::new(element), length)
    }

    pub fn pointer(pointee: Type) -> Self {
        Type::Pointer(Box::new(pointee))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Type::Integer(1))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// The signature behind a callable value, either a function or a pointer to one.
    pub fn callable_signature(&self) -> Option<&FunctionSignature> {
        match self {
            Type::Function(signature) => Some(signature),
            Type::Pointer(pointee) => match pointee.as_ref() {
                Type::Function(signature) => Some(signature),
                _ => None,
            },
            _ => None,
        }
    }

    /// The element type reached by indexing into a value of this type.
    pub fn indexed_type(&self) -> Option<&Type> {
        match self {
            Type::Array(element, _) | Type::Pointer(element) => Some(element),
            _ => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Integer(width) => write!(f, "int{}", width),
            Type::Float(width) => write!(f, "float{}", width),
            Type::Void => write!(f, "void"),
            Type::Array(element, length) => write!(f, "[{}]{}", length, element),
            Type::Pointer(pointee) => write!(f, "*{}", pointee),
            Type::Function(signature) => {
                write!(f, "fun (")?;
                for (i, parameter) in signature.parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", parameter)?;
                }
                if signature.is_variadic {
                    if signature.parameters.is_empty() {
                        write!(f, "...")?;
                    } else {
                        write!(f, ", ...")?;
                    }
                }
                write!(f, ") {}", signature.return_type)
            }
        }
    }
}
