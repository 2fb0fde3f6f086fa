use inkwell::{
    module::Linkage,
    types::{BasicType, BasicTypeEnum, FunctionType, IntType},
    values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue, IntValue, PointerValue},
    AddressSpace, FloatPredicate, IntPredicate,
};
use tracing::trace;

use crate::{
    ast::{
        ast::Expr,
        expressions::{
            ArrayExpr, AssignExpr, BinaryExpr, CallExpr, CastExpr, IfExpr, IndexExpr, UnaryExpr,
        },
        types::{FunctionSignature, Type},
    },
    errors::errors::{Error, ErrorImpl},
    tokens::tokens::{Token, TokenKind},
    Position,
};

use super::{
    compiler::{Binding, Compiler, Operand},
    defer::callable_pointer,
};

/// What a call site invokes.
#[derive(Debug, Clone, Copy)]
pub enum Callee<'a> {
    Direct(FunctionValue<'a>),
    Indirect {
        function_type: FunctionType<'a>,
        pointer: PointerValue<'a>,
    },
}

/// Generates LLVM IR for the given expression.
pub fn gen_expression<'a>(
    compiler: &Compiler<'a>,
    expression: &Expr,
) -> Result<Operand<'a>, Error> {
    match expression {
        Expr::Group(group) => gen_expression(compiler, &group.expression),
        Expr::Assign(assign) => gen_assignment(compiler, assign),
        Expr::Binary(binary) => {
            let left = gen_value(compiler, &binary.left)?;
            let right = gen_value(compiler, &binary.right)?;
            arithmetic(compiler, &binary.operator, left, right).map(Operand::Value)
        }
        Expr::Shift(binary) => {
            let left = gen_value(compiler, &binary.left)?;
            let right = gen_value(compiler, &binary.right)?;
            shift(compiler, &binary.operator, left, right).map(Operand::Value)
        }
        Expr::Comparison(binary) => gen_comparison(compiler, binary),
        Expr::Logical(binary) => gen_logical(compiler, binary),
        Expr::Unary(unary) => gen_unary(compiler, unary),
        Expr::Call(call) => gen_call(compiler, call),
        Expr::Literal(literal) => {
            match compiler.lookup(&literal.name.value, literal.name.get_position())? {
                Binding::Slot(slot) => Ok(Operand::Place(slot)),
                Binding::Constant(value) => Ok(Operand::Value(value)),
                Binding::Function(function) => Ok(Operand::Value(
                    function.as_global_value().as_pointer_value().into(),
                )),
            }
        }
        Expr::Number(number) => {
            number_constant(compiler, &number.value, &number.ty, false).map(Operand::Value)
        }
        Expr::Character(character) => {
            character_constant(compiler, &character.value).map(Operand::Value)
        }
        Expr::Boolean(boolean) => Ok(Operand::Value(boolean_constant(compiler, &boolean.value))),
        Expr::Null(_) => Ok(Operand::Value(
            compiler
                .context
                .i8_type()
                .ptr_type(AddressSpace::default())
                .const_null()
                .into(),
        )),
        Expr::String(string) => Ok(Operand::Place(string_global(compiler, &string.value.value))),
        Expr::Array(array) => gen_array(compiler, array),
        Expr::Index(index) => gen_index(compiler, index),
        Expr::Cast(cast) => gen_cast(compiler, cast),
        Expr::EnumAccess(access) => {
            let position = access.enum_name.get_position();
            match compiler.lookup(&access.qualified_name(), position.clone())? {
                Binding::Constant(value) => Ok(Operand::Value(value)),
                _ => Err(compiler.fail(
                    ErrorImpl::UnresolvedSymbol {
                        name: access.qualified_name(),
                    },
                    position,
                )),
            }
        }
        Expr::If(if_expr) => gen_if_expression(compiler, if_expr),
    }
}

/// Generates an expression and loads it if it is a place.
pub fn gen_value<'a>(compiler: &Compiler<'a>, expression: &Expr) -> Result<BasicValueEnum<'a>, Error> {
    let operand = gen_expression(compiler, expression)?;
    rvalue(compiler, operand, expression.get_position())
}

pub fn rvalue<'a>(
    compiler: &Compiler<'a>,
    operand: Operand<'a>,
    position: Position,
) -> Result<BasicValueEnum<'a>, Error> {
    match operand {
        Operand::Value(value) => Ok(value),
        Operand::Place(pointer) => Ok(compiler.builder.build_load(pointer, "")?),
        Operand::Void => Err(compiler.fail(ErrorImpl::VoidValue, position)),
    }
}

/// Generates a condition and narrows it to `i1`.
pub fn gen_condition<'a>(compiler: &Compiler<'a>, expression: &Expr) -> Result<IntValue<'a>, Error> {
    let value = gen_value(compiler, expression)?;
    to_boolean(compiler, value, expression)
}

fn to_boolean<'a>(
    compiler: &Compiler<'a>,
    value: BasicValueEnum<'a>,
    expression: &Expr,
) -> Result<IntValue<'a>, Error> {
    match value {
        BasicValueEnum::IntValue(int) if int.get_type().get_bit_width() == 1 => Ok(int),
        BasicValueEnum::IntValue(int) => Ok(compiler.builder.build_int_compare(
            IntPredicate::NE,
            int,
            int.get_type().const_zero(),
            "",
        )?),
        _ => Err(compiler.fail(
            ErrorImpl::TypeMismatch {
                expected: Type::boolean().to_string(),
                received: expression.get_type()?.to_string(),
            },
            expression.get_position(),
        )),
    }
}

/// Converts an operand of type `source` so it can be stored in a slot of
/// type `target`. Returns `None` when the types are incompatible.
///
/// Arrays decay to pointers to their first element, `*void` converts to and
/// from every pointer type, and function names convert to function pointers.
pub fn convert_operand<'a>(
    compiler: &Compiler<'a>,
    operand: Operand<'a>,
    source: &Type,
    target: &Type,
    position: Position,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    if source == target {
        return rvalue(compiler, operand, position).map(Some);
    }

    match (source, target) {
        (Type::Array(element, _), Type::Pointer(pointee))
            if element == pointee || pointee.is_void() =>
        {
            let decayed = decay(compiler, operand, position)?;
            let target_type = compiler.types.convert_type(target).into_pointer_type();
            Ok(Some(
                compiler
                    .builder
                    .build_pointer_cast(decayed, target_type, "")?
                    .into(),
            ))
        }
        (Type::Pointer(from), Type::Pointer(to)) if from.is_void() || to.is_void() => {
            let value = rvalue(compiler, operand, position)?.into_pointer_value();
            let target_type = compiler.types.convert_type(target).into_pointer_type();
            Ok(Some(
                compiler
                    .builder
                    .build_pointer_cast(value, target_type, "")?
                    .into(),
            ))
        }
        (Type::Function(signature), Type::Pointer(pointee))
        | (Type::Pointer(pointee), Type::Function(signature))
            if matches!(pointee.as_ref(), Type::Function(other) if other == signature) =>
        {
            rvalue(compiler, operand, position).map(Some)
        }
        _ => Ok(None),
    }
}

/// Pointer to the first element of an array operand. Array values that are
/// not addressable are spilled to a stack slot first.
fn decay<'a>(
    compiler: &Compiler<'a>,
    operand: Operand<'a>,
    position: Position,
) -> Result<PointerValue<'a>, Error> {
    let array = match operand {
        Operand::Place(pointer) => pointer,
        Operand::Value(value) => spill(compiler, value)?,
        Operand::Void => return Err(compiler.fail(ErrorImpl::VoidValue, position)),
    };

    let zero = compiler.context.i64_type().const_zero();
    Ok(unsafe {
        compiler
            .builder
            .build_in_bounds_gep(array, &[zero, zero], "")?
    })
}

fn spill<'a>(compiler: &Compiler<'a>, value: BasicValueEnum<'a>) -> Result<PointerValue<'a>, Error> {
    let slot = compiler.create_entry_block_alloca("", value.get_type())?;
    compiler.builder.build_store(slot, value)?;
    Ok(slot)
}

fn unsupported_operator(compiler: &Compiler, operator: &Token, value: BasicValueEnum) -> Error {
    compiler.fail(
        ErrorImpl::UnsupportedOperator {
            operator: operator.value.clone(),
            type_: value.get_type().print_to_string().to_string(),
        },
        operator.get_position(),
    )
}

/// Resizes an integer. `i1` is treated as unsigned, every other width as
/// signed.
fn resize_int<'a>(
    compiler: &Compiler<'a>,
    value: IntValue<'a>,
    target: IntType<'a>,
) -> Result<IntValue<'a>, Error> {
    let from = value.get_type().get_bit_width();
    let to = target.get_bit_width();

    let resized = if from == to {
        value
    } else if from > to {
        compiler.builder.build_int_truncate(value, target, "")?
    } else if from == 1 {
        compiler.builder.build_int_z_extend(value, target, "")?
    } else {
        compiler.builder.build_int_s_extend(value, target, "")?
    };
    Ok(resized)
}

/// Applies an arithmetic or bitwise operator. Shared by binary expressions
/// and compound assignments.
fn arithmetic<'a>(
    compiler: &Compiler<'a>,
    operator: &Token,
    left: BasicValueEnum<'a>,
    right: BasicValueEnum<'a>,
) -> Result<BasicValueEnum<'a>, Error> {
    let builder = &compiler.builder;

    match (left, right) {
        (BasicValueEnum::IntValue(left), BasicValueEnum::IntValue(right)) => {
            let right = resize_int(compiler, right, left.get_type())?;
            let value = match operator.kind {
                TokenKind::Plus => builder.build_int_add(left, right, "")?,
                TokenKind::Minus => builder.build_int_sub(left, right, "")?,
                TokenKind::Star => builder.build_int_mul(left, right, "")?,
                TokenKind::Slash => builder.build_int_signed_div(left, right, "")?,
                TokenKind::Percent => builder.build_int_signed_rem(left, right, "")?,
                TokenKind::And => builder.build_and(left, right, "")?,
                TokenKind::Or => builder.build_or(left, right, "")?,
                TokenKind::Xor => builder.build_xor(left, right, "")?,
                TokenKind::LeftShift | TokenKind::RightShift => {
                    return shift(compiler, operator, left.into(), right.into())
                }
                _ => return Err(unsupported_operator(compiler, operator, left.into())),
            };
            Ok(value.into())
        }
        (BasicValueEnum::FloatValue(left), BasicValueEnum::FloatValue(right)) => {
            let value = match operator.kind {
                TokenKind::Plus => builder.build_float_add(left, right, "")?,
                TokenKind::Minus => builder.build_float_sub(left, right, "")?,
                TokenKind::Star => builder.build_float_mul(left, right, "")?,
                TokenKind::Slash => builder.build_float_div(left, right, "")?,
                TokenKind::Percent => builder.build_float_rem(left, right, "")?,
                _ => return Err(unsupported_operator(compiler, operator, left.into())),
            };
            Ok(value.into())
        }
        (left, _) => Err(unsupported_operator(compiler, operator, left)),
    }
}

fn shift<'a>(
    compiler: &Compiler<'a>,
    operator: &Token,
    left: BasicValueEnum<'a>,
    right: BasicValueEnum<'a>,
) -> Result<BasicValueEnum<'a>, Error> {
    let (left, right) = match (left, right) {
        (BasicValueEnum::IntValue(left), BasicValueEnum::IntValue(right)) => (left, right),
        (left, _) => return Err(unsupported_operator(compiler, operator, left)),
    };

    let amount = if right.get_type().get_bit_width() < left.get_type().get_bit_width() {
        compiler
            .builder
            .build_int_z_extend(right, left.get_type(), "")?
    } else {
        resize_int(compiler, right, left.get_type())?
    };

    let is_signed = left.get_type().get_bit_width() != 1;
    let value = match operator.kind {
        TokenKind::LeftShift => compiler.builder.build_left_shift(left, amount, "")?,
        TokenKind::RightShift => compiler
            .builder
            .build_right_shift(left, amount, is_signed, "")?,
        _ => return Err(unsupported_operator(compiler, operator, left.into())),
    };
    Ok(value.into())
}

fn gen_comparison<'a>(compiler: &Compiler<'a>, binary: &BinaryExpr) -> Result<Operand<'a>, Error> {
    let left = gen_value(compiler, &binary.left)?;
    let right = gen_value(compiler, &binary.right)?;
    let operator = &binary.operator;
    let builder = &compiler.builder;

    let (left, right) = match (left, right) {
        (BasicValueEnum::PointerValue(left), BasicValueEnum::PointerValue(right)) => {
            let address = compiler.context.i64_type();
            (
                builder.build_ptr_to_int(left, address, "")?.into(),
                builder.build_ptr_to_int(right, address, "")?.into(),
            )
        }
        other => other,
    };

    let result = match (left, right) {
        (BasicValueEnum::IntValue(left), BasicValueEnum::IntValue(right)) => {
            let right = resize_int(compiler, right, left.get_type())?;
            let is_signed = left.get_type().get_bit_width() != 1
                && !binary.left.get_type()?.is_pointer();
            let predicate = match (operator.kind, is_signed) {
                (TokenKind::EqualEqual, _) => IntPredicate::EQ,
                (TokenKind::BangEqual, _) => IntPredicate::NE,
                (TokenKind::Smaller, true) => IntPredicate::SLT,
                (TokenKind::Smaller, false) => IntPredicate::ULT,
                (TokenKind::SmallerEqual, true) => IntPredicate::SLE,
                (TokenKind::SmallerEqual, false) => IntPredicate::ULE,
                (TokenKind::Greater, true) => IntPredicate::SGT,
                (TokenKind::Greater, false) => IntPredicate::UGT,
                (TokenKind::GreaterEqual, true) => IntPredicate::SGE,
                (TokenKind::GreaterEqual, false) => IntPredicate::UGE,
                _ => return Err(unsupported_operator(compiler, operator, left.into())),
            };
            builder.build_int_compare(predicate, left, right, "")?
        }
        (BasicValueEnum::FloatValue(left), BasicValueEnum::FloatValue(right)) => {
            let predicate = match operator.kind {
                TokenKind::EqualEqual => FloatPredicate::OEQ,
                TokenKind::BangEqual => FloatPredicate::ONE,
                TokenKind::Smaller => FloatPredicate::OLT,
                TokenKind::SmallerEqual => FloatPredicate::OLE,
                TokenKind::Greater => FloatPredicate::OGT,
                TokenKind::GreaterEqual => FloatPredicate::OGE,
                _ => return Err(unsupported_operator(compiler, operator, left.into())),
            };
            builder.build_float_compare(predicate, left, right, "")?
        }
        (left, _) => return Err(unsupported_operator(compiler, operator, left)),
    };

    Ok(Operand::Value(result.into()))
}

/// `&&` and `||` only evaluate their right operand when the left one does not
/// decide the result.
fn gen_logical<'a>(compiler: &Compiler<'a>, binary: &BinaryExpr) -> Result<Operand<'a>, Error> {
    let left = gen_condition(compiler, &binary.left)?;
    let left_block = compiler.current_block()?;

    let right_block = compiler.append_block("logic.rhs")?;
    let merge_block = compiler.append_block("logic.end")?;

    let short_circuit = match binary.operator.kind {
        TokenKind::AndAnd => {
            compiler
                .builder
                .build_conditional_branch(left, right_block, merge_block)?;
            compiler.context.bool_type().const_zero()
        }
        TokenKind::OrOr => {
            compiler
                .builder
                .build_conditional_branch(left, merge_block, right_block)?;
            compiler.context.bool_type().const_all_ones()
        }
        _ => return Err(unsupported_operator(compiler, &binary.operator, left.into())),
    };

    compiler.builder.position_at_end(right_block);
    let right = gen_condition(compiler, &binary.right)?;
    let right_end = compiler.current_block()?;
    compiler.builder.build_unconditional_branch(merge_block)?;

    compiler.builder.position_at_end(merge_block);
    let phi = compiler.builder.build_phi(compiler.context.bool_type(), "")?;
    phi.add_incoming(&[(&short_circuit, left_block), (&right, right_end)]);

    Ok(Operand::Value(phi.as_basic_value()))
}

fn gen_unary<'a>(compiler: &Compiler<'a>, unary: &UnaryExpr) -> Result<Operand<'a>, Error> {
    let operator = &unary.operator;
    let position = operator.get_position();

    match operator.kind {
        TokenKind::And => match gen_expression(compiler, &unary.right)? {
            Operand::Place(pointer) => Ok(Operand::Value(pointer.into())),
            _ => Err(compiler.fail(ErrorImpl::NotAddressable, position)),
        },
        TokenKind::Star => match gen_value(compiler, &unary.right)? {
            BasicValueEnum::PointerValue(pointer) => Ok(Operand::Place(pointer)),
            other => Err(unsupported_operator(compiler, operator, other)),
        },
        TokenKind::PlusPlus | TokenKind::MinusMinus => {
            let place = match gen_expression(compiler, &unary.right)? {
                Operand::Place(pointer) => pointer,
                _ => return Err(compiler.fail(ErrorImpl::InvalidAssignmentTarget, position)),
            };
            let current = compiler.builder.build_load(place, "")?;
            let one: BasicValueEnum = match current {
                BasicValueEnum::IntValue(int) => int.get_type().const_int(1, false).into(),
                BasicValueEnum::FloatValue(float) => float.get_type().const_float(1.0).into(),
                other => return Err(unsupported_operator(compiler, operator, other)),
            };
            let kind = if operator.kind == TokenKind::PlusPlus {
                TokenKind::Plus
            } else {
                TokenKind::Minus
            };
            let step = Token::new(kind, operator.value.clone(), operator.span.clone());
            let updated = arithmetic(compiler, &step, current, one)?;
            compiler.builder.build_store(place, updated)?;
            Ok(Operand::Value(updated))
        }
        _ => {
            let value = gen_value(compiler, &unary.right)?;
            let result: BasicValueEnum = match (operator.kind, value) {
                (TokenKind::Minus, BasicValueEnum::IntValue(int)) => {
                    compiler.builder.build_int_neg(int, "")?.into()
                }
                (TokenKind::Minus, BasicValueEnum::FloatValue(float)) => {
                    compiler.builder.build_float_neg(float, "")?.into()
                }
                (TokenKind::Bang, BasicValueEnum::IntValue(int))
                    if int.get_type().get_bit_width() == 1 =>
                {
                    compiler.builder.build_not(int, "")?.into()
                }
                (TokenKind::Tilde, BasicValueEnum::IntValue(int)) => {
                    compiler.builder.build_not(int, "")?.into()
                }
                (_, other) => return Err(unsupported_operator(compiler, operator, other)),
            };
            Ok(Operand::Value(result))
        }
    }
}

/// Whether an expression denotes a storage location that may be assigned.
fn is_assignable(expression: &Expr) -> bool {
    match expression {
        Expr::Literal(_) | Expr::Index(_) => true,
        Expr::Unary(unary) => unary.operator.kind == TokenKind::Star,
        Expr::Group(group) => is_assignable(&group.expression),
        _ => false,
    }
}

/// The right-hand side is generated before the target is resolved.
fn gen_assignment<'a>(compiler: &Compiler<'a>, assign: &AssignExpr) -> Result<Operand<'a>, Error> {
    let position = assign.operator.get_position();
    if !is_assignable(&assign.left) {
        return Err(compiler.fail(ErrorImpl::InvalidAssignmentTarget, position));
    }

    let target = assign.left.get_type()?;
    let source = assign.right.get_type()?;
    let compound = assign.operator.kind.compound_operator();

    let right = match compound {
        Some(_) => Operand::Value(gen_value(compiler, &assign.right)?),
        None => gen_expression(compiler, &assign.right)?,
    };

    let place = match gen_expression(compiler, &assign.left)? {
        Operand::Place(pointer) => pointer,
        _ => return Err(compiler.fail(ErrorImpl::InvalidAssignmentTarget, position)),
    };

    let value = match (compound, right) {
        (Some(kind), Operand::Value(right)) => {
            let current = compiler.builder.build_load(place, "")?;
            let operator = Token::new(kind, assign.operator.value.clone(), assign.operator.span.clone());
            arithmetic(compiler, &operator, current, right)?
        }
        (_, right) => {
            convert_operand(compiler, right, &source, &target, assign.right.get_position())?
                .ok_or_else(|| {
                    compiler.fail(
                        ErrorImpl::TypeMismatch {
                            expected: target.to_string(),
                            received: source.to_string(),
                        },
                        position.clone(),
                    )
                })?
        }
    };

    compiler.builder.build_store(place, value)?;
    Ok(Operand::Value(value))
}

/// Resolves the callee of a call and evaluates its arguments, without
/// emitting the call itself.
pub fn prepare_call<'a>(
    compiler: &Compiler<'a>,
    call: &CallExpr,
) -> Result<(Callee<'a>, Vec<BasicMetadataValueEnum<'a>>), Error> {
    let position = call.position.get_position();

    let direct = match call.callee.as_ref() {
        Expr::Literal(literal) => {
            match compiler.lookup(&literal.name.value, literal.name.get_position())? {
                Binding::Function(function) => compiler
                    .functions
                    .get(&literal.name.value)
                    .map(|declared| (literal.name.value.clone(), function, declared.signature.clone())),
                _ => None,
            }
        }
        _ => None,
    };

    let (name, callee, signature) = match direct {
        Some((name, function, signature)) => (name, Callee::Direct(function), signature),
        None => {
            let callee_type = call.callee.get_type()?;
            let signature = callee_type.callable_signature().cloned().ok_or_else(|| {
                compiler.fail(
                    ErrorImpl::NotCallable {
                        type_: callee_type.to_string(),
                    },
                    position.clone(),
                )
            })?;
            let pointer = match gen_value(compiler, &call.callee)? {
                BasicValueEnum::PointerValue(pointer) => pointer,
                _ => {
                    return Err(compiler.fail(
                        ErrorImpl::NotCallable {
                            type_: callee_type.to_string(),
                        },
                        position,
                    ))
                }
            };
            let name = match call.callee.as_ref() {
                Expr::Literal(literal) => literal.name.value.clone(),
                _ => callee_type.to_string(),
            };
            let function_type = compiler.types.function_type(&signature);
            callable_pointer(function_type, pointer, position)?;
            (
                name,
                Callee::Indirect {
                    function_type,
                    pointer,
                },
                signature,
            )
        }
    };

    let arguments = gen_arguments(compiler, call, &name, &signature)?;
    Ok((callee, arguments))
}

fn gen_arguments<'a>(
    compiler: &Compiler<'a>,
    call: &CallExpr,
    name: &str,
    signature: &FunctionSignature,
) -> Result<Vec<BasicMetadataValueEnum<'a>>, Error> {
    let expected = signature.parameters.len();
    let received = call.arguments.len();
    if received < expected || (!signature.is_variadic && received > expected) {
        return Err(compiler.fail(
            ErrorImpl::ArgumentCountMismatch {
                function: name.to_string(),
                expected,
                received,
            },
            call.position.get_position(),
        ));
    }

    let mut arguments = Vec::with_capacity(received);
    for (index, argument) in call.arguments.iter().enumerate() {
        let source = argument.get_type()?;
        let operand = gen_expression(compiler, argument)?;
        let position = argument.get_position();

        let value = match signature.parameters.get(index) {
            Some(parameter) => convert_operand(compiler, operand, &source, parameter, position.clone())?
                .ok_or_else(|| {
                    compiler.fail(
                        ErrorImpl::ArgumentTypeMismatch {
                            function: name.to_string(),
                            index,
                            expected: parameter.to_string(),
                            received: source.to_string(),
                        },
                        position,
                    )
                })?,
            None => variadic_argument(compiler, operand, &source, position)?,
        };
        arguments.push(value.into());
    }

    Ok(arguments)
}

/// Applies the C default argument promotions to an argument passed through
/// the variadic part of a signature.
fn variadic_argument<'a>(
    compiler: &Compiler<'a>,
    operand: Operand<'a>,
    source: &Type,
    position: Position,
) -> Result<BasicValueEnum<'a>, Error> {
    if let Type::Array(_, _) = source {
        return Ok(decay(compiler, operand, position)?.into());
    }

    let promoted = match rvalue(compiler, operand, position)? {
        BasicValueEnum::IntValue(int) if int.get_type().get_bit_width() < 32 => {
            resize_int(compiler, int, compiler.context.i32_type())?.into()
        }
        BasicValueEnum::FloatValue(float) if source == &Type::Float(32) => compiler
            .builder
            .build_float_ext(float, compiler.context.f64_type(), "")?
            .into(),
        other => other,
    };
    Ok(promoted)
}

fn gen_call<'a>(compiler: &Compiler<'a>, call: &CallExpr) -> Result<Operand<'a>, Error> {
    let (callee, arguments) = prepare_call(compiler, call)?;
    let call_site = match callee {
        Callee::Direct(function) => compiler.builder.build_call(function, &arguments, "")?,
        Callee::Indirect {
            function_type,
            pointer,
        } => {
            let callable = callable_pointer(function_type, pointer, call.position.get_position())?;
            compiler.builder.build_call(callable, &arguments, "")?
        }
    };

    Ok(match call_site.try_as_basic_value().left() {
        Some(value) => Operand::Value(value),
        None => Operand::Void,
    })
}

/// Address of the indexed aggregate, evaluated before the subscript.
enum IndexBase<'a> {
    Array(PointerValue<'a>),
    Pointer(PointerValue<'a>),
}

fn gen_index<'a>(compiler: &Compiler<'a>, index: &IndexExpr) -> Result<Operand<'a>, Error> {
    let position = index.position.get_position();
    let base_type = index.value.get_type()?;

    let base = match base_type {
        Type::Array(_, _) => IndexBase::Array(match gen_expression(compiler, &index.value)? {
            Operand::Place(pointer) => pointer,
            Operand::Value(value) => spill(compiler, value)?,
            Operand::Void => return Err(compiler.fail(ErrorImpl::VoidValue, position)),
        }),
        Type::Pointer(_) => {
            IndexBase::Pointer(gen_value(compiler, &index.value)?.into_pointer_value())
        }
        other => {
            return Err(compiler.fail(
                ErrorImpl::NotIndexable {
                    type_: other.to_string(),
                },
                position,
            ))
        }
    };

    let offset = match gen_value(compiler, &index.index)? {
        BasicValueEnum::IntValue(int) => resize_int(compiler, int, compiler.context.i64_type())?,
        _ => {
            return Err(compiler.fail(
                ErrorImpl::TypeMismatch {
                    expected: Type::Integer(64).to_string(),
                    received: index.index.get_type()?.to_string(),
                },
                index.index.get_position(),
            ))
        }
    };

    let element = match base {
        IndexBase::Array(array) => {
            let zero = compiler.context.i64_type().const_zero();
            unsafe {
                compiler
                    .builder
                    .build_in_bounds_gep(array, &[zero, offset], "")?
            }
        }
        IndexBase::Pointer(pointer) => unsafe {
            compiler.builder.build_in_bounds_gep(pointer, &[offset], "")?
        },
    };

    Ok(Operand::Place(element))
}

fn gen_cast<'a>(compiler: &Compiler<'a>, cast: &CastExpr) -> Result<Operand<'a>, Error> {
    let source = cast.value.get_type()?;
    let target = &cast.ty;
    let position = cast.position.get_position();
    let unsupported = || {
        compiler.fail(
            ErrorImpl::UnsupportedCast {
                from: source.to_string(),
                to: target.to_string(),
            },
            position.clone(),
        )
    };

    if target.is_void() {
        return Err(unsupported());
    }

    let operand = gen_expression(compiler, &cast.value)?;
    if &source == target {
        return rvalue(compiler, operand, position.clone()).map(Operand::Value);
    }

    if let (Type::Array(_, _), Type::Pointer(_)) = (&source, target) {
        let decayed = decay(compiler, operand, position.clone())?;
        let target_type = compiler.types.convert_type(target).into_pointer_type();
        return Ok(Operand::Value(
            compiler
                .builder
                .build_pointer_cast(decayed, target_type, "")?
                .into(),
        ));
    }

    let value = rvalue(compiler, operand, position.clone())?;
    let target_type = compiler.types.convert_type(target);
    let builder = &compiler.builder;

    let converted: BasicValueEnum = match (value, target_type) {
        (BasicValueEnum::IntValue(int), BasicTypeEnum::IntType(to)) => {
            resize_int(compiler, int, to)?.into()
        }
        (BasicValueEnum::IntValue(int), BasicTypeEnum::FloatType(to)) => {
            if int.get_type().get_bit_width() == 1 {
                builder.build_unsigned_int_to_float(int, to, "")?.into()
            } else {
                builder.build_signed_int_to_float(int, to, "")?.into()
            }
        }
        (BasicValueEnum::FloatValue(float), BasicTypeEnum::IntType(to)) => {
            builder.build_float_to_signed_int(float, to, "")?.into()
        }
        (BasicValueEnum::FloatValue(float), BasicTypeEnum::FloatType(to)) => {
            match (&source, target) {
                (Type::Float(from), Type::Float(into)) if from < into => {
                    builder.build_float_ext(float, to, "")?.into()
                }
                (Type::Float(from), Type::Float(into)) if from > into => {
                    builder.build_float_trunc(float, to, "")?.into()
                }
                _ => float.into(),
            }
        }
        (BasicValueEnum::PointerValue(pointer), BasicTypeEnum::PointerType(to)) => {
            builder.build_pointer_cast(pointer, to, "")?.into()
        }
        (BasicValueEnum::PointerValue(pointer), BasicTypeEnum::IntType(to)) => {
            builder.build_ptr_to_int(pointer, to, "")?.into()
        }
        (BasicValueEnum::IntValue(int), BasicTypeEnum::PointerType(to)) => {
            builder.build_int_to_ptr(int, to, "")?.into()
        }
        _ => return Err(unsupported()),
    };

    Ok(Operand::Value(converted))
}

fn gen_array<'a>(compiler: &Compiler<'a>, array: &ArrayExpr) -> Result<Operand<'a>, Error> {
    let element_type = compiler.types.convert_type(&array.element_type);
    let mut aggregate = element_type.array_type(array.values.len() as u32).get_undef();

    for (index, value) in array.values.iter().enumerate() {
        let source = value.get_type()?;
        let operand = gen_expression(compiler, value)?;
        let element = convert_operand(
            compiler,
            operand,
            &source,
            &array.element_type,
            value.get_position(),
        )?
        .ok_or_else(|| {
            compiler.fail(
                ErrorImpl::TypeMismatch {
                    expected: array.element_type.to_string(),
                    received: source.to_string(),
                },
                value.get_position(),
            )
        })?;

        aggregate = compiler
            .builder
            .build_insert_value(aggregate, element, index as u32, "")?
            .into_array_value();
    }

    Ok(Operand::Value(aggregate.into()))
}

/// Value producing `if`. Both branches are evaluated in their own block and
/// joined with a phi.
fn gen_if_expression<'a>(compiler: &Compiler<'a>, if_expr: &IfExpr) -> Result<Operand<'a>, Error> {
    let result_type = if_expr.if_value.get_type()?;
    let condition = gen_condition(compiler, &if_expr.condition)?;

    let then_block = compiler.append_block("ifexpr.then")?;
    let else_block = compiler.append_block("ifexpr.else")?;
    let merge_block = compiler.append_block("ifexpr.end")?;
    compiler
        .builder
        .build_conditional_branch(condition, then_block, else_block)?;

    compiler.builder.position_at_end(then_block);
    let then_value = gen_value(compiler, &if_expr.if_value)?;
    let then_end = compiler.current_block()?;
    compiler.builder.build_unconditional_branch(merge_block)?;

    compiler.builder.position_at_end(else_block);
    let else_type = if_expr.else_value.get_type()?;
    let else_operand = gen_expression(compiler, &if_expr.else_value)?;
    let else_value = convert_operand(
        compiler,
        else_operand,
        &else_type,
        &result_type,
        if_expr.else_token.get_position(),
    )?
    .ok_or_else(|| {
        compiler.fail(
            ErrorImpl::TypeMismatch {
                expected: result_type.to_string(),
                received: else_type.to_string(),
            },
            if_expr.else_token.get_position(),
        )
    })?;
    let else_end = compiler.current_block()?;
    compiler.builder.build_unconditional_branch(merge_block)?;

    compiler.builder.position_at_end(merge_block);
    let phi = compiler
        .builder
        .build_phi(compiler.types.convert_type(&result_type), "")?;
    phi.add_incoming(&[(&then_value, then_end), (&else_value, else_end)]);

    Ok(Operand::Value(phi.as_basic_value()))
}

/// Private constant holding the bytes of a string literal followed by a NUL.
///
/// The returned pointer is typed as a pointer to the literal's own array type,
/// so the terminator is not part of the value.
pub fn string_global<'a>(compiler: &Compiler<'a>, text: &str) -> PointerValue<'a> {
    let bytes = text.as_bytes();
    let initializer = compiler.context.const_string(bytes, true);

    let global = compiler.module.add_global(initializer.get_type(), None, ".str");
    global.set_linkage(Linkage::Private);
    global.set_constant(true);
    global.set_initializer(&initializer);

    trace!(length = bytes.len(), "emitted string literal");

    let storage = compiler
        .types
        .convert_type(&Type::array(Type::Integer(8), bytes.len() as u32))
        .ptr_type(AddressSpace::default());
    global.as_pointer_value().const_cast(storage)
}

pub fn number_constant<'a>(
    compiler: &Compiler<'a>,
    token: &Token,
    type_: &Type,
    negate: bool,
) -> Result<BasicValueEnum<'a>, Error> {
    let invalid = || {
        compiler.fail(
            ErrorImpl::InvalidNumberLiteral {
                literal: token.value.clone(),
            },
            token.get_position(),
        )
    };
    let text: String = token.value.chars().filter(|c| *c != '_').collect();

    match type_ {
        Type::Integer(_) => {
            let magnitude = parse_integer(&text).ok_or_else(invalid)?;
            let bits = if negate {
                magnitude.wrapping_neg()
            } else {
                magnitude
            };
            Ok(compiler
                .types
                .convert_type(type_)
                .into_int_type()
                .const_int(bits, negate)
                .into())
        }
        Type::Float(_) => {
            let value: f64 = text.parse().map_err(|_| invalid())?;
            let value = if negate { -value } else { value };
            Ok(compiler
                .types
                .convert_type(type_)
                .into_float_type()
                .const_float(value)
                .into())
        }
        _ => Err(invalid()),
    }
}

/// A number literal, possibly negated and parenthesized.
fn numeric_literal(expression: &Expr) -> Option<(&Token, bool)> {
    match expression {
        Expr::Number(number) => Some((&number.value, false)),
        Expr::Group(group) => numeric_literal(&group.expression),
        Expr::Unary(unary) if unary.operator.kind == TokenKind::Minus => {
            numeric_literal(&unary.right).map(|(token, negate)| (token, !negate))
        }
        _ => None,
    }
}

/// Folds a cast of a number literal. Float literals cast to integers are
/// truncated toward zero.
fn cast_number_constant<'a>(
    compiler: &Compiler<'a>,
    token: &Token,
    target: &Type,
    negate: bool,
) -> Result<BasicValueEnum<'a>, Error> {
    if !(target.is_integer() && token.kind == TokenKind::Float) {
        return number_constant(compiler, token, target, negate);
    }

    let value: f64 = token
        .value
        .replace('_', "")
        .parse()
        .map_err(|_| {
            compiler.fail(
                ErrorImpl::InvalidNumberLiteral {
                    literal: token.value.clone(),
                },
                token.get_position(),
            )
        })?;
    let value = if negate { -value } else { value };

    Ok(compiler
        .types
        .convert_type(target)
        .into_int_type()
        .const_int(value.trunc() as i64 as u64, true)
        .into())
}

/// Parses decimal, `0x`, `0o` and `0b` integer literals.
pub(crate) fn parse_integer(text: &str) -> Option<u64> {
    let (digits, radix) = match text.get(..2) {
        Some("0x") | Some("0X") => (&text[2..], 16),
        Some("0o") | Some("0O") => (&text[2..], 8),
        Some("0b") | Some("0B") => (&text[2..], 2),
        _ => (text, 10),
    };
    u64::from_str_radix(digits, radix).ok()
}

/// Byte value of a character literal, with or without its quotes.
pub(crate) fn character_value(text: &str) -> Option<u8> {
    let inner = text
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .unwrap_or(text);

    match inner.as_bytes() {
        [byte] => Some(*byte),
        [b'\\', escaped] => match escaped {
            b'n' => Some(b'\n'),
            b't' => Some(b'\t'),
            b'r' => Some(b'\r'),
            b'0' => Some(0),
            b'\\' => Some(b'\\'),
            b'\'' => Some(b'\''),
            b'"' => Some(b'"'),
            _ => None,
        },
        _ => None,
    }
}

fn character_constant<'a>(compiler: &Compiler<'a>, token: &Token) -> Result<BasicValueEnum<'a>, Error> {
    let value = character_value(&token.value).ok_or_else(|| {
        compiler.fail(
            ErrorImpl::InvalidCharacterLiteral {
                literal: token.value.clone(),
            },
            token.get_position(),
        )
    })?;
    Ok(compiler.context.i8_type().const_int(value as u64, false).into())
}

fn boolean_constant<'a>(compiler: &Compiler<'a>, token: &Token) -> BasicValueEnum<'a> {
    let value = (token.kind == TokenKind::True) as u64;
    compiler.context.bool_type().const_int(value, false).into()
}

/// Evaluates the initializer of a global variable without emitting any
/// instruction.
///
/// Returns `Ok(None)` when the expression is not a compile time constant.
pub fn gen_constant<'a>(
    compiler: &Compiler<'a>,
    expression: &Expr,
    expected: &Type,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let mismatch = |received: &Type| {
        compiler.fail(
            ErrorImpl::TypeMismatch {
                expected: expected.to_string(),
                received: received.to_string(),
            },
            expression.get_position(),
        )
    };

    let value = match expression {
        Expr::Group(group) => return gen_constant(compiler, &group.expression, expected),
        Expr::Number(number) => number_constant(compiler, &number.value, &number.ty, false)?,
        Expr::Unary(unary) if unary.operator.kind == TokenKind::Minus => {
            match numeric_literal(expression) {
                Some((token, negate)) => {
                    number_constant(compiler, token, &expression.get_type()?, negate)?
                }
                None => return Ok(None),
            }
        }
        Expr::Character(character) => character_constant(compiler, &character.value)?,
        Expr::Boolean(boolean) => boolean_constant(compiler, &boolean.value),
        Expr::Cast(cast) => match numeric_literal(&cast.value) {
            Some((token, negate)) if cast.ty.is_integer() || cast.ty.is_float() => {
                cast_number_constant(compiler, token, &cast.ty, negate)?
            }
            _ => return Ok(None),
        },
        Expr::EnumAccess(access) => {
            match compiler.lookup(&access.qualified_name(), access.enum_name.get_position())? {
                Binding::Constant(value) => value,
                _ => return Ok(None),
            }
        }
        Expr::Null(_) => {
            return match expected {
                Type::Pointer(_) => Ok(Some(
                    compiler
                        .types
                        .zero_value(compiler.types.convert_type(expected)),
                )),
                _ => Err(mismatch(&Type::pointer(Type::Void))),
            }
        }
        Expr::String(string) => {
            let text = &string.value.value;
            return match expected {
                Type::Array(_, _) if *expected == string.get_type() => {
                    Ok(Some(compiler.context.const_string(text.as_bytes(), false).into()))
                }
                Type::Pointer(pointee)
                    if matches!(pointee.as_ref(), Type::Integer(8) | Type::Void) =>
                {
                    let target = compiler.types.convert_type(expected).into_pointer_type();
                    Ok(Some(string_global(compiler, text).const_cast(target).into()))
                }
                _ => Err(mismatch(&string.get_type())),
            };
        }
        _ => return Ok(None),
    };

    let source = expression.get_type()?;
    if &source != expected {
        return Err(mismatch(&source));
    }
    Ok(Some(value))
}
