use std::slice;

use inkwell::values::BasicValue;
use tracing::trace;

use crate::{
    ast::{
        ast::Stmt,
        statements::{
            BreakStmt, DeferStmt, FieldDeclaration, IfStmt, ReturnStmt, WhileStmt,
        },
    },
    errors::errors::{Error, ErrorImpl},
};

use super::{
    compiler::{Binding, Compiler, Operand},
    defer::DeferredCall,
    expr::{convert_operand, gen_condition, gen_expression, prepare_call, Callee},
    loops::LoopExit,
};

pub fn gen_statement<'a>(compiler: &mut Compiler<'a>, statement: &Stmt) -> Result<(), Error> {
    match statement {
        Stmt::Block(block) => gen_scope(compiler, &block.nodes),
        Stmt::FieldDeclaration(field) => gen_field_declaration(compiler, field),
        Stmt::FunctionPrototype(prototype) => {
            compiler.declare_prototype(prototype, false)?;
            Ok(())
        }
        Stmt::ExternalPrototype(external) => {
            compiler.declare_prototype(&external.prototype, true)?;
            Ok(())
        }
        Stmt::FunctionDeclaration(function) => Err(compiler.fail(
            ErrorImpl::NestedFunction {
                name: function.prototype.name.value.clone(),
            },
            function.prototype.name.get_position(),
        )),
        Stmt::EnumDeclaration(declaration) => compiler.declare_enum(declaration),
        Stmt::If(if_stmt) => gen_if(compiler, if_stmt),
        Stmt::While(while_stmt) => gen_while(compiler, while_stmt),
        Stmt::Return(return_stmt) => gen_return(compiler, return_stmt),
        Stmt::Defer(defer_stmt) => gen_defer(compiler, defer_stmt),
        Stmt::Break(break_stmt) => gen_break(compiler, break_stmt),
        Stmt::Expression(expression_stmt) => {
            gen_expression(compiler, &expression_stmt.expression)?;
            Ok(())
        }
    }
}

/// Generates the body of an `if` or `while`. A body that is not a block still
/// gets its own scope.
fn gen_body<'a>(compiler: &mut Compiler<'a>, body: &Stmt) -> Result<(), Error> {
    match body {
        Stmt::Block(block) => gen_scope(compiler, &block.nodes),
        other => gen_scope(compiler, slice::from_ref(other)),
    }
}

/// Runs statements in a fresh scope with its own defer frame.
fn gen_scope<'a>(compiler: &mut Compiler<'a>, nodes: &[Stmt]) -> Result<(), Error> {
    compiler.scopes.enter_scope();
    compiler.defers.push_frame();

    let result = gen_scope_body(compiler, nodes);

    compiler.defers.pop_frame();
    compiler.scopes.exit_scope();
    result
}

fn gen_scope_body<'a>(compiler: &mut Compiler<'a>, nodes: &[Stmt]) -> Result<(), Error> {
    for (index, node) in nodes.iter().enumerate() {
        if compiler.is_terminated() {
            trace!(skipped = nodes.len() - index, "dropping unreachable statements");
            break;
        }
        gen_statement(compiler, node)?;
    }

    // Falling off the end of the scope runs its deferred calls. Scopes left
    // through `return` or `break` already ran them.
    if !compiler.is_terminated() {
        for call in compiler.defers.frame_calls() {
            call.generate_call(&compiler.builder)?;
        }
    }
    Ok(())
}

fn gen_field_declaration<'a>(
    compiler: &mut Compiler<'a>,
    field: &FieldDeclaration,
) -> Result<(), Error> {
    let name = &field.name.value;
    let position = field.name.get_position();
    let field_type = field.get_type()?.clone();
    let storage = compiler.storage_type(&field_type, name, &position)?;

    let value = match &field.value {
        Some(value) => {
            let source = value.get_type()?;
            let operand = gen_expression(compiler, value)?;
            convert_operand(compiler, operand, &source, &field_type, value.get_position())?
                .ok_or_else(|| {
                    compiler.fail(
                        ErrorImpl::TypeMismatch {
                            expected: field_type.to_string(),
                            received: source.to_string(),
                        },
                        position.clone(),
                    )
                })?
        }
        None => compiler.types.zero_value(storage),
    };

    let slot = compiler.create_entry_block_alloca(name, storage)?;
    compiler.builder.build_store(slot, value)?;
    compiler.scopes.declare(name.clone(), Binding::Slot(slot));

    Ok(())
}

fn gen_if<'a>(compiler: &mut Compiler<'a>, if_stmt: &IfStmt) -> Result<(), Error> {
    let condition = gen_condition(compiler, &if_stmt.condition)?;
    let then_block = compiler.append_block("if.then")?;

    let else_body = match &if_stmt.else_body {
        Some(else_body) => else_body,
        None => {
            let merge_block = compiler.append_block("if.end")?;
            compiler
                .builder
                .build_conditional_branch(condition, then_block, merge_block)?;

            compiler.builder.position_at_end(then_block);
            gen_body(compiler, &if_stmt.then_body)?;
            if !compiler.is_terminated() {
                compiler.builder.build_unconditional_branch(merge_block)?;
            }

            compiler.builder.position_at_end(merge_block);
            return Ok(());
        }
    };

    let else_block = compiler.append_block("if.else")?;
    compiler
        .builder
        .build_conditional_branch(condition, then_block, else_block)?;

    compiler.builder.position_at_end(then_block);
    gen_body(compiler, &if_stmt.then_body)?;
    let then_end = (!compiler.is_terminated())
        .then(|| compiler.current_block())
        .transpose()?;

    compiler.builder.position_at_end(else_block);
    gen_body(compiler, else_body)?;
    let else_end = (!compiler.is_terminated())
        .then(|| compiler.current_block())
        .transpose()?;

    // Both branches left through `return` or `break`: nothing follows the if.
    if then_end.is_none() && else_end.is_none() {
        return Ok(());
    }

    let merge_block = compiler.append_block("if.end")?;
    for open_block in [then_end, else_end].into_iter().flatten() {
        compiler.builder.position_at_end(open_block);
        compiler.builder.build_unconditional_branch(merge_block)?;
    }
    compiler.builder.position_at_end(merge_block);

    Ok(())
}

fn gen_while<'a>(compiler: &mut Compiler<'a>, while_stmt: &WhileStmt) -> Result<(), Error> {
    let condition_block = compiler.append_block("while.cond")?;
    let body_block = compiler.append_block("while.body")?;
    let end_block = compiler.append_block("while.end")?;

    compiler
        .builder
        .build_unconditional_branch(condition_block)?;

    compiler.builder.position_at_end(condition_block);
    let condition = gen_condition(compiler, &while_stmt.condition)?;
    // `while (true)` only exits through `break`.
    if condition.get_zero_extended_constant() == Some(1) {
        compiler.builder.build_unconditional_branch(body_block)?;
    } else {
        compiler
            .builder
            .build_conditional_branch(condition, body_block, end_block)?;
    }

    compiler.builder.position_at_end(body_block);
    compiler.loops.push(LoopExit {
        exit_block: end_block,
        defer_depth: compiler.defers.depth(),
    });
    let result = gen_body(compiler, &while_stmt.body);
    compiler.loops.pop();
    result?;

    if !compiler.is_terminated() {
        compiler
            .builder
            .build_unconditional_branch(condition_block)?;
    }

    compiler.builder.position_at_end(end_block);
    Ok(())
}

/// Leaves the innermost loop, running the deferred calls of every scope
/// opened inside it.
fn gen_break<'a>(compiler: &mut Compiler<'a>, break_stmt: &BreakStmt) -> Result<(), Error> {
    let exit = match compiler.loops.current() {
        Some(exit) => *exit,
        None => {
            return Err(compiler.fail(
                ErrorImpl::BreakOutsideLoop,
                break_stmt.position.get_position(),
            ))
        }
    };

    for call in compiler.defers.calls_above(exit.defer_depth) {
        call.generate_call(&compiler.builder)?;
    }

    compiler
        .builder
        .build_unconditional_branch(exit.exit_block)?;
    Ok(())
}

/// The returned value is computed before any deferred call runs.
fn gen_return<'a>(compiler: &mut Compiler<'a>, return_stmt: &ReturnStmt) -> Result<(), Error> {
    let position = return_stmt.position.get_position();
    let current = compiler.current_function_info(position.clone())?;
    let mismatch = |compiler: &Compiler<'a>, received: String| {
        compiler.fail(
            ErrorImpl::ReturnTypeMismatch {
                function: current.name.clone(),
                expected: current.return_type.to_string(),
                received,
            },
            position.clone(),
        )
    };

    let value = match &return_stmt.value {
        None if current.return_type.is_void() => None,
        None => return Err(mismatch(compiler, String::from("void"))),
        Some(value) => {
            let source = value.get_type()?;
            let operand = gen_expression(compiler, value)?;
            match operand {
                Operand::Void if current.return_type.is_void() => None,
                _ if current.return_type.is_void() => {
                    return Err(mismatch(compiler, source.to_string()))
                }
                operand => match convert_operand(
                    compiler,
                    operand,
                    &source,
                    &current.return_type,
                    value.get_position(),
                )? {
                    Some(converted) => Some(converted),
                    None => return Err(mismatch(compiler, source.to_string())),
                },
            }
        }
    };

    for call in compiler.defers.calls_above(0) {
        call.generate_call(&compiler.builder)?;
    }

    compiler
        .builder
        .build_return(value.as_ref().map(|value| value as &dyn BasicValue<'a>))?;
    Ok(())
}

/// Callee and arguments are evaluated where the `defer` appears; only the
/// call itself is postponed.
fn gen_defer<'a>(compiler: &mut Compiler<'a>, defer_stmt: &DeferStmt) -> Result<(), Error> {
    let (callee, arguments) = prepare_call(compiler, &defer_stmt.call)?;
    let call = match callee {
        Callee::Direct(function) => DeferredCall::Function {
            function,
            arguments,
        },
        Callee::Indirect {
            function_type,
            pointer,
        } => DeferredCall::FunctionPointer {
            function_type,
            callee: pointer,
            arguments,
        },
    };

    trace!(depth = compiler.defers.depth(), "registered deferred call");

    compiler.defers.register(call).map_err(|_| {
        compiler.fail(
            ErrorImpl::StatementOutsideFunction {
                statement: String::from("defer"),
            },
            defer_stmt.position.get_position(),
        )
    })
}
