//! Main compiler module.
//!
//! This module contains the core Compiler structure and the compilation entry
//! points. A compiler instance owns the LLVM module and builder for one
//! compilation unit, together with the transient state of the traversal:
//! scoped storage, deferred calls and loop exits.

use std::collections::HashMap;

use inkwell::{
    attributes::{Attribute, AttributeLoc},
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine},
    types::BasicTypeEnum,
    values::{BasicValueEnum, FunctionValue, PointerValue},
    OptimizationLevel,
};
use tracing::{debug, error, instrument, trace};

use crate::{
    ast::{
        ast::{CompilationUnit, Stmt},
        expressions::qualified_enum_name,
        statements::{EnumDeclaration, FieldDeclaration, FunctionDeclaration, FunctionPrototype},
        types::{FunctionSignature, Type},
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::{
    defer::{DeferRegistry, DeferredCall},
    expr::gen_constant,
    loops::{LoopExit, LoopStack},
    scope::Scopes,
    stmt::gen_statement,
    types::TypeLowering,
};

/// Options controlling a compilation.
#[derive(Debug, Clone, Copy)]
pub struct CompilerOptions {
    /// Run the LLVM verifier on the finished module.
    pub verify: bool,
    /// Stamp the module with the host target triple and data layout.
    pub host_target: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            verify: true,
            host_target: false,
        }
    }
}

/// What a name resolves to in the scoped storage tracker.
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    /// A stack slot or global variable.
    Slot(PointerValue<'a>),
    /// A compile time constant, such as an enum element.
    Constant(BasicValueEnum<'a>),
    Function(FunctionValue<'a>),
}

/// The result of generating an expression.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Value(BasicValueEnum<'a>),
    /// An addressable location holding the expression's value.
    Place(PointerValue<'a>),
    /// The result of calling a void function.
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclarationKind {
    Prototype,
    External,
    Definition,
}

#[derive(Debug)]
pub(crate) struct DeclaredFunction<'a> {
    pub function: FunctionValue<'a>,
    pub signature: FunctionSignature,
    pub position: Position,
    pub is_external: bool,
    pub is_defined: bool,
}

/// The function whose body is being generated.
#[derive(Debug, Clone)]
pub(crate) struct CurrentFunction<'a> {
    pub function: FunctionValue<'a>,
    pub name: String,
    pub return_type: Type,
}

/// The main compiler structure that holds the state of one compilation.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
pub struct Compiler<'a> {
    pub options: CompilerOptions,

    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,
    pub types: TypeLowering<'a>,

    pub scopes: Scopes<Binding<'a>>,
    pub defers: DeferRegistry<DeferredCall<'a>>,
    pub loops: LoopStack<LoopExit<'a>>,

    pub(crate) functions: HashMap<String, DeclaredFunction<'a>>,
    /// Declaration sites of enums, enum elements and global variables
    pub(crate) globals: HashMap<String, Position>,
    pub(crate) current_function: Option<CurrentFunction<'a>>,
}

impl<'a> Compiler<'a> {
    pub fn new(context: &'a Context, module_name: &str, options: CompilerOptions) -> Self {
        Compiler {
            options,
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            types: TypeLowering::new(context),
            scopes: Scopes::new(),
            defers: DeferRegistry::new(),
            loops: LoopStack::new(),
            functions: HashMap::new(),
            globals: HashMap::new(),
            current_function: None,
        }
    }

    /// Drops all per-unit state and starts a fresh module, so the instance can
    /// compile another unit without leaking declarations from the previous one.
    pub fn reset(&mut self, module_name: &str) {
        self.module = self.context.create_module(module_name);
        self.builder.clear_insertion_position();
        self.scopes.clear();
        self.defers.clear();
        self.loops.clear();
        self.functions.clear();
        self.globals.clear();
        self.current_function = None;
    }

    /// Generates IR for every top-level statement of the unit.
    ///
    /// Declarations (prototypes, enums, globals) are processed first so that
    /// function bodies may call functions declared further down the file.
    pub fn compile_unit(&mut self, unit: &CompilationUnit) -> Result<(), Error> {
        if self.options.host_target {
            self.set_host_target()?;
        }

        for node in unit.tree_nodes.iter() {
            self.declare_top_level(node)?;
        }

        for node in unit.tree_nodes.iter() {
            if let Stmt::FunctionDeclaration(function) = node {
                self.gen_function(function)?;
            }
        }

        if self.options.verify {
            self.module.verify().map_err(|message| {
                Error::new(
                    ErrorImpl::Verification {
                        message: message.to_string(),
                    },
                    Position::null(),
                )
            })?;
        }

        Ok(())
    }

    /// Consumes the compiler and hands out the finished module.
    pub fn finish(self) -> Module<'a> {
        self.module
    }

    /// The textual IR of the module built so far.
    pub fn print_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    fn set_host_target(&self) -> Result<(), Error> {
        let target_error = |message: String| {
            Error::new(ErrorImpl::Target { message }, Position::null())
        };

        Target::initialize_native(&InitializationConfig::default()).map_err(target_error)?;
        let target_triple = TargetMachine::get_default_triple();
        let target =
            Target::from_triple(&target_triple).map_err(|e| target_error(e.to_string()))?;
        let target_machine = target
            .create_target_machine(
                &target_triple,
                "generic",
                "",
                OptimizationLevel::Default,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| target_error(String::from("unable to create target machine")))?;

        self.module.set_triple(&target_triple);
        self.module
            .set_data_layout(&target_machine.get_target_data().get_data_layout());

        Ok(())
    }

    fn declare_top_level(&mut self, node: &Stmt) -> Result<(), Error> {
        match node {
            Stmt::FunctionPrototype(prototype) => {
                self.declare_function(prototype, DeclarationKind::Prototype)?;
            }
            Stmt::ExternalPrototype(external) => {
                self.declare_function(&external.prototype, DeclarationKind::External)?;
            }
            Stmt::FunctionDeclaration(function) => {
                self.declare_function(&function.prototype, DeclarationKind::Definition)?;
            }
            Stmt::EnumDeclaration(declaration) => self.declare_enum(declaration)?,
            Stmt::FieldDeclaration(field) => self.gen_global_field(field)?,
            other => {
                return Err(self.fail(
                    ErrorImpl::StatementOutsideFunction {
                        statement: other.name().to_string(),
                    },
                    other.get_position(),
                ))
            }
        }
        Ok(())
    }

    /// Registers a prototype in the module and the global scope.
    pub fn declare_prototype(
        &mut self,
        prototype: &FunctionPrototype,
        is_external: bool,
    ) -> Result<FunctionValue<'a>, Error> {
        let kind = if is_external {
            DeclarationKind::External
        } else {
            DeclarationKind::Prototype
        };
        self.declare_function(prototype, kind)
    }

    fn declare_function(
        &mut self,
        prototype: &FunctionPrototype,
        kind: DeclarationKind,
    ) -> Result<FunctionValue<'a>, Error> {
        let name = &prototype.name.value;
        let position = prototype.name.get_position();
        let signature = prototype.signature();

        if let Some(parameter) = prototype.parameters.iter().find(|p| p.ty.is_void()) {
            return Err(self.fail(
                ErrorImpl::VoidStorage {
                    name: parameter.name.value.clone(),
                },
                parameter.name.get_position(),
            ));
        }

        if let Some(existing) = self.functions.get_mut(name) {
            if existing.signature != signature {
                let previous = existing.position.clone();
                return Err(self.fail(
                    ErrorImpl::ConflictingSignature {
                        name: name.clone(),
                        previous,
                    },
                    position,
                ));
            }

            let clashes = match kind {
                DeclarationKind::Definition => existing.is_defined || existing.is_external,
                DeclarationKind::External => existing.is_defined,
                DeclarationKind::Prototype => false,
            };
            if clashes {
                let previous = existing.position.clone();
                return Err(self.fail(
                    ErrorImpl::DuplicateDeclaration {
                        name: name.clone(),
                        previous,
                    },
                    position,
                ));
            }

            existing.is_defined |= kind == DeclarationKind::Definition;
            existing.is_external |= kind == DeclarationKind::External;
            return Ok(existing.function);
        }

        self.check_global_name(name, &position)?;

        let function_type = self.types.function_type(&signature);
        let function = self
            .module
            .add_function(name, function_type, Some(Linkage::External));

        trace!(function = %name, ?kind, "declared function");

        self.scopes
            .declare_global(name.clone(), Binding::Function(function));
        self.functions.insert(
            name.clone(),
            DeclaredFunction {
                function,
                signature,
                position,
                is_external: kind == DeclarationKind::External,
                is_defined: kind == DeclarationKind::Definition,
            },
        );

        Ok(function)
    }

    /// Binds every element of the enum to its ordinal, in declaration order
    /// starting at zero.
    pub fn declare_enum(&mut self, declaration: &EnumDeclaration) -> Result<(), Error> {
        let enum_name = &declaration.name.value;
        let position = declaration.name.get_position();
        self.check_global_name(enum_name, &position)?;
        self.globals.insert(enum_name.clone(), position);

        let element_type = self.context.i32_type();
        for (ordinal, element) in declaration.values.iter().enumerate() {
            let qualified = qualified_enum_name(enum_name, &element.value);
            let element_position = element.get_position();
            self.check_global_name(&qualified, &element_position)?;

            let value = element_type.const_int(ordinal as u64, false);
            self.scopes
                .declare_global(qualified.clone(), Binding::Constant(value.into()));
            self.globals.insert(qualified, element_position);
        }

        trace!(enum_name = %enum_name, elements = declaration.values.len(), "declared enum");
        Ok(())
    }

    /// Module level variable. The initializer must be a constant expression.
    fn gen_global_field(&mut self, field: &FieldDeclaration) -> Result<(), Error> {
        let name = &field.name.value;
        let position = field.name.get_position();
        let field_type = field.get_type()?.clone();
        let storage = self.storage_type(&field_type, name, &position)?;
        self.check_global_name(name, &position)?;

        let initializer = match &field.value {
            Some(value) => match gen_constant(self, value, &field_type)? {
                Some(constant) => constant,
                None => {
                    return Err(self.fail(
                        ErrorImpl::NonConstantGlobal { name: name.clone() },
                        position,
                    ))
                }
            },
            None => self.types.zero_value(storage),
        };

        let global = self.module.add_global(storage, None, name);
        global.set_initializer(&initializer);

        self.scopes
            .declare_global(name.clone(), Binding::Slot(global.as_pointer_value()));
        self.globals.insert(name.clone(), position);

        Ok(())
    }

    fn check_global_name(&self, name: &str, position: &Position) -> Result<(), Error> {
        let previous = self
            .globals
            .get(name)
            .or_else(|| self.functions.get(name).map(|f| &f.position));

        match previous {
            Some(previous) => Err(self.fail(
                ErrorImpl::DuplicateDeclaration {
                    name: name.to_string(),
                    previous: previous.clone(),
                },
                position.clone(),
            )),
            None => Ok(()),
        }
    }

    /// Generates the body of a function declaration.
    pub fn gen_function(&mut self, declaration: &FunctionDeclaration) -> Result<(), Error> {
        let prototype = &declaration.prototype;
        let name = prototype.name.value.clone();
        let function = match self.functions.get(&name) {
            Some(declared) => declared.function,
            None => self.declare_function(prototype, DeclarationKind::Definition)?,
        };

        debug!(function = %name, parameters = prototype.parameters.len(), "generating function");

        self.add_function_attributes(function);
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        self.current_function = Some(CurrentFunction {
            function,
            name: name.clone(),
            return_type: prototype.return_type.clone(),
        });
        self.scopes.reset_to_global();
        self.defers.clear();
        self.loops.clear();

        self.scopes.enter_scope();
        let result = self
            .gen_parameters(prototype, function)
            .and_then(|_| gen_statement(self, &declaration.body))
            .and_then(|_| self.finish_function(entry));
        self.scopes.exit_scope();

        self.current_function = None;
        self.builder.clear_insertion_position();

        result
    }

    /// Copies every incoming argument into its own stack slot.
    fn gen_parameters(
        &mut self,
        prototype: &FunctionPrototype,
        function: FunctionValue<'a>,
    ) -> Result<(), Error> {
        for (parameter, value) in prototype.parameters.iter().zip(function.get_params()) {
            let slot = self.create_entry_block_alloca(
                &parameter.name.value,
                self.types.convert_type(&parameter.ty),
            )?;
            self.builder.build_store(slot, value)?;
            self.scopes
                .declare(parameter.name.value.clone(), Binding::Slot(slot));
        }
        Ok(())
    }

    /// Terminates the final block of a function whose body can fall through.
    fn finish_function(&mut self, entry: BasicBlock<'a>) -> Result<(), Error> {
        let block = self.current_block()?;
        if block.get_terminator().is_some() {
            return Ok(());
        }

        let current = self.current_function_info(Position::null())?;
        if current.return_type.is_void() {
            self.builder.build_return(None)?;
        } else if block != entry && block.get_first_use().is_none() {
            self.builder.build_unreachable()?;
        } else {
            let position = self
                .functions
                .get(&current.name)
                .map(|f| f.position.clone())
                .unwrap_or_else(Position::null);
            return Err(self.fail(
                ErrorImpl::MissingReturn {
                    function: current.name,
                },
                position,
            ));
        }
        Ok(())
    }

    fn add_function_attributes(&self, function: FunctionValue<'a>) {
        let attributes = [
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("uwtable"), 0),
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("nounwind"), 0),
        ];

        for attribute in attributes.iter() {
            function.add_attribute(AttributeLoc::Function, *attribute);
        }
    }

    /// Allocates a stack slot at the top of the current function's entry block.
    pub fn create_entry_block_alloca(
        &self,
        name: &str,
        type_: BasicTypeEnum<'a>,
    ) -> Result<PointerValue<'a>, Error> {
        let function = self.current_function_info(Position::null())?.function;
        let entry = function.get_first_basic_block().ok_or_else(|| {
            Error::new(
                ErrorImpl::Builder {
                    message: String::from("function has no entry block"),
                },
                Position::null(),
            )
        })?;

        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(instruction) => builder.position_before(&instruction),
            None => builder.position_at_end(entry),
        }

        Ok(builder.build_alloca(type_, name)?)
    }

    /// Lowers a declared type to a storage type, rejecting `void`.
    pub fn storage_type(
        &self,
        type_: &Type,
        name: &str,
        position: &Position,
    ) -> Result<BasicTypeEnum<'a>, Error> {
        if type_.is_void() {
            return Err(self.fail(
                ErrorImpl::VoidStorage {
                    name: name.to_string(),
                },
                position.clone(),
            ));
        }
        Ok(self.types.convert_type(type_))
    }

    pub fn lookup(&self, name: &str, position: Position) -> Result<Binding<'a>, Error> {
        self.scopes.lookup(name).copied().ok_or_else(|| {
            self.fail(
                ErrorImpl::UnresolvedSymbol {
                    name: name.to_string(),
                },
                position,
            )
        })
    }

    pub(crate) fn current_function_info(
        &self,
        position: Position,
    ) -> Result<CurrentFunction<'a>, Error> {
        self.current_function.clone().ok_or_else(|| {
            self.fail(
                ErrorImpl::StatementOutsideFunction {
                    statement: String::from("code"),
                },
                position,
            )
        })
    }

    pub(crate) fn current_block(&self) -> Result<BasicBlock<'a>, Error> {
        self.builder.get_insert_block().ok_or_else(|| {
            Error::new(
                ErrorImpl::Builder {
                    message: String::from("builder has no insertion block"),
                },
                Position::null(),
            )
        })
    }

    /// Whether the block at the insertion point already ends in a terminator.
    pub(crate) fn is_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .map_or(true, |block| block.get_terminator().is_some())
    }

    pub(crate) fn append_block(&self, name: &str) -> Result<BasicBlock<'a>, Error> {
        let function = self.current_function_info(Position::null())?.function;
        Ok(self.context.append_basic_block(function, name))
    }

    /// Builds a fatal error and logs it.
    pub(crate) fn fail(&self, error_impl: ErrorImpl, position: Position) -> Error {
        error!(%position, error = %error_impl, "code generation failed");
        Error::new(error_impl, position)
    }
}

/// Compiles a unit into a verified module with default options.
///
/// # Arguments
///
/// * `context` - The LLVM context that owns the produced module
/// * `module_name` - Name given to the module
/// * `unit` - The resolved compilation unit
pub fn compile<'a>(
    context: &'a Context,
    module_name: &str,
    unit: &CompilationUnit,
) -> Result<Module<'a>, Error> {
    compile_with_options(context, module_name, unit, CompilerOptions::default())
}

#[instrument(skip(context, unit), fields(statements = unit.tree_nodes.len()))]
pub fn compile_with_options<'a>(
    context: &'a Context,
    module_name: &str,
    unit: &CompilationUnit,
    options: CompilerOptions,
) -> Result<Module<'a>, Error> {
    let mut compiler = Compiler::new(context, module_name, options);
    compiler.compile_unit(unit)?;
    debug!("compilation finished");
    Ok(compiler.finish())
}
