//! Semantic analysis for Brolga
//!
//! Performs, in a single pass over the syntax tree:
//! - scope resolution (declare, shadow-aware lookup, loop membership)
//! - type checking and inference
//! - mutability and arity checking
//!
//! The output is the typed core program. Analysis is fail-fast: the first
//! violation aborts the pass and is raised to the caller unchanged.

use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::frontend::ast::{self, BinOp, ElseBranch, Ident, TypeAnn, UnOp};
use crate::middle::core;
use crate::middle::entity::{Entity, Function, Variable};
use crate::types::Type;
use crate::utils::{Error, Result, Span};

// ==================== Scope Chain ====================

/// Unique identifier for a scope frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// One lexical frame
#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    symbols: HashMap<String, Entity>,
    /// True for a loop body frame or any frame nested inside one
    in_loop: bool,
}

/// The scope chain: a tree of lexical frames
///
/// Frames exist for the top level, function bodies, and loop bodies.
/// Plain blocks (if branches) do not open frames.
pub struct Context {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Context {
    pub fn new() -> Self {
        let root = Scope {
            parent: None,
            symbols: HashMap::new(),
            in_loop: false,
        };
        Self {
            scopes: vec![root],
            current: ScopeId(0),
        }
    }

    /// Enter a new frame below the current one
    pub fn enter_scope(&mut self, in_loop: bool) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(self.current),
            symbols: HashMap::new(),
            in_loop,
        });
        self.current = id;
        id
    }

    /// Restore the parent frame
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            self.current = parent;
        }
    }

    /// Bind a name in the current frame
    ///
    /// Precondition: the caller has already rejected a duplicate via
    /// `lookup_local`.
    pub fn declare(&mut self, name: String, entity: Entity) {
        self.scopes[self.current.0].symbols.insert(name, entity);
    }

    /// Look up a name, searching from the current frame upward
    pub fn lookup(&self, name: &str) -> Option<&Entity> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            if let Some(entity) = self.scopes[id.0].symbols.get(name) {
                return Some(entity);
            }
            scope_id = self.scopes[id.0].parent;
        }
        None
    }

    /// Look up a name only in the current frame
    pub fn lookup_local(&self, name: &str) -> Option<&Entity> {
        self.scopes[self.current.0].symbols.get(name)
    }

    /// Whether the current frame is inside a loop
    pub fn in_loop(&self) -> bool {
        self.scopes[self.current.0].in_loop
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Analyzer ====================

/// The semantic analyzer
pub struct Analyzer {
    context: Context,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            context: Context::new(),
        }
    }

    /// Analyze a program, producing the typed core program
    pub fn analyze(&mut self, program: &ast::Program) -> Result<core::Program> {
        debug!("analyzing {} top-level statement(s)", program.statements.len());
        let statements = self.analyze_stmts(&program.statements)?;
        Ok(core::Program { statements })
    }

    fn analyze_stmts(&mut self, statements: &[ast::Stmt]) -> Result<Vec<core::Stmt>> {
        statements.iter().map(|s| self.analyze_stmt(s)).collect()
    }

    fn analyze_stmt(&mut self, statement: &ast::Stmt) -> Result<core::Stmt> {
        match statement {
            ast::Stmt::VarDec {
                mutable,
                name,
                annotation,
                initializer,
                ..
            } => {
                self.check_not_declared(name)?;
                let init_span = initializer.span();
                let initializer = self.analyze_expr(initializer)?;

                // The variable's type comes from the annotation when there
                // is one, otherwise it is inferred from the initializer.
                let ty = match annotation {
                    Some(annotation) => {
                        let declared = resolve_annotation(annotation);
                        self.check_assignable(&initializer, &declared, init_span)?;
                        declared
                    }
                    None => {
                        if initializer.is_nil() {
                            return Err(Error::UninferableNil { span: init_span });
                        }
                        initializer.ty()
                    }
                };

                // Bound only now, so an initializer cannot see its own name
                let variable = Variable::new(name.name.clone(), ty, *mutable);
                self.context
                    .declare(name.name.clone(), Entity::Variable(Rc::clone(&variable)));

                Ok(core::Stmt::VariableDeclaration {
                    variable,
                    initializer,
                })
            }

            ast::Stmt::FunDec {
                name, params, body, ..
            } => {
                self.check_not_declared(name)?;

                self.context.enter_scope(false);
                let scoped = self.analyze_function_scope(params, body);
                self.context.exit_scope();
                let (parameters, body) = scoped?;

                debug!("declared function {}({} parameter(s))", name.name, parameters.len());

                // Bound in the enclosing frame only after the body has been
                // analyzed, so a function cannot call itself.
                let function = Function::new(name.name.clone(), parameters, body.ty());
                self.context
                    .declare(name.name.clone(), Entity::Function(Rc::clone(&function)));

                Ok(core::Stmt::FunctionDeclaration { function, body })
            }

            ast::Stmt::Increment { target, .. } => {
                // Only the type is checked; an immutable number may be
                // incremented.
                let variable = match self.resolve(target)? {
                    Entity::Variable(variable) if variable.ty == Type::Number => variable,
                    _ => return Err(Error::ExpectedNumber { span: target.span }),
                };
                Ok(core::Stmt::Increment { variable })
            }

            ast::Stmt::Break { span } => {
                if !self.context.in_loop() {
                    return Err(Error::BreakOutsideLoop { span: *span });
                }
                Ok(core::Stmt::Break)
            }

            ast::Stmt::Print { argument, .. } => {
                let argument = self.analyze_expr(argument)?;
                Ok(core::Stmt::Print { argument })
            }

            ast::Stmt::Assignment { target, source, .. } => {
                let target_span = target.span();
                let source = self.analyze_expr(source)?;
                let target = self.analyze_expr(target)?;
                self.check_same_types(&source, &target, target_span)?;
                self.check_mutable(&target, target_span)?;
                Ok(core::Stmt::Assignment { target, source })
            }

            ast::Stmt::If {
                test,
                consequent,
                alternate,
                ..
            } => {
                let test_span = test.span();
                let test = self.analyze_expr(test)?;
                self.check_boolean(&test, test_span)?;

                // Branch blocks do not open frames
                let consequent = self.analyze_stmts(consequent)?;

                match alternate {
                    None => Ok(core::Stmt::ShortIf { test, consequent }),
                    Some(ElseBranch::Block(statements)) => Ok(core::Stmt::If {
                        test,
                        consequent,
                        alternate: core::IfAlternate::Block(self.analyze_stmts(statements)?),
                    }),
                    Some(ElseBranch::If(nested)) => Ok(core::Stmt::If {
                        test,
                        consequent,
                        alternate: core::IfAlternate::ElseIf(Box::new(self.analyze_stmt(nested)?)),
                    }),
                }
            }

            ast::Stmt::While { test, body, .. } => {
                let test_span = test.span();
                let test = self.analyze_expr(test)?;
                self.check_boolean(&test, test_span)?;

                self.context.enter_scope(true);
                let body = self.analyze_stmts(body);
                self.context.exit_scope();

                Ok(core::Stmt::While { test, body: body? })
            }
        }
    }

    /// Declare the parameters and analyze the body inside the already
    /// pushed function frame
    fn analyze_function_scope(
        &mut self,
        params: &[ast::Param],
        body: &ast::Expr,
    ) -> Result<(Vec<Rc<Variable>>, core::Expr)> {
        let mut parameters = Vec::new();
        for param in params {
            self.check_not_declared(&param.name)?;
            let variable = Variable::new(
                param.name.name.clone(),
                resolve_annotation(&param.annotation),
                false,
            );
            self.context.declare(
                param.name.name.clone(),
                Entity::Variable(Rc::clone(&variable)),
            );
            parameters.push(variable);
        }
        let body = self.analyze_expr(body)?;
        Ok((parameters, body))
    }

    fn analyze_expr(&mut self, expression: &ast::Expr) -> Result<core::Expr> {
        match expression {
            ast::Expr::Number { value, .. } => Ok(core::Expr::Number(*value)),
            ast::Expr::Boolean { value, .. } => Ok(core::Expr::Boolean(*value)),
            ast::Expr::Str { value, .. } => Ok(core::Expr::Str(value.clone())),
            ast::Expr::Nil { .. } => Ok(core::Expr::Nil),

            ast::Expr::Id(ident) => match self.resolve(ident)? {
                Entity::Variable(variable) => Ok(core::Expr::Variable(variable)),
                Entity::Function(function) => Ok(core::Expr::Function(function)),
            },

            ast::Expr::Array { elements, span } => {
                let elements: Vec<core::Expr> = elements
                    .iter()
                    .map(|e| self.analyze_expr(e))
                    .collect::<Result<_>>()?;
                self.check_all_same_type(&elements, *span)?;
                let element_ty = elements.first().map(|e| e.ty()).unwrap_or(Type::Any);
                Ok(core::Expr::Array {
                    ty: Type::array(element_ty),
                    elements,
                })
            }

            ast::Expr::Subscript { base, index, .. } => {
                let array = self.analyze_expr(base)?;
                self.check_string_or_array(&array, base.span())?;
                let index_span = index.span();
                let index = self.analyze_expr(index)?;
                self.check_number(&index, index_span)?;

                let ty = match array.ty() {
                    Type::Array(element) => *element,
                    // Subscripting a string yields a number
                    _ => Type::Number,
                };

                Ok(core::Expr::Subscript {
                    array: Box::new(array),
                    index: Box::new(index),
                    ty,
                })
            }

            ast::Expr::Call {
                callee,
                arguments,
                span,
            } => {
                let function = match self.resolve(callee)? {
                    Entity::Function(function) => function,
                    Entity::Variable(_) => {
                        return Err(Error::NotAFunction {
                            name: callee.name.clone(),
                            span: callee.span,
                        })
                    }
                };

                let analyzed: Vec<core::Expr> = arguments
                    .iter()
                    .map(|a| self.analyze_expr(a))
                    .collect::<Result<_>>()?;

                if analyzed.len() != function.parameters.len() {
                    return Err(Error::ArgCountMismatch {
                        expected: function.parameters.len(),
                        got: analyzed.len(),
                        span: *span,
                    });
                }

                for ((argument, node), parameter) in
                    analyzed.iter().zip(arguments).zip(&function.parameters)
                {
                    if argument.ty() != parameter.ty {
                        return Err(Error::SameTypeExpected { span: node.span() });
                    }
                }

                let ty = function.return_type.clone();
                Ok(core::Expr::Call {
                    callee: function,
                    arguments: analyzed,
                    ty,
                })
            }

            ast::Expr::Binary {
                op,
                left,
                right,
                span,
            } => self.analyze_binary(*op, left, right, *span),

            ast::Expr::Unary { op, operand, .. } => self.analyze_unary(*op, operand),
        }
    }

    fn analyze_binary(
        &mut self,
        op: BinOp,
        left: &ast::Expr,
        right: &ast::Expr,
        span: Span,
    ) -> Result<core::Expr> {
        let x = self.analyze_expr(left)?;
        let y = self.analyze_expr(right)?;

        let ty = match op {
            BinOp::Add => {
                self.check_number_or_string(&x, left.span())?;
                self.check_same_types(&x, &y, right.span())?;
                // Hard-coded: string + string also comes out as number
                Type::Number
            }
            BinOp::Sub | BinOp::Div | BinOp::Mod | BinOp::Pow => {
                self.check_number(&x, left.span())?;
                self.check_number(&y, right.span())?;
                Type::Number
            }
            BinOp::Mul => {
                self.check_number_or_string(&x, left.span())?;
                self.check_number(&y, right.span())?;
                x.ty()
            }
            BinOp::Eq | BinOp::Ne => {
                if x.ty() != y.ty() {
                    return Err(Error::TypeMismatch { span });
                }
                Type::Boolean
            }
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                self.check_number_or_string(&x, left.span())?;
                self.check_number_or_string(&y, right.span())?;
                Type::Boolean
            }
        };

        Ok(core::Expr::Binary {
            op,
            left: Box::new(x),
            right: Box::new(y),
            ty,
        })
    }

    fn analyze_unary(&mut self, op: UnOp, operand: &ast::Expr) -> Result<core::Expr> {
        let operand_span = operand.span();
        let operand = self.analyze_expr(operand)?;

        let ty = match op {
            UnOp::Neg => {
                self.check_number(&operand, operand_span)?;
                Type::Number
            }
            UnOp::Not => {
                self.check_boolean(&operand, operand_span)?;
                Type::Boolean
            }
            UnOp::Len => {
                self.check_string_or_array(&operand, operand_span)?;
                Type::Number
            }
        };

        Ok(core::Expr::Unary {
            op,
            operand: Box::new(operand),
            ty,
        })
    }

    // ==================== Checks ====================

    fn resolve(&self, ident: &Ident) -> Result<Entity> {
        self.context
            .lookup(&ident.name)
            .cloned()
            .ok_or_else(|| Error::NotDeclared {
                name: ident.name.clone(),
                span: ident.span,
            })
    }

    fn check_not_declared(&self, ident: &Ident) -> Result<()> {
        if self.context.lookup_local(&ident.name).is_some() {
            return Err(Error::AlreadyDeclared {
                name: ident.name.clone(),
                span: ident.span,
            });
        }
        Ok(())
    }

    fn check_number(&self, e: &core::Expr, span: Span) -> Result<()> {
        if e.ty() != Type::Number {
            return Err(Error::ExpectedNumber { span });
        }
        Ok(())
    }

    fn check_boolean(&self, e: &core::Expr, span: Span) -> Result<()> {
        if e.ty() != Type::Boolean {
            return Err(Error::ExpectedBoolean { span });
        }
        Ok(())
    }

    fn check_number_or_string(&self, e: &core::Expr, span: Span) -> Result<()> {
        if !e.ty().is_number_or_string() {
            return Err(Error::ExpectedNumberOrString { span });
        }
        Ok(())
    }

    fn check_string_or_array(&self, e: &core::Expr, span: Span) -> Result<()> {
        if !e.ty().is_string_or_array() {
            return Err(Error::ExpectedStringOrArray { span });
        }
        Ok(())
    }

    fn check_same_types(&self, x: &core::Expr, y: &core::Expr, span: Span) -> Result<()> {
        if x.ty() != y.ty() {
            return Err(Error::SameTypeExpected { span });
        }
        Ok(())
    }

    fn check_all_same_type(&self, elements: &[core::Expr], span: Span) -> Result<()> {
        if let Some(first) = elements.first() {
            let ty = first.ty();
            for element in elements {
                if element.ty() != ty {
                    return Err(Error::MixedElementTypes { span });
                }
            }
        }
        Ok(())
    }

    /// Initialization of an explicitly typed slot: exact type match, or a
    /// nil/plain value flowing into an optional slot
    fn check_assignable(&self, source: &core::Expr, declared: &Type, span: Span) -> Result<()> {
        let assignable = (source.is_nil() && declared.is_optional())
            || source.ty() == *declared
            || *declared == Type::optional(source.ty());
        if !assignable {
            return Err(Error::NotAssignable {
                from: source.ty().to_string(),
                target: declared.to_string(),
                span,
            });
        }
        Ok(())
    }

    fn check_mutable(&self, target: &core::Expr, span: Span) -> Result<()> {
        if !is_mutable(target) {
            return Err(Error::ImmutableAssignment { span });
        }
        Ok(())
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// A target is mutable iff it is a mutable variable, or a subscript whose
/// base array is, recursively, mutable
fn is_mutable(expression: &core::Expr) -> bool {
    match expression {
        core::Expr::Variable(variable) => variable.mutable,
        core::Expr::Subscript { array, .. } => is_mutable(array),
        _ => false,
    }
}

/// Resolve a syntactic type annotation to a descriptor
fn resolve_annotation(annotation: &TypeAnn) -> Type {
    match annotation {
        TypeAnn::Number { .. } => Type::Number,
        TypeAnn::Boolean { .. } => Type::Boolean,
        TypeAnn::Str { .. } => Type::Str,
        TypeAnn::Array { element, .. } => Type::array(resolve_annotation(element)),
        TypeAnn::Optional { inner, .. } => Type::optional(resolve_annotation(inner)),
    }
}
