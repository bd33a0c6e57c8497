//! Static resolver pass for the **Rox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, reads in an initializer, invalid
//!    `return`/`this`/`super`).
//! 3. Record, for *each* resolvable expression, how many scopes up its
//!    binding lives.  Names found in no scope are globals and get no entry.
//!
//! The scopes pushed here must mirror, one for one, the environments the
//! interpreter creates at runtime; a depth recorded here is followed blindly
//! there.
//!
//! Errors are collected rather than returned early so a single pass reports
//! all of them.

use crate::ast::{ClassDecl, Expr, ExprId, FunctionDecl, Stmt, Subscript};
use crate::error::LoxError;
use crate::token::Token;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// Side table produced by the resolver: expression id → scope distance.
pub type Locals = HashMap<ExprId, usize>;

/// What kind of function body are we inside?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// Are we inside a class body?  Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    /// Globals whose initializer is being resolved right now.
    initializing_globals: HashSet<String>,
    locals: Locals,
    errors: Vec<LoxError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            initializing_globals: HashSet::new(),
            locals: Locals::new(),
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<Locals, Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_statements(statements);
        self.finish()
    }

    /// Resolve a lone expression evaluated at global scope.
    pub fn resolve_expression(mut self, expr: &Expr) -> Result<Locals, Vec<LoxError>> {
        self.resolve_expr(expr);
        self.finish()
    }

    fn finish(self) -> Result<Locals, Vec<LoxError>> {
        if self.errors.is_empty() {
            info!("Resolved {} local reference(s)", self.locals.len());
            Ok(self.locals)
        } else {
            info!("Resolution failed with {} error(s)", self.errors.len());
            Err(self.errors)
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_statements(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_scoped(&mut self, statements: &[Stmt]) {
        self.begin_scope();
        self.resolve_statements(statements);
        self.end_scope();
    }

    /// A loop body runs inside its own per‑iteration scope.
    fn resolve_loop_body(&mut self, body: &Stmt) {
        self.begin_scope();
        self.resolve_stmt(body);
        self.end_scope();
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => self.resolve_scoped(statements),

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);

                if let Some(expr) = initializer {
                    let global = self.scopes.is_empty();

                    if global {
                        self.initializing_globals.insert(name.lexeme.clone());
                    }

                    self.resolve_expr(expr);

                    if global {
                        self.initializing_globals.remove(&name.lexeme);
                    }
                }

                self.define(name);
            }

            Stmt::Function(decl) => {
                // the name is visible *inside* its own body
                if let Some(name) = &decl.name {
                    self.declare(name);
                    self.define(name);
                }

                self.resolve_function(decl, FunctionType::Function);
            }

            Stmt::Class(decl) => self.resolve_class(decl),

            Stmt::Enum { name, .. } => {
                self.declare(name);
                self.define(name);
            }

            Stmt::Expression(expr) | Stmt::Print { expr, .. } => self.resolve_expr(expr),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_loop_body(body);
            }

            Stmt::DoWhile { body, condition } => {
                self.resolve_loop_body(body);
                self.resolve_expr(condition);
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                // outer scope for the initializer, inner one per iteration
                self.begin_scope();

                if let Some(init) = initializer {
                    self.resolve_stmt(init);
                }
                if let Some(cond) = condition {
                    self.resolve_expr(cond);
                }
                if let Some(inc) = increment {
                    self.resolve_expr(inc);
                }

                self.resolve_loop_body(body);

                self.end_scope();
            }

            Stmt::ForEach {
                name,
                iterable,
                body,
            } => {
                self.resolve_expr(iterable);

                self.begin_scope();
                self.declare(name);
                self.define(name);
                self.resolve_stmt(body);
                self.end_scope();
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Break(_) | Stmt::Continue(_) | Stmt::Import { .. } => {}

            Stmt::Throw { value, .. } => self.resolve_expr(value),

            Stmt::Try {
                body,
                catch,
                finally,
                ..
            } => {
                self.resolve_scoped(body);

                if let Some(clause) = catch {
                    self.begin_scope();

                    if let Some(name) = &clause.name {
                        self.declare(name);
                        self.define(name);
                    }

                    self.resolve_statements(&clause.body);
                    self.end_scope();
                }

                if let Some(finally) = finally {
                    self.resolve_scoped(finally);
                }
            }

            Stmt::Assert {
                condition, message, ..
            } => {
                self.resolve_expr(condition);

                if let Some(message) = message {
                    self.resolve_expr(message);
                }
            }
        }
    }

    fn resolve_class(&mut self, decl: &ClassDecl) {
        self.declare(&decl.name);
        self.define(&decl.name);

        if let Some(superclass) = &decl.superclass {
            if let Expr::Variable { name, .. } = superclass {
                if name.lexeme == decl.name.lexeme {
                    self.error(name, "A class can't inherit from itself.");
                }
            }

            self.resolve_expr(superclass);
        }

        // evaluated in the enclosing scope, before the class exists
        for field in &decl.static_fields {
            if let Some(init) = &field.initializer {
                self.resolve_expr(init);
            }
        }

        let enclosing_class = self.current_class;
        self.current_class = if decl.superclass.is_some() {
            ClassType::Subclass
        } else {
            ClassType::Class
        };

        if decl.superclass.is_some() {
            self.begin_scope();
            self.define_implicit("super");
        }

        self.begin_scope();
        self.define_implicit("this");

        for method in &decl.methods {
            let kind = if method.display_name() == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            self.resolve_function(method, kind);
        }

        for method in &decl.static_methods {
            self.resolve_function(method, FunctionType::Method);
        }

        self.end_scope();

        if decl.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) | Expr::Str { .. } | Expr::BigNum { .. } => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Spread { expr, .. } => self.resolve_expr(expr),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                let in_own_initializer = match self.scopes.last() {
                    Some(scope) => scope.get(&name.lexeme) == Some(&false),
                    None => self.initializing_globals.contains(&name.lexeme),
                };

                if in_own_initializer {
                    self.error(name, "Can't read local variable in its own initializer.");
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::Index {
                object, subscript, ..
            } => {
                self.resolve_expr(object);

                match subscript {
                    Subscript::Single(index) => self.resolve_expr(index),
                    Subscript::Slice { start, end } => {
                        for bound in [start, end].into_iter().flatten() {
                            self.resolve_expr(bound);
                        }
                    }
                }
            }

            Expr::SetIndex {
                object,
                index,
                value,
                ..
            } => {
                self.resolve_expr(object);
                self.resolve_expr(index);
                self.resolve_expr(value);
            }

            Expr::List { elements, .. } => {
                for element in elements {
                    self.resolve_expr(element);
                }
            }

            Expr::Dict { entries, .. } => {
                for (key, value) in entries {
                    self.resolve_expr(key);
                    self.resolve_expr(value);
                }
            }

            Expr::Function(decl) => self.resolve_function(decl, FunctionType::Function),

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Can't use 'super' outside of a class.");
                        return;
                    }
                    ClassType::Class => {
                        self.error(keyword, "Can't use 'super' in a class with no superclass.");
                        return;
                    }
                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        // a body runs later, once any global it names is initialised
        let initializing = std::mem::take(&mut self.initializing_globals);

        self.begin_scope();

        for param in &decl.params {
            self.declare(&param.name);
            self.define(&param.name);
        }

        self.resolve_statements(&decl.body);
        self.end_scope();

        self.initializing_globals = initializing;
        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn define_implicit(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it out of the
    /// table when no scope declares it (a global).
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
