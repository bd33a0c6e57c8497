//! Tree‑walking evaluator.
//!
//! Statements produce an [`ExecResult`]: `Normal` completion or one of the
//! non‑local signals `Return`, `Break` and `Continue`.  Every statement
//! executor hands a signal it does not own straight back to its caller; only
//! loops consume `Break`/`Continue` and only function bodies consume
//! `Return`.  Errors (interpreter errors and `throw`n values alike) travel
//! separately in the `Err` channel of [`RuntimeResult`].

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::{panic, thread};

use log::{debug, info};

use crate::ast::{
    BigLiteral, ClassDecl, Expr, ExprId, LiteralValue, Stmt, Subscript,
};
use crate::builtins;
use crate::callable::{Arity, Callable, NativeFunction};
use crate::class::{undefined_property, LoxClass};
use crate::environment::Environment;
use crate::error::{LoxError, Result, RuntimeError, RuntimeResult};
use crate::function::LoxFunction;
use crate::numeric::{self, ArithOp, BitOp, NumResult};
use crate::object::dict::DictObject;
use crate::object::enumeration::EnumObject;
use crate::object::string;
use crate::parser::Parser;
use crate::resolver::{Locals, Resolver};
use crate::scanner::scan_all;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Nested calls allowed before the program is stopped with "Stack overflow.".
pub const MAX_CALL_DEPTH: usize = 512;

/// Host stack for threads that run programs: 256 MiB.  Unoptimised builds
/// spend tens of kilobytes of stack per Lox call, so the default 2 MiB
/// thread stack runs out long before `MAX_CALL_DEPTH`.
pub const STACK_SIZE: usize = 256 * 1024 * 1024;

/// Run `f` to completion on a thread with [`STACK_SIZE`] bytes of stack.
///
/// The interpreter itself is `!Send`, so build it inside `f`.  A panic in
/// `f` is resumed on the calling thread.
pub fn run_with_stack<F, T>(f: F) -> io::Result<T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name("rox-interpreter".into())
            .stack_size(STACK_SIZE)
            .spawn_scoped(scope, f)?;

        match handle.join() {
            Ok(value) => Ok(value),
            Err(payload) => panic::resume_unwind(payload),
        }
    })
}

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecResult {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// `None` keeps the loop going; `Some` leaves it with that outcome.
fn loop_exit(signal: ExecResult) -> Option<ExecResult> {
    match signal {
        ExecResult::Normal | ExecResult::Continue => None,
        ExecResult::Break => Some(ExecResult::Normal),
        ExecResult::Return(value) => Some(ExecResult::Return(value)),
    }
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: Locals,
    output: Box<dyn Write>,
    base_dir: PathBuf,
    imported: HashSet<PathBuf>,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new Interpreter with the builtin functions installed.
    pub fn new() -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        let mut interpreter = Self {
            globals: globals.clone(),
            environment: globals,
            locals: Locals::new(),
            output: Box::new(io::stdout()),
            base_dir: PathBuf::from("."),
            imported: HashSet::new(),
            call_depth: 0,
        };

        builtins::install(&mut interpreter);

        interpreter
    }

    /// Send `print`/`put` output somewhere other than stdout.
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Directory `import` paths are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn globals(&self) -> &Rc<RefCell<Environment>> {
        &self.globals
    }

    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.borrow_mut().define(name, value);
    }

    /// Register a native callable in the global scope.
    pub fn define_native<F>(&mut self, name: &str, arity: Arity, func: F)
    where
        F: Fn(&mut Interpreter, &Token, Vec<Value>) -> RuntimeResult<Value> + 'static,
    {
        debug!("Defining native function '{}'", name);

        self.define_global(
            name,
            Value::Native(Rc::new(NativeFunction::new(name, arity, func))),
        );
    }

    /// Merge resolver output.  Ids are globally unique, so tables from
    /// several runs (REPL lines, imports) never clash.
    pub fn add_locals(&mut self, locals: Locals) {
        self.locals.extend(locals);
    }

    // ───────────────────────── pipelines ──────────────────────────

    /// Scan, parse and resolve `source`, keeping the resolver's output.
    pub fn prepare(&mut self, source: &str) -> std::result::Result<Vec<Stmt>, Vec<LoxError>> {
        let (tokens, mut errors) = scan_all(source);
        let (statements, parse_errors) = Parser::new(tokens).parse();

        errors.extend(parse_errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        let locals = Resolver::new().resolve(&statements)?;
        self.add_locals(locals);

        Ok(statements)
    }

    /// Run a whole program.  Static errors are all reported; execution stops
    /// at the first runtime error.
    pub fn run_source(&mut self, source: &str) -> std::result::Result<(), Vec<LoxError>> {
        let statements = self.prepare(source)?;

        self.interpret(&statements).map_err(|e| vec![e])
    }

    /// Evaluate `source` as one expression.
    pub fn evaluate_source(&mut self, source: &str) -> std::result::Result<Value, Vec<LoxError>> {
        let (tokens, mut errors) = scan_all(source);

        let expr = match Parser::new(tokens).parse_expression() {
            Ok(expr) => expr,
            Err(e) => {
                errors.push(e);
                return Err(errors);
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let locals = Resolver::new().resolve_expression(&expr)?;
        self.add_locals(locals);

        let value = self.evaluate(&expr).map_err(|e| vec![LoxError::from(e)]);
        self.output.flush().map_err(|e| vec![LoxError::from(e)])?;

        value
    }

    /// Interprets a list of statements (a "program").
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        let result = self.run_statements(statements);

        self.output.flush()?;

        match result {
            Ok(_) => {
                info!("Interpretation completed successfully");
                Ok(())
            }
            Err(e) => {
                info!("Interpretation stopped: {}", e);
                Err(e.into())
            }
        }
    }

    // ───────────────────────── statements ─────────────────────────

    fn run_statements(&mut self, statements: &[Stmt]) -> RuntimeResult<ExecResult> {
        for stmt in statements {
            match self.execute(stmt)? {
                ExecResult::Normal => {}
                signal => return Ok(signal),
            }
        }

        Ok(ExecResult::Normal)
    }

    /// Run `f` with `environment` as the current scope, restoring the
    /// previous scope afterwards whatever the outcome.
    fn execute_in<T>(
        &mut self,
        environment: Rc<RefCell<Environment>>,
        f: impl FnOnce(&mut Self) -> RuntimeResult<T>,
    ) -> RuntimeResult<T> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = f(self);
        self.environment = previous;

        result
    }

    /// Execute `statements` directly inside `environment`.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> RuntimeResult<ExecResult> {
        self.execute_in(environment, |interp| interp.run_statements(statements))
    }

    fn execute_scoped(&mut self, statements: &[Stmt]) -> RuntimeResult<ExecResult> {
        let environment = Environment::child_of(&self.environment);

        self.execute_block(statements, environment)
    }

    /// One loop iteration, in its own scope.
    fn execute_loop_body(&mut self, body: &Stmt) -> RuntimeResult<ExecResult> {
        let environment = Environment::child_of(&self.environment);

        self.execute_in(environment, |interp| interp.execute(body))
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<ExecResult> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print { expr, newline } => {
                let value = self.evaluate(expr)?;

                let written = if *newline {
                    writeln!(self.output, "{}", value)
                } else {
                    write!(self.output, "{}", value)
                };

                written.map_err(|e| {
                    RuntimeError::at_line(expr.line(), format!("Failed to write output: {}", e))
                })?;
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}'", name.lexeme);

                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => return self.execute_scoped(statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_stmt) = else_branch {
                    return self.execute(else_stmt);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Some(exit) = loop_exit(self.execute_loop_body(body)?) {
                        return Ok(exit);
                    }
                }
            }

            Stmt::DoWhile { body, condition } => loop {
                if let Some(exit) = loop_exit(self.execute_loop_body(body)?) {
                    return Ok(exit);
                }

                if !self.evaluate(condition)?.is_truthy() {
                    break;
                }
            },

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                let environment = Environment::child_of(&self.environment);

                return self.execute_in(environment, |interp| {
                    interp.execute_for(
                        initializer.as_deref(),
                        condition.as_ref(),
                        increment.as_ref(),
                        body,
                    )
                });
            }

            Stmt::ForEach {
                name,
                iterable,
                body,
            } => {
                let collection = self.evaluate(iterable)?;
                let items = collection.iterate().ok_or_else(|| {
                    RuntimeError::new(
                        name,
                        format!("Can't iterate over {}.", collection.type_name()),
                    )
                })?;

                for item in items {
                    let environment = Environment::child_of(&self.environment);
                    environment.borrow_mut().define(&name.lexeme, item);

                    let signal = self.execute_in(environment, |interp| interp.execute(body))?;

                    if let Some(exit) = loop_exit(signal) {
                        return Ok(exit);
                    }
                }
            }

            Stmt::Function(decl) => {
                let function = LoxFunction::new(decl.clone(), self.environment.clone(), false);

                debug!("Defining function '{}'", decl.display_name());

                self.environment
                    .borrow_mut()
                    .define(decl.display_name(), Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                return Ok(ExecResult::Return(value));
            }

            Stmt::Class(decl) => self.execute_class(decl)?,

            Stmt::Enum { name, members } => {
                let object = EnumObject::new(&name.lexeme, members.iter().map(|m| m.lexeme.as_str()));

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Object(Rc::new(object)));
            }

            Stmt::Break(_) => return Ok(ExecResult::Break),

            Stmt::Continue(_) => return Ok(ExecResult::Continue),

            Stmt::Throw { keyword, value } => {
                let value = self.evaluate(value)?;

                debug!("Throwing {}", value);

                return Err(RuntimeError::thrown(value, keyword.line));
            }

            Stmt::Try {
                body,
                catch,
                finally,
                ..
            } => {
                let outcome = match (self.execute_scoped(body), catch) {
                    (Err(error), Some(clause)) => {
                        debug!("Caught: {}", error);

                        let environment = Environment::child_of(&self.environment);

                        if let Some(name) = &clause.name {
                            environment
                                .borrow_mut()
                                .define(&name.lexeme, error.into_value());
                        }

                        self.execute_block(&clause.body, environment)
                    }
                    (outcome, _) => outcome,
                };

                if let Some(finally) = finally {
                    // a signal or error raised here supersedes the pending one
                    match self.execute_scoped(finally)? {
                        ExecResult::Normal => {}
                        signal => return Ok(signal),
                    }
                }

                return outcome;
            }

            Stmt::Assert {
                keyword,
                condition,
                message,
                source,
            } => {
                if !self.evaluate(condition)?.is_truthy() {
                    let message = match message {
                        Some(expr) => self.evaluate(expr)?.to_string(),
                        None => format!("Assertion failed: {}", source),
                    };

                    return Err(RuntimeError::new(keyword, message));
                }
            }

            Stmt::Import { keyword, path } => self.import(keyword, path)?,
        }

        Ok(ExecResult::Normal)
    }

    fn execute_for(
        &mut self,
        initializer: Option<&Stmt>,
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &Stmt,
    ) -> RuntimeResult<ExecResult> {
        if let Some(init) = initializer {
            self.execute(init)?;
        }

        loop {
            if let Some(cond) = condition {
                if !self.evaluate(cond)?.is_truthy() {
                    break;
                }
            }

            if let Some(exit) = loop_exit(self.execute_loop_body(body)?) {
                return Ok(exit);
            }

            if let Some(inc) = increment {
                self.evaluate(inc)?;
            }
        }

        Ok(ExecResult::Normal)
    }

    fn execute_class(&mut self, decl: &ClassDecl) -> RuntimeResult<()> {
        let superclass: Option<Rc<LoxClass>> = match &decl.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => return Err(RuntimeError::at_line(expr.line(), "Superclass must be a class.")),
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&decl.name.lexeme, Value::Nil);

        let mut static_fields: HashMap<String, Value> = HashMap::new();

        for field in &decl.static_fields {
            let value = match &field.initializer {
                Some(expr) => self.evaluate(expr)?,
                None => Value::Nil,
            };

            static_fields.insert(field.name.lexeme.clone(), value);
        }

        let closure = match &superclass {
            Some(superclass) => {
                let environment = Environment::child_of(&self.environment);
                environment
                    .borrow_mut()
                    .define("super", Value::Class(superclass.clone()));
                environment
            }
            None => self.environment.clone(),
        };

        let methods = decl
            .methods
            .iter()
            .map(|method| {
                let is_initializer = method.display_name() == "init";
                let function = LoxFunction::new(method.clone(), closure.clone(), is_initializer);

                (method.display_name().to_string(), Rc::new(function))
            })
            .collect();

        let static_methods = decl
            .static_methods
            .iter()
            .map(|method| {
                let function = LoxFunction::new(method.clone(), closure.clone(), false);

                (method.display_name().to_string(), Rc::new(function))
            })
            .collect();

        let class = LoxClass::new(
            decl.name.lexeme.clone(),
            superclass,
            methods,
            static_methods,
            static_fields,
        );

        info!("Class '{}' defined", decl.name.lexeme);

        self.environment
            .borrow_mut()
            .define(&decl.name.lexeme, Value::Class(Rc::new(class)));

        Ok(())
    }

    /// Run a file in the global scope, once per canonical path.
    fn import(&mut self, keyword: &Token, path: &str) -> RuntimeResult<()> {
        let target = self.base_dir.join(path);

        let canonical = target.canonicalize().map_err(|e| {
            RuntimeError::new(keyword, format!("Can't import '{}': {}.", path, e))
        })?;

        if !self.imported.insert(canonical.clone()) {
            debug!("'{}' already imported", canonical.display());
            return Ok(());
        }

        info!("Importing {}", canonical.display());

        let source = fs::read_to_string(&canonical).map_err(|e| {
            RuntimeError::new(keyword, format!("Can't import '{}': {}.", path, e))
        })?;

        let statements = self.prepare(&source).map_err(|errors| {
            let details: Vec<String> = errors.iter().map(ToString::to_string).collect();

            RuntimeError::new(
                keyword,
                format!("Can't import '{}':\n{}", path, details.join("\n")),
            )
        })?;

        let module_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_dir.clone());
        let previous_dir = std::mem::replace(&mut self.base_dir, module_dir);

        let globals = self.globals.clone();
        let result = self.execute_in(globals, |interp| interp.run_statements(&statements));

        self.base_dir = previous_dir;

        result.map(|_| ())
    }

    // ───────────────────────── expressions ────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Integer(n) => Value::Int(*n),
                LiteralValue::Float(n) => Value::Float(*n),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Str { value, .. } => Ok(Value::Str(value.clone())),

            Expr::BigNum { value, .. } => Ok(match value {
                BigLiteral::Int(n) => Value::from(n.clone()),
                BigLiteral::Float(n) => Value::from(n.clone()),
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                let result: NumResult = match operator.token_type {
                    TokenType::BANG => return Ok(Value::Bool(!right.is_truthy())),
                    TokenType::MINUS => numeric::negate(&right),
                    TokenType::TILDE => numeric::bit_not(&right),
                    _ => Err("Invalid unary operator."),
                };

                result.map_err(|msg| RuntimeError::new(operator, msg))
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                self.evaluate_binary(&left, operator, &right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuits = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Spread { ellipsis, .. } => Err(RuntimeError::new(
                ellipsis,
                "Spread is only allowed in calls and list literals.",
            )),

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        let assigned = self.environment.borrow_mut().assign_at(
                            distance,
                            &name.lexeme,
                            value.clone(),
                        );

                        if !assigned {
                            return Err(undefined_variable(name));
                        }
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                let arguments = self.evaluate_elements(arguments)?;

                self.call_value(&callee, paren, arguments)
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;

                self.get_property(&object, name)
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let target = self.evaluate(object)?;
                let value = self.evaluate(value)?;

                match &target {
                    Value::Instance(instance) => instance.set(name, value.clone()),
                    Value::Class(class) => class.set_static(name, value.clone()),
                    Value::Object(object) => object
                        .set(&name.lexeme, value.clone())
                        .map_err(|msg| RuntimeError::new(name, msg))?,
                    other => {
                        return Err(RuntimeError::new(
                            name,
                            format!("Only instances have fields, got {}.", other.type_name()),
                        ))
                    }
                }

                Ok(value)
            }

            Expr::Index {
                object,
                bracket,
                subscript,
            } => {
                let target = self.evaluate(object)?;

                self.evaluate_index(&target, bracket, subscript)
            }

            Expr::SetIndex {
                object,
                bracket,
                index,
                value,
            } => {
                let target = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                let value = self.evaluate(value)?;

                match &target {
                    Value::Object(object) => object
                        .set_index(&index, value.clone())
                        .map_err(|msg| RuntimeError::new(bracket, msg))?,
                    other => {
                        return Err(RuntimeError::new(
                            bracket,
                            format!("Can't assign to an index of {}.", other.type_name()),
                        ))
                    }
                }

                Ok(value)
            }

            Expr::List { elements, .. } => Ok(Value::list(self.evaluate_elements(elements)?)),

            Expr::Dict { brace, entries } => {
                let dict = DictObject::new();

                for (key, value) in entries {
                    let key = self.evaluate(key)?;
                    let value = self.evaluate(value)?;

                    dict.insert(&key, value)
                        .map_err(|msg| RuntimeError::new(brace, msg))?;
                }

                Ok(Value::Object(Rc::new(dict)))
            }

            Expr::Function(decl) => Ok(Value::Function(Rc::new(LoxFunction::new(
                decl.clone(),
                self.environment.clone(),
                false,
            )))),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),
        }
    }

    fn evaluate_binary(&self, left: &Value, operator: &Token, right: &Value) -> RuntimeResult<Value> {
        let checked = |result: NumResult| result.map_err(|msg| RuntimeError::new(operator, msg));

        match operator.token_type {
            TokenType::PLUS => {
                if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                    return Ok(Value::from(format!("{}{}", left, right)));
                }

                checked(numeric::arithmetic(ArithOp::Add, left, right))
            }
            TokenType::MINUS => checked(numeric::arithmetic(ArithOp::Sub, left, right)),
            TokenType::STAR => checked(numeric::arithmetic(ArithOp::Mul, left, right)),
            TokenType::SLASH => checked(numeric::arithmetic(ArithOp::Div, left, right)),
            TokenType::PERCENT => checked(numeric::arithmetic(ArithOp::Rem, left, right)),
            TokenType::STAR_STAR => checked(numeric::arithmetic(ArithOp::Pow, left, right)),

            TokenType::AMPERSAND => checked(numeric::bitwise(BitOp::And, left, right)),
            TokenType::PIPE => checked(numeric::bitwise(BitOp::Or, left, right)),
            TokenType::CARET => checked(numeric::bitwise(BitOp::Xor, left, right)),
            TokenType::LESS_LESS => checked(numeric::bitwise(BitOp::Shl, left, right)),
            TokenType::GREATER_GREATER => checked(numeric::bitwise(BitOp::Shr, left, right)),

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left.equals(right))),
            TokenType::BANG_EQUAL => Ok(Value::Bool(!left.equals(right))),

            TokenType::GREATER
            | TokenType::GREATER_EQUAL
            | TokenType::LESS
            | TokenType::LESS_EQUAL => {
                let ordering = match (left, right) {
                    (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                    _ if left.is_number() && right.is_number() => numeric::compare(left, right),
                    _ => {
                        return Err(RuntimeError::new(
                            operator,
                            "Operands must be two numbers or two strings.",
                        ))
                    }
                };

                // NaN compares false both ways
                let holds = ordering.is_some_and(|ord| match operator.token_type {
                    TokenType::GREATER => ord == Ordering::Greater,
                    TokenType::GREATER_EQUAL => ord != Ordering::Less,
                    TokenType::LESS => ord == Ordering::Less,
                    _ => ord != Ordering::Greater,
                });

                Ok(Value::Bool(holds))
            }

            _ => Err(RuntimeError::new(operator, "Invalid binary operator.")),
        }
    }

    /// Evaluate call arguments or list elements, expanding `...spread`.
    fn evaluate_elements(&mut self, elements: &[Expr]) -> RuntimeResult<Vec<Value>> {
        let mut values = Vec::with_capacity(elements.len());

        for element in elements {
            if let Expr::Spread { ellipsis, expr } = element {
                let spread = self.evaluate(expr)?;
                let items = spread.iterate().ok_or_else(|| {
                    RuntimeError::new(ellipsis, format!("Can't spread {}.", spread.type_name()))
                })?;

                values.extend(items);
            } else {
                values.push(self.evaluate(element)?);
            }
        }

        Ok(values)
    }

    fn evaluate_index(
        &mut self,
        target: &Value,
        bracket: &Token,
        subscript: &Subscript,
    ) -> RuntimeResult<Value> {
        let fail = |msg: String| RuntimeError::new(bracket, msg);

        match subscript {
            Subscript::Single(index) => {
                let index = self.evaluate(index)?;

                match target {
                    Value::Str(s) => string::index(s, &index).map_err(fail),
                    Value::Object(object) => object.index(&index).map_err(fail),
                    other => Err(fail(format!("Can't index {}.", other.type_name()))),
                }
            }

            Subscript::Slice { start, end } => {
                let start = self.slice_bound(start.as_deref(), bracket)?;
                let end = self.slice_bound(end.as_deref(), bracket)?;

                match target {
                    Value::Str(s) => Ok(string::slice(s, start, end)),
                    Value::Object(object) => object.slice(start, end).map_err(fail),
                    other => Err(fail(format!("Can't slice {}.", other.type_name()))),
                }
            }
        }
    }

    fn slice_bound(&mut self, bound: Option<&Expr>, bracket: &Token) -> RuntimeResult<Option<i64>> {
        let Some(expr) = bound else {
            return Ok(None);
        };

        match self.evaluate(expr)? {
            Value::Nil => Ok(None),
            Value::Int(n) => Ok(Some(n)),
            other => Err(RuntimeError::new(
                bracket,
                format!("Slice bounds must be integers, got {}.", other.type_name()),
            )),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> RuntimeResult<Value> {
        let unresolved = || RuntimeError::new(keyword, "Unresolved 'super'.");

        let distance = *self.locals.get(&id).ok_or_else(unresolved)?;
        let superclass = self.environment.borrow().get_at(distance, "super");
        let receiver = distance
            .checked_sub(1)
            .and_then(|d| self.environment.borrow().get_at(d, "this"));

        let (Some(Value::Class(superclass)), Some(receiver)) = (superclass, receiver) else {
            return Err(unresolved());
        };

        // inside a static method `this` is the class itself
        let found = if matches!(receiver, Value::Class(_)) {
            superclass.find_static_method(method)?
        } else {
            superclass.find_method(method)?
        };

        match found {
            Some(function) => Ok(Value::Function(Rc::new(function.bind(receiver)))),
            None => Err(undefined_property(method)),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> RuntimeResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => self
                .environment
                .borrow()
                .get_at(distance, &name.lexeme)
                .ok_or_else(|| undefined_variable(name)),
            None => self.globals.borrow().get(name),
        }
    }

    /// Property access on any value.
    pub fn get_property(&self, object: &Value, name: &Token) -> RuntimeResult<Value> {
        match object {
            Value::Instance(instance) => instance.get(name),
            Value::Class(class) => class.get_static(name),
            Value::Str(s) => string::method(s.clone(), &name.lexeme).ok_or_else(|| undefined_property(name)),
            Value::Object(object) => object
                .clone()
                .get(&name.lexeme)
                .ok_or_else(|| undefined_property(name)),
            other => Err(RuntimeError::new(
                name,
                format!("Only instances have properties, got {}.", other.type_name()),
            )),
        }
    }

    /// Call any callable value after checking its arity.
    pub fn call_value(
        &mut self,
        callee: &Value,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> RuntimeResult<Value> {
        let callable: &dyn Callable = match callee {
            Value::Function(function) => function.as_ref(),
            Value::Native(native) => native.as_ref(),
            Value::Class(class) => class,
            other => {
                return Err(RuntimeError::new(
                    paren,
                    format!(
                        "Can only call functions and classes, got {}.",
                        other.type_name()
                    ),
                ))
            }
        };

        let arity = callable.arity();

        if !arity.accepts(arguments.len()) {
            return Err(RuntimeError::new(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    arity,
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::new(paren, "Stack overflow."));
        }

        debug!("Calling '{}' with {} argument(s)", callable.name(), arguments.len());

        self.call_depth += 1;
        let result = callable.call(self, paren, arguments);
        self.call_depth -= 1;

        result
    }
}

fn undefined_variable(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}
