//! Abstract syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Nodes own their children.  Leaf nodes keep a copy of the token they came
//! from so every later phase can report a line number.  Nodes that the
//! resolver annotates (`Variable`, `Assign`, `This`, `Super`) carry an
//! [`ExprId`] that keys the resolver's side table.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::token::Token;

/// Stable identity of a resolvable expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub usize);

impl ExprId {
    /// Allocate a process‑wide unique id.  Ids never repeat, so trees parsed
    /// later (REPL lines, imported files) never collide with earlier ones.
    pub fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        ExprId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(i64),
    Float(f64),
    True,
    False,
    Nil,
}

/// Arbitrary‑precision literal, parsed once at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum BigLiteral {
    Int(BigInt),
    Float(BigDecimal),
}

/// Subscript of an index expression: `a[i]` or `a[start:end]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Subscript {
    Single(Box<Expr>),
    Slice {
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Number, boolean or `nil` constant.
    Literal(LiteralValue),

    /// String literal.  The token keeps the quote marker.
    Str { token: Token, value: Rc<str> },

    /// Arbitrary‑precision literal such as `12n`.
    BigNum { token: Token, value: BigLiteral },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// Prefix operator: `!x`, `-x`, `~x`.
    Unary { operator: Token, right: Box<Expr> },

    /// Infix arithmetic, bitwise, comparison or equality operator.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        question: Token,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// `...expr`, only produced inside call arguments and list literals.
    Spread { ellipsis: Token, expr: Box<Expr> },

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// `name = value`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Function‑ or method‑call expression.
    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.name`
    Get { object: Box<Expr>, name: Token },

    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// `object[i]` or `object[start:end]`
    Index {
        object: Box<Expr>,
        bracket: Token,
        subscript: Subscript,
    },

    /// `object[index] = value`
    SetIndex {
        object: Box<Expr>,
        bracket: Token,
        index: Box<Expr>,
        value: Box<Expr>,
    },

    /// `[a, b, ...rest]`
    List { bracket: Token, elements: Vec<Expr> },

    /// `{ key: value, ... }`
    Dict {
        brace: Token,
        entries: Vec<(Expr, Expr)>,
    },

    /// Anonymous function expression (`fun (x) => x + 1`).
    Function(Rc<FunctionDecl>),

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, keyword: Token },
}

impl Expr {
    /// Best‑effort source line of the expression.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(_) => 0,
            Expr::Str { token, .. } | Expr::BigNum { token, .. } => token.line,
            Expr::Grouping(inner) => inner.line(),
            Expr::Unary { operator, .. }
            | Expr::Binary { operator, .. }
            | Expr::Logical { operator, .. } => operator.line,
            Expr::Ternary { question, .. } => question.line,
            Expr::Spread { ellipsis, .. } => ellipsis.line,
            Expr::Variable { name, .. } | Expr::Assign { name, .. } => name.line,
            Expr::Call { paren, .. } => paren.line,
            Expr::Get { name, .. } | Expr::Set { name, .. } => name.line,
            Expr::Index { bracket, .. }
            | Expr::SetIndex { bracket, .. }
            | Expr::List { bracket, .. } => bracket.line,
            Expr::Dict { brace, .. } => brace.line,
            Expr::Function(decl) => decl.keyword.line,
            Expr::Super { keyword, .. } | Expr::This { keyword, .. } => keyword.line,
        }
    }
}

/// One declared parameter.  `rest` marks the `...name` vararg parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Token,
    pub rest: bool,
}

/// Shared, read‑only function definition.  Closures hold an `Rc` to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// `None` for anonymous functions.
    pub name: Option<Token>,
    /// The `fun` keyword (or method name) for diagnostics.
    pub keyword: Token,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    pub fn display_name(&self) -> &str {
        self.name.as_ref().map_or("anonymous", |t| t.lexeme.as_str())
    }

    /// Position of the rest parameter, if any.
    pub fn rest_index(&self) -> Option<usize> {
        self.params.iter().position(|p| p.rest)
    }
}

/// `catch (name) { body }`; the binding is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub name: Option<Token>,
    pub body: Vec<Stmt>,
}

/// `static name = value;` inside a class body.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticField {
    pub name: Token,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Token,
    /// Always an `Expr::Variable` when present.
    pub superclass: Option<Expr>,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub static_methods: Vec<Rc<FunctionDecl>>,
    pub static_fields: Vec<StaticField>,
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print expr;` (`newline = true`) or `put expr;`.
    Print { expr: Expr, newline: bool },

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    /// `do body while (condition);`
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },

    For {
        initializer: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },

    /// `foreach (name in iterable) body`
    ForEach {
        name: Token,
        iterable: Expr,
        body: Box<Stmt>,
    },

    /// Named function declaration.
    Function(Rc<FunctionDecl>),

    Return {
        keyword: Token,
        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Class(ClassDecl),

    /// `enum Name { A, B, C }`
    Enum { name: Token, members: Vec<Token> },

    Break(Token),

    Continue(Token),

    Throw { keyword: Token, value: Expr },

    /// `try { … } catch (e) { … } finally { … }`
    Try {
        keyword: Token,
        body: Vec<Stmt>,
        catch: Option<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },

    /// `assert condition (, message)?;` with the condition's source text.
    Assert {
        keyword: Token,
        condition: Expr,
        message: Option<Expr>,
        source: String,
    },

    /// `import "path";`
    Import { keyword: Token, path: String },
}
