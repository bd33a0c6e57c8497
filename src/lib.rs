//! Rox: a tree-walking interpreter for an extended Lox dialect.
//!
//! Source text flows through [`scanner`] → [`parser`] → [`resolver`] →
//! [`interpreter`].  [`Interpreter::run_source`](interpreter::Interpreter::run_source)
//! drives the whole pipeline.

pub mod ast;
pub mod ast_printer;
pub mod builtins;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod numeric;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;
