/*!
Recursive‑descent parser for Rox.

Time & Space Complexity
=======================

* **n** = number of tokens (including the sole EOF).

| Phase / function              | Cost | Rationale                                                     |
|-------------------------------|-----:|---------------------------------------------------------------|
| `Parser::parse` main loop     | Θ(n) | Each token is consumed once via `advance()`.                  |
| `{` at statement start        | O(k) | Scan of the first dict key at most, then a checkpoint restore.|
| Error recovery `synchronize()`| O(k) | Discards tokens ≤ next statement boundary (`k ≤ n`).          |

Call‑stack depth grows with syntactic nesting.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| Error paths                  | `debug`| Context before recording the diagnostic.  |

--------------------------------------------------------------------------------
Grammar (EBNF, condensed)
--------------------------------------------------------------------------------

```text
program     → declaration* EOF ;
declaration → classDecl | funDecl | enumDecl | varDecl | statement ;
classDecl   → "class" IDENT ( "<" IDENT )? "{" member* "}" ;
member      → "static"? IDENT params body
            | "static" IDENT ( "=" expression )? ";" ;
funDecl     → "fun" IDENT params body ;
params      → "(" ( "..."? IDENT ( "," "..."? IDENT )* )? ")" ;
body        → block | "=>" expression ;
enumDecl    → "enum" IDENT "{" IDENT ( "," IDENT )* ","? "}" ;
varDecl     → "var" IDENT ( "=" expression )? ";" ;
statement   → exprStmt | printStmt | putStmt | ifStmt | whileStmt | doStmt
            | forStmt | foreachStmt | returnStmt | breakStmt | continueStmt
            | throwStmt | tryStmt | assertStmt | importStmt | block ;
expression  → assignment ;
assignment  → ( call "." IDENT | call "[" expression "]" | IDENT ) "=" assignment
            | ternary ;
ternary     → or ( "?" expression ":" ternary )? ;
or          → and ( "or" and )* ;
and         → equality ( "and" equality )* ;
equality    → comparison ( ( "!=" | "==" ) comparison )* ;
comparison  → bitOr ( ( ">" | ">=" | "<" | "<=" ) bitOr )* ;
bitOr       → bitXor ( "|" bitXor )* ;
bitXor      → bitAnd ( "^" bitAnd )* ;
bitAnd      → shift ( "&" shift )* ;
shift       → term ( ( "<<" | ">>" ) term )* ;
term        → factor ( ( "-" | "+" ) factor )* ;
factor      → exponent ( ( "/" | "*" | "%" ) exponent )* ;
exponent    → unary ( "**" exponent )? ;
unary       → ( "!" | "-" | "~" ) unary | call ;
call        → primary ( "(" arguments? ")" | "." IDENT | "[" subscript "]" )* ;
subscript   → expression | expression? ":" expression? ;
primary     → NUMBER | STRING | BIGNUM | "true" | "false" | "nil" | "this"
            | "super" "." IDENT | IDENT | "(" expression ")"
            | "[" elements? "]" | "{" entries? "}" | "fun" params body ;
```
*/

use std::rc::Rc;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::ast::{
    BigLiteral, CatchClause, ClassDecl, Expr, ExprId, FunctionDecl, LiteralValue, Param,
    StaticField, Stmt, Subscript,
};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};

const MAX_ARGS: usize = 255;

/// Saved parser state for speculative parsing.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    current: usize,
    loop_depth: usize,
    errors: usize,
}

/// Top‑level parser over a token vector terminated by `EOF`.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Number of loop bodies enclosing the cursor within the current function.
    loop_depth: usize,
    errors: Vec<LoxError>,
}

impl Parser {
    /// Construct a new parser.  A missing trailing `EOF` is supplied.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(Token::is_eof) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenType::EOF, "", line));
        }

        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            loop_depth: 0,
            errors: Vec::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program.
    ///
    /// Returns every statement that parsed cleanly together with all
    /// diagnostics collected along the way.  The program is valid only when
    /// the error list is empty.
    pub fn parse(&mut self) -> (Vec<Stmt>, Vec<LoxError>) {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!(
            "Parsed {} statement(s), {} error(s)",
            statements.len(),
            self.errors.len()
        );

        (statements, std::mem::take(&mut self.errors))
    }

    /// Parse the whole token stream as a single expression.
    pub fn parse_expression(&mut self) -> Result<Expr> {
        let expr = self.expression()?;

        if !self.is_at_end() {
            return Err(LoxError::parse(self.peek(), "Expect end of expression."));
        }

        Ok(expr)
    }

    // ──────────────────────── declaration rules ───────────────────

    /// Parse one declaration; on failure record the diagnostic and skip to
    /// the next statement boundary.
    fn declaration(&mut self) -> Option<Stmt> {
        match self.try_declaration() {
            Ok(stmt) => Some(stmt),

            Err(e) => {
                debug!("Parse error, synchronizing: {}", e);

                self.errors.push(e);
                self.synchronize();

                None
            }
        }
    }

    fn try_declaration(&mut self) -> Result<Stmt> {
        debug!("Entering declaration at line {}", self.peek().line);

        if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.check(TokenType::FUN) && self.check_next(TokenType::IDENTIFIER) {
            self.advance();
            self.function_declaration()
        } else if self.matches(TokenType::ENUM) {
            self.enum_declaration()
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;

        let superclass: Option<Expr> = if self.matches(TokenType::LESS) {
            let super_name = self.consume(TokenType::IDENTIFIER, "Expect superclass name.")?;

            Some(Expr::Variable {
                id: ExprId::fresh(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();
        let mut static_methods: Vec<Rc<FunctionDecl>> = Vec::new();
        let mut static_fields: Vec<StaticField> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if self.matches(TokenType::STATIC) {
                let member = self.consume(TokenType::IDENTIFIER, "Expect static member name.")?;

                if self.check(TokenType::LEFT_PAREN) {
                    static_methods.push(self.method(member)?);
                } else {
                    let initializer = if self.matches(TokenType::EQUAL) {
                        Some(self.expression()?)
                    } else {
                        None
                    };

                    self.consume(TokenType::SEMICOLON, "Expect ';' after static field.")?;

                    static_fields.push(StaticField {
                        name: member,
                        initializer,
                    });
                }
            } else {
                let member = self.consume(TokenType::IDENTIFIER, "Expect method name.")?;
                methods.push(self.method(member)?);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        debug!(
            "Parsed class '{}' with {} method(s)",
            name.lexeme,
            methods.len()
        );

        Ok(Stmt::Class(ClassDecl {
            name,
            superclass,
            methods,
            static_methods,
            static_fields,
        }))
    }

    fn method(&mut self, name: Token) -> Result<Rc<FunctionDecl>> {
        let params = self.parameters()?;
        let body = self.function_body(true)?;

        Ok(Rc::new(FunctionDecl {
            name: Some(name.clone()),
            keyword: name,
            params,
            body,
        }))
    }

    fn function_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect function name.")?;
        let params = self.parameters()?;
        let body = self.function_body(true)?;

        Ok(Stmt::Function(Rc::new(FunctionDecl {
            name: Some(name.clone()),
            keyword: name,
            params,
            body,
        })))
    }

    fn parameters(&mut self) -> Result<Vec<Param>> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' before parameters.")?;

        let mut params: Vec<Param> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGS {
                    return Err(LoxError::parse(
                        self.peek(),
                        "Can't have more than 255 parameters.",
                    ));
                }

                let rest = self.matches(TokenType::ELLIPSIS);
                let name = self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?;

                if rest && params.iter().any(|p| p.rest) {
                    return Err(LoxError::parse(&name, "Only one rest parameter is allowed."));
                }

                params.push(Param { name, rest });

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        Ok(params)
    }

    /// Block body or `=> expression`.  `break`/`continue` never cross a
    /// function boundary, so the loop depth restarts at zero inside.
    fn function_body(&mut self, terminated: bool) -> Result<Vec<Stmt>> {
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.function_body_inner(terminated);
        self.loop_depth = enclosing_loops;

        body
    }

    fn function_body_inner(&mut self, terminated: bool) -> Result<Vec<Stmt>> {
        if self.matches(TokenType::ARROW) {
            let keyword: Token = self.previous().clone();
            let value: Expr = self.expression()?;

            if terminated {
                self.consume(TokenType::SEMICOLON, "Expect ';' after arrow body.")?;
            }

            return Ok(vec![Stmt::Return {
                keyword,
                value: Some(value),
            }]);
        }

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before function body.")?;

        self.block()
    }

    fn enum_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect enum name.")?;

        self.consume(TokenType::LEFT_BRACE, "Expect '{' after enum name.")?;

        let mut members: Vec<Token> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) {
            let member = self.consume(TokenType::IDENTIFIER, "Expect enum member name.")?;

            if members.iter().any(|m| m.lexeme == member.lexeme) {
                return Err(LoxError::parse(&member, "Duplicate enum member."));
            }

            members.push(member);

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after enum members.")?;

        Ok(Stmt::Enum { name, members })
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::FOREACH) {
            self.foreach_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::DO) {
            self.do_while_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::BREAK) {
            self.loop_jump("break").map(Stmt::Break)
        } else if self.matches(TokenType::CONTINUE) {
            self.loop_jump("continue").map(Stmt::Continue)
        } else if self.matches(TokenType::THROW) {
            self.throw_statement()
        } else if self.matches(TokenType::TRY) {
            self.try_statement()
        } else if self.matches(TokenType::ASSERT) {
            self.assert_statement()
        } else if self.matches(TokenType::IMPORT) {
            self.import_statement()
        } else if self.matches(TokenType::PRINT) {
            self.print_statement(true)
        } else if self.matches(TokenType::PUT) {
            self.print_statement(false)
        } else if self.check(TokenType::LEFT_BRACE) {
            self.block_or_dict()
        } else {
            self.expression_statement()
        }
    }

    /// `{` opens either a block or a dict literal statement.
    fn block_or_dict(&mut self) -> Result<Stmt> {
        if self.brace_opens_dict() {
            debug!("Statement-level '{{' parsed as a dict literal");

            return self.expression_statement();
        }

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before block.")?;

        Ok(Stmt::Block(self.block()?))
    }

    /// Look past a statement-level `{` without committing to either parse.
    ///
    /// A dict is `{}` used as a value, or a first key followed by `:`.  The
    /// scan gives up at the first brace or `;`, so it never enters a nested
    /// body and costs at most the length of that key.
    fn brace_opens_dict(&mut self) -> bool {
        let checkpoint = self.checkpoint();

        self.advance();
        let is_dict = self.scan_dict_key();

        self.restore(checkpoint);

        is_dict
    }

    fn scan_dict_key(&mut self) -> bool {
        if self.matches(TokenType::RIGHT_BRACE) {
            return matches!(
                self.peek().token_type,
                TokenType::SEMICOLON | TokenType::DOT | TokenType::LEFT_BRACKET
            );
        }

        let mut depth: usize = 0;
        let mut open_ternaries: usize = 0;

        while !self.is_at_end() {
            match &self.advance().token_type {
                TokenType::LEFT_PAREN | TokenType::LEFT_BRACKET => depth += 1,
                TokenType::RIGHT_PAREN | TokenType::RIGHT_BRACKET => match depth.checked_sub(1) {
                    Some(outer) => depth = outer,
                    None => return false,
                },
                TokenType::QUESTION if depth == 0 => open_ternaries += 1,
                TokenType::COLON if depth == 0 => match open_ternaries.checked_sub(1) {
                    Some(rest) => open_ternaries = rest,
                    None => return true,
                },
                TokenType::LEFT_BRACE | TokenType::RIGHT_BRACE | TokenType::SEMICOLON => {
                    return false
                }
                _ => {}
            }
        }

        false
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Option<Box<Stmt>> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(Box::new(self.var_declaration()?))
        } else {
            Some(Box::new(self.expression_statement()?))
        };

        let condition: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let body = Box::new(self.loop_body()?);

        Ok(Stmt::For {
            initializer,
            condition,
            increment,
            body,
        })
    }

    fn foreach_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'foreach'.")?;

        self.matches(TokenType::VAR);

        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect loop variable name.")?;

        self.consume(TokenType::IN, "Expect 'in' after loop variable.")?;

        let iterable: Expr = self.expression()?;

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after foreach clause.")?;

        let body = Box::new(self.loop_body()?);

        Ok(Stmt::ForEach {
            name,
            iterable,
            body,
        })
    }

    fn loop_body(&mut self) -> Result<Stmt> {
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        body
    }

    fn print_statement(&mut self, newline: bool) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print { expr, newline })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;

        let body: Box<Stmt> = Box::new(self.loop_body()?);

        Ok(Stmt::While { condition, body })
    }

    fn do_while_statement(&mut self) -> Result<Stmt> {
        let body: Box<Stmt> = Box::new(self.loop_body()?);

        self.consume(TokenType::WHILE, "Expect 'while' after do body.")?;
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after do-while statement.")?;

        Ok(Stmt::DoWhile { body, condition })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    /// `break;` or `continue;`, legal only inside a loop body.
    fn loop_jump(&mut self, kind: &str) -> Result<Token> {
        let keyword: Token = self.previous().clone();

        if self.loop_depth == 0 {
            return Err(LoxError::parse(
                &keyword,
                format!("Can't use '{}' outside of a loop.", kind),
            ));
        }

        self.consume(
            TokenType::SEMICOLON,
            &format!("Expect ';' after '{}'.", kind),
        )?;

        Ok(keyword)
    }

    fn throw_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after thrown value.")?;

        Ok(Stmt::Throw { keyword, value })
    }

    fn try_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();

        self.consume(TokenType::LEFT_BRACE, "Expect '{' after 'try'.")?;
        let body = self.block()?;

        let catch: Option<CatchClause> = if self.matches(TokenType::CATCH) {
            let name = if self.matches(TokenType::LEFT_PAREN) {
                let name = self.consume(TokenType::IDENTIFIER, "Expect catch variable name.")?;
                self.consume(TokenType::RIGHT_PAREN, "Expect ')' after catch variable.")?;

                Some(name)
            } else {
                None
            };

            self.consume(TokenType::LEFT_BRACE, "Expect '{' before catch body.")?;

            Some(CatchClause {
                name,
                body: self.block()?,
            })
        } else {
            None
        };

        let finally: Option<Vec<Stmt>> = if self.matches(TokenType::FINALLY) {
            self.consume(TokenType::LEFT_BRACE, "Expect '{' before finally body.")?;

            Some(self.block()?)
        } else {
            None
        };

        if catch.is_none() && finally.is_none() {
            return Err(LoxError::parse(
                &keyword,
                "Expect 'catch' or 'finally' after try block.",
            ));
        }

        Ok(Stmt::Try {
            keyword,
            body,
            catch,
            finally,
        })
    }

    fn assert_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let start = self.current;
        let condition: Expr = self.expression()?;
        let source = source_text(&self.tokens[start..self.current]);

        let message: Option<Expr> = if self.matches(TokenType::COMMA) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after assertion.")?;

        Ok(Stmt::Assert {
            keyword,
            condition,
            message,
            source,
        })
    }

    fn import_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();

        let path = match &self.peek().token_type {
            TokenType::STRING(path) => path.clone(),
            _ => return Err(LoxError::parse(self.peek(), "Expect module path string.")),
        };

        self.advance();
        self.consume(TokenType::SEMICOLON, "Expect ';' after import.")?;

        Ok(Stmt::Import { keyword, path })
    }

    /// Statements up to the closing `}`.  The opening brace is already
    /// consumed.  Errors inside are recorded and skipped.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.ternary()?;

        if self.matches(TokenType::EQUAL) {
            let equals: Token = self.previous().clone();
            let value = Box::new(self.assignment()?);

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: ExprId::fresh(),
                    name,
                    value,
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value,
                }),

                Expr::Index {
                    object,
                    bracket,
                    subscript: Subscript::Single(index),
                } => Ok(Expr::SetIndex {
                    object,
                    bracket,
                    index,
                    value,
                }),

                _ => Err(LoxError::parse(&equals, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn ternary(&mut self) -> Result<Expr> {
        let condition: Expr = self.logical_or()?;

        if self.matches(TokenType::QUESTION) {
            let question: Token = self.previous().clone();
            let then_branch: Expr = self.expression()?;

            self.consume(TokenType::COLON, "Expect ':' in conditional expression.")?;

            let else_branch: Expr = self.ternary()?;

            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                question,
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(condition)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// One left‑associative binary precedence level.
    fn binary_level(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = operand(self)?;

        while self.matches_any(operators) {
            let operator: Token = self.previous().clone();
            let right: Expr = operand(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::bit_or,
        )
    }

    fn bit_or(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::PIPE], Self::bit_xor)
    }

    fn bit_xor(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::CARET], Self::bit_and)
    }

    fn bit_and(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::AMPERSAND], Self::shift)
    }

    fn shift(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenType::LESS_LESS, TokenType::GREATER_GREATER],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenType::STAR, TokenType::SLASH, TokenType::PERCENT],
            Self::exponent,
        )
    }

    /// `**` is right‑associative: `2 ** 3 ** 2 == 2 ** 9`.
    fn exponent(&mut self) -> Result<Expr> {
        let base: Expr = self.unary()?;

        if self.matches(TokenType::STAR_STAR) {
            let operator: Token = self.previous().clone();
            let power: Expr = self.exponent()?;

            return Ok(Expr::Binary {
                left: Box::new(base),
                operator,
                right: Box::new(power),
            });
        }

        Ok(base)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches_any(&[TokenType::BANG, TokenType::MINUS, TokenType::TILDE]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else if self.matches(TokenType::LEFT_BRACKET) {
                expr = self.finish_index(expr)?;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// An element of an argument list or list literal, optionally spread.
    fn element(&mut self) -> Result<Expr> {
        if self.matches(TokenType::ELLIPSIS) {
            let ellipsis: Token = self.previous().clone();
            let expr: Expr = self.expression()?;

            return Ok(Expr::Spread {
                ellipsis,
                expr: Box::new(expr),
            });
        }

        self.expression()
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    return Err(LoxError::parse(
                        self.peek(),
                        "Can't have more than 255 arguments.",
                    ));
                }

                arguments.push(self.element()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn finish_index(&mut self, object: Expr) -> Result<Expr> {
        let bracket: Token = self.previous().clone();

        let subscript = if self.matches(TokenType::COLON) {
            Subscript::Slice {
                start: None,
                end: self.slice_end()?,
            }
        } else {
            let index = Box::new(self.expression()?);

            if self.matches(TokenType::COLON) {
                Subscript::Slice {
                    start: Some(index),
                    end: self.slice_end()?,
                }
            } else {
                Subscript::Single(index)
            }
        };

        self.consume(TokenType::RIGHT_BRACKET, "Expect ']' after index.")?;

        Ok(Expr::Index {
            object: Box::new(object),
            bracket,
            subscript,
        })
    }

    fn slice_end(&mut self) -> Result<Option<Box<Expr>>> {
        if self.check(TokenType::RIGHT_BRACKET) {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.expression()?)))
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let token: Token = self.peek().clone();

        let literal = match &token.token_type {
            TokenType::FALSE => Some(LiteralValue::False),
            TokenType::TRUE => Some(LiteralValue::True),
            TokenType::NIL => Some(LiteralValue::Nil),
            TokenType::INTEGER(n) => Some(LiteralValue::Integer(*n)),
            TokenType::FLOAT(n) => Some(LiteralValue::Float(*n)),
            _ => None,
        };

        if let Some(literal) = literal {
            self.advance();
            return Ok(Expr::Literal(literal));
        }

        match &token.token_type {
            TokenType::STRING(s) => {
                let value: Rc<str> = Rc::from(s.as_str());
                self.advance();

                return Ok(Expr::Str { token, value });
            }

            TokenType::BIGNUM(digits) => {
                let value = parse_big_literal(digits)
                    .ok_or_else(|| LoxError::parse(&token, "Invalid numeric literal."))?;
                self.advance();

                return Ok(Expr::BigNum { token, value });
            }

            _ => {}
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: ExprId::fresh(),
                name: token,
            });
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This {
                id: ExprId::fresh(),
                keyword: token,
            });
        }

        if self.matches(TokenType::SUPER) {
            self.consume(TokenType::DOT, "Expect '.' after 'super'.")?;
            let method: Token =
                self.consume(TokenType::IDENTIFIER, "Expect superclass method name.")?;

            return Ok(Expr::Super {
                id: ExprId::fresh(),
                keyword: token,
                method,
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.matches(TokenType::LEFT_BRACKET) {
            return self.list_literal();
        }

        if self.matches(TokenType::LEFT_BRACE) {
            return self.dict_literal();
        }

        if self.matches(TokenType::FUN) {
            let params = self.parameters()?;
            let body = self.function_body(false)?;

            return Ok(Expr::Function(Rc::new(FunctionDecl {
                name: None,
                keyword: token,
                params,
                body,
            })));
        }

        Err(LoxError::parse(&token, "Expect expression."))
    }

    fn list_literal(&mut self) -> Result<Expr> {
        let bracket: Token = self.previous().clone();
        let mut elements: Vec<Expr> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACKET) {
            elements.push(self.element()?);

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(TokenType::RIGHT_BRACKET, "Expect ']' after list elements.")?;

        Ok(Expr::List { bracket, elements })
    }

    fn dict_literal(&mut self) -> Result<Expr> {
        let brace: Token = self.previous().clone();
        let mut entries: Vec<(Expr, Expr)> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) {
            let key: Expr = self.expression()?;
            self.consume(TokenType::COLON, "Expect ':' after dict key.")?;
            let value: Expr = self.expression()?;

            entries.push((key, value));

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after dict entries.")?;

        Ok(Expr::Dict { brace, entries })
    }

    // ────────────────────── utility helpers ───────────────────────

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            current: self.current,
            loop_depth: self.loop_depth,
            errors: self.errors.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.current = checkpoint.current;
        self.loop_depth = checkpoint.loop_depth;
        self.errors.truncate(checkpoint.errors);
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    fn matches_any(&mut self, types: &[TokenType]) -> bool {
        if types.iter().any(|t| self.peek().token_type == *t) && !self.is_at_end() {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance().clone());
        }

        debug!("consume failed at '{}': {}", self.peek().lexeme, message);

        Err(LoxError::parse(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    fn check_next(&self, ttype: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| t.token_type == ttype)
    }

    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::ENUM
                | TokenType::FOR
                | TokenType::FOREACH
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::DO
                | TokenType::PRINT
                | TokenType::PUT
                | TokenType::RETURN
                | TokenType::BREAK
                | TokenType::CONTINUE
                | TokenType::THROW
                | TokenType::TRY
                | TokenType::ASSERT
                | TokenType::IMPORT => return,
                _ => {}
            }

            self.advance();
        }
    }
}

fn parse_big_literal(digits: &str) -> Option<BigLiteral> {
    if digits.contains(['.', 'e', 'E']) {
        BigDecimal::from_str(digits).ok().map(BigLiteral::Float)
    } else {
        BigInt::from_str(digits).ok().map(BigLiteral::Int)
    }
}

/// Re‑join lexemes into readable source text for assertion messages.
fn source_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&TokenType> = None;

    for token in tokens {
        if let Some(prev) = prev {
            let glued_after = matches!(
                prev,
                TokenType::LEFT_PAREN
                    | TokenType::LEFT_BRACKET
                    | TokenType::DOT
                    | TokenType::BANG
                    | TokenType::TILDE
                    | TokenType::ELLIPSIS
            );
            let glued_before = matches!(
                token.token_type,
                TokenType::RIGHT_PAREN
                    | TokenType::RIGHT_BRACKET
                    | TokenType::LEFT_PAREN
                    | TokenType::LEFT_BRACKET
                    | TokenType::DOT
                    | TokenType::COMMA
            );

            if !glued_after && !glued_before {
                out.push(' ');
            }
        }

        out.push_str(&token.lexeme);
        prev = Some(&token.token_type);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan_all;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let (tokens, lex_errors) = scan_all(source);
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

        Parser::new(tokens).parse()
    }

    #[test]
    fn source_text_rejoins_calls_and_operators() {
        let (tokens, _) = scan_all("f(a, b[1]) == !x.y");

        assert_eq!(
            source_text(&tokens[..tokens.len() - 1]),
            "f(a, b[1]) == !x.y"
        );
    }

    #[test]
    fn braced_statements_are_a_block() {
        let (statements, errors) = parse("{ var x = 1; print x; }");

        assert!(errors.is_empty(), "{:?}", errors);
        assert!(matches!(statements[0], Stmt::Block(ref body) if body.len() == 2));
    }

    #[test]
    fn statement_level_brace_can_be_a_dict() {
        let (statements, errors) = parse("{\"a\": 1, \"b\": 2};");

        assert!(errors.is_empty());
        assert!(matches!(
            statements[0],
            Stmt::Expression(Expr::Dict { ref entries, .. }) if entries.len() == 2
        ));
    }

    #[test]
    fn ternary_colon_does_not_make_a_dict() {
        let (statements, errors) = parse("{ x = a ? b : c; print xs[1:2]; }");

        assert!(errors.is_empty(), "{:?}", errors);
        assert!(matches!(statements[0], Stmt::Block(ref body) if body.len() == 2));
    }

    #[test]
    fn empty_dict_statement_needs_a_value_use() {
        let (statements, errors) = parse("{};");

        assert!(errors.is_empty());
        assert!(matches!(statements[0], Stmt::Expression(Expr::Dict { .. })));
    }

    #[test]
    fn empty_braces_without_semicolon_are_a_block() {
        let (statements, errors) = parse("{}");

        assert!(errors.is_empty());
        assert_eq!(statements, vec![Stmt::Block(vec![])]);
    }
}
