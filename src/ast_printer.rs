use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt, Subscript};

/// Converts an AST to the Crafting‑Interpreters parenthesised prefix form,
/// as printed by `rox parse`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Integer(n) => n.to_string(),

                // 3.0 → "3.0"
                LiteralValue::Float(n) => format!("{:?}", n),
            },

            Expr::Str { value, .. } => value.to_string(),

            Expr::BigNum { token, .. } => token.lexeme.clone(),

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => format!(
                "(?: {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            Expr::Spread { expr, .. } => format!("(... {})", Self::print(expr)),

            // ── variables ───────────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            // ── calls and access ────────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => Self::parenthesize(&format!("call {}", Self::print(callee)), arguments),

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::Index {
                object, subscript, ..
            } => match subscript {
                Subscript::Single(index) => {
                    format!("([] {} {})", Self::print(object), Self::print(index))
                }
                Subscript::Slice { start, end } => format!(
                    "([:] {} {} {})",
                    Self::print(object),
                    start.as_deref().map_or_else(|| "nil".into(), Self::print),
                    end.as_deref().map_or_else(|| "nil".into(), Self::print)
                ),
            },

            Expr::SetIndex {
                object,
                index,
                value,
                ..
            } => format!(
                "(= ([] {} {}) {})",
                Self::print(object),
                Self::print(index),
                Self::print(value)
            ),

            // ── containers ──────────────────────────────────────────────
            Expr::List { elements, .. } => Self::parenthesize("list", elements),

            Expr::Dict { entries, .. } => {
                let mut s = String::from("(dict");
                for (key, value) in entries {
                    s.push_str(&format!(" ({} {})", Self::print(key), Self::print(value)));
                }
                s.push(')');
                s
            }

            Expr::Function(decl) => Self::function("fun", decl),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::This { .. } => "this".into(),
        }
    }

    /// Prefix form of one statement.
    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print { expr, newline } => {
                let keyword = if *newline { "print" } else { "put" };
                format!("({} {})", keyword, Self::print(expr))
            }

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => Self::block("block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_stmt) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_stmt)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::DoWhile { body, condition } => format!(
                "(do {} {})",
                Self::print_stmt(body),
                Self::print(condition)
            ),

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => format!(
                "(for {} {} {} {})",
                initializer
                    .as_deref()
                    .map_or_else(|| "nil".into(), Self::print_stmt),
                condition.as_ref().map_or_else(|| "nil".into(), Self::print),
                increment.as_ref().map_or_else(|| "nil".into(), Self::print),
                Self::print_stmt(body)
            ),

            Stmt::ForEach {
                name,
                iterable,
                body,
            } => format!(
                "(foreach {} {} {})",
                name.lexeme,
                Self::print(iterable),
                Self::print_stmt(body)
            ),

            Stmt::Function(decl) => Self::function("fun", decl),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            Stmt::Class(decl) => {
                let mut s = format!("(class {}", decl.name.lexeme);
                if let Some(superclass) = &decl.superclass {
                    s.push_str(&format!(" < {}", Self::print(superclass)));
                }
                for field in &decl.static_fields {
                    match &field.initializer {
                        Some(init) => s.push_str(&format!(
                            " (static {} {})",
                            field.name.lexeme,
                            Self::print(init)
                        )),
                        None => s.push_str(&format!(" (static {})", field.name.lexeme)),
                    }
                }
                for method in &decl.static_methods {
                    s.push(' ');
                    s.push_str(&Self::function("static", method));
                }
                for method in &decl.methods {
                    s.push(' ');
                    s.push_str(&Self::function("method", method));
                }
                s.push(')');
                s
            }

            Stmt::Enum { name, members } => {
                let members: Vec<&str> = members.iter().map(|m| m.lexeme.as_str()).collect();
                format!("(enum {} {})", name.lexeme, members.join(" "))
            }

            Stmt::Break(_) => "(break)".into(),

            Stmt::Continue(_) => "(continue)".into(),

            Stmt::Throw { value, .. } => format!("(throw {})", Self::print(value)),

            Stmt::Try {
                body,
                catch,
                finally,
                ..
            } => {
                let mut s = format!("(try {}", Self::block("block", body));
                if let Some(clause) = catch {
                    let label = match &clause.name {
                        Some(name) => format!("catch {}", name.lexeme),
                        None => "catch".into(),
                    };
                    s.push(' ');
                    s.push_str(&Self::block(&label, &clause.body));
                }
                if let Some(finally) = finally {
                    s.push(' ');
                    s.push_str(&Self::block("finally", finally));
                }
                s.push(')');
                s
            }

            Stmt::Assert {
                condition, message, ..
            } => match message {
                Some(message) => format!(
                    "(assert {} {})",
                    Self::print(condition),
                    Self::print(message)
                ),
                None => format!("(assert {})", Self::print(condition)),
            },

            Stmt::Import { path, .. } => format!("(import {})", path),
        }
    }

    fn parenthesize(head: &str, exprs: &[Expr]) -> String {
        let mut s = format!("({}", head);
        for expr in exprs {
            s.push(' ');
            s.push_str(&Self::print(expr));
        }
        s.push(')');
        s
    }

    fn block(head: &str, statements: &[Stmt]) -> String {
        let mut s = format!("({}", head);
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }

    fn function(head: &str, decl: &FunctionDecl) -> String {
        let params: Vec<String> = decl
            .params
            .iter()
            .map(|p| {
                if p.rest {
                    format!("...{}", p.name.lexeme)
                } else {
                    p.name.lexeme.clone()
                }
            })
            .collect();

        Self::block(
            &format!("{} {} ({})", head, decl.display_name(), params.join(" ")),
            &decl.body,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::scan_all;

    fn expr(source: &str) -> String {
        let (tokens, errors) = scan_all(source);
        assert!(errors.is_empty());
        AstPrinter::print(&Parser::new(tokens).parse_expression().unwrap())
    }

    #[test]
    fn prints_operators_in_prefix_form() {
        assert_eq!(expr("(1 + 2.0) * -x"), "(* (group (+ 1 2.0)) (- x))");
        assert_eq!(expr("a ? b : c"), "(?: a b c)");
        assert_eq!(expr("xs[1:]"), "([:] xs 1 nil)");
    }

    #[test]
    fn prints_statements() {
        let (tokens, _) = scan_all("var a = [1, ...b]; if (a) print a; else put nil;");
        let (statements, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty());

        let printed: Vec<String> = statements.iter().map(AstPrinter::print_stmt).collect();

        assert_eq!(
            printed,
            vec![
                "(var a (list 1 (... b)))",
                "(if a (print a) (put nil))",
            ]
        );
    }
}
