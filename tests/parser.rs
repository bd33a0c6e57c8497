#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::{Expr, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::error::LoxError;
    use rox::interpreter::run_with_stack;
    use rox::parser::Parser;
    use rox::scanner::scan_all;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let (tokens, lex_errors) = scan_all(source);
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

        Parser::new(tokens).parse()
    }

    fn printed(source: &str) -> Vec<String> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);

        statements.iter().map(AstPrinter::print_stmt).collect()
    }

    fn error_messages(source: &str) -> Vec<String> {
        parse(source).1.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(
            printed("print 1 + 2 * 3 ** 2 ** 2;"),
            vec!["(print (+ 1 (* 2 (** 3 (** 2 2)))))"]
        );
        assert_eq!(
            printed("x = a or b and c == d < e | f ^ g & h << 1;"),
            vec!["(; (= x (or a (and b (== c (< d (| e (^ f (& g (<< h 1))))))))))"]
        );
    }

    #[test]
    fn test_class_with_static_members() {
        assert_eq!(
            printed(
                "class C { static count = 0; static make() { return C(); } init(x) { this.x = x; } }"
            ),
            vec![
                "(class C (static count 0) (static make () (return (call C))) \
                 (method init (x) (; (= (. this x) x))))"
            ]
        );
    }

    #[test]
    fn test_rest_parameter_and_arrow_body() {
        assert_eq!(
            printed("fun f(a, ...rest) => a;"),
            vec!["(fun f (a ...rest) (return a))"]
        );
    }

    #[test]
    fn test_loops_and_try() {
        assert_eq!(
            printed(
                "foreach (x in xs) { continue; } \
                 do { break; } while (false); \
                 try { throw 1; } catch (e) { print e; } finally { put 2; }"
            ),
            vec![
                "(foreach x xs (block (continue)))",
                "(do (block (break)) false)",
                "(try (block (throw 1)) (catch e (print e)) (finally (put 2)))",
            ]
        );
    }

    #[test]
    fn test_indexing_and_slicing() {
        assert_eq!(
            printed("xs[0] = xs[-1]; print xs[1:3]; print xs[:];"),
            vec![
                "(; (= ([] xs 0) ([] xs (- 1))))",
                "(print ([:] xs 1 3))",
                "(print ([:] xs nil nil))",
            ]
        );
    }

    #[test]
    fn test_assert_keeps_source_text() {
        let (statements, errors) = parse("assert f(x) == 1;");

        assert!(errors.is_empty());

        match &statements[0] {
            Stmt::Assert { source, message, .. } => {
                assert_eq!(source, "f(x) == 1");
                assert!(message.is_none());
            }
            other => panic!("expected an assert, got {:?}", other),
        }
    }

    #[test]
    fn test_import_path() {
        let (statements, errors) = parse("import \"lib/util.lox\";");

        assert!(errors.is_empty());
        assert!(matches!(
            &statements[0],
            Stmt::Import { path, .. } if path == "lib/util.lox"
        ));
    }

    #[test]
    fn test_resolvable_nodes_get_distinct_ids() {
        let (statements, _) = parse("a; a;");

        let ids: Vec<_> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => *id,
                other => panic!("expected a variable, got {:?}", other),
            })
            .collect();

        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_nested_callback_blocks() {
        // each level is a block whose first statement passes a function literal
        let depth = 40;
        let source = format!(
            "fun g(h) {{}} {}{}",
            "{ g(fun () { ".repeat(depth),
            "}); }".repeat(depth)
        );

        let (count, errors) = run_with_stack(|| {
            let (statements, errors) = parse(&source);
            let errors: Vec<String> = errors.iter().map(ToString::to_string).collect();

            (statements.len(), errors)
        })
        .unwrap();

        assert_eq!(errors, Vec::<String>::new());
        assert_eq!(count, 2);
        assert!(matches!(
            printed("{ g(fun () { {} }); }").as_slice(),
            [block] if block.starts_with("(block")
        ));
    }

    #[test]
    fn test_errors_are_collected_after_synchronizing() {
        let (statements, errors) = parse("var = 1;\nprint 1 +;\nvar ok = 2;");

        assert_eq!(
            errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 2] Error at ';': Expect expression.",
            ]
        );
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_error_at_end() {
        assert_eq!(
            error_messages("print 1"),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(
            error_messages("1 = 2;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(
            error_messages("break;"),
            vec!["[line 1] Error at 'break': Can't use 'break' outside of a loop."]
        );

        // a function body inside a loop is not itself in the loop
        assert_eq!(
            error_messages("while (true) { fun f() { continue; } }"),
            vec!["[line 1] Error at 'continue': Can't use 'continue' outside of a loop."]
        );
    }

    #[test]
    fn test_declaration_errors() {
        assert_eq!(
            error_messages("try { }"),
            vec!["[line 1] Error at 'try': Expect 'catch' or 'finally' after try block."]
        );
        assert_eq!(
            error_messages("fun f(...a, ...b) {}"),
            vec!["[line 1] Error at 'b': Only one rest parameter is allowed."]
        );
        assert_eq!(
            error_messages("enum E { A, A }"),
            vec!["[line 1] Error at 'A': Duplicate enum member."]
        );
    }

    #[test]
    fn test_parse_expression_rejects_trailing_tokens() {
        let (tokens, _) = scan_all("1 + 2 3");
        let error = Parser::new(tokens).parse_expression().unwrap_err();

        assert_eq!(
            error.to_string(),
            "[line 1] Error at '3': Expect end of expression."
        );
    }
}
