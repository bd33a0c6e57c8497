#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use rox::error::LoxError;
    use rox::parser::Parser;
    use rox::resolver::{Locals, Resolver};
    use rox::scanner::scan_all;

    fn resolve(source: &str) -> Result<Locals, Vec<LoxError>> {
        let (tokens, lex_errors) = scan_all(source);
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

        let (statements, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);

        Resolver::new().resolve(&statements)
    }

    /// Recorded depths, sorted, since ids are opaque.
    fn depths(source: &str) -> Vec<usize> {
        let locals = resolve(source).unwrap_or_else(|errors| panic!("{:?}", errors));
        let mut depths: Vec<usize> = locals.values().copied().collect();
        depths.sort_unstable();
        depths
    }

    fn errors(source: &str) -> Vec<String> {
        match resolve(source) {
            Ok(_) => panic!("resolution unexpectedly succeeded"),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_globals_are_not_recorded() {
        assert_eq!(depths("var a = 1; print a; fun f() { return a; }"), Vec::<usize>::new());
    }

    #[test]
    fn test_block_depths() {
        assert_eq!(depths("{ var a = 1; { print a; } }"), vec![1]);
    }

    #[test]
    fn test_parameters_share_the_body_scope() {
        assert_eq!(depths("fun f(x) { var y = x; return y; }"), vec![0, 0]);
    }

    #[test]
    fn test_closure_depths() {
        assert_eq!(
            depths("fun outer() { var c = 0; fun inner() { c = c + 1; } }"),
            vec![1, 1]
        );
    }

    #[test]
    fn test_loop_body_gets_its_own_scope() {
        // condition at 0; the body sits under the iteration scope and its block
        assert_eq!(
            depths("{ var i = 0; while (i < 1) { i = i + 1; } }"),
            vec![0, 2, 2]
        );
    }

    #[test]
    fn test_this_and_super_depths() {
        // `this` is one scope above the method body, `super` two
        assert_eq!(
            depths("class A {} class B < A { f() { this; super.f; } }"),
            vec![1, 2]
        );
    }

    #[test]
    fn test_self_reference_in_initializer() {
        let expected = vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."];

        assert_eq!(errors("var a = a;"), expected);
        assert_eq!(errors("{ var a = a; }"), expected);
        assert_eq!(errors("fun f() { var a = a; }"), expected);
    }

    #[test]
    fn test_function_may_refer_to_global_being_defined() {
        assert!(resolve("var f = fun () { return f; };").is_ok());
    }

    #[test]
    fn test_redeclaration() {
        assert!(resolve("var a = 1; var a = 2;").is_ok());
        assert_eq!(
            errors("{ var a = 1; var a = 2; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_invalid_return() {
        assert_eq!(
            errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
        assert_eq!(
            errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
        assert!(resolve("class A { init() { return; } }").is_ok());
    }

    #[test]
    fn test_invalid_this_and_super() {
        assert_eq!(
            errors("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            errors("fun f() { super.g(); }"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
        assert_eq!(
            errors("class A { f() { super.f(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
        assert_eq!(
            errors("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_all_errors_are_reported() {
        assert_eq!(
            errors("return 1;\nprint this;"),
            vec![
                "[line 1] Error at 'return': Can't return from top-level code.",
                "[line 2] Error at 'this': Can't use 'this' outside of a class.",
            ]
        );
    }
}
