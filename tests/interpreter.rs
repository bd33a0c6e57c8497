mod common;

#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;

    use rox::value::Value;

    use crate::common::{first_error, interpreter, run, run_err};

    // ── scoping and closures ────────────────────────────────────────────

    #[test]
    fn test_block_shadowing_leaves_outer_untouched() {
        assert_eq!(run("var x = 1; { var x = 2; print x; } print x;"), "2\n1\n");
    }

    #[test]
    fn test_closures_share_captured_state() {
        let source = r#"
            fun makeCounter() {
                var c = 0;
                fun inc() { c = c + 1; return c; }
                fun get() { return c; }
                return [inc, get];
            }
            var pair = makeCounter();
            var inc = pair[0];
            var get = pair[1];
            inc();
            inc();
            print get();
            var other = makeCounter();
            print other[1]();
        "#;

        assert_eq!(run(source), "2\n0\n");
    }

    #[test]
    fn test_closure_binds_to_declaration_scope() {
        let source = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;

        assert_eq!(run(source), "global\nglobal\n");
    }

    #[test]
    fn test_loop_iterations_capture_fresh_scopes() {
        let source = r#"
            var fns = [];
            foreach (i in [1, 2, 3]) {
                fns.push(fun () => i);
            }
            foreach (f in fns) put f();
            print "";
        "#;

        assert_eq!(run(source), "123\n");
    }

    // ── classes ─────────────────────────────────────────────────────────

    #[test]
    fn test_super_dispatch() {
        let source = r#"
            class A { greet() { return "A"; } }
            class B < A { greet() { return super.greet() + "B"; } }
            print B().greet();
        "#;

        assert_eq!(run(source), "AB\n");
    }

    #[test]
    fn test_inherited_methods_bind_receiver() {
        let source = r#"
            class A { name() { return this.label; } }
            class B < A { init() { this.label = "b"; } }
            print B().name();
            print B();
        "#;

        assert_eq!(run(source), "b\nB instance\n");
    }

    #[test]
    fn test_initializer_always_yields_instance() {
        let source = r#"
            class P {
                init(x) { this.x = x; return; }
            }
            var p = P(3);
            print p.x;
            print p.init(4) == p;
            print p.x;
        "#;

        assert_eq!(run(source), "3\ntrue\n4\n");
    }

    #[test]
    fn test_inherited_initializer_sets_arity() {
        let source = r#"
            class A { init(x) { this.x = x; } }
            class B < A {}
            print B(3).x;
        "#;

        assert_eq!(run(source), "3\n");
        assert_eq!(
            first_error("class A { init(x) {} }\nclass B < A {}\nB();"),
            "Expected 1 arguments but got 0.\n[line 3]"
        );
    }

    #[test]
    fn test_static_members() {
        let source = r#"
            class Counter {
                static count = 0;
                static bump() { Counter.count = Counter.count + 1; return this; }
                init(start) { this.value = start; }
                get() { return this.value; }
            }
            Counter.bump();
            Counter.bump();
            print Counter.count;
            print Counter(5).get();
            print Counter.bump() == Counter;

            class Sub < Counter {}
            print Sub.bump();
            print Sub.count;
        "#;

        assert_eq!(run(source), "2\n5\ntrue\nSub\n4\n");
    }

    #[test]
    fn test_super_in_static_method() {
        let source = r#"
            class A { static make() { return "A:" + str(this); } }
            class B < A { static make() { return super.make() + "!"; } }
            print B.make();
        "#;

        assert_eq!(run(source), "A:B!\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class A { f() { return "method"; } }
            var a = A();
            print a.f();
            a.f = fun () => "field";
            print a.f();
        "#;

        assert_eq!(run(source), "method\nfield\n");
    }

    // ── control flow ────────────────────────────────────────────────────

    #[test]
    fn test_for_continue_and_break() {
        let source = r#"
            var out = [];
            for (var i = 0; i < 5; i = i + 1) {
                if (i == 2) continue;
                if (i == 4) break;
                out.push(i);
            }
            print out;
        "#;

        assert_eq!(run(source), "[0, 1, 3]\n");
    }

    #[test]
    fn test_while_and_do_while() {
        let source = r#"
            var i = 0;
            while (true) { i = i + 1; if (i >= 3) break; }
            print i;
            do { i = i - 1; } while (i > 10);
            print i;
        "#;

        assert_eq!(run(source), "3\n2\n");
    }

    #[test]
    fn test_finally_runs_exactly_once() {
        let source = r#"
            var count = 0;
            fun throws() { try { throw "boom"; } finally { count = count + 1; } }
            fun returns() { try { return 1; } finally { count = count + 1; } }
            fun normal() { try { var x = 1; } finally { count = count + 1; } }

            try { throws(); } catch (e) { print e; }
            print count;
            print returns();
            print count;
            normal();
            print count;
        "#;

        assert_eq!(run(source), "boom\n1\n1\n2\n3\n");
    }

    #[test]
    fn test_finally_signal_supersedes_pending_one() {
        let source = r#"
            fun f() {
                try { return "try"; } finally { return "finally"; }
            }
            print f();

            fun g() {
                try { throw "lost"; } finally { return "recovered"; }
            }
            print g();
        "#;

        assert_eq!(run(source), "finally\nrecovered\n");
    }

    #[test]
    fn test_break_through_finally() {
        let source = r#"
            for (var i = 0; i < 3; i = i + 1) {
                try { if (i == 1) break; } finally { put i; }
            }
            print "";
        "#;

        assert_eq!(run(source), "01\n");
    }

    #[test]
    fn test_runtime_errors_are_catchable() {
        let source = r#"
            try { nil(); } catch (e) { print e; }
            try { throw [1, 2]; } catch (e) { print e[1]; }
            try { assert 1 > 2; } catch { print "caught"; }
        "#;

        assert_eq!(
            run(source),
            "Can only call functions and classes, got nil.\n2\ncaught\n"
        );
    }

    #[test]
    fn test_logical_and_ternary() {
        assert_eq!(
            run(r#"print nil or "x"; print 0 and 1; print false ? 1 : 2;"#),
            "x\n1\n2\n"
        );
    }

    // ── numbers ─────────────────────────────────────────────────────────

    #[test]
    fn test_numeric_tower() {
        let source = r#"
            print 1 + 2.5 == 3.5;
            print bigint(2) ** 64;
            print 9223372036854775807 + 1;
            print 7 / 2;
            print 7.0 / 2;
            print 2 ** -1;
            print 1.0 / 0;
            print 10 == 10.0;
            print bigint(10) == 10;
        "#;

        assert_eq!(
            run(source),
            "true\n18446744073709551616\n9223372036854775808\n3\n3.5\n0.5\ninf\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_bitwise_operators() {
        assert_eq!(
            run("print 6 & 3; print 6 | 3; print 6 ^ 3; print 1 << 4; print ~0;"),
            "2\n7\n5\n16\n-1\n"
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(first_error("print 1 / 0;"), "Division by zero.\n[line 1]");
    }

    #[test]
    fn test_operand_errors_report_line() {
        assert_eq!(
            first_error("var a = 1;\nprint a + nil;"),
            "Operands must be numbers.\n[line 2]"
        );
        assert_eq!(
            first_error("print 1 < \"a\";"),
            "Operands must be two numbers or two strings.\n[line 1]"
        );
    }

    // ── calls ───────────────────────────────────────────────────────────

    #[test]
    fn test_rest_parameter_packs_surplus() {
        let source = r#"
            fun f(a, ...rest) { print a; print rest; }
            f(1, 2, 3, 4, 5);
            f(1);
        "#;

        assert_eq!(run(source), "1\n[2, 3, 4, 5]\n1\n[]\n");
    }

    #[test]
    fn test_rest_parameter_defaults_missing_arguments() {
        let source = r#"
            fun f(a, ...rest) { print a; print rest; }
            f();
        "#;

        assert_eq!(run(source), "nil\n[]\n");
    }

    #[test]
    fn test_rest_parameter_in_the_middle() {
        let source = r#"
            fun f(a, ...r, z) { print a; print r; print z; }
            f(1, 2, 3, 4, 5);
            f(1, 2);
            f(1);
        "#;

        assert_eq!(
            run(source),
            "1\n[2, 3, 4]\n5\n1\n[]\n2\n1\n[]\nnil\n"
        );
    }

    #[test]
    fn test_runaway_recursion_is_a_runtime_error() {
        assert_eq!(
            first_error("fun f(n) { return f(n + 1); } f(0);"),
            "Stack overflow.\n[line 1]"
        );

        let source = r#"
            fun f(n) { return f(n + 1); }
            try { f(0); } catch (e) { print e; }
        "#;

        assert_eq!(run(source), "Stack overflow.\n");
    }

    #[test]
    fn test_deep_recursion_below_the_limit() {
        let source = r#"
            fun depth(n) {
                if (n == 0) return 0;
                return 1 + (depth(n - 1) * 1);
            }
            print depth(500);
        "#;

        assert_eq!(run(source), "500\n");
    }

    #[test]
    fn test_spread_arguments() {
        let source = r#"
            fun add(a, b, c) { return a + b + c; }
            var xs = [1, 2, 3];
            print add(...xs);
            print [0, ...xs, 4];
        "#;

        assert_eq!(run(source), "6\n[0, 1, 2, 3, 4]\n");
    }

    #[test]
    fn test_arity_errors() {
        assert_eq!(
            first_error("fun f(a) {}\nf(1, 2);"),
            "Expected 1 arguments but got 2.\n[line 2]"
        );
        assert_eq!(
            first_error("range();"),
            "Expected at least 1 arguments but got 0.\n[line 1]"
        );
    }

    #[test]
    fn test_calling_non_callable() {
        assert_eq!(
            first_error("\"str\"();"),
            "Can only call functions and classes, got string.\n[line 1]"
        );
    }

    #[test]
    fn test_function_display() {
        assert_eq!(
            run("fun f() {} print f; print clock; class K {} print K;"),
            "<fn f>\n<native fn clock>\nK\n"
        );
    }

    // ── strings and collections ─────────────────────────────────────────

    #[test]
    fn test_string_operations() {
        let source = r#"
            print "a" + 1;
            print "héllo"[1];
            print "hello"[1:3];
            print "hello"[-1];
            print "a,b".split(",");
            print " x ".trim().upper();
            print "abc".contains("b");
            print "a" < "b";
        "#;

        assert_eq!(
            run(source),
            "a1\né\nel\no\n[\"a\", \"b\"]\nX\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_list_methods() {
        let source = r#"
            var xs = [3, 1];
            xs.push(2);
            print xs;
            print xs.len();
            print xs.map(fun (x) => x * 2);
            print xs.filter(fun (x) => x > 1);
            print xs.contains(1);
            print xs.pop();
            print xs;
            xs[0] = 9;
            print xs;
            print xs[-1];
            print [1, 2] == [1, 2];
            print xs.join("-");
        "#;

        assert_eq!(
            run(source),
            "[3, 1, 2]\n3\n[6, 2, 4]\n[3, 2]\ntrue\n2\n[3, 1]\n[9, 1]\n1\ntrue\n9-1\n"
        );
    }

    #[test]
    fn test_lists_are_shared() {
        assert_eq!(run("var a = [1]; var b = a; b.push(2); print a;"), "[1, 2]\n");
    }

    #[test]
    fn test_self_referential_containers() {
        let source = r#"
            var a = [1];
            a.push(a);
            print a;

            var b = [1];
            b.push(b);
            print a == b;

            var d = {"n": 1};
            d["self"] = d;
            print d;
        "#;

        assert_eq!(run(source), "[1, [...]]\ntrue\n{\"n\": 1, \"self\": {...}}\n");
    }

    #[test]
    fn test_index_out_of_range() {
        assert_eq!(first_error("print [1][5];"), "Index out of range.\n[line 1]");
    }

    #[test]
    fn test_dicts() {
        let source = r#"
            var d = {"a": 1, "b": 2};
            d["c"] = 3;
            print d;
            print d["z"];
            print d.keys();
            print d.has("a");
            d.remove("a");
            print d.len();
            foreach (k in d) put k;
            print "";
        "#;

        assert_eq!(
            run(source),
            "{\"a\": 1, \"b\": 2, \"c\": 3}\nnil\n[\"a\", \"b\", \"c\"]\ntrue\n2\nbc\n"
        );
    }

    #[test]
    fn test_unhashable_dict_key() {
        assert_eq!(
            first_error("var d = {}; d[1.5] = 1;"),
            "Unhashable key type: float.\n[line 1]"
        );
    }

    #[test]
    fn test_enums() {
        let source = r#"
            enum Color { RED, GREEN }
            print Color.GREEN;
            print Color.GREEN.ordinal;
            print Color.RED == Color.RED;
            print Color.RED == Color.GREEN;
            print len(Color);
            foreach (c in Color) print c.name;
        "#;

        assert_eq!(
            run(source),
            "Color.GREEN\n1\ntrue\nfalse\n2\nRED\nGREEN\n"
        );
    }

    // ── builtins ────────────────────────────────────────────────────────

    #[test]
    fn test_builtins() {
        let source = r#"
            print type(1);
            print type(1.5);
            print type("s");
            print type([]);
            print type(nil);
            print str(12) + "!";
            print int("42") + 1;
            print float(1);
            print len("héllo");
            print list(1, 2);
            print range(3);
            print range(2, 4);
            print type(clock());
        "#;

        assert_eq!(
            run(source),
            "int\nfloat\nstring\nlist\nnil\n12!\n43\n1.0\n5\n[1, 2]\n[0, 1, 2]\n[2, 3]\nfloat\n"
        );
    }

    // ── assert and errors ───────────────────────────────────────────────

    #[test]
    fn test_assert_messages() {
        assert_eq!(first_error("assert 1 == 2;"), "Assertion failed: 1 == 2\n[line 1]");
        assert_eq!(first_error("assert false, \"custom\";"), "custom\n[line 1]");
        assert_eq!(run("assert true;"), "");
    }

    #[test]
    fn test_uncaught_throw() {
        let errors = run_err("throw \"bad\";");

        assert_eq!(errors[0].to_string(), "Uncaught exception: bad\n[line 1]");
        assert_eq!(errors[0].exit_code(), 70);
    }

    #[test]
    fn test_undefined_names() {
        assert_eq!(
            first_error("print missing;"),
            "Undefined variable 'missing'.\n[line 1]"
        );
        assert_eq!(
            first_error("missing = 1;"),
            "Undefined variable 'missing'.\n[line 1]"
        );
        assert_eq!(
            first_error("class A {} print A().x;"),
            "Undefined property 'x'.\n[line 1]"
        );
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        let (mut interpreter, output) = interpreter();

        let errors = interpreter.run_source("print 1;\nreturn;").unwrap_err();

        assert_eq!(errors[0].exit_code(), 65);
        assert_eq!(output.contents(), "");
    }

    #[test]
    fn test_runtime_error_stops_after_earlier_output() {
        let (mut interpreter, output) = interpreter();

        assert!(interpreter.run_source("print 1; nil(); print 2;").is_err());
        assert_eq!(output.contents(), "1\n");
    }

    // ── sessions ────────────────────────────────────────────────────────

    #[test]
    fn test_state_persists_across_sources() {
        let (mut interpreter, output) = interpreter();

        interpreter
            .run_source("var a = 1; fun inc() { a = a + 1; return a; }")
            .unwrap();
        interpreter.run_source("inc(); print a;").unwrap();

        assert_eq!(output.contents(), "2\n");
        assert_eq!(interpreter.evaluate_source("inc() * 10").unwrap(), Value::Int(30));
    }

    #[test]
    fn test_put_omits_newline() {
        assert_eq!(run("put 1; put \"a\"; print nil;"), "1anil\n");
    }
}
