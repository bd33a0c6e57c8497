mod common;

#[cfg(test)]
mod import_tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    use rox::interpreter::Interpreter;

    use crate::common::SharedOutput;

    fn fixture(files: &[(&str, &str)]) -> TempDir {
        let dir = tempdir().unwrap();

        for (name, source) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, source).unwrap();
        }

        dir
    }

    fn interpreter_in(dir: &Path) -> (Interpreter, SharedOutput) {
        let output = SharedOutput::default();
        let interpreter = Interpreter::new()
            .with_output(output.clone())
            .with_base_dir(dir);

        (interpreter, output)
    }

    #[test]
    fn test_imported_definitions_become_global() {
        let dir = fixture(&[(
            "lib.lox",
            "var greeting = \"hi\"; fun twice(x) { return x * 2; } print \"loaded\";",
        )]);
        let (mut interpreter, output) = interpreter_in(dir.path());

        interpreter
            .run_source("{ import \"lib.lox\"; } print greeting; print twice(21);")
            .unwrap();

        assert_eq!(output.contents(), "loaded\nhi\n42\n");
    }

    #[test]
    fn test_each_file_runs_once() {
        let dir = fixture(&[("lib.lox", "print \"loaded\";")]);
        let (mut interpreter, output) = interpreter_in(dir.path());

        interpreter
            .run_source("import \"lib.lox\"; import \"./lib.lox\"; import \"lib.lox\";")
            .unwrap();

        assert_eq!(output.contents(), "loaded\n");
    }

    #[test]
    fn test_nested_imports_resolve_from_their_own_directory() {
        let dir = fixture(&[
            ("sub/a.lox", "import \"b.lox\"; var a = b + 1;"),
            ("sub/b.lox", "var b = 1;"),
        ]);
        let (mut interpreter, output) = interpreter_in(dir.path());

        interpreter.run_source("import \"sub/a.lox\"; print a;").unwrap();

        assert_eq!(output.contents(), "2\n");
    }

    #[test]
    fn test_missing_file_is_a_runtime_error() {
        let dir = fixture(&[]);
        let (mut interpreter, _) = interpreter_in(dir.path());

        let errors = interpreter
            .run_source("\nimport \"nope.lox\";")
            .unwrap_err();
        let message = errors[0].to_string();

        assert!(message.starts_with("Can't import 'nope.lox':"), "{}", message);
        assert!(message.ends_with("[line 2]"), "{}", message);
        assert_eq!(errors[0].exit_code(), 70);
    }

    #[test]
    fn test_errors_in_imported_file_are_reported() {
        let dir = fixture(&[("bad.lox", "print 1")]);
        let (mut interpreter, _) = interpreter_in(dir.path());

        let errors = interpreter.run_source("import \"bad.lox\";").unwrap_err();

        assert_eq!(
            errors[0].to_string(),
            "Can't import 'bad.lox':\n[line 1] Error at end: Expect ';' after value.\n[line 1]"
        );
    }

    #[test]
    fn test_imported_errors_are_catchable() {
        let dir = fixture(&[]);
        let (mut interpreter, output) = interpreter_in(dir.path());

        interpreter
            .run_source("try { import \"nope.lox\"; } catch { print \"missing\"; }")
            .unwrap();

        assert_eq!(output.contents(), "missing\n");
    }
}
