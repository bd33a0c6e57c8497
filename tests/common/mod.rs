#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::LoxError;
use rox::interpreter::{run_with_stack, Interpreter};

/// Output sink the test keeps a handle to after the interpreter takes it.
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn interpreter() -> (Interpreter, SharedOutput) {
    let output = SharedOutput::default();
    let interpreter = Interpreter::new().with_output(output.clone());

    (interpreter, output)
}

/// Run `source` and return everything it printed.
pub fn run(source: &str) -> String {
    run_with_stack(|| {
        let (mut interpreter, output) = interpreter();

        if let Err(errors) = interpreter.run_source(source) {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            panic!(
                "program failed:\n{}\noutput so far:\n{}",
                messages.join("\n"),
                output.contents()
            );
        }

        output.contents()
    })
    .unwrap()
}

/// Run `source`, expecting it to fail, and return the diagnostics.
pub fn run_err(source: &str) -> Vec<LoxError> {
    run_with_stack(|| {
        let (mut interpreter, _) = interpreter();

        match interpreter.run_source(source) {
            Ok(()) => panic!("program unexpectedly succeeded"),
            Err(errors) => errors,
        }
    })
    .unwrap()
}

/// First diagnostic of a failing program, as printed.
pub fn first_error(source: &str) -> String {
    run_err(source)[0].to_string()
}
