use std::sync::Arc;

use nada_mir_core::{Expr, FunctionId, Input, NadaFunction, Party, SourceRef, TypeSpec};

use crate::errors::CompileError;

pub fn at(line: u32) -> SourceRef {
    SourceRef::new("main.py", line, line * 10, 8)
}

pub fn party(name: &str) -> Party {
    Party::new(name, at(1))
}

pub fn secret_integer(name: &str, owner: &str) -> Arc<Input> {
    Input::new(name, party(owner), TypeSpec::secret_integer(), at(2))
}

pub fn secret_array(name: &str, owner: &str, size: usize) -> Arc<Input> {
    Input::new(
        name,
        party(owner),
        TypeSpec::array(TypeSpec::secret_integer(), size),
        at(3),
    )
}

/// `fn inc(x) = x + 1`
pub fn increment(id: u64) -> Arc<NadaFunction> {
    NadaFunction::define(
        FunctionId(id),
        "inc",
        vec![("x".to_string(), TypeSpec::secret_integer())],
        TypeSpec::secret_integer(),
        SourceRef::new("funcs.py", 4, 0, 20),
        |args: &[Expr]| {
            let one = Expr::integer(1, SourceRef::new("funcs.py", 5, 4, 5));
            Ok::<_, CompileError>(args[0].add(&one, SourceRef::new("funcs.py", 5, 4, 9))?)
        },
    )
    .unwrap()
}

/// `fn add(a, b) = a + b`
pub fn adder(id: u64) -> Arc<NadaFunction> {
    NadaFunction::define(
        FunctionId(id),
        "add",
        vec![
            ("a".to_string(), TypeSpec::secret_integer()),
            ("b".to_string(), TypeSpec::secret_integer()),
        ],
        TypeSpec::secret_integer(),
        SourceRef::new("funcs.py", 10, 0, 20),
        |args: &[Expr]| {
            Ok::<_, CompileError>(args[0].add(&args[1], SourceRef::new("funcs.py", 11, 4, 5))?)
        },
    )
    .unwrap()
}
