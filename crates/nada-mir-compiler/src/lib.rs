/*! Lower Nada expression graphs into MIR.
 *
 * A program is a list of outputs, each the root of an expression graph. Compiling walks every graph,
 * collects the inputs, parties and user functions it reaches into a per-run context, and assembles the
 * MIR document the circuit compiler consumes. Any failure aborts the whole compilation.
 */

pub mod context;
pub mod errors;
pub mod hir;
pub mod lowering;
pub mod program;
pub mod reify;

pub use context::CompilationContext;
pub use errors::{CompileError, Result};
pub use hir::{compile_hir, HirProgram};
pub use lowering::{lower_function, lower_operation};
pub use program::{compile, compile_to_string, compile_with_context};
pub use reify::{reify, Typed};

#[cfg(test)]
mod tests;
