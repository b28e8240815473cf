/*! Unified interface for the Nada frontend.
 *
 * Single import for building expression graphs, lowering them to MIR and writing the resulting
 * documents where the circuit compiler expects them.
 */

pub use nada_mir_compiler as compiler;
pub use nada_mir_core as core;
pub use nada_mir_emit as emit;

pub use nada_mir_core::{
    Expr, Input, MirProgram, NadaFunction, Output, Party, ScalarType, SourceRef, TypeSpec,
    Visibility,
};

pub use nada_mir_compiler::{compile, compile_hir, compile_to_string, CompileError};

pub use nada_mir_emit::{EmitterConfig, MirEmitter};
