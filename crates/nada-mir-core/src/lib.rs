/*! Data model for the Nada circuit frontend.
 *
 * Programs describe multi-party computations by composing typed values into an expression graph. This
 * crate holds both ends of compilation: the graph the DSL builds (types, inputs, parties, functions,
 * operations) and the MIR document the compiler turns it into.
 */

pub mod graph;
pub mod mir;
pub mod source_ref;
pub mod types;

pub use graph::{
    BinaryOp, Expr, FunctionArg, FunctionId, Input, LiteralValue, NadaFunction, Operation, Output,
    Party,
};
pub use mir::{
    MirArg, MirFunction, MirInput, MirOperation, MirOutput, MirParty, MirProgram, Primitive,
    TypeDescriptor,
};
pub use source_ref::{SourceFiles, SourceRef};
pub use types::{ScalarKind, ScalarType, TypeSpec, Visibility};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Invalid operation: {left} {op} {right}")]
    TypeMismatch {
        op: String,
        left: String,
        right: String,
    },
    #[error("{op} expects a scalar operand, got {ty}")]
    NotAScalar { op: String, ty: String },
    #[error("Expected an array or vector, got {0}")]
    NotACollection(String),
    #[error("Expected an array of tuples, got {0}")]
    NotATupleArray(String),
    #[error("Unknown type: {0}")]
    UnknownType(String),
    #[error("{0} requires a digit count")]
    MissingDigits(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
