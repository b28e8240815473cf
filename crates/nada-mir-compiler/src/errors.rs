use nada_mir_core::{FunctionId, GraphError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Input is duplicated: {name}")]
    DuplicateInput { party: String, name: String },

    #[error("Compilation of Operation {0} not supported")]
    UnsupportedOperation(String),

    #[error("Missing required field: {field} in {node_type}")]
    MissingField { field: String, node_type: String },

    #[error("Unknown party: {0}")]
    UnknownParty(String),

    #[error("Input index {0} is out of range")]
    UnknownInput(usize),

    #[error("Unknown function: {0}")]
    UnknownFunction(FunctionId),

    #[error("Function {0} is declared more than once")]
    DuplicateFunction(FunctionId),

    #[error("Argument {0} is not bound by an enclosing function")]
    UnknownArgument(String),

    #[error("Function {0} refers to itself through map or reduce")]
    RecursiveFunction(FunctionId),

    #[error("Invalid literal {value} for type {ty}")]
    InvalidLiteral { value: String, ty: String },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Malformed program document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompileError>;
