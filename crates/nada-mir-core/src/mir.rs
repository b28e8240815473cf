/*! The MIR document handed to the downstream circuit compiler.
 *
 * Field names and nesting here are a wire contract: every struct serialises to exactly the JSON
 * shape the consumer expects, operations as externally tagged single-key objects.
 */

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::graph::FunctionId;
use crate::source_ref::SourceRef;
use crate::types::Visibility;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Primitive {
    Integer,
    UnsignedInteger,
    Boolean,
    Rational { digits: Option<u32> },
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Integer => "Integer",
            Primitive::UnsignedInteger => "UnsignedInteger",
            Primitive::Boolean => "Boolean",
            Primitive::Rational { .. } => "Rational",
        }
    }
}

#[derive(Serialize)]
struct DigitsBody {
    digits: u32,
}

impl Serialize for Primitive {
    /// `{"Integer": null}` or `{"Rational": {"digits": n}}`.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Primitive::Rational {
                digits: Some(digits),
            } => map.serialize_entry(self.name(), &DigitsBody { digits: *digits })?,
            _ => map.serialize_entry(self.name(), &())?,
        }
        map.end()
    }
}

/// Reified type as it appears in the MIR document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Public(Primitive),
    Secret(Primitive),
    /// Literal and structural types carry no visibility and serialise as their bare name.
    Bare(Primitive),
    Array {
        inner_type: Box<TypeDescriptor>,
        size: Option<usize>,
    },
    Vector {
        inner_type: Box<TypeDescriptor>,
    },
    NadaTuple {
        left_type: Box<TypeDescriptor>,
        right_type: Box<TypeDescriptor>,
    },
    /// Element type of an uninstantiated generic container.
    Placeholder,
}

impl TypeDescriptor {
    pub fn scalar(visibility: Option<Visibility>, primitive: Primitive) -> Self {
        match visibility {
            Some(Visibility::Public) => TypeDescriptor::Public(primitive),
            Some(Visibility::Secret) => TypeDescriptor::Secret(primitive),
            None => TypeDescriptor::Bare(primitive),
        }
    }
}

#[derive(Serialize)]
struct ArrayBody<'a> {
    inner_type: &'a TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<usize>,
}

#[derive(Serialize)]
struct VectorBody<'a> {
    inner_type: &'a TypeDescriptor,
}

#[derive(Serialize)]
struct TupleBody<'a> {
    left_type: &'a TypeDescriptor,
    right_type: &'a TypeDescriptor,
}

impl Serialize for TypeDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TypeDescriptor::Bare(primitive) => serializer.serialize_str(primitive.name()),
            TypeDescriptor::Placeholder => serializer.serialize_str("T"),
            TypeDescriptor::Public(primitive) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Public", primitive)?;
                map.end()
            }
            TypeDescriptor::Secret(primitive) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Secret", primitive)?;
                map.end()
            }
            TypeDescriptor::Array { inner_type, size } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(
                    "Array",
                    &ArrayBody {
                        inner_type,
                        size: *size,
                    },
                )?;
                map.end()
            }
            TypeDescriptor::Vector { inner_type } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Vector", &VectorBody { inner_type })?;
                map.end()
            }
            TypeDescriptor::NadaTuple {
                left_type,
                right_type,
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(
                    "NadaTuple",
                    &TupleBody {
                        left_type,
                        right_type,
                    },
                )?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryNode {
    pub left: Box<MirOperation>,
    pub right: Box<MirOperation>,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub source_ref: SourceRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HigherOrderNode {
    #[serde(rename = "fn")]
    pub function: FunctionId,
    pub inner: Box<MirOperation>,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub source_ref: SourceRef,
}

/// One lowered operation. Serialises as `{"<Kind>": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MirOperation {
    Addition(BinaryNode),
    Subtraction(BinaryNode),
    Multiplication(BinaryNode),
    Division(BinaryNode),
    Modulo(BinaryNode),
    LeftShift(BinaryNode),
    RightShift(BinaryNode),
    LessThan(BinaryNode),
    GreaterThan(BinaryNode),
    LessOrEqualThan(BinaryNode),
    GreaterOrEqualThan(BinaryNode),
    Equals(BinaryNode),
    PublicEquals(BinaryNode),
    Zip(BinaryNode),
    Cast {
        target: Box<MirOperation>,
        to: String,
        #[serde(rename = "type")]
        ty: TypeDescriptor,
        source_ref: SourceRef,
    },
    InputReference {
        refers_to: String,
        #[serde(rename = "type")]
        ty: TypeDescriptor,
    },
    Literal {
        value: String,
        #[serde(rename = "type")]
        ty: TypeDescriptor,
        source_ref: SourceRef,
    },
    Map(HigherOrderNode),
    Reduce(HigherOrderNode),
    Unzip {
        inner: Box<MirOperation>,
        #[serde(rename = "type")]
        ty: TypeDescriptor,
        source_ref: SourceRef,
    },
    NadaFunctionArgRef {
        function_id: FunctionId,
        refers_to: String,
        #[serde(rename = "type")]
        ty: TypeDescriptor,
    },
}

impl MirOperation {
    pub fn kind_name(&self) -> &'static str {
        match self {
            MirOperation::Addition(_) => "Addition",
            MirOperation::Subtraction(_) => "Subtraction",
            MirOperation::Multiplication(_) => "Multiplication",
            MirOperation::Division(_) => "Division",
            MirOperation::Modulo(_) => "Modulo",
            MirOperation::LeftShift(_) => "LeftShift",
            MirOperation::RightShift(_) => "RightShift",
            MirOperation::LessThan(_) => "LessThan",
            MirOperation::GreaterThan(_) => "GreaterThan",
            MirOperation::LessOrEqualThan(_) => "LessOrEqualThan",
            MirOperation::GreaterOrEqualThan(_) => "GreaterOrEqualThan",
            MirOperation::Equals(_) => "Equals",
            MirOperation::PublicEquals(_) => "PublicEquals",
            MirOperation::Zip(_) => "Zip",
            MirOperation::Cast { .. } => "Cast",
            MirOperation::InputReference { .. } => "InputReference",
            MirOperation::Literal { .. } => "Literal",
            MirOperation::Map(_) => "Map",
            MirOperation::Reduce(_) => "Reduce",
            MirOperation::Unzip { .. } => "Unzip",
            MirOperation::NadaFunctionArgRef { .. } => "NadaFunctionArgRef",
        }
    }

    /// Direct operands, left to right.
    pub fn children(&self) -> Vec<&MirOperation> {
        match self {
            MirOperation::Addition(node)
            | MirOperation::Subtraction(node)
            | MirOperation::Multiplication(node)
            | MirOperation::Division(node)
            | MirOperation::Modulo(node)
            | MirOperation::LeftShift(node)
            | MirOperation::RightShift(node)
            | MirOperation::LessThan(node)
            | MirOperation::GreaterThan(node)
            | MirOperation::LessOrEqualThan(node)
            | MirOperation::GreaterOrEqualThan(node)
            | MirOperation::Equals(node)
            | MirOperation::PublicEquals(node)
            | MirOperation::Zip(node) => vec![node.left.as_ref(), node.right.as_ref()],
            MirOperation::Cast { target, .. } => vec![target.as_ref()],
            MirOperation::Map(node) | MirOperation::Reduce(node) => vec![node.inner.as_ref()],
            MirOperation::Unzip { inner, .. } => vec![inner.as_ref()],
            MirOperation::InputReference { .. }
            | MirOperation::Literal { .. }
            | MirOperation::NadaFunctionArgRef { .. } => Vec::new(),
        }
    }

    /// Names of every input referenced in this subtree, in depth-first order.
    pub fn input_references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut stack = vec![self];
        while let Some(op) = stack.pop() {
            if let MirOperation::InputReference { refers_to, .. } = op {
                names.push(refers_to.as_str());
            }
            stack.extend(op.children().into_iter().rev());
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirArg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirFunction {
    pub id: FunctionId,
    pub args: Vec<MirArg>,
    pub function: String,
    pub inner: MirOperation,
    pub return_type: TypeDescriptor,
    pub source_ref: SourceRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirParty {
    pub name: String,
    pub source_ref: SourceRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirInput {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub party: String,
    pub doc: String,
    pub source_ref: SourceRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirOutput {
    pub inner: MirOperation,
    pub name: String,
    pub party: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub source_ref: SourceRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirProgram {
    pub functions: Vec<MirFunction>,
    pub parties: Vec<MirParty>,
    pub inputs: Vec<MirInput>,
    pub outputs: Vec<MirOutput>,
    pub source_files: Vec<String>,
}

impl MirProgram {
    pub fn function(&self, id: FunctionId) -> Option<&MirFunction> {
        self.functions.iter().find(|f| f.id == id)
    }

    pub fn input(&self, party: &str, name: &str) -> Option<&MirInput> {
        self.inputs
            .iter()
            .find(|input| input.party == party && input.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&MirOutput> {
        self.outputs.iter().find(|output| output.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
