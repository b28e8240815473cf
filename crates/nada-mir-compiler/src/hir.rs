/*! JSON program descriptions.
 *
 * A HIR document is the serialised form of a DSL program: party and input tables, a function table,
 * and output expressions whose nodes reference inputs by table index and functions by id. Loading
 * rebuilds the shared expression graph through the typed constructors, so one input entry becomes one
 * input instance and every node is type checked exactly as if the program had been traced directly.
 * Dumping goes the other way and writes a traced graph back out in the same format.
 */

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use nada_mir_core::{
    BinaryOp, Expr, FunctionId, Input, LiteralValue, MirProgram, NadaFunction, Operation, Output,
    Party, ScalarKind, ScalarType, SourceRef, TypeSpec, Visibility,
};
use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::{CompileError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HirProgram {
    #[serde(default)]
    pub parties: Vec<HirParty>,
    #[serde(default)]
    pub inputs: Vec<HirInput>,
    #[serde(default)]
    pub functions: Vec<HirFunction>,
    pub outputs: Vec<HirOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HirParty {
    pub name: String,
    #[serde(default)]
    pub source_ref: SourceRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HirInput {
    pub name: String,
    pub party: String,
    #[serde(rename = "type")]
    pub ty: HirType,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub source_ref: SourceRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HirArg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: HirType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HirFunction {
    pub id: FunctionId,
    pub function: String,
    pub args: Vec<HirArg>,
    pub return_type: HirType,
    pub inner: HirNode,
    #[serde(default)]
    pub source_ref: SourceRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HirOutput {
    pub name: String,
    pub party: String,
    pub inner: HirNode,
    #[serde(default)]
    pub source_ref: SourceRef,
}

/// A type written either as a class name (`"SecretInteger"`) or as a composite object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HirType {
    Name(String),
    Composite(HirCompositeType),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HirCompositeType {
    Array {
        inner_type: Box<HirType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<usize>,
    },
    Vector {
        inner_type: Box<HirType>,
    },
    NadaTuple {
        left_type: Box<HirType>,
        right_type: Box<HirType>,
    },
    SecretRational {
        digits: u32,
    },
    Generic(String),
}

impl HirType {
    pub fn to_type_spec(&self) -> Result<TypeSpec> {
        let spec = match self {
            HirType::Name(name) => TypeSpec::Scalar(name.parse::<ScalarType>()?),
            HirType::Composite(HirCompositeType::Array { inner_type, size }) => TypeSpec::Array {
                inner: Box::new(inner_type.to_type_spec()?),
                size: *size,
            },
            HirType::Composite(HirCompositeType::Vector { inner_type }) => {
                TypeSpec::vector(inner_type.to_type_spec()?)
            }
            HirType::Composite(HirCompositeType::NadaTuple {
                left_type,
                right_type,
            }) => TypeSpec::tuple(left_type.to_type_spec()?, right_type.to_type_spec()?),
            HirType::Composite(HirCompositeType::SecretRational { digits }) => {
                TypeSpec::secret_rational(*digits)
            }
            HirType::Composite(HirCompositeType::Generic(name)) => TypeSpec::generic(name.clone()),
        };
        Ok(spec)
    }
}

/// One expression node. Which fields are required depends on `op`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HirNode {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<HirNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<HirNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<HirNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Box<HirNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<usize>,
    #[serde(rename = "fn", default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refers_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<HirType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digits: Option<u32>,
    #[serde(default)]
    pub source_ref: SourceRef,
}

impl HirNode {
    fn bare(op: &str, source_ref: &SourceRef) -> Self {
        HirNode {
            op: op.to_string(),
            left: None,
            right: None,
            inner: None,
            target: None,
            to: None,
            input: None,
            function: None,
            refers_to: None,
            value: None,
            ty: None,
            digits: None,
            source_ref: source_ref.clone(),
        }
    }

    fn required<'n, T>(&'n self, value: &'n Option<T>, field: &str) -> Result<&'n T> {
        value.as_ref().ok_or_else(|| CompileError::MissingField {
            field: field.to_string(),
            node_type: self.op.clone(),
        })
    }

    fn child<'n>(&'n self, value: &'n Option<Box<HirNode>>, field: &str) -> Result<&'n HirNode> {
        self.required(value, field).map(Box::as_ref)
    }
}

impl HirProgram {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuilds the program's outputs as an expression graph.
    pub fn to_outputs(&self) -> Result<Vec<Output>> {
        let mut loader = Loader::new(self)?;
        self.outputs
            .iter()
            .map(|output| loader.output(output))
            .collect()
    }
}

impl HirProgram {
    /// Writes a traced program back out as a HIR document.
    ///
    /// Inputs are numbered in first-reference order and every function reachable through `Map` or
    /// `Reduce` lands in the function table once.
    pub fn from_outputs(outputs: &[Output]) -> Result<Self> {
        let mut dumper = Dumper::default();
        let outputs = outputs
            .iter()
            .map(|output| dumper.output(output))
            .collect::<Result<Vec<_>>>()?;

        Ok(HirProgram {
            parties: dumper.parties.into_values().collect(),
            inputs: dumper.inputs,
            functions: dumper.functions.into_values().collect(),
            outputs,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parses a HIR document and compiles it in one step.
pub fn compile_hir(json: &str) -> Result<MirProgram> {
    let program = HirProgram::from_json(json)?;
    let outputs = program.to_outputs()?;
    crate::program::compile(&outputs)
}

struct Loader<'a> {
    parties: IndexMap<String, Party>,
    inputs: Vec<Arc<Input>>,
    functions: IndexMap<FunctionId, &'a HirFunction>,
    built: HashMap<FunctionId, Arc<NadaFunction>>,
    in_progress: HashSet<FunctionId>,
}

impl<'a> Loader<'a> {
    fn new(program: &'a HirProgram) -> Result<Self> {
        let parties: IndexMap<String, Party> = program
            .parties
            .iter()
            .map(|party| {
                (
                    party.name.clone(),
                    Party::new(party.name.clone(), party.source_ref.clone()),
                )
            })
            .collect();

        let mut functions = IndexMap::new();
        for function in &program.functions {
            if functions.insert(function.id, function).is_some() {
                return Err(CompileError::DuplicateFunction(function.id));
            }
        }

        let mut loader = Self {
            parties,
            inputs: Vec::with_capacity(program.inputs.len()),
            functions,
            built: HashMap::new(),
            in_progress: HashSet::new(),
        };

        for input in &program.inputs {
            let party = loader.party(&input.party)?;
            loader.inputs.push(Input::with_doc(
                input.name.clone(),
                party,
                input.ty.to_type_spec()?,
                input.doc.clone(),
                input.source_ref.clone(),
            ));
        }

        debug!(
            parties = loader.parties.len(),
            inputs = loader.inputs.len(),
            functions = loader.functions.len(),
            "loaded program tables"
        );
        Ok(loader)
    }

    fn party(&self, name: &str) -> Result<Party> {
        self.parties
            .get(name)
            .cloned()
            .ok_or_else(|| CompileError::UnknownParty(name.to_string()))
    }

    fn output(&mut self, output: &HirOutput) -> Result<Output> {
        let party = self.party(&output.party)?;
        let inner = self.node(&output.inner, None)?;
        Ok(Output::new(
            inner,
            output.name.clone(),
            party,
            output.source_ref.clone(),
        ))
    }

    fn node(&mut self, node: &HirNode, args: Option<&[Expr]>) -> Result<Expr> {
        let source_ref = node.source_ref.clone();

        if let Some(op) = BinaryOp::from_name(&node.op) {
            let left = self.node(node.child(&node.left, "left")?, args)?;
            let right = self.node(node.child(&node.right, "right")?, args)?;
            return Ok(Expr::binary(op, &left, &right, source_ref)?);
        }

        match node.op.as_str() {
            "Cast" => {
                let target = self.node(node.child(&node.target, "target")?, args)?;
                let to = ScalarType::parse_with_digits(node.required(&node.to, "to")?, node.digits)?;
                Ok(target.cast(to, source_ref)?)
            }
            "InputReference" => {
                let index = *node.required(&node.input, "input")?;
                let input = self
                    .inputs
                    .get(index)
                    .ok_or(CompileError::UnknownInput(index))?;
                Ok(Expr::input(input))
            }
            "Literal" => Ok(Expr::literal(literal_value(node)?, source_ref)),
            "Map" | "Reduce" => {
                let id = *node.required(&node.function, "fn")?;
                let function = self.function(id)?;
                let inner = self.node(node.child(&node.inner, "inner")?, args)?;
                if node.op == "Map" {
                    Ok(inner.map(&function, source_ref)?)
                } else {
                    Ok(inner.reduce(&function, source_ref)?)
                }
            }
            "Unzip" => {
                let inner = self.node(node.child(&node.inner, "inner")?, args)?;
                Ok(inner.unzip(source_ref)?)
            }
            "NadaFunctionArgRef" => {
                let name = node.required(&node.refers_to, "refers_to")?;
                args.and_then(|args| {
                    args.iter().find(|arg| {
                        matches!(arg.op(), Operation::FunctionArgRef(declared) if &declared.name == name)
                    })
                })
                .cloned()
                .ok_or_else(|| CompileError::UnknownArgument(name.clone()))
            }
            other => Err(CompileError::UnsupportedOperation(other.to_string())),
        }
    }

    /// Builds a function on first use; functions may appear in the table in any order.
    fn function(&mut self, id: FunctionId) -> Result<Arc<NadaFunction>> {
        if let Some(function) = self.built.get(&id) {
            return Ok(Arc::clone(function));
        }

        let hir: &'a HirFunction = self
            .functions
            .get(&id)
            .copied()
            .ok_or(CompileError::UnknownFunction(id))?;

        if !self.in_progress.insert(id) {
            return Err(CompileError::RecursiveFunction(id));
        }

        let params = hir
            .args
            .iter()
            .map(|arg| -> Result<(String, TypeSpec)> {
                Ok((arg.name.clone(), arg.ty.to_type_spec()?))
            })
            .collect::<Result<Vec<_>>>()?;

        let function = NadaFunction::define(
            id,
            hir.function.clone(),
            params,
            hir.return_type.to_type_spec()?,
            hir.source_ref.clone(),
            |args| self.node(&hir.inner, Some(args)),
        )?;

        self.in_progress.remove(&id);
        self.built.insert(id, Arc::clone(&function));
        Ok(function)
    }
}

#[derive(Default)]
struct Dumper {
    parties: IndexMap<String, HirParty>,
    input_index: HashMap<*const Input, usize>,
    inputs: Vec<HirInput>,
    functions: IndexMap<FunctionId, HirFunction>,
}

impl Dumper {
    fn party(&mut self, party: &Party) -> String {
        self.parties.insert(
            party.name.clone(),
            HirParty {
                name: party.name.clone(),
                source_ref: party.source_ref.clone(),
            },
        );
        party.name.clone()
    }

    fn input(&mut self, input: &Arc<Input>) -> usize {
        let key = Arc::as_ptr(input);
        if let Some(index) = self.input_index.get(&key) {
            return *index;
        }

        let party = self.party(&input.party);
        let index = self.inputs.len();
        self.inputs.push(HirInput {
            name: input.name.clone(),
            party,
            ty: hir_type(&input.ty),
            doc: input.doc.clone(),
            source_ref: input.source_ref.clone(),
        });
        self.input_index.insert(key, index);
        index
    }

    fn output(&mut self, output: &Output) -> Result<HirOutput> {
        let inner = self.node(&output.inner)?;
        let party = self.party(&output.party);
        Ok(HirOutput {
            name: output.name.clone(),
            party,
            inner,
            source_ref: output.source_ref.clone(),
        })
    }

    fn function(&mut self, function: &NadaFunction) -> Result<()> {
        if self.functions.contains_key(&function.id) {
            return Ok(());
        }

        let inner = self.node(&function.inner)?;
        let args = function
            .args
            .iter()
            .map(|arg| HirArg {
                name: arg.name.clone(),
                ty: hir_type(&arg.ty),
            })
            .collect();

        self.functions.insert(
            function.id,
            HirFunction {
                id: function.id,
                function: function.name.clone(),
                args,
                return_type: hir_type(&function.return_type),
                inner,
                source_ref: function.source_ref.clone(),
            },
        );
        Ok(())
    }

    fn node(&mut self, expr: &Expr) -> Result<HirNode> {
        let node = match expr.op() {
            Operation::Binary {
                op,
                left,
                right,
                source_ref,
            } => HirNode {
                left: Some(Box::new(self.node(left)?)),
                right: Some(Box::new(self.node(right)?)),
                ..HirNode::bare(op.name(), source_ref)
            },
            Operation::Cast {
                target,
                to,
                source_ref,
            } => HirNode {
                target: Some(Box::new(self.node(target)?)),
                to: Some(to.to_string()),
                digits: rational_digits(to),
                ..HirNode::bare("Cast", source_ref)
            },
            Operation::InputReference(input) => HirNode {
                input: Some(self.input(input)),
                ..HirNode::bare("InputReference", &SourceRef::default())
            },
            Operation::Literal { value, source_ref } => {
                let ty = value.scalar_type();
                HirNode {
                    value: Some(Value::String(value.to_string())),
                    ty: Some(HirType::Name(ty.to_string())),
                    digits: rational_digits(&ty),
                    ..HirNode::bare("Literal", source_ref)
                }
            }
            Operation::Map {
                function,
                inner,
                source_ref,
            }
            | Operation::Reduce {
                function,
                inner,
                source_ref,
            } => {
                self.function(function)?;
                HirNode {
                    function: Some(function.id),
                    inner: Some(Box::new(self.node(inner)?)),
                    ..HirNode::bare(expr.op().kind_name(), source_ref)
                }
            }
            Operation::Unzip { inner, source_ref } => HirNode {
                inner: Some(Box::new(self.node(inner)?)),
                ..HirNode::bare("Unzip", source_ref)
            },
            Operation::FunctionArgRef(arg) => HirNode {
                refers_to: Some(arg.name.clone()),
                ..HirNode::bare("NadaFunctionArgRef", &SourceRef::default())
            },
            other => {
                return Err(CompileError::UnsupportedOperation(
                    other.kind_name().to_string(),
                ))
            }
        };
        Ok(node)
    }
}

fn hir_type(spec: &TypeSpec) -> HirType {
    match spec {
        TypeSpec::Scalar(ScalarType {
            visibility: Some(Visibility::Secret),
            kind: ScalarKind::Rational {
                digits: Some(digits),
            },
        }) => HirType::Composite(HirCompositeType::SecretRational { digits: *digits }),
        TypeSpec::Scalar(scalar) => HirType::Name(scalar.to_string()),
        TypeSpec::Array { inner, size } => HirType::Composite(HirCompositeType::Array {
            inner_type: Box::new(hir_type(inner)),
            size: *size,
        }),
        TypeSpec::Vector { inner } => HirType::Composite(HirCompositeType::Vector {
            inner_type: Box::new(hir_type(inner)),
        }),
        TypeSpec::Tuple { left, right } => HirType::Composite(HirCompositeType::NadaTuple {
            left_type: Box::new(hir_type(left)),
            right_type: Box::new(hir_type(right)),
        }),
        TypeSpec::Generic(name) => HirType::Composite(HirCompositeType::Generic(name.clone())),
    }
}

fn rational_digits(scalar: &ScalarType) -> Option<u32> {
    match scalar.kind {
        ScalarKind::Rational { digits } => digits,
        _ => None,
    }
}

fn literal_value(node: &HirNode) -> Result<LiteralValue> {
    let ty = node.required(&node.ty, "type")?.to_type_spec()?;
    let text = match node.required(&node.value, "value")? {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };

    let invalid = || CompileError::InvalidLiteral {
        value: text.clone(),
        ty: ty.to_string(),
    };

    let scalar = ty
        .as_scalar()
        .filter(|scalar| scalar.visibility.is_none())
        .ok_or_else(invalid)?;

    let value = match scalar.kind {
        ScalarKind::Integer => LiteralValue::Integer(text.parse::<BigInt>().map_err(|_| invalid())?),
        ScalarKind::UnsignedInteger => {
            LiteralValue::UnsignedInteger(text.parse::<BigUint>().map_err(|_| invalid())?)
        }
        ScalarKind::Boolean => match text.as_str() {
            "true" => LiteralValue::Boolean(true),
            "false" => LiteralValue::Boolean(false),
            _ => return Err(invalid()),
        },
        ScalarKind::Rational { digits } => {
            let digits = node
                .digits
                .or(digits)
                .ok_or_else(|| CompileError::MissingField {
                    field: "digits".to_string(),
                    node_type: node.op.clone(),
                })?;
            LiteralValue::Rational {
                mantissa: text.parse::<BigInt>().map_err(|_| invalid())?,
                digits,
            }
        }
    };
    Ok(value)
}
