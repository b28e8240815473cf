/*! Expression graph built by DSL programs.
 *
 * Every value a program manipulates is an `Expr`: a shared, immutable node pairing the value's declared
 * type with the operation that produced it. Graphs are assembled bottom-up through the constructors
 * below, which enforce operand typing, so anything handed to the compiler is well-typed and acyclic.
 */

use std::fmt;
use std::sync::Arc;

use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

use crate::source_ref::SourceRef;
use crate::types::{ScalarKind, ScalarType, TypeSpec, Visibility};
use crate::{GraphError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub name: String,
    pub source_ref: SourceRef,
}

impl Party {
    pub fn new(name: impl Into<String>, source_ref: SourceRef) -> Self {
        Self {
            name: name.into(),
            source_ref,
        }
    }
}

/// A party-owned program input. Identity is the `Arc` allocation, not the name.
#[derive(Debug)]
pub struct Input {
    pub name: String,
    pub party: Party,
    pub ty: TypeSpec,
    pub doc: String,
    pub source_ref: SourceRef,
}

impl Input {
    pub fn new(
        name: impl Into<String>,
        party: Party,
        ty: TypeSpec,
        source_ref: SourceRef,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            party,
            ty,
            doc: String::new(),
            source_ref,
        })
    }

    pub fn with_doc(
        name: impl Into<String>,
        party: Party,
        ty: TypeSpec,
        doc: impl Into<String>,
        source_ref: SourceRef,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            party,
            ty,
            doc: doc.into(),
            source_ref,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Output {
    pub inner: Expr,
    pub name: String,
    pub party: Party,
    pub source_ref: SourceRef,
}

impl Output {
    pub fn new(inner: Expr, name: impl Into<String>, party: Party, source_ref: SourceRef) -> Self {
        Self {
            inner,
            name: name.into(),
            party,
            source_ref,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(pub u64);

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionArg {
    pub function_id: FunctionId,
    pub name: String,
    pub ty: TypeSpec,
    pub source_ref: SourceRef,
}

/// User-defined function applied by `Map` and `Reduce`.
#[derive(Debug)]
pub struct NadaFunction {
    pub id: FunctionId,
    /// Name of the host-language function the body was traced from.
    pub name: String,
    pub args: Vec<FunctionArg>,
    pub return_type: TypeSpec,
    pub inner: Expr,
    pub source_ref: SourceRef,
}

impl NadaFunction {
    /// Traces `body` over argument references and records the result as the function body.
    pub fn define<F, E>(
        id: FunctionId,
        name: impl Into<String>,
        params: Vec<(String, TypeSpec)>,
        return_type: TypeSpec,
        source_ref: SourceRef,
        body: F,
    ) -> std::result::Result<Arc<Self>, E>
    where
        F: FnOnce(&[Expr]) -> std::result::Result<Expr, E>,
    {
        let args: Vec<FunctionArg> = params
            .into_iter()
            .map(|(name, ty)| FunctionArg {
                function_id: id,
                name,
                ty,
                source_ref: source_ref.clone(),
            })
            .collect();

        let arg_refs: Vec<Expr> = args.iter().cloned().map(Expr::argument).collect();
        let inner = body(&arg_refs)?;

        Ok(Arc::new(Self {
            id,
            name: name.into(),
            args,
            return_type,
            inner,
            source_ref,
        }))
    }

    pub fn arg(&self, name: &str) -> Option<&FunctionArg> {
        self.args.iter().find(|arg| arg.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    LeftShift,
    RightShift,
    LessThan,
    GreaterThan,
    LessOrEqualThan,
    GreaterOrEqualThan,
    Equals,
    PublicEquals,
    Zip,
}

impl BinaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Addition => "Addition",
            BinaryOp::Subtraction => "Subtraction",
            BinaryOp::Multiplication => "Multiplication",
            BinaryOp::Division => "Division",
            BinaryOp::Modulo => "Modulo",
            BinaryOp::LeftShift => "LeftShift",
            BinaryOp::RightShift => "RightShift",
            BinaryOp::LessThan => "LessThan",
            BinaryOp::GreaterThan => "GreaterThan",
            BinaryOp::LessOrEqualThan => "LessOrEqualThan",
            BinaryOp::GreaterOrEqualThan => "GreaterOrEqualThan",
            BinaryOp::Equals => "Equals",
            BinaryOp::PublicEquals => "PublicEquals",
            BinaryOp::Zip => "Zip",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "Addition" => BinaryOp::Addition,
            "Subtraction" => BinaryOp::Subtraction,
            "Multiplication" => BinaryOp::Multiplication,
            "Division" => BinaryOp::Division,
            "Modulo" => BinaryOp::Modulo,
            "LeftShift" => BinaryOp::LeftShift,
            "RightShift" => BinaryOp::RightShift,
            "LessThan" => BinaryOp::LessThan,
            "GreaterThan" => BinaryOp::GreaterThan,
            "LessOrEqualThan" => BinaryOp::LessOrEqualThan,
            "GreaterOrEqualThan" => BinaryOp::GreaterOrEqualThan,
            "Equals" => BinaryOp::Equals,
            "PublicEquals" => BinaryOp::PublicEquals,
            "Zip" => BinaryOp::Zip,
            _ => return None,
        };
        Some(op)
    }

    fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Addition
                | BinaryOp::Subtraction
                | BinaryOp::Multiplication
                | BinaryOp::Division
                | BinaryOp::Modulo
        )
    }

    fn is_ordering(&self) -> bool {
        matches!(
            self,
            BinaryOp::LessThan
                | BinaryOp::GreaterThan
                | BinaryOp::LessOrEqualThan
                | BinaryOp::GreaterOrEqualThan
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    Integer(BigInt),
    UnsignedInteger(BigUint),
    Boolean(bool),
    /// Fixed-point value `mantissa * 10^-digits`.
    Rational { mantissa: BigInt, digits: u32 },
}

impl LiteralValue {
    pub fn scalar_type(&self) -> ScalarType {
        let kind = match self {
            LiteralValue::Integer(_) => ScalarKind::Integer,
            LiteralValue::UnsignedInteger(_) => ScalarKind::UnsignedInteger,
            LiteralValue::Boolean(_) => ScalarKind::Boolean,
            LiteralValue::Rational { digits, .. } => ScalarKind::Rational {
                digits: Some(*digits),
            },
        };
        ScalarType::literal(kind)
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Integer(value) => write!(f, "{}", value),
            LiteralValue::UnsignedInteger(value) => write!(f, "{}", value),
            LiteralValue::Boolean(value) => write!(f, "{}", value),
            LiteralValue::Rational { mantissa, .. } => write!(f, "{}", mantissa),
        }
    }
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Operation {
    Binary {
        op: BinaryOp,
        left: Expr,
        right: Expr,
        source_ref: SourceRef,
    },
    Cast {
        target: Expr,
        to: ScalarType,
        source_ref: SourceRef,
    },
    InputReference(Arc<Input>),
    Literal {
        value: LiteralValue,
        source_ref: SourceRef,
    },
    Map {
        function: Arc<NadaFunction>,
        inner: Expr,
        source_ref: SourceRef,
    },
    Reduce {
        function: Arc<NadaFunction>,
        inner: Expr,
        source_ref: SourceRef,
    },
    Unzip {
        inner: Expr,
        source_ref: SourceRef,
    },
    FunctionArgRef(FunctionArg),
}

impl Operation {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Operation::Binary { op, .. } => op.name(),
            Operation::Cast { .. } => "Cast",
            Operation::InputReference(_) => "InputReference",
            Operation::Literal { .. } => "Literal",
            Operation::Map { .. } => "Map",
            Operation::Reduce { .. } => "Reduce",
            Operation::Unzip { .. } => "Unzip",
            Operation::FunctionArgRef(_) => "NadaFunctionArgRef",
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub ty: TypeSpec,
    pub op: Operation,
}

/// Shared handle to a graph node.
#[derive(Debug, Clone)]
pub struct Expr(Arc<Node>);

impl Expr {
    /// Wraps an operation without type checking. Prefer the typed constructors.
    pub fn new(ty: TypeSpec, op: Operation) -> Self {
        Expr(Arc::new(Node { ty, op }))
    }

    pub fn ty(&self) -> &TypeSpec {
        &self.0.ty
    }

    pub fn op(&self) -> &Operation {
        &self.0.op
    }

    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn input(input: &Arc<Input>) -> Self {
        Expr::new(input.ty.clone(), Operation::InputReference(Arc::clone(input)))
    }

    pub fn argument(arg: FunctionArg) -> Self {
        Expr::new(arg.ty.clone(), Operation::FunctionArgRef(arg))
    }

    pub fn literal(value: LiteralValue, source_ref: SourceRef) -> Self {
        Expr::new(
            TypeSpec::Scalar(value.scalar_type()),
            Operation::Literal { value, source_ref },
        )
    }

    pub fn integer(value: i64, source_ref: SourceRef) -> Self {
        Expr::literal(LiteralValue::Integer(BigInt::from(value)), source_ref)
    }

    pub fn unsigned_integer(value: u64, source_ref: SourceRef) -> Self {
        Expr::literal(LiteralValue::UnsignedInteger(BigUint::from(value)), source_ref)
    }

    pub fn boolean(value: bool, source_ref: SourceRef) -> Self {
        Expr::literal(LiteralValue::Boolean(value), source_ref)
    }

    pub fn binary(op: BinaryOp, left: &Expr, right: &Expr, source_ref: SourceRef) -> Result<Self> {
        let ty = binary_result_type(op, left.ty(), right.ty())?;
        Ok(Expr::new(
            ty,
            Operation::Binary {
                op,
                left: left.clone(),
                right: right.clone(),
                source_ref,
            },
        ))
    }

    pub fn add(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::Addition, self, other, source_ref)
    }

    pub fn sub(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::Subtraction, self, other, source_ref)
    }

    pub fn mul(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::Multiplication, self, other, source_ref)
    }

    pub fn div(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::Division, self, other, source_ref)
    }

    pub fn rem(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::Modulo, self, other, source_ref)
    }

    pub fn shl(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::LeftShift, self, other, source_ref)
    }

    pub fn shr(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::RightShift, self, other, source_ref)
    }

    pub fn lt(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::LessThan, self, other, source_ref)
    }

    pub fn gt(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::GreaterThan, self, other, source_ref)
    }

    pub fn le(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::LessOrEqualThan, self, other, source_ref)
    }

    pub fn ge(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::GreaterOrEqualThan, self, other, source_ref)
    }

    pub fn equals(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::Equals, self, other, source_ref)
    }

    pub fn public_equals(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::PublicEquals, self, other, source_ref)
    }

    pub fn zip(&self, other: &Expr, source_ref: SourceRef) -> Result<Self> {
        Expr::binary(BinaryOp::Zip, self, other, source_ref)
    }

    pub fn cast(&self, to: ScalarType, source_ref: SourceRef) -> Result<Self> {
        let from = scalar_operand("Cast", self.ty())?;
        if to.is_secret_rational_without_digits() {
            return Err(GraphError::MissingDigits(to.to_string()));
        }
        if !from.kind.is_numeric() || !to.kind.is_numeric() {
            return Err(GraphError::TypeMismatch {
                op: "Cast".to_string(),
                left: from.to_string(),
                right: to.to_string(),
            });
        }
        Ok(Expr::new(
            TypeSpec::Scalar(to),
            Operation::Cast {
                target: self.clone(),
                to,
                source_ref,
            },
        ))
    }

    pub fn map(&self, function: &Arc<NadaFunction>, source_ref: SourceRef) -> Result<Self> {
        let ty = match self.ty() {
            TypeSpec::Array { size, .. } => TypeSpec::Array {
                inner: Box::new(function.return_type.clone()),
                size: *size,
            },
            TypeSpec::Vector { .. } => TypeSpec::vector(function.return_type.clone()),
            other => return Err(GraphError::NotACollection(other.to_string())),
        };
        Ok(Expr::new(
            ty,
            Operation::Map {
                function: Arc::clone(function),
                inner: self.clone(),
                source_ref,
            },
        ))
    }

    pub fn reduce(&self, function: &Arc<NadaFunction>, source_ref: SourceRef) -> Result<Self> {
        if self.ty().element().is_none() {
            return Err(GraphError::NotACollection(self.ty().to_string()));
        }
        Ok(Expr::new(
            function.return_type.clone(),
            Operation::Reduce {
                function: Arc::clone(function),
                inner: self.clone(),
                source_ref,
            },
        ))
    }

    pub fn unzip(&self, source_ref: SourceRef) -> Result<Self> {
        let ty = match self.ty() {
            TypeSpec::Array { inner, size } => match inner.as_ref() {
                TypeSpec::Tuple { left, right } => TypeSpec::Tuple {
                    left: Box::new(TypeSpec::Array {
                        inner: left.clone(),
                        size: *size,
                    }),
                    right: Box::new(TypeSpec::Array {
                        inner: right.clone(),
                        size: *size,
                    }),
                },
                other => return Err(GraphError::NotATupleArray(other.to_string())),
            },
            other => return Err(GraphError::NotATupleArray(other.to_string())),
        };
        Ok(Expr::new(
            ty,
            Operation::Unzip {
                inner: self.clone(),
                source_ref,
            },
        ))
    }
}

fn scalar_operand<'a>(op: &str, ty: &'a TypeSpec) -> Result<&'a ScalarType> {
    ty.as_scalar().ok_or_else(|| GraphError::NotAScalar {
        op: op.to_string(),
        ty: ty.to_string(),
    })
}

fn join_visibility(left: Option<Visibility>, right: Option<Visibility>) -> Option<Visibility> {
    match (left, right) {
        (Some(l), Some(r)) => Some(l.join(r)),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

fn merge_kind(left: ScalarKind, right: ScalarKind) -> ScalarKind {
    match (left, right) {
        (ScalarKind::Rational { digits: Some(d) }, _) | (_, ScalarKind::Rational { digits: Some(d) }) => {
            ScalarKind::Rational { digits: Some(d) }
        }
        (kind, _) => kind,
    }
}

fn binary_result_type(op: BinaryOp, left: &TypeSpec, right: &TypeSpec) -> Result<TypeSpec> {
    let mismatch = || GraphError::TypeMismatch {
        op: op.name().to_string(),
        left: left.to_string(),
        right: right.to_string(),
    };

    if op == BinaryOp::Zip {
        return match (left, right) {
            (
                TypeSpec::Array {
                    inner: l,
                    size: l_size,
                },
                TypeSpec::Array {
                    inner: r,
                    size: r_size,
                },
            ) if l_size == r_size => Ok(TypeSpec::Array {
                inner: Box::new(TypeSpec::Tuple {
                    left: l.clone(),
                    right: r.clone(),
                }),
                size: *l_size,
            }),
            _ => Err(mismatch()),
        };
    }

    let l = scalar_operand(op.name(), left)?;
    let r = scalar_operand(op.name(), right)?;

    match op {
        BinaryOp::LeftShift | BinaryOp::RightShift => {
            let amount_ok = r.kind == ScalarKind::UnsignedInteger
                && r.visibility != Some(Visibility::Secret);
            if !l.kind.is_numeric() || !amount_ok {
                return Err(mismatch());
            }
            Ok(TypeSpec::Scalar(*l))
        }
        _ if !l.kind.same_base(&r.kind) => Err(mismatch()),
        _ if op.is_arithmetic() => {
            if !l.kind.is_numeric() {
                return Err(mismatch());
            }
            Ok(TypeSpec::Scalar(ScalarType {
                visibility: join_visibility(l.visibility, r.visibility),
                kind: merge_kind(l.kind, r.kind),
            }))
        }
        _ if op.is_ordering() => {
            if !l.kind.is_numeric() {
                return Err(mismatch());
            }
            Ok(TypeSpec::Scalar(ScalarType {
                visibility: join_visibility(l.visibility, r.visibility),
                kind: ScalarKind::Boolean,
            }))
        }
        BinaryOp::Equals => Ok(TypeSpec::Scalar(ScalarType {
            visibility: join_visibility(l.visibility, r.visibility),
            kind: ScalarKind::Boolean,
        })),
        BinaryOp::PublicEquals => {
            if l.visibility.is_none() || r.visibility.is_none() {
                return Err(mismatch());
            }
            Ok(TypeSpec::public_boolean())
        }
        _ => Err(mismatch()),
    }
}
