use std::fmt;
use std::str::FromStr;

use crate::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Secret,
}

impl Visibility {
    /// Secret wins over public when two operands meet.
    pub fn join(self, other: Visibility) -> Visibility {
        match (self, other) {
            (Visibility::Public, Visibility::Public) => Visibility::Public,
            _ => Visibility::Secret,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::Secret => "Secret",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Integer,
    UnsignedInteger,
    Boolean,
    Rational { digits: Option<u32> },
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Integer => "Integer",
            ScalarKind::UnsignedInteger => "UnsignedInteger",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Rational { .. } => "Rational",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ScalarKind::Boolean)
    }

    /// Kinds are compatible when they only differ in rational precision metadata.
    pub fn same_base(&self, other: &ScalarKind) -> bool {
        self.name() == other.name()
    }
}

/// A primitive DSL type. Values without visibility are literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScalarType {
    pub visibility: Option<Visibility>,
    pub kind: ScalarKind,
}

impl ScalarType {
    pub const fn literal(kind: ScalarKind) -> Self {
        Self {
            visibility: None,
            kind,
        }
    }

    pub const fn public(kind: ScalarKind) -> Self {
        Self {
            visibility: Some(Visibility::Public),
            kind,
        }
    }

    pub const fn secret(kind: ScalarKind) -> Self {
        Self {
            visibility: Some(Visibility::Secret),
            kind,
        }
    }

    pub fn with_kind(self, kind: ScalarKind) -> Self {
        Self { kind, ..self }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.visibility {
            Some(visibility) => write!(f, "{}{}", visibility.prefix(), self.kind.name()),
            None => write!(f, "{}", self.kind.name()),
        }
    }
}

impl ScalarType {
    /// Parses a DSL class name, attaching `digits` to rational kinds. A secret rational without
    /// `digits` is rejected.
    pub fn parse_with_digits(name: &str, digits: Option<u32>) -> Result<Self, GraphError> {
        let (visibility, rest) = if let Some(rest) = name.strip_prefix("Public") {
            (Some(Visibility::Public), rest.trim_start())
        } else if let Some(rest) = name.strip_prefix("Secret") {
            (Some(Visibility::Secret), rest.trim_start())
        } else {
            (None, name)
        };

        let kind = match rest {
            "Integer" => ScalarKind::Integer,
            "UnsignedInteger" => ScalarKind::UnsignedInteger,
            "Boolean" => ScalarKind::Boolean,
            "Rational" => ScalarKind::Rational { digits },
            _ => return Err(GraphError::UnknownType(name.to_string())),
        };

        let scalar = ScalarType { visibility, kind };
        if scalar.is_secret_rational_without_digits() {
            return Err(GraphError::MissingDigits(name.to_string()));
        }
        Ok(scalar)
    }

    pub fn is_secret_rational_without_digits(&self) -> bool {
        self.visibility == Some(Visibility::Secret)
            && self.kind == ScalarKind::Rational { digits: None }
    }
}

impl FromStr for ScalarType {
    type Err = GraphError;

    /// Parses DSL class names such as `SecretInteger`, `PublicBoolean` or `Integer`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScalarType::parse_with_digits(s, None)
    }
}

/// Declared type of a DSL value, possibly parameterised over an unbound type variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    Scalar(ScalarType),
    Array {
        inner: Box<TypeSpec>,
        size: Option<usize>,
    },
    Vector {
        inner: Box<TypeSpec>,
    },
    Tuple {
        left: Box<TypeSpec>,
        right: Box<TypeSpec>,
    },
    Generic(String),
}

impl TypeSpec {
    pub fn secret_integer() -> Self {
        TypeSpec::Scalar(ScalarType::secret(ScalarKind::Integer))
    }

    pub fn public_integer() -> Self {
        TypeSpec::Scalar(ScalarType::public(ScalarKind::Integer))
    }

    pub fn secret_unsigned_integer() -> Self {
        TypeSpec::Scalar(ScalarType::secret(ScalarKind::UnsignedInteger))
    }

    pub fn secret_boolean() -> Self {
        TypeSpec::Scalar(ScalarType::secret(ScalarKind::Boolean))
    }

    pub fn public_boolean() -> Self {
        TypeSpec::Scalar(ScalarType::public(ScalarKind::Boolean))
    }

    pub fn secret_rational(digits: u32) -> Self {
        TypeSpec::Scalar(ScalarType::secret(ScalarKind::Rational {
            digits: Some(digits),
        }))
    }

    pub fn array(inner: TypeSpec, size: usize) -> Self {
        TypeSpec::Array {
            inner: Box::new(inner),
            size: Some(size),
        }
    }

    pub fn vector(inner: TypeSpec) -> Self {
        TypeSpec::Vector {
            inner: Box::new(inner),
        }
    }

    pub fn tuple(left: TypeSpec, right: TypeSpec) -> Self {
        TypeSpec::Tuple {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn generic(name: impl Into<String>) -> Self {
        TypeSpec::Generic(name.into())
    }

    pub fn as_scalar(&self) -> Option<&ScalarType> {
        match self {
            TypeSpec::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Element type of an array or vector.
    pub fn element(&self) -> Option<&TypeSpec> {
        match self {
            TypeSpec::Array { inner, .. } | TypeSpec::Vector { inner } => Some(inner),
            _ => None,
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, TypeSpec::Generic(_))
    }
}

impl From<ScalarType> for TypeSpec {
    fn from(scalar: ScalarType) -> Self {
        TypeSpec::Scalar(scalar)
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Scalar(scalar) => write!(f, "{}", scalar),
            TypeSpec::Array {
                inner,
                size: Some(size),
            } => write!(f, "Array<{}, {}>", inner, size),
            TypeSpec::Array { inner, size: None } => write!(f, "Array<{}>", inner),
            TypeSpec::Vector { inner } => write!(f, "Vector<{}>", inner),
            TypeSpec::Tuple { left, right } => write!(f, "NadaTuple<{}, {}>", left, right),
            TypeSpec::Generic(name) => write!(f, "{}", name),
        }
    }
}
