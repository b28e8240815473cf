//! Type reification: declared DSL types into MIR type descriptors.

use nada_mir_core::{
    Expr, FunctionArg, Input, Primitive, ScalarKind, ScalarType, TypeDescriptor, TypeSpec,
    Visibility,
};

/// Anything that exposes a declared DSL type.
pub trait Typed {
    fn type_spec(&self) -> &TypeSpec;
}

impl Typed for TypeSpec {
    fn type_spec(&self) -> &TypeSpec {
        self
    }
}

impl Typed for Expr {
    fn type_spec(&self) -> &TypeSpec {
        self.ty()
    }
}

impl Typed for Input {
    fn type_spec(&self) -> &TypeSpec {
        &self.ty
    }
}

impl Typed for FunctionArg {
    fn type_spec(&self) -> &TypeSpec {
        &self.ty
    }
}

pub fn reify<T: Typed + ?Sized>(value: &T) -> TypeDescriptor {
    reify_spec(value.type_spec())
}

fn reify_spec(spec: &TypeSpec) -> TypeDescriptor {
    match spec {
        TypeSpec::Scalar(scalar) => reify_scalar(scalar),
        TypeSpec::Array { inner, size } => TypeDescriptor::Array {
            inner_type: Box::new(reify_element(inner)),
            // Zero means "not fixed" for the DSL's array constructors.
            size: size.filter(|size| *size > 0),
        },
        TypeSpec::Vector { inner } => TypeDescriptor::Vector {
            inner_type: Box::new(reify_element(inner)),
        },
        TypeSpec::Tuple { left, right } => TypeDescriptor::NadaTuple {
            left_type: Box::new(reify_spec(left)),
            right_type: Box::new(reify_spec(right)),
        },
        TypeSpec::Generic(_) => TypeDescriptor::Placeholder,
    }
}

fn reify_element(inner: &TypeSpec) -> TypeDescriptor {
    if inner.is_generic() {
        TypeDescriptor::Placeholder
    } else {
        reify_spec(inner)
    }
}

fn reify_scalar(scalar: &ScalarType) -> TypeDescriptor {
    let primitive = match scalar.kind {
        ScalarKind::Integer => Primitive::Integer,
        ScalarKind::UnsignedInteger => Primitive::UnsignedInteger,
        ScalarKind::Boolean => Primitive::Boolean,
        // Only secret rationals carry their precision into the document.
        ScalarKind::Rational { digits } => Primitive::Rational {
            digits: digits.filter(|_| scalar.visibility == Some(Visibility::Secret)),
        },
    };
    TypeDescriptor::scalar(scalar.visibility, primitive)
}
