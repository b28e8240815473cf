/*! Graph-to-MIR lowering.
 *
 * Walks an expression graph depth first and emits the matching MIR node for each operation,
 * registering inputs, parties and higher-order functions in the compilation context as they are
 * encountered. The node's own type is reified once, before its operands are visited.
 */

use nada_mir_core::mir::{BinaryNode, HigherOrderNode};
use nada_mir_core::{BinaryOp, Expr, MirArg, MirFunction, MirOperation, NadaFunction, Operation};
use tracing::{debug, trace};

use crate::context::CompilationContext;
use crate::errors::{CompileError, Result};
use crate::reify::reify;

pub fn lower_operation(ctx: &mut CompilationContext, expr: &Expr) -> Result<MirOperation> {
    let ty = reify(expr);
    let op = expr.op();
    trace!(kind = op.kind_name(), "lowering node");

    let lowered = match op {
        Operation::Binary {
            op,
            left,
            right,
            source_ref,
        } => {
            let node = BinaryNode {
                left: Box::new(lower_operation(ctx, left)?),
                right: Box::new(lower_operation(ctx, right)?),
                ty,
                source_ref: ctx.record_source(source_ref),
            };
            binary_operation(*op, node)
        }
        Operation::Cast {
            target,
            to,
            source_ref,
        } => MirOperation::Cast {
            target: Box::new(lower_operation(ctx, target)?),
            to: to.to_string(),
            ty,
            source_ref: ctx.record_source(source_ref),
        },
        Operation::InputReference(input) => {
            ctx.register_input(input, ty.clone())?;
            MirOperation::InputReference {
                refers_to: input.name.clone(),
                ty,
            }
        }
        Operation::Literal { value, source_ref } => MirOperation::Literal {
            value: value.to_string(),
            ty,
            source_ref: ctx.record_source(source_ref),
        },
        Operation::Map {
            function,
            inner,
            source_ref,
        } => {
            ctx.register_function(function);
            MirOperation::Map(HigherOrderNode {
                function: function.id,
                inner: Box::new(lower_operation(ctx, inner)?),
                ty,
                source_ref: ctx.record_source(source_ref),
            })
        }
        Operation::Reduce {
            function,
            inner,
            source_ref,
        } => {
            ctx.register_function(function);
            MirOperation::Reduce(HigherOrderNode {
                function: function.id,
                inner: Box::new(lower_operation(ctx, inner)?),
                ty,
                source_ref: ctx.record_source(source_ref),
            })
        }
        Operation::Unzip { inner, source_ref } => MirOperation::Unzip {
            inner: Box::new(lower_operation(ctx, inner)?),
            ty,
            source_ref: ctx.record_source(source_ref),
        },
        // Argument references have no value type of their own; use the declared one.
        Operation::FunctionArgRef(arg) => MirOperation::NadaFunctionArgRef {
            function_id: arg.function_id,
            refers_to: arg.name.clone(),
            ty: reify(arg),
        },
        other => {
            return Err(CompileError::UnsupportedOperation(
                other.kind_name().to_string(),
            ))
        }
    };

    Ok(lowered)
}

fn binary_operation(op: BinaryOp, node: BinaryNode) -> MirOperation {
    match op {
        BinaryOp::Addition => MirOperation::Addition(node),
        BinaryOp::Subtraction => MirOperation::Subtraction(node),
        BinaryOp::Multiplication => MirOperation::Multiplication(node),
        BinaryOp::Division => MirOperation::Division(node),
        BinaryOp::Modulo => MirOperation::Modulo(node),
        BinaryOp::LeftShift => MirOperation::LeftShift(node),
        BinaryOp::RightShift => MirOperation::RightShift(node),
        BinaryOp::LessThan => MirOperation::LessThan(node),
        BinaryOp::GreaterThan => MirOperation::GreaterThan(node),
        BinaryOp::LessOrEqualThan => MirOperation::LessOrEqualThan(node),
        BinaryOp::GreaterOrEqualThan => MirOperation::GreaterOrEqualThan(node),
        BinaryOp::Equals => MirOperation::Equals(node),
        BinaryOp::PublicEquals => MirOperation::PublicEquals(node),
        BinaryOp::Zip => MirOperation::Zip(node),
    }
}

/// Lowers a user-defined function. Its body may register further functions.
pub fn lower_function(ctx: &mut CompilationContext, function: &NadaFunction) -> Result<MirFunction> {
    debug!(id = %function.id, function = %function.name, "lowering function");

    let args = function
        .args
        .iter()
        .map(|arg| MirArg {
            name: arg.name.clone(),
            ty: reify(arg),
        })
        .collect();
    let inner = lower_operation(ctx, &function.inner)?;

    Ok(MirFunction {
        id: function.id,
        args,
        function: function.name.clone(),
        inner,
        return_type: reify(&function.return_type),
        source_ref: ctx.record_source(&function.source_ref),
    })
}
