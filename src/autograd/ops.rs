//! Free functions that build the autograd graph

use super::function::{
    AddOp, MatmulOp, MeanOp, MulOp, Operation, PowOp, SelectOp, SinOp, SubOp, SumOp, TransposeOp,
};
use super::variable::Variable;
use crate::error::TensorResult;
use crate::tensor::{Element, Slice, Tensor};

/// Run `op` forward on the values of `inputs`.
///
/// If no input requires gradients the result is a non-tracking leaf.
/// Otherwise the result is a derived node that owns `op` and records every
/// input in order.
pub fn record<T, O>(mut op: O, inputs: &[&Variable<T>]) -> TensorResult<Variable<T>>
where
    T: Element,
    O: Operation<T> + 'static,
{
    let values: Vec<Tensor<T>> = inputs.iter().map(|v| v.data()).collect();
    let output = op.forward(&values)?;

    if !inputs.iter().any(|v| v.requires_grad()) {
        return Ok(Variable::new(output, false));
    }

    tracing::trace!(op = op.name(), inputs = inputs.len(), "recording operation");
    let inputs = inputs.iter().map(|&v| v.clone()).collect();
    Ok(Variable::from_op(output, Box::new(op), inputs))
}

pub fn add<T: Element>(a: &Variable<T>, b: &Variable<T>) -> TensorResult<Variable<T>> {
    record(AddOp::new(), &[a, b])
}

pub fn sub<T: Element>(a: &Variable<T>, b: &Variable<T>) -> TensorResult<Variable<T>> {
    record(SubOp::new(), &[a, b])
}

pub fn mul<T: Element>(a: &Variable<T>, b: &Variable<T>) -> TensorResult<Variable<T>> {
    record(MulOp::new(), &[a, b])
}

pub fn matmul<T: Element>(a: &Variable<T>, b: &Variable<T>) -> TensorResult<Variable<T>> {
    record(MatmulOp::new(), &[a, b])
}

pub fn pow<T: Element>(a: &Variable<T>, exponent: f64) -> TensorResult<Variable<T>> {
    record(PowOp::new(exponent), &[a])
}

pub fn sin<T: Element>(a: &Variable<T>) -> TensorResult<Variable<T>> {
    record(SinOp::new(), &[a])
}

pub fn sum<T: Element>(a: &Variable<T>) -> TensorResult<Variable<T>> {
    record(SumOp::new(), &[a])
}

pub fn mean<T: Element>(a: &Variable<T>) -> TensorResult<Variable<T>> {
    record(MeanOp::new(), &[a])
}

pub fn select<T: Element>(a: &Variable<T>, slices: &[Slice]) -> TensorResult<Variable<T>> {
    record(SelectOp::new(slices), &[a])
}

pub fn transpose<T: Element>(a: &Variable<T>, dim0: isize, dim1: isize) -> TensorResult<Variable<T>> {
    record(TransposeOp::new(dim0, dim1), &[a])
}
