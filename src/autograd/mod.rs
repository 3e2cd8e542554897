//! Reverse-mode automatic differentiation
//!
//! Free functions in [`ops`] run an [`Operation`] forward and, when any
//! operand tracks gradients, wire a new [`Variable`] into the graph.
//! [`Variable::backward`] orders the graph with [`Executor`] and replays each
//! operation's backward rule, accumulating into input gradients.

pub mod function;
pub mod gradcheck;
pub mod graph;
pub mod ops;
pub mod variable;

pub use function::{
    AddOp, MatmulOp, MeanOp, MulOp, Operation, OperationContext, PowOp, SelectOp, SinOp, SubOp,
    SumOp, TransposeOp,
};
pub use graph::Executor;
pub use ops::*;
pub use variable::{Variable, VariableId};
