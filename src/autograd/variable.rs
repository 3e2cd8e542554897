//! Variable nodes of the autograd graph

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::function::Operation;
use super::graph::Executor;
use crate::config::{self, AutogradConfig};
use crate::error::{TensorError, TensorResult};
use crate::tensor::{DimVector, Element, Tensor};

static NEXT_VARIABLE_ID: AtomicU64 = AtomicU64::new(0);

/// Unique identifier of a variable, increasing in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(u64);

impl VariableId {
    fn next() -> Self {
        VariableId(NEXT_VARIABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

struct VariableInner<T: Element> {
    id: VariableId,
    data: Tensor<T>,
    grad: Option<Tensor<T>>,
    requires_grad: bool,
    is_leaf: bool,
    grad_fn: Option<Box<dyn Operation<T>>>,
    inputs: Vec<Variable<T>>,
}

/// A node of the autograd graph.
///
/// Cloning a `Variable` yields another handle to the same node. Leaves are
/// created directly; derived nodes are created by the functions in
/// [`crate::autograd::ops`] and remember the operation and inputs that
/// produced them.
pub struct Variable<T: Element> {
    inner: Arc<RwLock<VariableInner<T>>>,
}

impl<T: Element> Variable<T> {
    /// Leaf node over `data`
    pub fn new(data: Tensor<T>, requires_grad: bool) -> Self {
        let grad = requires_grad.then(|| Tensor::zeros_like(&data));
        Self::from_inner(VariableInner {
            id: VariableId::next(),
            data,
            grad,
            requires_grad,
            is_leaf: true,
            grad_fn: None,
            inputs: Vec::new(),
        })
    }

    pub fn from_tensor(data: Tensor<T>, requires_grad: bool) -> Self {
        Self::new(data, requires_grad)
    }

    pub fn from_vec(data: Vec<T>, shape: impl Into<DimVector>, requires_grad: bool) -> TensorResult<Self> {
        Ok(Self::new(Tensor::from_vec(data, shape)?, requires_grad))
    }

    pub fn zeros(shape: impl Into<DimVector>, requires_grad: bool) -> Self {
        Self::new(Tensor::zeros(shape), requires_grad)
    }

    pub fn ones(shape: impl Into<DimVector>, requires_grad: bool) -> Self {
        Self::new(Tensor::ones(shape), requires_grad)
    }

    /// Leaf with unspecified contents; storage is zero-filled
    pub fn empty(shape: impl Into<DimVector>, requires_grad: bool) -> Self {
        Self::new(Tensor::new(shape), requires_grad)
    }

    pub fn empty_like(other: &Variable<T>, requires_grad: bool) -> Self {
        Self::new(Tensor::zeros_like(&other.data()), requires_grad)
    }

    /// Derived node produced by `op` from `inputs`
    pub(crate) fn from_op(data: Tensor<T>, op: Box<dyn Operation<T>>, inputs: Vec<Variable<T>>) -> Self {
        let grad = Some(Tensor::zeros_like(&data));
        Self::from_inner(VariableInner {
            id: VariableId::next(),
            data,
            grad,
            requires_grad: true,
            is_leaf: false,
            grad_fn: Some(op),
            inputs,
        })
    }

    fn from_inner(inner: VariableInner<T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    pub fn id(&self) -> VariableId {
        self.inner.read().id
    }

    /// Handle to the value tensor, sharing its storage
    pub fn data(&self) -> Tensor<T> {
        self.inner.read().data.alias()
    }

    pub fn data_(&self, data: Tensor<T>) {
        self.inner.write().data = data;
    }

    /// Handle to the accumulated gradient, if tracked
    pub fn grad(&self) -> Option<Tensor<T>> {
        self.inner.read().grad.as_ref().map(Tensor::alias)
    }

    pub fn grad_(&self, grad: Tensor<T>) -> TensorResult<()> {
        let mut inner = self.inner.write();
        if grad.shape() != inner.data.shape() {
            return Err(TensorError::shape_error(
                &format!("gradient of shape {}", inner.data.shape()),
                &format!("{}", grad.shape()),
                None,
            ));
        }
        inner.grad = Some(grad);
        Ok(())
    }

    pub fn requires_grad(&self) -> bool {
        self.inner.read().requires_grad
    }

    /// Enable tracking (allocating a zero gradient if none exists) or
    /// disable it (dropping the gradient)
    pub fn requires_grad_(&self, requires_grad: bool) {
        let mut inner = self.inner.write();
        inner.requires_grad = requires_grad;
        if !requires_grad {
            inner.grad = None;
        } else if inner.grad.is_none() {
            inner.grad = Some(Tensor::zeros_like(&inner.data));
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.inner.read().is_leaf
    }

    pub fn size(&self) -> DimVector {
        self.inner.read().data.shape().clone()
    }

    pub fn stride(&self) -> DimVector {
        self.inner.read().data.strides().clone()
    }

    pub fn item(&self) -> TensorResult<T> {
        self.inner.read().data.item()
    }

    /// Name of the producing operation, `None` for leaves and released nodes
    pub fn op_name(&self) -> Option<&'static str> {
        self.inner.read().grad_fn.as_ref().map(|op| op.name())
    }

    /// Handles to the recorded inputs
    pub fn inputs(&self) -> Vec<Variable<T>> {
        self.inner.read().inputs.clone()
    }

    /// Whether both handles refer to the same node
    pub fn ptr_eq(&self, other: &Variable<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn zero_grad(&self) {
        if let Some(grad) = self.inner.read().grad.as_ref() {
            grad.fill_(T::zero());
        }
    }

    /// Non-tracking leaf sharing this node's value
    pub fn detach(&self) -> Self {
        Self::new(self.data(), false)
    }

    /// Add `grad` into this node's gradient, allocating it on first use
    pub(crate) fn accumulate_grad(&self, grad: &Tensor<T>) -> TensorResult<()> {
        let mut inner = self.inner.write();
        if inner.grad.is_none() {
            inner.grad = Some(Tensor::zeros_like(&inner.data));
        }
        match inner.grad.as_ref() {
            Some(acc) => acc.add_(grad),
            None => Ok(()),
        }
    }

    /// Backward pass with the global autograd settings
    pub fn backward(&self) -> TensorResult<()> {
        self.backward_with(&config::get_config().autograd)
    }

    /// Seed this node's gradient with ones and propagate it to every
    /// tracked ancestor. Leaf gradients accumulate across calls, a leaf
    /// root included; gradients of intermediate nodes are recomputed from
    /// zero each time.
    pub fn backward_with(&self, settings: &AutogradConfig) -> TensorResult<()> {
        if !self.requires_grad() {
            return Err(TensorError::InvalidState(
                "backward() called on a variable that does not require gradients".to_string(),
            ));
        }

        let order = Executor::topological_sort(self);
        tracing::debug!(nodes = order.len(), root = %self.id(), "starting backward pass");

        for node in &order {
            if !node.is_leaf() {
                node.zero_grad();
            }
        }
        {
            let mut inner = self.inner.write();
            let seed = Tensor::ones_like(&inner.data);
            if inner.is_leaf && inner.grad.is_some() {
                if let Some(acc) = inner.grad.as_ref() {
                    acc.add_(&seed)?;
                }
            } else {
                inner.grad = Some(seed);
            }
        }

        for node in order.iter().rev() {
            let (inputs, grads) = {
                let inner = node.inner.read();
                let op = match inner.grad_fn.as_ref() {
                    Some(op) => op,
                    None => continue,
                };
                let grad = match inner.grad.as_ref() {
                    Some(grad) => grad,
                    None => continue,
                };
                tracing::trace!(node = %inner.id, op = op.name(), "replaying operation");

                let grads = op.backward(grad)?;
                if grads.len() != inner.inputs.len() {
                    tracing::warn!(
                        op = op.name(),
                        expected = inner.inputs.len(),
                        got = grads.len(),
                        "operation returned the wrong number of gradients"
                    );
                    return Err(TensorError::InvalidState(format!(
                        "{} returned {} gradients for {} inputs",
                        op.name(),
                        grads.len(),
                        inner.inputs.len()
                    )));
                }
                (inner.inputs.clone(), grads)
            };

            for (input, grad) in inputs.iter().zip(grads.iter()) {
                if input.requires_grad() {
                    input.accumulate_grad(grad)?;
                }
            }
        }

        if settings.release_graph_after_backward {
            self.release_graph();
        }
        Ok(())
    }

    /// Drop the operation and input edges of this node and every ancestor.
    /// Values, gradients and leaf flags are kept.
    pub fn release_graph(&self) {
        let order = Executor::collect_ancestors(self);
        for node in &order {
            let mut inner = node.inner.write();
            inner.grad_fn = None;
            inner.inputs.clear();
        }
        tracing::debug!(nodes = order.len(), root = %self.id(), "released autograd graph");
    }
}

impl<T: Element> Clone for Variable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Element> fmt::Debug for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Variable")
            .field("id", &inner.id)
            .field("shape", inner.data.shape())
            .field("requires_grad", &inner.requires_grad)
            .field("is_leaf", &inner.is_leaf)
            .field("op", &inner.grad_fn.as_ref().map(|op| op.name()))
            .finish()
    }
}
