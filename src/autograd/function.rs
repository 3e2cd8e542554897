//! Operation trait, per-invocation context and the differentiable operations

use crate::config;
use crate::error::{TensorError, TensorResult};
use crate::tensor::{DimVector, Element, Slice, Tensor};

/// State saved during forward for use in backward
#[derive(Debug)]
pub struct OperationContext<T: Element> {
    saved_tensors: Vec<Tensor<T>>,
    input_shapes: Vec<DimVector>,
}

impl<T: Element> Default for OperationContext<T> {
    fn default() -> Self {
        Self {
            saved_tensors: Vec::new(),
            input_shapes: Vec::new(),
        }
    }
}

impl<T: Element> OperationContext<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a handle to `tensor`; later in-place writes to it are visible here
    pub fn save_for_backward(&mut self, tensor: &Tensor<T>) {
        self.saved_tensors.push(tensor.alias());
    }

    pub fn saved_tensor(&self, index: usize) -> TensorResult<&Tensor<T>> {
        self.saved_tensors.get(index).ok_or_else(|| {
            TensorError::InvalidState(format!(
                "No saved tensor at index {}; backward called before forward?",
                index
            ))
        })
    }

    pub fn save_input_shape(&mut self, shape: &DimVector) {
        self.input_shapes.push(shape.clone());
    }

    pub fn input_shape(&self, index: usize) -> TensorResult<&DimVector> {
        self.input_shapes.get(index).ok_or_else(|| {
            TensorError::InvalidState(format!("No saved input shape at index {}", index))
        })
    }

    pub fn num_saved(&self) -> usize {
        self.saved_tensors.len()
    }
}

/// A differentiable operation.
///
/// One instance serves exactly one invocation: `forward` runs first and may
/// save state, then `backward` turns the output gradient into one gradient
/// per forward input, in input order.
pub trait Operation<T: Element>: Send + Sync {
    fn forward(&mut self, inputs: &[Tensor<T>]) -> TensorResult<Tensor<T>>;

    fn backward(&self, grad: &Tensor<T>) -> TensorResult<Vec<Tensor<T>>>;

    fn name(&self) -> &'static str;
}

fn check_arity<T: Element>(name: &str, inputs: &[Tensor<T>], expected: usize) -> TensorResult<()> {
    if inputs.len() != expected {
        return Err(TensorError::InvalidState(format!(
            "{} takes {} inputs, got {}",
            name,
            expected,
            inputs.len()
        )));
    }
    Ok(())
}

/// Gradient for an operand of `shape`, summed over broadcast dimensions when enabled
fn reduce_grad<T: Element>(grad: &Tensor<T>, shape: &DimVector, reduce: bool) -> TensorResult<Tensor<T>> {
    if reduce {
        grad.sum_to(shape)
    } else {
        Ok(grad.alias())
    }
}

fn negated<T: Element>(grad: &Tensor<T>) -> TensorResult<Tensor<T>> {
    let out = grad.contiguous();
    out.neg_()?;
    Ok(out)
}

macro_rules! broadcasting_op {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name<T: Element> {
            ctx: OperationContext<T>,
            reduce_broadcast: bool,
        }

        impl<T: Element> $name<T> {
            pub fn new() -> Self {
                Self {
                    ctx: OperationContext::new(),
                    reduce_broadcast: config::get_config().autograd.reduce_broadcast_grads,
                }
            }

            /// Whether backward sums gradients back to each operand's shape
            pub fn with_broadcast_reduction(mut self, enabled: bool) -> Self {
                self.reduce_broadcast = enabled;
                self
            }
        }

        impl<T: Element> Default for $name<T> {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

broadcasting_op!(
    /// Elementwise broadcast addition
    AddOp
);
broadcasting_op!(
    /// Elementwise broadcast subtraction
    SubOp
);
broadcasting_op!(
    /// Elementwise broadcast product
    MulOp
);

impl<T: Element> Operation<T> for AddOp<T> {
    fn forward(&mut self, inputs: &[Tensor<T>]) -> TensorResult<Tensor<T>> {
        check_arity(self.name(), inputs, 2)?;
        self.ctx.save_input_shape(inputs[0].shape());
        self.ctx.save_input_shape(inputs[1].shape());
        inputs[0].add(&inputs[1])
    }

    fn backward(&self, grad: &Tensor<T>) -> TensorResult<Vec<Tensor<T>>> {
        Ok(vec![
            reduce_grad(grad, self.ctx.input_shape(0)?, self.reduce_broadcast)?,
            reduce_grad(grad, self.ctx.input_shape(1)?, self.reduce_broadcast)?,
        ])
    }

    fn name(&self) -> &'static str {
        "Add"
    }
}

impl<T: Element> Operation<T> for SubOp<T> {
    fn forward(&mut self, inputs: &[Tensor<T>]) -> TensorResult<Tensor<T>> {
        check_arity(self.name(), inputs, 2)?;
        self.ctx.save_input_shape(inputs[0].shape());
        self.ctx.save_input_shape(inputs[1].shape());
        inputs[0].sub(&inputs[1])
    }

    fn backward(&self, grad: &Tensor<T>) -> TensorResult<Vec<Tensor<T>>> {
        let neg = negated(grad)?;
        Ok(vec![
            reduce_grad(grad, self.ctx.input_shape(0)?, self.reduce_broadcast)?,
            reduce_grad(&neg, self.ctx.input_shape(1)?, self.reduce_broadcast)?,
        ])
    }

    fn name(&self) -> &'static str {
        "Sub"
    }
}

impl<T: Element> Operation<T> for MulOp<T> {
    fn forward(&mut self, inputs: &[Tensor<T>]) -> TensorResult<Tensor<T>> {
        check_arity(self.name(), inputs, 2)?;
        self.ctx.save_for_backward(&inputs[0]);
        self.ctx.save_for_backward(&inputs[1]);
        inputs[0].mul(&inputs[1])
    }

    fn backward(&self, grad: &Tensor<T>) -> TensorResult<Vec<Tensor<T>>> {
        let a = self.ctx.saved_tensor(0)?;
        let b = self.ctx.saved_tensor(1)?;
        Ok(vec![
            reduce_grad(&grad.mul(b)?, a.shape(), self.reduce_broadcast)?,
            reduce_grad(&grad.mul(a)?, b.shape(), self.reduce_broadcast)?,
        ])
    }

    fn name(&self) -> &'static str {
        "Mul"
    }
}

/// Matrix product; rank-1 operands are promoted to a row or column
#[derive(Debug)]
pub struct MatmulOp<T: Element> {
    ctx: OperationContext<T>,
}

impl<T: Element> MatmulOp<T> {
    pub fn new() -> Self {
        Self {
            ctx: OperationContext::new(),
        }
    }
}

impl<T: Element> Operation<T> for MatmulOp<T> {
    fn forward(&mut self, inputs: &[Tensor<T>]) -> TensorResult<Tensor<T>> {
        check_arity(self.name(), inputs, 2)?;
        let out = inputs[0].matmul(&inputs[1])?;
        self.ctx.save_for_backward(&inputs[0].as_matrix(true)?);
        self.ctx.save_for_backward(&inputs[1].as_matrix(false)?);
        self.ctx.save_input_shape(inputs[0].shape());
        self.ctx.save_input_shape(inputs[1].shape());
        Ok(out)
    }

    fn backward(&self, grad: &Tensor<T>) -> TensorResult<Vec<Tensor<T>>> {
        let a = self.ctx.saved_tensor(0)?;
        let b = self.ctx.saved_tensor(1)?;
        let grad_a = grad.matmul(&b.transpose(0, 1)?)?;
        let grad_b = a.transpose(0, 1)?.matmul(grad)?;
        Ok(vec![
            grad_a.reshape(self.ctx.input_shape(0)?.clone())?,
            grad_b.reshape(self.ctx.input_shape(1)?.clone())?,
        ])
    }

    fn name(&self) -> &'static str {
        "Matmul"
    }
}

/// Elementwise power with a scalar exponent
#[derive(Debug)]
pub struct PowOp<T: Element> {
    ctx: OperationContext<T>,
    exponent: f64,
}

impl<T: Element> PowOp<T> {
    pub fn new(exponent: f64) -> Self {
        Self {
            ctx: OperationContext::new(),
            exponent,
        }
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }
}

impl<T: Element> Operation<T> for PowOp<T> {
    fn forward(&mut self, inputs: &[Tensor<T>]) -> TensorResult<Tensor<T>> {
        check_arity(self.name(), inputs, 1)?;
        let out = inputs[0].contiguous();
        out.pow_(self.exponent)?;
        self.ctx.save_for_backward(&inputs[0]);
        Ok(out)
    }

    /// `exponent * x^(exponent - 1) * grad`
    fn backward(&self, grad: &Tensor<T>) -> TensorResult<Vec<Tensor<T>>> {
        let local = self.ctx.saved_tensor(0)?.contiguous();
        local.pow_(self.exponent - 1.0)?;
        local.mul_scalar_(T::from_f64(self.exponent))?;
        local.mul_(grad)?;
        Ok(vec![local])
    }

    fn name(&self) -> &'static str {
        "Pow"
    }
}

/// Elementwise sine
#[derive(Debug)]
pub struct SinOp<T: Element> {
    ctx: OperationContext<T>,
}

impl<T: Element> SinOp<T> {
    pub fn new() -> Self {
        Self {
            ctx: OperationContext::new(),
        }
    }
}

impl<T: Element> Operation<T> for SinOp<T> {
    fn forward(&mut self, inputs: &[Tensor<T>]) -> TensorResult<Tensor<T>> {
        check_arity(self.name(), inputs, 1)?;
        let out = inputs[0].contiguous();
        out.sin_()?;
        self.ctx.save_for_backward(&inputs[0]);
        Ok(out)
    }

    /// `cos(x) * grad`
    fn backward(&self, grad: &Tensor<T>) -> TensorResult<Vec<Tensor<T>>> {
        let local = self.ctx.saved_tensor(0)?.contiguous();
        local.cos_()?;
        local.mul_(grad)?;
        Ok(vec![local])
    }

    fn name(&self) -> &'static str {
        "Sin"
    }
}

/// Sum of all elements
#[derive(Debug)]
pub struct SumOp<T: Element> {
    ctx: OperationContext<T>,
}

impl<T: Element> SumOp<T> {
    pub fn new() -> Self {
        Self {
            ctx: OperationContext::new(),
        }
    }
}

impl<T: Element> Operation<T> for SumOp<T> {
    fn forward(&mut self, inputs: &[Tensor<T>]) -> TensorResult<Tensor<T>> {
        check_arity(self.name(), inputs, 1)?;
        self.ctx.save_input_shape(inputs[0].shape());
        inputs[0].sum()
    }

    fn backward(&self, grad: &Tensor<T>) -> TensorResult<Vec<Tensor<T>>> {
        let shape = self.ctx.input_shape(0)?.clone();
        Ok(vec![Tensor::full(shape, grad.item()?)])
    }

    fn name(&self) -> &'static str {
        "Sum"
    }
}

/// Mean of all elements
#[derive(Debug)]
pub struct MeanOp<T: Element> {
    ctx: OperationContext<T>,
}

impl<T: Element> MeanOp<T> {
    pub fn new() -> Self {
        Self {
            ctx: OperationContext::new(),
        }
    }
}

impl<T: Element> Operation<T> for MeanOp<T> {
    fn forward(&mut self, inputs: &[Tensor<T>]) -> TensorResult<Tensor<T>> {
        check_arity(self.name(), inputs, 1)?;
        self.ctx.save_input_shape(inputs[0].shape());
        inputs[0].mean()
    }

    fn backward(&self, grad: &Tensor<T>) -> TensorResult<Vec<Tensor<T>>> {
        let shape = self.ctx.input_shape(0)?.clone();
        let n = shape.flat_size() as f64;
        Ok(vec![Tensor::full(shape, T::from_f64(grad.item()?.to_f64() / n))])
    }

    fn name(&self) -> &'static str {
        "Mean"
    }
}

/// Strided sub-view; backward scatters into a zero buffer of the input's shape
#[derive(Debug)]
pub struct SelectOp<T: Element> {
    ctx: OperationContext<T>,
    slices: Vec<Slice>,
}

impl<T: Element> SelectOp<T> {
    pub fn new(slices: &[Slice]) -> Self {
        Self {
            ctx: OperationContext::new(),
            slices: slices.to_vec(),
        }
    }
}

impl<T: Element> Operation<T> for SelectOp<T> {
    fn forward(&mut self, inputs: &[Tensor<T>]) -> TensorResult<Tensor<T>> {
        check_arity(self.name(), inputs, 1)?;
        let view = inputs[0].select(&self.slices)?;
        self.ctx.save_for_backward(&Tensor::zeros_like(&inputs[0]));
        Ok(view)
    }

    fn backward(&self, grad: &Tensor<T>) -> TensorResult<Vec<Tensor<T>>> {
        let buffer = self.ctx.saved_tensor(0)?.clone();
        buffer.select(&self.slices)?.add_(grad)?;
        Ok(vec![buffer])
    }

    fn name(&self) -> &'static str {
        "Select"
    }
}

/// Swap of two dimensions as a view
#[derive(Debug)]
pub struct TransposeOp {
    dim0: isize,
    dim1: isize,
}

impl TransposeOp {
    pub fn new(dim0: isize, dim1: isize) -> Self {
        Self { dim0, dim1 }
    }
}

impl<T: Element> Operation<T> for TransposeOp {
    fn forward(&mut self, inputs: &[Tensor<T>]) -> TensorResult<Tensor<T>> {
        check_arity("Transpose", inputs, 1)?;
        inputs[0].transpose(self.dim0, self.dim1)
    }

    fn backward(&self, grad: &Tensor<T>) -> TensorResult<Vec<Tensor<T>>> {
        Ok(vec![grad.transpose(self.dim0, self.dim1)?])
    }

    fn name(&self) -> &'static str {
        "Transpose"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(data: &[f64], shape: &[usize]) -> Tensor<f64> {
        Tensor::from_vec(data.to_vec(), shape).unwrap()
    }

    #[test]
    fn test_context_reports_missing_state() {
        let ctx = OperationContext::<f32>::new();
        assert!(matches!(ctx.saved_tensor(0), Err(TensorError::InvalidState(_))));
        assert!(ctx.input_shape(0).is_err());

        let op = MatmulOp::<f32>::new();
        assert!(op.backward(&Tensor::ones([1, 1])).is_err());
    }

    #[test]
    fn test_arity_is_checked() {
        let mut op = AddOp::<f32>::new();
        assert!(op.forward(&[Tensor::ones([2])]).is_err());
    }

    #[test]
    fn test_add_reduces_broadcast_grads() {
        let mut op = AddOp::new();
        let out = op
            .forward(&[Tensor::<f64>::zeros([1, 3]), Tensor::zeros([4, 1])])
            .unwrap();
        assert_eq!(out.shape(), &[4, 3]);

        let grads = op.backward(&Tensor::ones([4, 3])).unwrap();
        assert_eq!(grads[0].to_vec(), vec![4.0; 3]);
        assert_eq!(grads[1].to_vec(), vec![3.0; 4]);
        assert_eq!(grads[1].shape(), &[4, 1]);
    }

    #[test]
    fn test_raw_grads_without_reduction() {
        let mut op = AddOp::new().with_broadcast_reduction(false);
        op.forward(&[Tensor::<f64>::zeros([3]), Tensor::zeros([2, 3])]).unwrap();
        let grads = op.backward(&Tensor::ones([2, 3])).unwrap();
        assert_eq!(grads[0].shape(), &[2, 3]);
    }

    #[test]
    fn test_sub_negates_second_grad() {
        let mut op = SubOp::new();
        op.forward(&[Tensor::<i32>::zeros([2]), Tensor::zeros([2])]).unwrap();
        let grads = op.backward(&Tensor::ones([2])).unwrap();
        assert_eq!(grads[0].to_vec(), vec![1, 1]);
        assert_eq!(grads[1].to_vec(), vec![-1, -1]);
    }

    #[test]
    fn test_mul_product_rule() {
        let mut op = MulOp::new();
        op.forward(&[t(&[2.0, 3.0], &[2]), t(&[5.0, 7.0], &[2])]).unwrap();
        let grads = op.backward(&Tensor::ones([2])).unwrap();
        assert_eq!(grads[0].to_vec(), vec![5.0, 7.0]);
        assert_eq!(grads[1].to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_matmul_grads() {
        let mut op = MatmulOp::new();
        let a = t(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let b = t(&[1.0, 0.0, 0.0, 1.0, 1.0, 1.0], &[3, 2]);
        op.forward(&[a, b]).unwrap();

        let grads = op.backward(&Tensor::ones([2, 2])).unwrap();
        assert_eq!(grads[0].shape(), &[2, 3]);
        assert_eq!(grads[0].to_vec(), vec![1.0, 1.0, 2.0, 1.0, 1.0, 2.0]);
        assert_eq!(grads[1].to_vec(), vec![5.0, 5.0, 7.0, 7.0, 9.0, 9.0]);
    }

    #[test]
    fn test_matmul_vector_grads_keep_input_shape() {
        let mut op = MatmulOp::new();
        op.forward(&[t(&[1.0, 2.0], &[2]), t(&[1.0, 2.0, 3.0, 4.0], &[2, 2])]).unwrap();
        let grads = op.backward(&Tensor::ones([1, 2])).unwrap();
        assert_eq!(grads[0].shape(), &[2]);
        assert_eq!(grads[0].to_vec(), vec![3.0, 7.0]);
    }

    #[test]
    fn test_pow_and_sin_grads() {
        let mut pow = PowOp::new(3.0);
        let out = pow.forward(&[t(&[2.0], &[1])]).unwrap();
        assert_eq!(out.item().unwrap(), 8.0);
        assert_eq!(pow.backward(&Tensor::ones([1])).unwrap()[0].item().unwrap(), 12.0);

        let mut sin = SinOp::new();
        sin.forward(&[t(&[0.5], &[1])]).unwrap();
        let g = sin.backward(&t(&[2.0], &[1])).unwrap()[0].item().unwrap();
        assert!((g - 2.0 * 0.5f64.cos()).abs() < 1e-12);
    }

    #[test]
    fn test_integral_sin_fails_in_forward() {
        let mut sin = SinOp::new();
        assert!(matches!(
            sin.forward(&[Tensor::<i64>::ones([2])]),
            Err(TensorError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_sum_and_mean_grads() {
        let mut sum = SumOp::new();
        sum.forward(&[Tensor::<f64>::zeros([2, 2])]).unwrap();
        assert_eq!(sum.backward(&Tensor::scalar(3.0)).unwrap()[0].to_vec(), vec![3.0; 4]);

        let mut mean = MeanOp::new();
        mean.forward(&[Tensor::<f64>::zeros([2, 2])]).unwrap();
        assert_eq!(mean.backward(&Tensor::scalar(1.0)).unwrap()[0].to_vec(), vec![0.25; 4]);
    }

    #[test]
    fn test_select_scatters_into_fresh_buffer() {
        let mut op = SelectOp::new(&[Slice::range(1, 3)]);
        let view = op.forward(&[Tensor::<f64>::zeros([4, 2])]).unwrap();
        assert_eq!(view.shape(), &[2, 2]);

        let first = op.backward(&Tensor::ones([2, 2])).unwrap();
        let second = op.backward(&Tensor::ones([2, 2])).unwrap();
        let expected = vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0];
        assert_eq!(first[0].to_vec(), expected);
        assert_eq!(second[0].to_vec(), expected);
    }

    #[test]
    fn test_transpose_grad() {
        let mut op = TransposeOp::new(0, 1);
        let out = Operation::<f64>::forward(&mut op, &[Tensor::zeros([2, 3])]).unwrap();
        assert_eq!(out.shape(), &[3, 2]);
        let grads = Operation::<f64>::backward(&op, &t(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2])).unwrap();
        assert_eq!(grads[0].shape(), &[2, 3]);
        assert_eq!(grads[0].to_vec(), vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
    }
}
