use crate::autograd::capture_state::CaptureState;
use crate::autograd::grad_function::{
    check_arity, check_capture_arity, check_op_arity, InputGrads, OpExprGradFunction,
};
use crate::autograd::rules::check_attr_names;
use crate::device::StorageDevice;
use crate::error::{ArityKind, OpGradError};
use crate::op::{AttrMap, OpExpr, OpType};
use crate::ops;
use crate::scalar::Scalar;
use crate::tensor::Tensor;
use crate::types::DType;

pub const DEPEND: OpType = OpType::from_static("depend");

/// What the backward of `depend(input, depend_tensor)` needs.
///
/// Only metadata of the dependency tensor is kept, never its values: its
/// gradient is a zero fill, not a function of anything it held.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DependCaptureState {
    pub in_requires_grad: bool,
    pub depend_tensor_requires_grad: bool,
    /// Only filled in when the dependency tensor requires grad.
    pub depend_tensor_shape: Vec<usize>,
    pub depend_tensor_dtype: DType,
    pub depend_tensor_device: StorageDevice,
}

impl CaptureState for DependCaptureState {}

/// Backward rule of `depend`, whose output is `input` unchanged and whose second
/// input only orders execution.
///
/// * `input` receives the output gradient as is.
/// * `depend_tensor` receives zeros of its own shape, dtype and device.
#[derive(Debug, Default)]
pub struct DependGrad;

impl OpExprGradFunction for DependGrad {
    type State = DependCaptureState;

    fn init(&mut self, op: &OpExpr) -> Result<(), OpGradError> {
        check_op_arity(&DEPEND, op, 2, 1)?;
        check_attr_names(&DEPEND, op.attrs(), &[])
    }

    fn capture(
        &self,
        state: &mut DependCaptureState,
        inputs: &[Tensor],
        outputs: &[Tensor],
        _attrs: &AttrMap,
    ) -> Result<(), OpGradError> {
        check_capture_arity(&DEPEND, inputs, outputs, 2, 1)?;

        state.in_requires_grad = inputs[0].requires_grad();
        state.depend_tensor_requires_grad = inputs[1].requires_grad();
        if state.depend_tensor_requires_grad {
            let depend_tensor = &inputs[1];
            state.depend_tensor_shape = depend_tensor.shape();
            state.depend_tensor_dtype = depend_tensor.dtype();
            state.depend_tensor_device = depend_tensor.device();
        }
        Ok(())
    }

    fn apply(&self, state: &DependCaptureState, out_grads: &[Tensor]) -> Result<InputGrads, OpGradError> {
        check_arity(&DEPEND, ArityKind::OutputGrads, 1, out_grads.len())?;

        let mut in_grads: InputGrads = vec![None, None];
        if state.in_requires_grad {
            in_grads[0] = Some(out_grads[0].clone());
        }
        if state.depend_tensor_requires_grad {
            in_grads[1] = Some(ops::constant(
                &state.depend_tensor_shape,
                Scalar::Int(0),
                state.depend_tensor_dtype,
                state.depend_tensor_device,
            )?);
        }
        Ok(in_grads)
    }
}

#[cfg(test)]
#[path = "depend_test.rs"]
mod tests;
