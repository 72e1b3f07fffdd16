use crate::autograd::capture_state::CaptureState;
use crate::autograd::grad_function::{
    check_arity, check_capture_arity, check_op_arity, InputGrads, OpExprGradFunction,
};
use crate::autograd::rules::check_attr_names;
use crate::error::{ArityKind, OpGradError};
use crate::op::{AttrMap, OpExpr, OpType};
use crate::ops;
use crate::tensor::Tensor;

pub const RESHAPE: OpType = OpType::from_static("reshape");

const SHAPE_ATTR: &str = "shape";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReshapeCaptureState {
    pub requires_grad: bool,
    pub input_shape: Vec<usize>,
}

impl CaptureState for ReshapeCaptureState {}

/// Backward rule of `reshape`: the output gradient is reshaped back to the
/// input's shape. The optional target-shape attribute (`shape`) is checked at
/// `init` but not needed by the backward, which uses the captured input shape.
#[derive(Debug, Default)]
pub struct ReshapeGrad;

impl OpExprGradFunction for ReshapeGrad {
    type State = ReshapeCaptureState;

    fn init(&mut self, op: &OpExpr) -> Result<(), OpGradError> {
        check_op_arity(&RESHAPE, op, 1, 1)?;
        check_attr_names(&RESHAPE, op.attrs(), &[SHAPE_ATTR])?;
        match op.attrs().get(SHAPE_ATTR) {
            Some(value) if value.as_shape().is_none() => Err(OpGradError::InvalidAttrSchema {
                op_type: RESHAPE,
                attr: SHAPE_ATTR.to_string(),
                reason: format!("expected shape, got {}", value.type_name()),
            }),
            _ => Ok(()),
        }
    }

    fn capture(
        &self,
        state: &mut ReshapeCaptureState,
        inputs: &[Tensor],
        outputs: &[Tensor],
        _attrs: &AttrMap,
    ) -> Result<(), OpGradError> {
        check_capture_arity(&RESHAPE, inputs, outputs, 1, 1)?;
        state.requires_grad = inputs[0].requires_grad();
        if state.requires_grad {
            state.input_shape = inputs[0].shape();
        }
        Ok(())
    }

    fn apply(&self, state: &ReshapeCaptureState, out_grads: &[Tensor]) -> Result<InputGrads, OpGradError> {
        check_arity(&RESHAPE, ArityKind::OutputGrads, 1, out_grads.len())?;
        if !state.requires_grad {
            return Ok(vec![None]);
        }
        Ok(vec![Some(ops::reshape(&out_grads[0], &state.input_shape)?)])
    }
}
