use crate::autograd::capture_state::CaptureState;
use crate::autograd::grad_function::{
    check_arity, check_capture_arity, check_op_arity, InputGrads, OpExprGradFunction,
};
use crate::autograd::rules::check_attr_names;
use crate::error::{ArityKind, OpGradError};
use crate::op::{AttrMap, OpExpr, OpType};
use crate::ops;
use crate::tensor::Tensor;
use crate::types::DType;

pub const CAST: OpType = OpType::from_static("cast");

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CastCaptureState {
    pub requires_grad: bool,
    pub input_dtype: DType,
}

impl CaptureState for CastCaptureState {}

/// Backward rule of `cast`: the output gradient is cast back to the input dtype.
#[derive(Debug, Default)]
pub struct CastGrad;

impl OpExprGradFunction for CastGrad {
    type State = CastCaptureState;

    fn init(&mut self, op: &OpExpr) -> Result<(), OpGradError> {
        check_op_arity(&CAST, op, 1, 1)?;
        check_attr_names(&CAST, op.attrs(), &["dtype"])?;
        match op.attrs().get("dtype") {
            Some(value) if value.as_dtype().is_none() => Err(OpGradError::InvalidAttrSchema {
                op_type: CAST,
                attr: "dtype".to_string(),
                reason: format!("expected dtype, got {}", value.type_name()),
            }),
            _ => Ok(()),
        }
    }

    fn capture(
        &self,
        state: &mut CastCaptureState,
        inputs: &[Tensor],
        outputs: &[Tensor],
        _attrs: &AttrMap,
    ) -> Result<(), OpGradError> {
        check_capture_arity(&CAST, inputs, outputs, 1, 1)?;
        state.requires_grad = inputs[0].requires_grad();
        state.input_dtype = inputs[0].dtype();
        Ok(())
    }

    fn apply(&self, state: &CastCaptureState, out_grads: &[Tensor]) -> Result<InputGrads, OpGradError> {
        check_arity(&CAST, ArityKind::OutputGrads, 1, out_grads.len())?;
        if !state.requires_grad {
            return Ok(vec![None]);
        }
        Ok(vec![Some(ops::cast(&out_grads[0], state.input_dtype)?)])
    }
}
