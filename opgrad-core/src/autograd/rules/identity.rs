use crate::autograd::capture_state::CaptureState;
use crate::autograd::grad_function::{
    check_arity, check_capture_arity, check_op_arity, InputGrads, OpExprGradFunction,
};
use crate::autograd::rules::check_attr_names;
use crate::error::{ArityKind, OpGradError};
use crate::op::{AttrMap, OpExpr, OpType};
use crate::tensor::Tensor;

pub const IDENTITY: OpType = OpType::from_static("identity");

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IdentityCaptureState {
    pub requires_grad: bool,
}

impl CaptureState for IdentityCaptureState {}

/// Backward rule of `identity`: the output gradient is passed through unchanged.
#[derive(Debug, Default)]
pub struct IdentityGrad;

impl OpExprGradFunction for IdentityGrad {
    type State = IdentityCaptureState;

    fn init(&mut self, op: &OpExpr) -> Result<(), OpGradError> {
        check_op_arity(&IDENTITY, op, 1, 1)?;
        check_attr_names(&IDENTITY, op.attrs(), &[])
    }

    fn capture(
        &self,
        state: &mut IdentityCaptureState,
        inputs: &[Tensor],
        outputs: &[Tensor],
        _attrs: &AttrMap,
    ) -> Result<(), OpGradError> {
        check_capture_arity(&IDENTITY, inputs, outputs, 1, 1)?;
        state.requires_grad = inputs[0].requires_grad();
        Ok(())
    }

    fn apply(&self, state: &IdentityCaptureState, out_grads: &[Tensor]) -> Result<InputGrads, OpGradError> {
        check_arity(&IDENTITY, ArityKind::OutputGrads, 1, out_grads.len())?;
        Ok(vec![state.requires_grad.then(|| out_grads[0].clone())])
    }
}
