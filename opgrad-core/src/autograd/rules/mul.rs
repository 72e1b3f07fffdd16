use crate::autograd::capture_state::CaptureState;
use crate::autograd::grad_function::{
    check_arity, check_capture_arity, check_op_arity, InputGrads, OpExprGradFunction,
};
use crate::autograd::rules::check_attr_names;
use crate::error::{ArityKind, OpGradError};
use crate::op::{AttrMap, OpExpr, OpType};
use crate::ops;
use crate::tensor::Tensor;

pub const MUL: OpType = OpType::from_static("mul");

/// Saved operands of `z = x * y`.
///
/// Each operand is saved only when the *other* one needs its gradient:
/// `dx = dy * y` needs `y`, `dy = dz * x` needs `x`.
#[derive(Debug, Default, Clone)]
pub struct MulCaptureState {
    pub x_requires_grad: bool,
    pub y_requires_grad: bool,
    pub x: Option<Tensor>,
    pub y: Option<Tensor>,
}

impl CaptureState for MulCaptureState {}

/// Backward rule of element-wise `mul`, the product rule.
#[derive(Debug, Default)]
pub struct MulGrad;

impl OpExprGradFunction for MulGrad {
    type State = MulCaptureState;

    fn init(&mut self, op: &OpExpr) -> Result<(), OpGradError> {
        check_op_arity(&MUL, op, 2, 1)?;
        check_attr_names(&MUL, op.attrs(), &[])
    }

    fn capture(
        &self,
        state: &mut MulCaptureState,
        inputs: &[Tensor],
        outputs: &[Tensor],
        _attrs: &AttrMap,
    ) -> Result<(), OpGradError> {
        check_capture_arity(&MUL, inputs, outputs, 2, 1)?;
        state.x_requires_grad = inputs[0].requires_grad();
        state.y_requires_grad = inputs[1].requires_grad();
        if state.x_requires_grad {
            state.y = Some(inputs[1].detach());
        }
        if state.y_requires_grad {
            state.x = Some(inputs[0].detach());
        }
        Ok(())
    }

    fn apply(&self, state: &MulCaptureState, out_grads: &[Tensor]) -> Result<InputGrads, OpGradError> {
        check_arity(&MUL, ArityKind::OutputGrads, 1, out_grads.len())?;
        let dz = &out_grads[0];
        let dx = match (&state.y, state.x_requires_grad) {
            (Some(y), true) => Some(ops::mul(dz, y)?),
            _ => None,
        };
        let dy = match (&state.x, state.y_requires_grad) {
            (Some(x), true) => Some(ops::mul(dz, x)?),
            _ => None,
        };
        log::trace!(
            "mul: dx {}, dy {}",
            if dx.is_some() { "computed" } else { "skipped" },
            if dy.is_some() { "computed" } else { "skipped" }
        );
        Ok(vec![dx, dy])
    }
}
