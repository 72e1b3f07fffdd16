use crate::autograd::capture_state::CaptureState;
use crate::autograd::grad_function::{
    check_arity, check_capture_arity, check_op_arity, InputGrads, OpExprGradFunction,
};
use crate::autograd::rules::check_attr_names;
use crate::error::{ArityKind, OpGradError};
use crate::op::{AttrMap, OpExpr, OpType};
use crate::ops;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

pub const SCALAR_MUL: OpType = OpType::from_static("scalar_mul");

const SCALAR_ATTR: &str = "scalar";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScalarMulCaptureState {
    pub requires_grad: bool,
    /// `None` when the input does not require grad.
    pub scalar: Option<Scalar>,
}

impl CaptureState for ScalarMulCaptureState {}

/// Backward rule of `y = x * scalar`: `dx = dy * scalar`.
///
/// The factor comes from the `scalar` attribute, which must be an int or a
/// float. `init` records the op expression's value; `capture` prefers the
/// per-invocation attributes when they carry one.
#[derive(Debug, Default)]
pub struct ScalarMulGrad {
    scalar: Option<Scalar>,
}

fn scalar_attr(attrs: &AttrMap) -> Result<Option<Scalar>, OpGradError> {
    let Some(value) = attrs.get(SCALAR_ATTR) else {
        return Ok(None);
    };
    value
        .as_scalar()
        .map(Some)
        .ok_or_else(|| OpGradError::InvalidAttrSchema {
            op_type: SCALAR_MUL,
            attr: SCALAR_ATTR.to_string(),
            reason: format!("expected int or float, got {}", value.type_name()),
        })
}

impl OpExprGradFunction for ScalarMulGrad {
    type State = ScalarMulCaptureState;

    fn init(&mut self, op: &OpExpr) -> Result<(), OpGradError> {
        check_op_arity(&SCALAR_MUL, op, 1, 1)?;
        check_attr_names(&SCALAR_MUL, op.attrs(), &[SCALAR_ATTR])?;
        let scalar = scalar_attr(op.attrs())?.ok_or_else(|| OpGradError::InvalidAttrSchema {
            op_type: SCALAR_MUL,
            attr: SCALAR_ATTR.to_string(),
            reason: "missing required attribute".to_string(),
        })?;
        self.scalar = Some(scalar);
        Ok(())
    }

    fn capture(
        &self,
        state: &mut ScalarMulCaptureState,
        inputs: &[Tensor],
        outputs: &[Tensor],
        attrs: &AttrMap,
    ) -> Result<(), OpGradError> {
        check_capture_arity(&SCALAR_MUL, inputs, outputs, 1, 1)?;
        let requires_grad = inputs[0].requires_grad();
        if !requires_grad {
            state.requires_grad = false;
            return Ok(());
        }
        let scalar = match scalar_attr(attrs)? {
            Some(scalar) => scalar,
            None => self.scalar.ok_or_else(|| OpGradError::InvalidState {
                op_type: SCALAR_MUL,
                state: "uninitialized".to_string(),
                operation: "capture".to_string(),
            })?,
        };
        state.requires_grad = true;
        state.scalar = Some(scalar);
        Ok(())
    }

    fn apply(&self, state: &ScalarMulCaptureState, out_grads: &[Tensor]) -> Result<InputGrads, OpGradError> {
        check_arity(&SCALAR_MUL, ArityKind::OutputGrads, 1, out_grads.len())?;
        match (state.requires_grad, state.scalar) {
            (true, Some(scalar)) => Ok(vec![Some(ops::mul_scalar(&out_grads[0], scalar)?)]),
            _ => Ok(vec![None]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::AttrValue;
    use crate::utils::testing::{check_tensor_near, create_test_tensor, create_test_tensor_with_grad};

    fn op_with(attrs: AttrMap) -> OpExpr {
        OpExpr::new(SCALAR_MUL, 1, 1).with_attrs(attrs)
    }

    #[test]
    fn test_init_requires_numeric_scalar() {
        let err = ScalarMulGrad::default().init(&op_with(AttrMap::new())).unwrap_err();
        assert!(matches!(err, OpGradError::InvalidAttrSchema { ref reason, .. } if reason == "missing required attribute"));

        let attrs: AttrMap = [("scalar", AttrValue::Bool(true))].into_iter().collect();
        let err = ScalarMulGrad::default().init(&op_with(attrs)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid attribute 'scalar' for op 'scalar_mul': expected int or float, got bool"
        );

        let attrs: AttrMap = [("scalar", AttrValue::Int(3))].into_iter().collect();
        let mut rule = ScalarMulGrad::default();
        rule.init(&op_with(attrs)).unwrap();
        assert_eq!(rule.scalar, Some(Scalar::Int(3)));
    }

    #[test]
    fn test_capture_prefers_invocation_attrs() {
        let attrs: AttrMap = [("scalar", AttrValue::Float(2.0))].into_iter().collect();
        let mut rule = ScalarMulGrad::default();
        rule.init(&op_with(attrs)).unwrap();

        let x = create_test_tensor_with_grad(vec![1.0, -1.0], vec![2]);
        let y = ops::mul_scalar(&x, Scalar::Float(2.0)).unwrap();

        let mut state = ScalarMulCaptureState::default();
        rule.capture(&mut state, &[x.clone()], &[y.clone()], &AttrMap::new())
            .unwrap();
        assert_eq!(state.scalar, Some(Scalar::Float(2.0)));

        let invocation: AttrMap = [("scalar", AttrValue::Float(-0.5))].into_iter().collect();
        let mut state = ScalarMulCaptureState::default();
        rule.capture(&mut state, &[x], &[y], &invocation).unwrap();
        assert_eq!(state.scalar, Some(Scalar::Float(-0.5)));

        let dy = create_test_tensor(vec![4.0, 8.0], vec![2]);
        let grads = rule.apply(&state, &[dy]).unwrap();
        check_tensor_near(grads[0].as_ref().unwrap(), &[2], &[-2.0, -4.0], 1e-6);
    }

    #[test]
    fn test_integer_grad_overflow_is_error() {
        let state = ScalarMulCaptureState {
            requires_grad: true,
            scalar: Some(Scalar::Int(2)),
        };
        let dy = Tensor::new_i64(vec![i64::MAX], vec![1]).unwrap();
        assert!(matches!(
            ScalarMulGrad::default().apply(&state, &[dy]),
            Err(OpGradError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_no_grad_input_saves_nothing() {
        let attrs: AttrMap = [("scalar", AttrValue::Int(5))].into_iter().collect();
        let mut rule = ScalarMulGrad::default();
        rule.init(&op_with(attrs)).unwrap();

        let x = create_test_tensor(vec![1.0], vec![1]);
        let mut state = ScalarMulCaptureState::default();
        rule.capture(&mut state, &[x.clone()], &[x.clone()], &AttrMap::new())
            .unwrap();
        assert_eq!(state, ScalarMulCaptureState::default());
        assert!(rule.apply(&state, &[x]).unwrap()[0].is_none());
    }
}
