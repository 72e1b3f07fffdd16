use crate::autograd::capture_state::{AnyCaptureState, BoxedCaptureState, CaptureState};
use crate::error::{ArityKind, OpGradError};
use crate::op::{AttrMap, OpExpr, OpType};
use crate::tensor::Tensor;
use std::fmt::Debug;

/// Input gradients returned by `apply`: one slot per forward input, in input
/// order. `None` means "no gradient needed for this input".
pub type InputGrads = Vec<Option<Tensor>>;

/// Backward rule for one op type, parameterized by its capture-state type.
///
/// The three calls follow the life of one op-expression node:
///
/// 1. `init` once, when the node is built. Validates the op expression's arity
///    and attribute schema, before any tensor is computed.
/// 2. `capture` once per forward invocation. Checks the exact input/output
///    counts *before* writing anything, then records the minimum the backward
///    needs. Must not keep `inputs`/`outputs` handles beyond what it explicitly
///    saves into `state`.
/// 3. `apply` at most once per backward invocation. Pure function of
///    `(state, out_grads)`: one slot per captured input, `None` for inputs that
///    did not require grad.
///
/// Implementors are `Send + Sync` so that independent graph branches can run
/// their rules on different threads; no rule holds shared mutable state.
pub trait OpExprGradFunction: Debug + Send + Sync + 'static {
    type State: CaptureState;

    fn init(&mut self, op: &OpExpr) -> Result<(), OpGradError>;

    fn capture(
        &self,
        state: &mut Self::State,
        inputs: &[Tensor],
        outputs: &[Tensor],
        attrs: &AttrMap,
    ) -> Result<(), OpGradError>;

    fn apply(&self, state: &Self::State, out_grads: &[Tensor]) -> Result<InputGrads, OpGradError>;
}

/// Object-safe form of [`OpExprGradFunction`] stored in the registry and in graph nodes.
pub trait GradFunction: Debug + Send + Sync {
    /// Op type this instance was looked up under.
    fn op_type(&self) -> &OpType;

    fn init(&mut self, op: &OpExpr) -> Result<(), OpGradError>;

    /// Runs capture into a fresh state. The state is only returned if capture
    /// succeeded, so a failed capture never leaves partially written state behind.
    fn capture(
        &self,
        inputs: &[Tensor],
        outputs: &[Tensor],
        attrs: &AttrMap,
    ) -> Result<BoxedCaptureState, OpGradError>;

    /// Fails with `StateTypeMismatch` if `state` was captured by another rule type.
    fn apply(
        &self,
        state: &dyn AnyCaptureState,
        out_grads: &[Tensor],
    ) -> Result<InputGrads, OpGradError>;
}

/// Adapter from a typed rule to [`GradFunction`].
#[derive(Debug)]
pub struct ErasedGradFunction<F: OpExprGradFunction> {
    op_type: OpType,
    inner: F,
}

impl<F: OpExprGradFunction> ErasedGradFunction<F> {
    pub fn new(op_type: OpType, inner: F) -> Self {
        ErasedGradFunction { op_type, inner }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: OpExprGradFunction> GradFunction for ErasedGradFunction<F> {
    fn op_type(&self) -> &OpType {
        &self.op_type
    }

    fn init(&mut self, op: &OpExpr) -> Result<(), OpGradError> {
        self.inner.init(op)
    }

    fn capture(
        &self,
        inputs: &[Tensor],
        outputs: &[Tensor],
        attrs: &AttrMap,
    ) -> Result<BoxedCaptureState, OpGradError> {
        let mut state = F::State::default();
        self.inner.capture(&mut state, inputs, outputs, attrs)?;
        log::trace!("{}: captured {:?}", self.op_type, state);
        Ok(Box::new(state))
    }

    fn apply(
        &self,
        state: &dyn AnyCaptureState,
        out_grads: &[Tensor],
    ) -> Result<InputGrads, OpGradError> {
        let state = state
            .downcast_ref::<F::State>()
            .ok_or_else(|| OpGradError::StateTypeMismatch {
                op_type: self.op_type.clone(),
            })?;
        self.inner.apply(state, out_grads)
    }
}

/// Fails with `ArityMismatch` unless `actual == expected`.
pub fn check_arity(
    op_type: &OpType,
    kind: ArityKind,
    expected: usize,
    actual: usize,
) -> Result<(), OpGradError> {
    if expected != actual {
        return Err(OpGradError::ArityMismatch {
            op_type: op_type.clone(),
            kind,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Checks the declared arity of an op expression against a rule's contract.
pub fn check_op_arity(
    op_type: &OpType,
    op: &OpExpr,
    num_inputs: usize,
    num_outputs: usize,
) -> Result<(), OpGradError> {
    check_arity(op_type, ArityKind::Inputs, num_inputs, op.num_inputs())?;
    check_arity(op_type, ArityKind::Outputs, num_outputs, op.num_outputs())
}

/// Checks the input and output counts seen by `capture`.
pub fn check_capture_arity(
    op_type: &OpType,
    inputs: &[Tensor],
    outputs: &[Tensor],
    num_inputs: usize,
    num_outputs: usize,
) -> Result<(), OpGradError> {
    check_arity(op_type, ArityKind::Inputs, num_inputs, inputs.len())?;
    check_arity(op_type, ArityKind::Outputs, num_outputs, outputs.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct CountState {
        seen: usize,
    }

    impl CaptureState for CountState {}

    #[derive(Debug, Default)]
    struct CountGrad;

    impl OpExprGradFunction for CountGrad {
        type State = CountState;

        fn init(&mut self, _op: &OpExpr) -> Result<(), OpGradError> {
            Ok(())
        }

        fn capture(
            &self,
            state: &mut CountState,
            inputs: &[Tensor],
            _outputs: &[Tensor],
            _attrs: &AttrMap,
        ) -> Result<(), OpGradError> {
            state.seen = inputs.len();
            Ok(())
        }

        fn apply(&self, state: &CountState, _out_grads: &[Tensor]) -> Result<InputGrads, OpGradError> {
            Ok(vec![None; state.seen])
        }
    }

    #[derive(Debug, Default)]
    struct OtherState;

    impl CaptureState for OtherState {}

    #[test]
    fn test_erased_round_trip_keeps_state() {
        let rule = ErasedGradFunction::new(OpType::from("count"), CountGrad);
        let x = crate::tensor::ones(&[1]).unwrap();
        let state = rule.capture(&[x.clone(), x], &[], &AttrMap::new()).unwrap();
        assert_eq!(state.downcast_ref::<CountState>(), Some(&CountState { seen: 2 }));
        assert_eq!(rule.apply(state.as_ref(), &[]).unwrap().len(), 2);
    }

    #[test]
    fn test_foreign_state_is_rejected() {
        let rule = ErasedGradFunction::new(OpType::from("count"), CountGrad);
        let foreign: BoxedCaptureState = Box::new(OtherState);
        match rule.apply(foreign.as_ref(), &[]) {
            Err(OpGradError::StateTypeMismatch { op_type }) => assert_eq!(op_type.as_str(), "count"),
            other => panic!("Expected StateTypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_check_arity_reports_kind() {
        let op_type = OpType::from("depend");
        let err = check_arity(&op_type, ArityKind::OutputGrads, 1, 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Arity mismatch for op 'depend': expected 1 output gradients, got 3"
        );
    }
}
