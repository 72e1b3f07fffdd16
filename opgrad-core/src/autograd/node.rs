//! Per-node driver of the Init / Capture / Apply protocol.

use crate::autograd::capture_state::{BoxedCaptureState, CaptureState};
use crate::autograd::grad_function::{GradFunction, InputGrads};
use crate::autograd::registry::GradFunctionRegistry;
use crate::error::OpGradError;
use crate::op::{AttrMap, OpExpr};
use crate::tensor::Tensor;
use std::fmt;

/// Where a [`GradNode`] is in its life.
///
/// `Uninitialized -> Initialized -> Captured -> Applied`, with `Released`
/// reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Uninitialized,
    Initialized,
    Captured,
    Applied,
    Released,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeState::Uninitialized => "uninitialized",
            NodeState::Initialized => "initialized",
            NodeState::Captured => "captured",
            NodeState::Applied => "applied",
            NodeState::Released => "released",
        };
        f.write_str(name)
    }
}

/// One op-expression node of the backward graph.
///
/// Owns its gradient function instance and, between `capture` and
/// `apply`/`release`, the captured state. The walker drives it; accumulation
/// of the returned input gradients is the walker's business.
#[derive(Debug)]
pub struct GradNode {
    op: OpExpr,
    grad_fn: Box<dyn GradFunction>,
    state: NodeState,
    captured: Option<BoxedCaptureState>,
    input_requires_grad: Vec<bool>,
}

impl GradNode {
    /// Wraps a freshly looked-up gradient function. Call [`GradNode::init`] next.
    pub fn new(op: OpExpr, grad_fn: Box<dyn GradFunction>) -> Self {
        GradNode {
            op,
            grad_fn,
            state: NodeState::Uninitialized,
            captured: None,
            input_requires_grad: Vec::new(),
        }
    }

    /// Looks up the rule for `op` and initializes it.
    pub fn from_registry(registry: &GradFunctionRegistry, op: OpExpr) -> Result<Self, OpGradError> {
        let grad_fn = registry.lookup(op.op_type())?;
        let mut node = GradNode::new(op, grad_fn);
        node.init()?;
        Ok(node)
    }

    /// Like [`GradNode::from_registry`], but an op without a rule is only an
    /// error when one of `inputs` requires grad. Returns `Ok(None)` for a
    /// non-differentiable op that nothing needs a gradient through.
    pub fn resolve(
        registry: &GradFunctionRegistry,
        op: &OpExpr,
        inputs: &[Tensor],
    ) -> Result<Option<Self>, OpGradError> {
        match GradNode::from_registry(registry, op.clone()) {
            Ok(node) => Ok(Some(node)),
            Err(OpGradError::UnregisteredOp { op_type }) => {
                if inputs.iter().any(Tensor::requires_grad) {
                    Err(OpGradError::GradientRequired { op_type })
                } else {
                    log::debug!("Op '{}' has no gradient function and needs none", op_type);
                    Ok(None)
                }
            }
            Err(e) => Err(e),
        }
    }

    fn invalid_state(&self, operation: &str) -> OpGradError {
        OpGradError::InvalidState {
            op_type: self.op.op_type().clone(),
            state: self.state.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn init(&mut self) -> Result<(), OpGradError> {
        if self.state != NodeState::Uninitialized {
            return Err(self.invalid_state("init"));
        }
        self.grad_fn.init(&self.op)?;
        self.state = NodeState::Initialized;
        Ok(())
    }

    /// Captures with the op expression's own attributes.
    pub fn capture(&mut self, inputs: &[Tensor], outputs: &[Tensor]) -> Result<(), OpGradError> {
        let attrs = self.op.attrs().clone();
        self.capture_with_attrs(inputs, outputs, &attrs)
    }

    /// Captures with per-invocation attributes. On error the node stays
    /// `Initialized` and holds no state.
    pub fn capture_with_attrs(
        &mut self,
        inputs: &[Tensor],
        outputs: &[Tensor],
        attrs: &AttrMap,
    ) -> Result<(), OpGradError> {
        if self.state != NodeState::Initialized {
            return Err(self.invalid_state("capture"));
        }
        let captured = self.grad_fn.capture(inputs, outputs, attrs)?;
        log::debug!(
            "Captured op '{}' with {} inputs, {} outputs",
            self.op.op_type(),
            inputs.len(),
            outputs.len()
        );
        self.input_requires_grad = inputs.iter().map(Tensor::requires_grad).collect();
        self.captured = Some(captured);
        self.state = NodeState::Captured;
        Ok(())
    }

    /// Whether a backward pass through this node can produce any gradient.
    pub fn needs_backward(&self) -> bool {
        self.state == NodeState::Captured && self.input_requires_grad.iter().any(|&rg| rg)
    }

    /// Runs the backward rule and drops the captured state.
    ///
    /// The result is checked against what `capture` saw: one slot per input,
    /// and no gradient for an input that did not require grad.
    pub fn apply(&mut self, out_grads: &[Tensor]) -> Result<InputGrads, OpGradError> {
        if self.state != NodeState::Captured {
            return Err(self.invalid_state("apply"));
        }
        let captured = self
            .captured
            .as_deref()
            .ok_or_else(|| self.invalid_state("apply"))?;
        let in_grads = self.grad_fn.apply(captured, out_grads)?;

        let op_type = self.op.op_type();
        if in_grads.len() != self.input_requires_grad.len() {
            return Err(OpGradError::InvalidGradientSlots {
                op_type: op_type.clone(),
                expected: self.input_requires_grad.len(),
                actual: in_grads.len(),
            });
        }
        for (index, (grad, &requires_grad)) in
            in_grads.iter().zip(&self.input_requires_grad).enumerate()
        {
            if grad.is_some() && !requires_grad {
                return Err(OpGradError::UnexpectedGradient {
                    op_type: op_type.clone(),
                    index,
                });
            }
            log::trace!(
                "{}: input {} gradient {}",
                op_type,
                index,
                if grad.is_some() { "present" } else { "absent" }
            );
        }

        log::debug!("Applied backward of op '{}'", op_type);
        self.captured = None;
        self.state = NodeState::Applied;
        Ok(in_grads)
    }

    /// Drops the captured state. Legal in every state.
    pub fn release(&mut self) {
        if self.needs_backward() {
            log::warn!(
                "Releasing node for op '{}' whose captured state still needed a backward pass",
                self.op.op_type()
            );
        } else if self.captured.is_some() {
            log::debug!("Released node for op '{}' without backward", self.op.op_type());
        }
        self.captured = None;
        self.state = NodeState::Released;
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn op(&self) -> &OpExpr {
        &self.op
    }

    pub fn grad_fn(&self) -> &dyn GradFunction {
        self.grad_fn.as_ref()
    }

    /// The captured state, if it is present and of type `S`.
    pub fn captured_state<S: CaptureState>(&self) -> Option<&S> {
        self.captured.as_deref()?.downcast_ref::<S>()
    }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod tests;
