use super::*;
use crate::autograd::capture_state::CaptureState;
use crate::autograd::grad_function::InputGrads;
use crate::autograd::rules::{DependGrad, DEPEND, IDENTITY};
use crate::op::{AttrMap, OpExpr};
use crate::tensor::Tensor;
use once_cell::sync::Lazy;

#[derive(Debug, Default)]
struct NoopState;

impl CaptureState for NoopState {}

/// Rule remembering whether `init` ran, to check instances are never shared.
#[derive(Debug, Default)]
struct InitFlagGrad {
    initialized: bool,
}

impl OpExprGradFunction for InitFlagGrad {
    type State = NoopState;

    fn init(&mut self, _op: &OpExpr) -> Result<(), OpGradError> {
        self.initialized = true;
        Ok(())
    }

    fn capture(
        &self,
        _state: &mut NoopState,
        _inputs: &[Tensor],
        _outputs: &[Tensor],
        _attrs: &AttrMap,
    ) -> Result<(), OpGradError> {
        Ok(())
    }

    fn apply(&self, _state: &NoopState, _out_grads: &[Tensor]) -> Result<InputGrads, OpGradError> {
        Ok(if self.initialized { vec![None] } else { vec![] })
    }
}

#[test]
fn test_lookup_unregistered_op() {
    let registry = GradFunctionRegistry::new();
    assert!(registry.is_empty());
    let op_type = OpType::from("frobnicate");
    match registry.lookup(&op_type) {
        Err(OpGradError::UnregisteredOp { op_type: reported }) => assert_eq!(reported, op_type),
        other => panic!("Expected UnregisteredOp, got {:?}", other),
    }
}

#[test]
fn test_duplicate_registration_keeps_first_rule() {
    let registry = GradFunctionRegistry::new();
    registry.register_rule::<DependGrad>(DEPEND).unwrap();

    let err = registry.register_rule::<InitFlagGrad>(DEPEND).unwrap_err();
    assert_eq!(err, OpGradError::DuplicateRegistration { op_type: DEPEND });
    assert_eq!(registry.len(), 1);

    let rule = registry.lookup(&DEPEND).unwrap();
    assert!(format!("{:?}", rule).contains("DependGrad"));
}

#[test]
fn test_lookup_returns_fresh_instances() {
    let registry = GradFunctionRegistry::new();
    registry.register_rule::<InitFlagGrad>("flag").unwrap();
    let op_type = OpType::from("flag");

    let mut first = registry.lookup(&op_type).unwrap();
    first.init(&OpExpr::new("flag", 0, 0)).unwrap();
    let second = registry.lookup(&op_type).unwrap();

    let state = first.capture(&[], &[], &AttrMap::new()).unwrap();
    assert_eq!(first.apply(state.as_ref(), &[]).unwrap().len(), 1);
    // The second instance never saw `init`.
    assert_eq!(second.apply(state.as_ref(), &[]).unwrap().len(), 0);
    assert_eq!(second.op_type(), &op_type);
}

#[test]
fn test_register_custom_factory() {
    let registry = GradFunctionRegistry::new();
    registry
        .register(
            OpType::new(String::from("custom")),
            Box::new(|| {
                Box::new(ErasedGradFunction::new(OpType::from("custom"), InitFlagGrad::default()))
                    as Box<dyn GradFunction>
            }),
        )
        .unwrap();
    assert!(registry.contains("custom"));
    assert!(!registry.contains("depend"));
}

#[test]
fn test_builtin_registry_contents() {
    let registry = GradFunctionRegistry::with_builtin_rules();
    assert!(registry.contains("depend"));
    assert!(registry.contains(IDENTITY.as_str()));
    let op_types = registry.op_types();
    let mut sorted = op_types.clone();
    sorted.sort();
    assert_eq!(op_types, sorted);
    assert!(format!("{:?}", registry).contains("depend"));
}

#[test]
fn test_global_registry_has_builtins() {
    assert!(is_registered("depend"));
    assert!(registered_op_types().contains(&DEPEND));
    let rule = lookup_grad_function(&DEPEND).unwrap();
    assert_eq!(rule.op_type(), &DEPEND);
    assert!(std::ptr::eq(global_registry(), global_registry()));
}

#[test]
fn test_global_registration_is_visible() {
    register_op_expr_grad_function::<InitFlagGrad>("registry_test_flag").unwrap();
    assert!(is_registered("registry_test_flag"));
    assert!(matches!(
        register_grad_function(
            "registry_test_flag",
            Box::new(|| {
                Box::new(ErasedGradFunction::new(OpType::from("x"), InitFlagGrad::default()))
                    as Box<dyn GradFunction>
            })
        ),
        Err(OpGradError::DuplicateRegistration { .. })
    ));
}

#[test]
fn test_frozen_registry_rejects_registration() {
    let registry = GradFunctionRegistry::with_builtin_rules();
    assert!(!registry.is_frozen());
    registry.freeze();
    registry.freeze();
    assert!(registry.is_frozen());

    let err = registry.register_rule::<InitFlagGrad>("late").unwrap_err();
    assert_eq!(err, OpGradError::RegistryFrozen { op_type: OpType::from("late") });
    assert_eq!(
        err.to_string(),
        "Gradient function registry is frozen; cannot register op 'late'"
    );
    assert!(!registry.contains("late"));

    // Already registered rules stay available.
    let rule = registry.lookup(&DEPEND).unwrap();
    assert_eq!(rule.op_type(), &DEPEND);
    assert!(format!("{:?}", registry).contains("frozen: true"));
}

static SELF_EXTENDING: Lazy<GradFunctionRegistry> = Lazy::new(|| {
    let registry = GradFunctionRegistry::new();
    registry
        .register(
            "self_extending",
            Box::new(|| {
                // Runs inside `lookup` and writes to the same registry.
                let _ = SELF_EXTENDING.register_rule::<InitFlagGrad>("registered_by_factory");
                Box::new(ErasedGradFunction::new(
                    OpType::from("self_extending"),
                    InitFlagGrad::default(),
                )) as Box<dyn GradFunction>
            }),
        )
        .unwrap();
    registry
});

#[test]
fn test_factory_may_use_its_registry() {
    let rule = SELF_EXTENDING.lookup(&OpType::from("self_extending")).unwrap();
    assert_eq!(rule.op_type().as_str(), "self_extending");
    assert!(SELF_EXTENDING.contains("registered_by_factory"));
    assert!(SELF_EXTENDING
        .lookup(&OpType::from("registered_by_factory"))
        .is_ok());
}
