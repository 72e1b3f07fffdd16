//! Built-in backward rules, one module per forward primitive.
//!
//! Each rule is a unit struct implementing [`OpExprGradFunction`](crate::autograd::OpExprGradFunction)
//! with its own capture-state type. [`register_builtin_rules`] installs all of them
//! under their op-type constants.

pub mod cast;
pub mod depend;
pub mod identity;
pub mod mul;
pub mod reshape;
pub mod scalar_mul;

pub use cast::{CastCaptureState, CastGrad, CAST};
pub use depend::{DependCaptureState, DependGrad, DEPEND};
pub use identity::{IdentityCaptureState, IdentityGrad, IDENTITY};
pub use mul::{MulCaptureState, MulGrad, MUL};
pub use reshape::{ReshapeCaptureState, ReshapeGrad, RESHAPE};
pub use scalar_mul::{ScalarMulCaptureState, ScalarMulGrad, SCALAR_MUL};

use crate::autograd::registry::GradFunctionRegistry;
use crate::error::OpGradError;
use crate::op::{AttrMap, OpType};

/// Registers every built-in rule into `registry`.
///
/// Fails on the first op type that is already present; rules registered before
/// that point stay registered.
pub fn register_builtin_rules(registry: &GradFunctionRegistry) -> Result<(), OpGradError> {
    registry.register_rule::<DependGrad>(DEPEND)?;
    registry.register_rule::<IdentityGrad>(IDENTITY)?;
    registry.register_rule::<ReshapeGrad>(RESHAPE)?;
    registry.register_rule::<CastGrad>(CAST)?;
    registry.register_rule::<ScalarMulGrad>(SCALAR_MUL)?;
    registry.register_rule::<MulGrad>(MUL)?;
    Ok(())
}

/// Rejects any attribute whose name is not in `allowed`.
pub(crate) fn check_attr_names(
    op_type: &OpType,
    attrs: &AttrMap,
    allowed: &[&str],
) -> Result<(), OpGradError> {
    match attrs.iter().find(|(name, _)| !allowed.contains(name)) {
        Some((name, _)) => Err(OpGradError::InvalidAttrSchema {
            op_type: op_type.clone(),
            attr: name.to_string(),
            reason: "unexpected attribute".to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::AttrValue;

    #[test]
    fn test_check_attr_names() {
        let attrs: AttrMap = [("scalar", AttrValue::Float(1.0))].into_iter().collect();
        assert!(check_attr_names(&SCALAR_MUL, &attrs, &["scalar"]).is_ok());
        assert!(check_attr_names(&DEPEND, &AttrMap::new(), &[]).is_ok());

        let err = check_attr_names(&DEPEND, &attrs, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid attribute 'scalar' for op 'depend': unexpected attribute"
        );
    }

    #[test]
    fn test_builtin_rules_register_once() {
        let registry = GradFunctionRegistry::new();
        register_builtin_rules(&registry).unwrap();
        let names: Vec<String> = registry.op_types().iter().map(|t| t.to_string()).collect();
        assert_eq!(
            names,
            vec!["cast", "depend", "identity", "mul", "reshape", "scalar_mul"]
        );

        assert_eq!(
            register_builtin_rules(&registry),
            Err(OpGradError::DuplicateRegistration { op_type: DEPEND })
        );
        assert_eq!(registry.len(), 6);
    }
}
