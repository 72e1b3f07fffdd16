//! Op-type to gradient-function registry.
//!
//! Rules are registered as factories so that every lookup yields a fresh,
//! uninitialized instance: `init` may store per-op-expression configuration in
//! the rule, and two graph nodes must never share it.
//!
//! A process-wide registry with the built-in rules is available through
//! [`global_registry`] and the free functions of this module. Local registries
//! ([`GradFunctionRegistry::new`]) are independent of it.
//!
//! Registration belongs to start-up. Once a registry is frozen
//! ([`GradFunctionRegistry::freeze`], [`freeze_global_registry`]) further
//! registrations fail with `RegistryFrozen`, and lookups keep working. Factories
//! run outside the registry lock, so a factory may itself use the registry.

use crate::autograd::grad_function::{ErasedGradFunction, GradFunction, OpExprGradFunction};
use crate::autograd::rules::register_builtin_rules;
use crate::error::OpGradError;
use crate::op::OpType;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Factory producing a fresh gradient function instance.
pub type GradFunctionFactory = Box<dyn Fn() -> Box<dyn GradFunction> + Send + Sync>;

type SharedFactory = Arc<dyn Fn() -> Box<dyn GradFunction> + Send + Sync>;

/// Map from [`OpType`] to [`GradFunctionFactory`].
///
/// Registration is write-once per op type. Lookups take a read lock only, long
/// enough to clone the factory handle.
#[derive(Default)]
pub struct GradFunctionRegistry {
    factories: RwLock<HashMap<OpType, SharedFactory>>,
    frozen: AtomicBool,
}

impl GradFunctionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in rule.
    pub fn with_builtin_rules() -> Self {
        let registry = Self::new();
        if let Err(e) = register_builtin_rules(&registry) {
            // Cannot happen on a fresh registry unless two built-ins share an op type.
            log::error!("Failed to register built-in gradient functions: {}", e);
        }
        registry
    }

    fn read_factories(&self) -> RwLockReadGuard<'_, HashMap<OpType, SharedFactory>> {
        match self.factories.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Gradient function registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_factories(&self) -> RwLockWriteGuard<'_, HashMap<OpType, SharedFactory>> {
        match self.factories.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Gradient function registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Rejects every later registration. Idempotent.
    pub fn freeze(&self) {
        if !self.frozen.swap(true, Ordering::AcqRel) {
            log::debug!("Gradient function registry frozen with {} rules", self.len());
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Registers `factory` under `op_type`.
    ///
    /// Fails with `RegistryFrozen` after [`freeze`](Self::freeze), and with
    /// `DuplicateRegistration` if the op type already has a rule; the existing
    /// rule is kept.
    pub fn register(
        &self,
        op_type: impl Into<OpType>,
        factory: GradFunctionFactory,
    ) -> Result<(), OpGradError> {
        let op_type = op_type.into();
        let mut factories = self.write_factories();
        if self.is_frozen() {
            log::error!("Late gradient function registration for op '{}' after freeze", op_type);
            return Err(OpGradError::RegistryFrozen { op_type });
        }
        if factories.contains_key(&op_type) {
            log::error!("Duplicate gradient function registration for op '{}'", op_type);
            return Err(OpGradError::DuplicateRegistration { op_type });
        }
        log::debug!("Registered gradient function for op '{}'", op_type);
        factories.insert(op_type, Arc::from(factory));
        Ok(())
    }

    /// Registers a typed rule constructed through `Default`.
    pub fn register_rule<F>(&self, op_type: impl Into<OpType>) -> Result<(), OpGradError>
    where
        F: OpExprGradFunction + Default,
    {
        let op_type = op_type.into();
        let factory_op_type = op_type.clone();
        self.register(
            op_type,
            Box::new(move || {
                Box::new(ErasedGradFunction::new(factory_op_type.clone(), F::default()))
                    as Box<dyn GradFunction>
            }),
        )
    }

    /// Fresh instance of the rule registered for `op_type`.
    pub fn lookup(&self, op_type: &OpType) -> Result<Box<dyn GradFunction>, OpGradError> {
        let factory = self.read_factories().get(op_type).cloned();
        match factory {
            Some(factory) => {
                log::debug!("Looked up gradient function for op '{}'", op_type);
                Ok(factory())
            }
            None => {
                log::debug!("No gradient function registered for op '{}'", op_type);
                Err(OpGradError::UnregisteredOp {
                    op_type: op_type.clone(),
                })
            }
        }
    }

    pub fn contains(&self, op_type: &str) -> bool {
        self.read_factories().contains_key(op_type)
    }

    /// Registered op types, sorted.
    pub fn op_types(&self) -> Vec<OpType> {
        let mut op_types: Vec<OpType> = self.read_factories().keys().cloned().collect();
        op_types.sort();
        op_types
    }

    pub fn len(&self) -> usize {
        self.read_factories().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_factories().is_empty()
    }
}

impl fmt::Debug for GradFunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradFunctionRegistry")
            .field("op_types", &self.op_types())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

static GLOBAL_REGISTRY: OnceCell<GradFunctionRegistry> = OnceCell::new();

/// Process-wide registry, created with the built-in rules on first use.
pub fn global_registry() -> &'static GradFunctionRegistry {
    GLOBAL_REGISTRY.get_or_init(|| {
        log::debug!("Initializing global gradient function registry");
        GradFunctionRegistry::with_builtin_rules()
    })
}

/// Registers `factory` in the global registry.
pub fn register_grad_function(
    op_type: impl Into<OpType>,
    factory: GradFunctionFactory,
) -> Result<(), OpGradError> {
    global_registry().register(op_type, factory)
}

/// Registers a typed rule in the global registry.
pub fn register_op_expr_grad_function<F>(op_type: impl Into<OpType>) -> Result<(), OpGradError>
where
    F: OpExprGradFunction + Default,
{
    global_registry().register_rule::<F>(op_type)
}

/// Freezes the global registry; later registrations fail with `RegistryFrozen`.
pub fn freeze_global_registry() {
    global_registry().freeze()
}

/// Fresh instance of the globally registered rule for `op_type`.
pub fn lookup_grad_function(op_type: &OpType) -> Result<Box<dyn GradFunction>, OpGradError> {
    global_registry().lookup(op_type)
}

pub fn is_registered(op_type: &str) -> bool {
    global_registry().contains(op_type)
}

pub fn registered_op_types() -> Vec<OpType> {
    global_registry().op_types()
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
