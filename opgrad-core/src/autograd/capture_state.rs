use std::any::Any;
use std::fmt::Debug;

/// Marker for the per-op record that `capture` fills and `apply` reads.
///
/// A state is plain data: flags, shapes, dtypes and, only when the backward math
/// needs values, saved tensors. It is created with `Default` right before
/// capture, so a rule that fails its arity check leaves it at the default.
pub trait CaptureState: Default + Debug + Send + Sync + 'static {}

/// Object-safe view of a [`CaptureState`], used once the concrete state type
/// has been erased behind a graph node.
pub trait AnyCaptureState: Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<S: CaptureState> AnyCaptureState for S {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Type-erased capture state owned by a graph node.
pub type BoxedCaptureState = Box<dyn AnyCaptureState>;

impl<'a> dyn AnyCaptureState + 'a {
    /// Recovers the concrete state, or `None` if it belongs to another op type.
    pub fn downcast_ref<S: CaptureState>(&self) -> Option<&S> {
        self.as_any().downcast_ref::<S>()
    }
}
