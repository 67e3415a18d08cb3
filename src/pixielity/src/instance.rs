use std::any::{self, Any};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::Managed;

/// A resolved object with its type erased.
///
/// An [`Instance`] always wraps an `Arc<T>`, where `T` is the target type of
/// the key it was resolved for. Cloning an [`Instance`] never clones the
/// object: every clone hands out the same allocation, which is what makes
/// cached singletons identity-stable.
#[derive(Clone)]
pub struct Instance {
    object: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    pub fn new<T>(object: Arc<T>) -> Self
    where
        T: Managed + ?Sized,
    {
        Self {
            object: Arc::new(object),
            type_name: any::type_name::<T>(),
        }
    }

    /// Name of the wrapped object's type, as seen by the container.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T>(&self) -> bool
    where
        T: Managed + ?Sized,
    {
        self.object.is::<Arc<T>>()
    }

    /// Returns a new handle to the wrapped object if it is an `Arc<T>`.
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: Managed + ?Sized,
    {
        self.object.downcast_ref::<Arc<T>>().map(Arc::clone)
    }

    /// Returns true if both instances are handles of the same resolution.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
