use std::any::{self, TypeId};
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::Managed;
use crate::key::{TypedKey, TypedQualifier};

pub struct KeyImpl<T, Q>
where
    T: Managed + ?Sized,
    Q: TypedQualifier,
{
    qualifier: Q,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T, Q> KeyImpl<T, Q>
where
    T: Managed + ?Sized,
    Q: TypedQualifier,
{
    pub fn new(qualifier: Q) -> Self {
        Self {
            qualifier,
            _marker: PhantomData,
        }
    }
}

impl<T, Q> Clone for KeyImpl<T, Q>
where
    T: Managed + ?Sized,
    Q: TypedQualifier,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, Q> Copy for KeyImpl<T, Q>
where
    T: Managed + ?Sized,
    Q: TypedQualifier,
{
}

impl<T, Q> Debug for KeyImpl<T, Q>
where
    T: Managed + ?Sized,
    Q: TypedQualifier,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

impl<T, Q> Display for KeyImpl<T, Q>
where
    T: Managed + ?Sized,
    Q: TypedQualifier,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if TypeId::of::<Q>() == TypeId::of::<()>() {
            write!(f, "[{}]", any::type_name::<T>())
        } else {
            write!(f, "[{}@{:?}]", any::type_name::<T>(), self.qualifier)
        }
    }
}

impl<T, Q> PartialEq for KeyImpl<T, Q>
where
    T: Managed + ?Sized,
    Q: TypedQualifier,
{
    fn eq(&self, other: &Self) -> bool {
        self.qualifier.eq(&other.qualifier)
    }
}

impl<T, Q> Eq for KeyImpl<T, Q>
where
    T: Managed + ?Sized,
    Q: TypedQualifier,
{
}

impl<T, Q> Hash for KeyImpl<T, Q>
where
    T: Managed + ?Sized,
    Q: TypedQualifier,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualifier.hash(state);
    }
}

impl<T, Q> TypedKey for KeyImpl<T, Q>
where
    T: Managed + ?Sized,
    Q: TypedQualifier,
{
    type Target = T;

    type Qualifier = Q;

    fn qualifier(&self) -> Self::Qualifier {
        self.qualifier
    }
}
