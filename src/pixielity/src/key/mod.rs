//! Typed identifiers for everything the container can resolve.
//!
//! A key names an *abstract*: an interface such as `dyn Logger`, a class such
//! as `ConsoleLogger`, or an arbitrary name attached to a target type. The
//! target type decides what [`Container::make`] hands back: resolving a key
//! whose target is `T` always yields an `Arc<T>`.
//!
//! [`Container::make`]: crate::container::Container::make

mod implementation;

use std::any::TypeId;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

use crate::container::Managed;
use crate::util::any::AsAny;
use crate::util::hash::DynHash;

pub(crate) use crate::key::implementation::KeyImpl;

/// A type-erased key, usable as a map key through `Box<dyn Key>`.
pub trait Key
where
    Self: Debug + Display + AsAny + DynHash + Send + Sync + 'static,
{
    /// The [`TypeId`] of the target type.
    fn target_type(&self) -> TypeId;

    /// The name of the target type, for diagnostics.
    fn target_name(&self) -> &'static str;

    fn dyn_clone(&self) -> Box<dyn Key>;
}

impl PartialEq for dyn Key {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other.as_any())
    }
}

impl Eq for dyn Key {}

impl Hash for dyn Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dyn_hash(state);
    }
}

impl Clone for Box<dyn Key> {
    fn clone(&self) -> Self {
        self.dyn_clone()
    }
}

impl<T: TypedKey> Key for T {
    fn target_type(&self) -> TypeId {
        TypeId::of::<T::Target>()
    }

    fn target_name(&self) -> &'static str {
        std::any::type_name::<T::Target>()
    }

    fn dyn_clone(&self) -> Box<dyn Key> {
        Box::new(*self)
    }
}

/// A statically typed key.
pub trait TypedKey: Key + Copy + Eq + Hash {
    /// The abstract type the key resolves to, behind an `Arc`.
    type Target: Managed + ?Sized;

    type Qualifier: TypedQualifier;

    fn qualifier(&self) -> Self::Qualifier;
}

/// Values that can tell apart several keys sharing the same target type.
pub trait TypedQualifier: Copy + Debug + Eq + Hash + Send + Sync + 'static {}

impl<T> TypedQualifier for T where T: Copy + Debug + Eq + Hash + Send + Sync + 'static {}

/// The key of an interface or class type itself.
pub fn of<T>() -> impl TypedKey<Target = T, Qualifier = ()>
where
    T: Managed + ?Sized,
{
    KeyImpl::new(())
}

/// A key distinguished by a string name, e.g. `named::<str>("app.name")`.
pub fn named<T>(name: &'static str) -> impl TypedKey<Target = T, Qualifier = &'static str>
where
    T: Managed + ?Sized,
{
    KeyImpl::new(name)
}

/// A key distinguished by an arbitrary qualifier value.
pub fn qualified<T, Q>(qualifier: Q) -> impl TypedKey<Target = T, Qualifier = Q>
where
    T: Managed + ?Sized,
    Q: TypedQualifier,
{
    KeyImpl::new(qualifier)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    trait Logger: Send + Sync {}

    #[test]
    fn boxed_keys_are_usable_as_map_keys() {
        let mut keys: HashSet<Box<dyn Key>> = HashSet::new();
        assert!(keys.insert(Box::new(of::<dyn Logger>())));
        assert!(keys.insert(Box::new(named::<dyn Logger>("file"))));
        assert!(keys.insert(Box::new(of::<String>())));
        assert!(!keys.insert(Box::new(of::<dyn Logger>())));

        assert!(keys.contains(&of::<dyn Logger>() as &dyn Key));
        assert!(keys.contains(&named::<dyn Logger>("file") as &dyn Key));
        assert!(!keys.contains(&named::<dyn Logger>("console") as &dyn Key));
    }

    #[test]
    fn keys_of_different_targets_are_distinct() {
        let logger: Box<dyn Key> = Box::new(named::<dyn Logger>("main"));
        let string: Box<dyn Key> = Box::new(named::<String>("main"));

        assert_ne!(&logger, &string);
        assert_eq!(logger.target_type(), TypeId::of::<dyn Logger>());
        assert_eq!(string.target_name(), std::any::type_name::<String>());
    }

    #[test]
    fn boxed_key_clone_preserves_identity() {
        let key: Box<dyn Key> = Box::new(qualified::<u32, _>(7u8));
        assert_eq!(&key.clone(), &key);
    }
}
