mod context;
mod proxy;

use std::any;
use std::sync::Arc;

use crate::container::ContainerError;
use crate::instance::Instance;
use crate::key::{Key, TypedKey};

pub use context::{ResolutionContext, ResolutionTrace};
pub(crate) use proxy::ContextForwardingInjectorProxy;

/// The view of a container handed to factories.
///
/// A factory receives the container it is being resolved by as a
/// `&dyn Injector`. Resolving through it keeps track of the current
/// resolution path, so that a factory depending on its own abstract is
/// reported as [`ContainerError::CyclicDependency`].
#[cfg_attr(test, mockall::automock)]
pub trait Injector: Send + Sync {
    fn dyn_make(&self, key: &dyn Key) -> Result<Instance, ContainerError>;

    fn dyn_make_dependency<'a>(
        &self,
        key: &dyn Key,
        context: &'a ResolutionContext<'a>,
    ) -> Result<Instance, ContainerError>;

    fn dyn_has(&self, key: &dyn Key) -> bool;
}

pub trait TypedInjector: Injector {
    /// Resolves `key`, building it when nothing is bound. See
    /// [`Container::make`](crate::container::Container::make).
    fn make<K>(&self, key: K) -> Result<Arc<K::Target>, ContainerError>
    where
        K: TypedKey,
    {
        let instance = self.dyn_make(&key)?;
        downcast_instance(&key, &instance)
    }

    fn has<K>(&self, key: K) -> bool
    where
        K: TypedKey,
    {
        self.dyn_has(&key)
    }

    /// Resolves `key` only if it is bound or cached.
    fn get<K>(&self, key: K) -> Result<Arc<K::Target>, ContainerError>
    where
        K: TypedKey,
    {
        if self.dyn_has(&key) {
            self.make(key)
        } else {
            Err(ContainerError::NotFound {
                key: key.dyn_clone(),
            })
        }
    }

    fn upcast_dyn(&self) -> &dyn Injector;
}

impl<T> TypedInjector for T
where
    T: Injector,
{
    fn upcast_dyn(&self) -> &dyn Injector {
        self
    }
}

impl TypedInjector for dyn Injector + '_ {
    fn upcast_dyn(&self) -> &dyn Injector {
        self
    }
}

pub(crate) fn downcast_instance<K>(
    key: &K,
    instance: &Instance,
) -> Result<Arc<K::Target>, ContainerError>
where
    K: TypedKey,
{
    instance
        .downcast::<K::Target>()
        .ok_or_else(|| ContainerError::TypeMismatch {
            key: key.dyn_clone(),
            expected: any::type_name::<K::Target>(),
            found: instance.type_name(),
        })
}

#[cfg(test)]
mod tests {
    use crate::key;

    use super::*;

    #[test]
    fn typed_injector_make_succeeds() {
        let mut injector = MockInjector::new();
        injector
            .expect_dyn_make()
            .returning(|_| Ok(Instance::new(Arc::new(8080u16))));

        let port = injector.make(key::named::<u16>("port")).unwrap();
        assert_eq!(*port, 8080);
    }

    #[test]
    fn typed_injector_make_fails_when_instance_has_another_type() {
        let mut injector = MockInjector::new();
        injector
            .expect_dyn_make()
            .returning(|_| Ok(Instance::new(Arc::new(String::from("8080")))));

        assert!(matches!(
            injector.make(key::named::<u16>("port")),
            Err(ContainerError::TypeMismatch { found, .. }) if found == any::type_name::<String>()
        ));
    }

    #[test]
    fn typed_injector_get_fails_when_key_is_not_registered() {
        let mut injector = MockInjector::new();
        injector.expect_dyn_has().return_const(false);
        injector.expect_dyn_make().never();

        assert!(matches!(
            injector.get(key::of::<u16>()),
            Err(ContainerError::NotFound { .. })
        ));
    }

    #[test]
    fn typed_injector_get_delegates_to_make_when_key_is_registered() {
        let mut injector = MockInjector::new();
        injector.expect_dyn_has().return_const(true);
        injector
            .expect_dyn_make()
            .times(1)
            .returning(|_| Ok(Instance::new(Arc::new(1u16))));

        assert_eq!(*injector.get(key::of::<u16>()).unwrap(), 1);
    }

    #[test]
    fn typed_injector_works_through_trait_objects() {
        let mut injector = MockInjector::new();
        injector.expect_dyn_has().return_const(true);
        let injector: &dyn Injector = &injector;

        assert!(injector.has(key::of::<u16>()));
        assert!(injector.upcast_dyn().dyn_has(&key::of::<u16>()));
    }
}
