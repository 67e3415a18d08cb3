use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::injector::{downcast_instance, Injector};
use crate::container::{ContainerError, Managed};
use crate::instance::Instance;
use crate::key::{Key, TypedKey};

pub(crate) type FactoryResult =
    Result<Result<Instance, Box<dyn Error + Send + Sync>>, ContainerError>;

pub(crate) type FactoryFn = dyn Fn(&dyn Injector) -> FactoryResult + Send + Sync;

pub(crate) type UpcastFn = dyn Fn(Instance) -> Result<Instance, ContainerError> + Send + Sync;

/// What an abstract resolves to.
///
/// Binding an abstract without a concrete (`None`) makes it resolve to
/// itself, i.e. to the class registered for its key.
pub struct Concrete<T>
where
    T: Managed + ?Sized,
{
    kind: ConcreteKind,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T> Concrete<T>
where
    T: Managed + ?Sized,
{
    fn new(kind: ConcreteKind) -> Self {
        Self {
            kind,
            _marker: PhantomData,
        }
    }

    /// A factory invoked with the resolving container on each unshared
    /// resolution.
    ///
    /// Container errors returned by the factory are propagated as is. Errors
    /// of the factory itself, returned in the inner `Err`, are reported as
    /// [`ContainerError::Construction`].
    pub fn factory<F, E>(factory: F) -> Self
    where
        F: Fn(&dyn Injector) -> Result<Result<Arc<T>, E>, ContainerError> + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let factory = move |injector: &dyn Injector| -> FactoryResult {
            factory(injector).map(|res| res.map(Instance::new).map_err(Into::into))
        };
        Self::new(ConcreteKind::Factory(Arc::new(factory)))
    }

    /// Resolves the abstract by resolving another key of the same target type.
    pub fn alias<K>(target: K) -> Self
    where
        K: TypedKey<Target = T>,
    {
        Self::new(ConcreteKind::Alias {
            target: Arc::new(target),
            upcast: None,
        })
    }

    /// Resolves the abstract by resolving `target` and converting the result,
    /// typically an unsizing coercion such as `Arc<ConsoleLogger>` into
    /// `Arc<dyn Logger>`.
    pub fn upcast<K>(target: K, upcast: fn(Arc<K::Target>) -> Arc<T>) -> Self
    where
        K: TypedKey,
    {
        let convert = move |instance: Instance| {
            downcast_instance(&target, &instance).map(|object| Instance::new(upcast(object)))
        };
        Self::new(ConcreteKind::Alias {
            target: Arc::new(target),
            upcast: Some(Arc::new(convert)),
        })
    }

    pub(crate) fn into_kind(self) -> ConcreteKind {
        self.kind
    }
}

impl<T> Debug for Concrete<T>
where
    T: Managed + ?Sized,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.kind, f)
    }
}

#[derive(Clone)]
pub(crate) enum ConcreteKind {
    Itself,
    Alias {
        target: Arc<dyn Key>,
        upcast: Option<Arc<UpcastFn>>,
    },
    Factory(Arc<FactoryFn>),
}

impl Debug for ConcreteKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Itself => f.write_str("Itself"),
            Self::Alias { target, upcast } => f
                .debug_struct("Alias")
                .field("target", target)
                .field("upcast", &upcast.is_some())
                .finish(),
            Self::Factory(_) => f.debug_tuple("Factory").finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    concrete: ConcreteKind,
    shared: bool,
}

impl Binding {
    pub fn new(concrete: ConcreteKind, shared: bool) -> Self {
        Self { concrete, shared }
    }

    pub fn concrete(&self) -> &ConcreteKind {
        &self.concrete
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }
}

#[derive(Debug, Default)]
pub(crate) struct BindingTable {
    bindings: HashMap<Box<dyn Key>, Binding>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the binding, returning the one it replaces.
    pub fn insert(&mut self, key: Box<dyn Key>, binding: Binding) -> Option<Binding> {
        self.bindings.insert(key, binding)
    }

    pub fn get(&self, key: &dyn Key) -> Option<&Binding> {
        self.bindings.get(key)
    }

    pub fn contains(&self, key: &dyn Key) -> bool {
        self.bindings.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use crate::container::injector::MockInjector;
    use crate::key;

    use super::*;

    trait Logger: Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct ConsoleLogger;

    impl Logger for ConsoleLogger {
        fn name(&self) -> &'static str {
            "console"
        }
    }

    #[test]
    fn binding_table_insert_replaces_previous_binding() {
        let mut table = BindingTable::new();
        assert!(table
            .insert(
                Box::new(key::of::<dyn Logger>()),
                Binding::new(ConcreteKind::Itself, false),
            )
            .is_none());

        let replaced = table
            .insert(
                Box::new(key::of::<dyn Logger>()),
                Binding::new(ConcreteKind::Itself, true),
            )
            .unwrap();
        assert!(!replaced.is_shared());

        let binding = table.get(&key::of::<dyn Logger>()).unwrap();
        assert!(binding.is_shared());
        assert!(table.contains(&key::of::<dyn Logger>()));
        assert!(!table.contains(&key::named::<dyn Logger>("file")));
    }

    #[test]
    fn concrete_factory_wraps_returned_object() {
        let concrete = Concrete::<dyn Logger>::factory(|_| {
            Ok(Ok::<_, Infallible>(Arc::new(ConsoleLogger) as Arc<dyn Logger>))
        });
        let ConcreteKind::Factory(factory) = concrete.into_kind() else {
            panic!("a factory concrete should be kept as a factory");
        };

        let instance = factory(&MockInjector::new()).unwrap().unwrap();
        assert_eq!(instance.downcast::<dyn Logger>().unwrap().name(), "console");
    }

    #[test]
    fn concrete_factory_boxes_domain_errors() {
        let concrete =
            Concrete::<dyn Logger>::factory(|_| Ok(Err::<Arc<dyn Logger>, _>("disk is full")));
        let ConcreteKind::Factory(factory) = concrete.into_kind() else {
            panic!("a factory concrete should be kept as a factory");
        };

        let err = factory(&MockInjector::new()).unwrap().unwrap_err();
        assert_eq!(err.to_string(), "disk is full");
    }

    #[test]
    fn concrete_upcast_converts_target_instance() {
        let concrete = Concrete::<dyn Logger>::upcast(key::of::<ConsoleLogger>(), |logger| logger);
        let ConcreteKind::Alias {
            target,
            upcast: Some(upcast),
        } = concrete.into_kind()
        else {
            panic!("an upcast concrete should be kept as an alias with a conversion");
        };
        assert_eq!(target.as_ref(), &key::of::<ConsoleLogger>() as &dyn Key);

        let instance = upcast(Instance::new(Arc::new(ConsoleLogger))).unwrap();
        assert_eq!(instance.downcast::<dyn Logger>().unwrap().name(), "console");

        assert!(matches!(
            upcast(Instance::new(Arc::new(0u8))),
            Err(ContainerError::TypeMismatch { .. })
        ));
    }
}
