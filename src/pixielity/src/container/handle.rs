use std::sync::Arc;

use crate::container::binding::{Concrete, ConcreteKind};
use crate::container::core::ContainerCore;
use crate::container::injector::{Injector, ResolutionContext, TypedInjector};
use crate::container::ContainerError;
use crate::instance::Instance;
use crate::key::{Key, TypedKey};

/// A dependency-injection container.
///
/// Cloning a [`Container`] yields another handle to the same bindings and
/// cached instances.
#[derive(Clone)]
pub struct Container {
    core: Arc<ContainerCore>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            core: Arc::new(ContainerCore::new()),
        }
    }

    /// Binds `key` to `concrete`, replacing any previous binding of `key`.
    ///
    /// `None` binds the key to itself, i.e. to the class registered for it.
    /// Nothing is validated until the key is resolved. A shared binding is
    /// built once and cached on first resolution; an instance that is already
    /// cached stays cached when the key is bound again.
    pub fn bind<K>(&self, key: K, concrete: Option<Concrete<K::Target>>, shared: bool)
    where
        K: TypedKey,
    {
        let concrete = concrete.map_or(ConcreteKind::Itself, Concrete::into_kind);
        self.core.bind(Box::new(key), concrete, shared);
    }

    /// Binds `key` as shared. See [`Container::bind`].
    pub fn singleton<K>(&self, key: K, concrete: Option<Concrete<K::Target>>)
    where
        K: TypedKey,
    {
        self.bind(key, concrete, true);
    }

    /// Registers an already built object, handed out as is by every later
    /// resolution of `key`.
    pub fn instance<K>(&self, key: K, object: Arc<K::Target>)
    where
        K: TypedKey,
    {
        self.core.instance(Box::new(key), Instance::new(object));
    }

    /// Resolves `key`.
    ///
    /// A key that was never bound resolves to itself: the class registered
    /// for it in the [catalog](crate::class::catalog) is constructed, with
    /// its dependencies resolved the same way. Use [`Container::get`] to
    /// resolve only what was explicitly registered.
    pub fn make<K>(&self, key: K) -> Result<Arc<K::Target>, ContainerError>
    where
        K: TypedKey,
    {
        TypedInjector::make(self, key)
    }

    /// Returns true if `key` is bound or has a cached instance.
    pub fn has<K>(&self, key: K) -> bool
    where
        K: TypedKey,
    {
        self.core.has(&key)
    }

    /// Resolves `key`, failing with [`ContainerError::NotFound`] unless
    /// [`Container::has`] is true for it.
    pub fn get<K>(&self, key: K) -> Result<Arc<K::Target>, ContainerError>
    where
        K: TypedKey,
    {
        TypedInjector::get(self, key)
    }
}

impl Injector for Container {
    fn dyn_make(&self, key: &dyn Key) -> Result<Instance, ContainerError> {
        self.core.dyn_make(key)
    }

    fn dyn_make_dependency<'a>(
        &self,
        key: &dyn Key,
        context: &'a ResolutionContext<'a>,
    ) -> Result<Instance, ContainerError> {
        self.core.dyn_make_dependency(key, context)
    }

    fn dyn_has(&self, key: &dyn Key) -> bool {
        self.core.has(key)
    }
}
