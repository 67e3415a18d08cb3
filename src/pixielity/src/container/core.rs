use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use oneshot::{Receiver, RecvError, Sender};
use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::{debug, trace, warn};

use crate::class::{catalog, Argument, Arguments, Class, ParameterKind};
use crate::container::binding::{Binding, BindingTable, ConcreteKind};
use crate::container::injector::{ContextForwardingInjectorProxy, Injector, ResolutionContext};
use crate::container::instances::InstanceCache;
use crate::container::ContainerError;
use crate::instance::Instance;
use crate::key::Key;

pub(crate) struct ContainerCore {
    bindings: RwLock<BindingTable>,
    managed: RwLock<SharedObjectData>,
}

impl ContainerCore {
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(BindingTable::new()),
            managed: RwLock::new(SharedObjectData::new()),
        }
    }

    pub fn bind(&self, key: Box<dyn Key>, concrete: ConcreteKind, shared: bool) {
        debug!(key = %key, ?concrete, shared, "binding");
        let binding = Binding::new(concrete, shared);
        if self.bindings.write().insert(key, binding).is_some() {
            trace!("replaced previous binding");
        }
    }

    pub fn instance(&self, key: Box<dyn Key>, instance: Instance) {
        debug!(key = %key, type_name = instance.type_name(), "registering instance");
        self.managed.write().instances.insert(key, instance);
    }

    pub fn has(&self, key: &dyn Key) -> bool {
        self.bindings.read().contains(key) || self.managed.read().instances.contains(key)
    }

    fn make_object(&self, context: &ResolutionContext) -> Result<Instance, ContainerError> {
        let key = context.key();
        if let Some(instance) = self.try_get_cached_instance(key) {
            trace!(key = %key, "resolved from cache");
            return Ok(instance);
        }

        if context.trace().previous_exist_key(key) {
            return Err(ContainerError::CyclicDependency {
                key: key.dyn_clone(),
                path: context.trace().render(),
            });
        }

        // Also catches factories that captured the container instead of using
        // the injector they were given.
        let Some(_resolving) = ResolvingGuard::enter(self.id(), key) else {
            return Err(ContainerError::CyclicDependency {
                key: key.dyn_clone(),
                path: ResolvingGuard::render(self.id(), key),
            });
        };

        // Sharing is decided once, by the binding of the requested key.
        let binding = self.bindings.read().get(key).cloned();
        trace!(key = %key, depth = context.trace().depth(), "resolving");
        match binding {
            Some(binding) if binding.is_shared() => {
                self.get_shared_object(binding.concrete(), context)
            }
            Some(binding) => self.build_or_forward(binding.concrete(), context),
            None => self.build_or_forward(&ConcreteKind::Itself, context),
        }
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }

    fn try_get_cached_instance(&self, key: &dyn Key) -> Option<Instance> {
        self.managed.read().instances.get(key)
    }

    fn get_shared_object(
        &self,
        concrete: &ConcreteKind,
        context: &ResolutionContext,
    ) -> Result<Instance, ContainerError> {
        let key = context.key();
        let managed = self.managed.write();

        if let Some(instance) = managed.instances.get(key) {
            return Ok(instance);
        }

        if !managed.constructing.contains_key(key) {
            return self.construct_shared_object(managed, concrete, context);
        }

        if managed.leads_back_to_current_thread(key) {
            Err(ContainerError::CyclicDependency {
                key: key.dyn_clone(),
                path: context.trace().render(),
            })
        } else {
            self.wait_for_constructed_object(managed, key)
        }
    }

    fn wait_for_constructed_object(
        &self,
        mut managed: RwLockWriteGuard<SharedObjectData>,
        key: &dyn Key,
    ) -> Result<Instance, ContainerError> {
        trace!(key = %key, "waiting for construction on another thread");
        let receiver = self.register_waiter_on_object_context(&mut managed, key);
        drop(managed);
        self.get_object_on_object_context_response(receiver.recv(), key)
    }

    fn register_waiter_on_object_context(
        &self,
        managed: &mut SharedObjectData,
        key: &dyn Key,
    ) -> Receiver<WaitResponse> {
        let (sender, receiver) = oneshot::channel();
        let on_thread = thread::current().id();
        let Some(object_context) = managed.constructing.get_mut(key) else {
            unreachable!("whether `object_context` exists should be checked before calling this method")
        };
        object_context.register_waiter(on_thread, sender);
        managed.waiting.insert(on_thread, key.dyn_clone());
        receiver
    }

    fn get_object_on_object_context_response(
        &self,
        response: Result<WaitResponse, RecvError>,
        key: &dyn Key,
    ) -> Result<Instance, ContainerError> {
        match response {
            Ok(WaitResponse::Constructed) => {
                let Some(instance) = self.try_get_cached_instance(key) else {
                    unreachable!("`instance` should already be put into `self.managed.instances`")
                };
                Ok(instance)
            }
            Ok(WaitResponse::Error(err)) => Err(err),
            Err(RecvError) => Err(ContainerError::Abandoned {
                key: key.dyn_clone(),
            }),
        }
    }

    fn construct_shared_object(
        &self,
        mut managed: RwLockWriteGuard<SharedObjectData>,
        concrete: &ConcreteKind,
        context: &ResolutionContext,
    ) -> Result<Instance, ContainerError> {
        let key = context.key();
        let on_thread = thread::current().id();
        managed
            .constructing
            .insert(key.dyn_clone(), ConstructingObjectContext::new(on_thread));
        drop(managed);

        let construction = ConstructionGuard::new(self, key);
        let result = self.build_or_forward(concrete, context);
        construction.settle(&result);
        result
    }

    fn notify_waiters(
        &self,
        mut managed: RwLockWriteGuard<SharedObjectData>,
        key: &dyn Key,
        response: WaitResponse,
    ) {
        if let Some(object_context) = managed.constructing.remove(key) {
            for (on_thread, _) in &object_context.waiters {
                managed.waiting.remove(on_thread);
            }
            drop(managed);
            object_context.notify(response);
        }
    }

    fn build_or_forward(
        &self,
        concrete: &ConcreteKind,
        context: &ResolutionContext,
    ) -> Result<Instance, ContainerError> {
        let key = context.key();
        match concrete {
            ConcreteKind::Factory(factory) => {
                let injector = ContextForwardingInjectorProxy::new(self, context);
                factory(&injector)?.map_err(|source| ContainerError::Construction {
                    key: key.dyn_clone(),
                    source: Arc::from(source),
                })
            }
            ConcreteKind::Alias { target, .. } if target.as_ref() == key => {
                self.build_class(context)
            }
            ConcreteKind::Alias { target, upcast } => {
                trace!(key = %key, target = %target, "forwarding to alias");
                let instance = self.dyn_make_dependency(target.as_ref(), context)?;
                match upcast {
                    Some(upcast) => upcast(instance),
                    None => Ok(instance),
                }
            }
            ConcreteKind::Itself => self.build_class(context),
        }
    }

    fn build_class(&self, context: &ResolutionContext) -> Result<Instance, ContainerError> {
        let key = context.key();
        let Some(class) = catalog::find(key) else {
            return Err(ContainerError::NotInstantiable {
                key: key.dyn_clone(),
            });
        };

        let mut arguments = self.resolve_dependencies(class, context)?;
        trace!(class = class.name(), "constructing");
        class
            .instantiate(&mut arguments)?
            .map_err(|source| ContainerError::Construction {
                key: key.dyn_clone(),
                source: Arc::from(source),
            })
    }

    fn resolve_dependencies(
        &self,
        class: &Class,
        context: &ResolutionContext,
    ) -> Result<Arguments, ContainerError> {
        let parameters = class.parameters();
        let mut arguments = Vec::with_capacity(parameters.len());

        for parameter in parameters {
            let argument = match parameter.kind() {
                ParameterKind::Dependency(dependency) => {
                    let instance = match self.dyn_make_dependency(dependency.as_ref(), context) {
                        Err(ContainerError::NotInstantiable { key })
                            if key.as_ref() == dependency.as_ref() =>
                        {
                            return Err(ContainerError::UnresolvableDependency {
                                parameter: parameter.name(),
                                class: class.name(),
                                dependency: Some(key),
                            });
                        }
                        res => res?,
                    };
                    Argument::new(parameter.name(), Some(dependency.dyn_clone()), instance)
                }
                ParameterKind::Value {
                    default: Some(default),
                } => Argument::new(parameter.name(), None, default()),
                ParameterKind::Value { default: None } => {
                    return Err(ContainerError::UnresolvableDependency {
                        parameter: parameter.name(),
                        class: class.name(),
                        dependency: None,
                    });
                }
            };
            arguments.push(argument);
        }

        Ok(Arguments::new(class.name(), arguments))
    }
}

impl Injector for ContainerCore {
    fn dyn_make(&self, key: &dyn Key) -> Result<Instance, ContainerError> {
        let context = ResolutionContext::new(key);
        self.make_object(&context)
    }

    fn dyn_make_dependency<'a>(
        &self,
        key: &dyn Key,
        context: &'a ResolutionContext<'a>,
    ) -> Result<Instance, ContainerError> {
        let context = context.append(key);
        self.make_object(&context)
    }

    fn dyn_has(&self, key: &dyn Key) -> bool {
        self.has(key)
    }
}

struct SharedObjectData {
    instances: InstanceCache,
    constructing: HashMap<Box<dyn Key>, ConstructingObjectContext>,
    /// The shared key each blocked thread is waiting for.
    waiting: HashMap<ThreadId, Box<dyn Key>>,
}

impl SharedObjectData {
    fn new() -> Self {
        Self {
            instances: InstanceCache::new(),
            constructing: HashMap::new(),
            waiting: HashMap::new(),
        }
    }

    /// Follows the threads waiting on each other, starting at the one
    /// constructing `key`, and returns true if the chain reaches the current
    /// thread, i.e. if waiting for `key` would never return.
    fn leads_back_to_current_thread<'a>(&'a self, key: &'a dyn Key) -> bool {
        let current = thread::current().id();
        let mut key = key;
        // Each hop visits another waiting thread.
        for _ in 0..=self.waiting.len() {
            let Some(object_context) = self.constructing.get(key) else {
                return false;
            };
            if object_context.on_thread == current {
                return true;
            }
            match self.waiting.get(&object_context.on_thread) {
                Some(next) => key = next.as_ref(),
                None => return false,
            }
        }
        false
    }
}

struct ConstructingObjectContext {
    on_thread: ThreadId,
    waiters: Vec<(ThreadId, Sender<WaitResponse>)>,
}

impl ConstructingObjectContext {
    fn new(on_thread: ThreadId) -> Self {
        Self {
            on_thread,
            waiters: Vec::new(),
        }
    }

    fn register_waiter(&mut self, on_thread: ThreadId, sender: Sender<WaitResponse>) {
        self.waiters.push((on_thread, sender));
    }

    fn notify(self, response: WaitResponse) {
        for (_, sender) in self.waiters {
            let _ = sender.send(response.clone());
        }
    }
}

#[derive(Debug, Clone)]
enum WaitResponse {
    Constructed,
    Error(ContainerError),
}

/// Owns the `constructing` entry of a shared key until its construction is
/// settled. Dropping it unsettled, e.g. when a factory panics, releases the
/// key and fails every waiter with [`ContainerError::Abandoned`].
struct ConstructionGuard<'a> {
    core: &'a ContainerCore,
    key: &'a dyn Key,
    settled: bool,
}

impl<'a> ConstructionGuard<'a> {
    fn new(core: &'a ContainerCore, key: &'a dyn Key) -> Self {
        Self {
            core,
            key,
            settled: false,
        }
    }

    fn settle(mut self, result: &Result<Instance, ContainerError>) {
        let mut managed = self.core.managed.write();
        let response = match result {
            Ok(instance) => {
                managed.instances.insert(self.key.dyn_clone(), instance.clone());
                debug!(key = %self.key, "cached shared instance");
                WaitResponse::Constructed
            }
            Err(err) => WaitResponse::Error(err.clone()),
        };
        self.settled = true;
        self.core.notify_waiters(managed, self.key, response);
    }
}

impl Drop for ConstructionGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!(key = %self.key, "shared construction abandoned");
        let managed = self.core.managed.write();
        let err = ContainerError::Abandoned {
            key: self.key.dyn_clone(),
        };
        self.core
            .notify_waiters(managed, self.key, WaitResponse::Error(err));
    }
}

thread_local! {
    /// Keys being resolved on this thread, tagged with their container.
    static RESOLVING: RefCell<Vec<(usize, Box<dyn Key>)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a key as being resolved on the current thread for as long as it
/// lives.
struct ResolvingGuard;

impl ResolvingGuard {
    /// Returns `None` if `key` is already being resolved by `container` on
    /// this thread.
    fn enter(container: usize, key: &dyn Key) -> Option<Self> {
        RESOLVING.with(|resolving| {
            let mut resolving = resolving.borrow_mut();
            if resolving
                .iter()
                .any(|(owner, resolved)| *owner == container && resolved.as_ref() == key)
            {
                return None;
            }
            resolving.push((container, key.dyn_clone()));
            Some(Self)
        })
    }

    /// Renders the keys `container` is resolving on this thread, followed by
    /// `key`.
    fn render(container: usize, key: &dyn Key) -> String {
        RESOLVING.with(|resolving| {
            let resolving = resolving.borrow();
            let mut path = String::new();
            for (_, resolved) in resolving.iter().filter(|(owner, _)| *owner == container) {
                let _ = write!(path, "{resolved} -> ");
            }
            let _ = write!(path, "{key}");
            path
        })
    }
}

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        let _ = RESOLVING.try_with(|resolving| resolving.borrow_mut().pop());
    }
}
