use crate::container::injector::{Injector, ResolutionContext, TypedInjector};
use crate::container::ContainerError;
use crate::instance::Instance;
use crate::key::Key;

/// Forwards every request as a dependency of the wrapped context.
pub struct ContextForwardingInjectorProxy<'a, I>
where
    I: TypedInjector + ?Sized,
{
    inner: &'a I,
    context: &'a ResolutionContext<'a>,
}

impl<'a, I> ContextForwardingInjectorProxy<'a, I>
where
    I: TypedInjector + ?Sized,
{
    pub fn new(inner: &'a I, context: &'a ResolutionContext<'a>) -> Self {
        Self { inner, context }
    }
}

impl<I> Injector for ContextForwardingInjectorProxy<'_, I>
where
    I: TypedInjector + ?Sized,
{
    fn dyn_make(&self, key: &dyn Key) -> Result<Instance, ContainerError> {
        self.dyn_make_dependency(key, self.context)
    }

    fn dyn_make_dependency<'a>(
        &self,
        key: &dyn Key,
        context: &'a ResolutionContext<'a>,
    ) -> Result<Instance, ContainerError> {
        self.inner.dyn_make_dependency(key, context)
    }

    fn dyn_has(&self, key: &dyn Key) -> bool {
        self.inner.dyn_has(key)
    }
}
