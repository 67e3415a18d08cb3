//! Constructor metadata for the types the container can build on its own.
//!
//! A type becomes a *class* by implementing [`Injectable`], which declares
//! its constructor parameters and builds it from resolved [`Arguments`].
//! The [`injectable`](crate::injectable) attribute generates that
//! implementation from an annotated constructor and registers the type in
//! the process-wide [catalog](catalog), where the container looks it up when
//! resolving an abstract that was never bound to anything else.

mod arguments;
pub mod catalog;
mod parameter;

use std::any;
use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::{ContainerError, Managed};
use crate::instance::Instance;
use crate::key::{self, Key};

pub use arguments::{Argument, Arguments};
pub use parameter::{Parameter, ParameterKind};

pub(crate) type InstantiateResult =
    Result<Result<Instance, Box<dyn Error + Send + Sync>>, ContainerError>;

/// A type the container can construct from its declared constructor
/// parameters.
pub trait Injectable: Managed + Sized {
    /// Domain error of the constructor, reported as
    /// [`ContainerError::Construction`].
    type Error: Into<Box<dyn Error + Send + Sync>>;

    /// Constructor parameters in declaration order.
    fn parameters() -> Vec<Parameter> {
        Vec::new()
    }

    /// Builds the object from one argument per declared parameter.
    fn construct(arguments: &mut Arguments) -> Result<Result<Self, Self::Error>, ContainerError>;
}

/// A registered class: the key it is resolved by and how to build it.
pub struct Class {
    key: Box<dyn Key>,
    name: &'static str,
    parameters: fn() -> Vec<Parameter>,
    instantiate: fn(&mut Arguments) -> InstantiateResult,
}

impl Class {
    pub fn of<T>() -> Self
    where
        T: Injectable,
    {
        Self {
            key: Box::new(key::of::<T>()),
            name: any::type_name::<T>(),
            parameters: T::parameters,
            instantiate: instantiate::<T>,
        }
    }

    pub fn key(&self) -> &dyn Key {
        self.key.as_ref()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parameters(&self) -> Vec<Parameter> {
        (self.parameters)()
    }

    pub(crate) fn instantiate(&self, arguments: &mut Arguments) -> InstantiateResult {
        (self.instantiate)(arguments)
    }
}

impl Debug for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Class")
            .field("key", &self.key)
            .field("parameters", &self.parameters())
            .finish_non_exhaustive()
    }
}

fn instantiate<T>(arguments: &mut Arguments) -> InstantiateResult
where
    T: Injectable,
{
    T::construct(arguments).map(|res| res.map(|object| Instance::new(Arc::new(object))).map_err(Into::into))
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    struct Clock {
        offset: i64,
    }

    impl Injectable for Clock {
        type Error = Infallible;

        fn parameters() -> Vec<Parameter> {
            vec![Parameter::with_default("offset", || 0i64)]
        }

        fn construct(arguments: &mut Arguments) -> Result<Result<Self, Self::Error>, ContainerError> {
            Ok(Ok(Self {
                offset: arguments.value("offset")?,
            }))
        }
    }

    struct Broken;

    impl Injectable for Broken {
        type Error = &'static str;

        fn construct(_: &mut Arguments) -> Result<Result<Self, Self::Error>, ContainerError> {
            Ok(Err("broken on purpose"))
        }
    }

    #[test]
    fn class_of_describes_the_type() {
        let class = Class::of::<Clock>();

        assert_eq!(class.key(), &key::of::<Clock>() as &dyn Key);
        assert_eq!(class.name(), any::type_name::<Clock>());
        assert_eq!(class.parameters().len(), 1);
        assert_eq!(class.parameters()[0].name(), "offset");
    }

    #[test]
    fn class_instantiate_succeeds() {
        let class = Class::of::<Clock>();
        let mut arguments = Arguments::new(
            class.name(),
            vec![Argument::new("offset", None, Instance::new(Arc::new(5i64)))],
        );

        let instance = class.instantiate(&mut arguments).unwrap().unwrap();
        assert_eq!(instance.downcast::<Clock>().unwrap().offset, 5);
    }

    #[test]
    fn class_instantiate_boxes_constructor_errors() {
        let class = Class::of::<Broken>();
        let mut arguments = Arguments::new(class.name(), Vec::new());

        let err = class.instantiate(&mut arguments).unwrap().unwrap_err();
        assert_eq!(err.to_string(), "broken on purpose");
    }
}
