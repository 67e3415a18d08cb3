use std::any;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::container::{ContainerError, Managed};
use crate::instance::Instance;
use crate::key::Key;

/// A resolved constructor argument.
#[derive(Debug)]
pub struct Argument {
    parameter: &'static str,
    dependency: Option<Box<dyn Key>>,
    instance: Instance,
}

impl Argument {
    pub fn new(parameter: &'static str, dependency: Option<Box<dyn Key>>, instance: Instance) -> Self {
        Self {
            parameter,
            dependency,
            instance,
        }
    }

    pub fn parameter(&self) -> &'static str {
        self.parameter
    }

    /// The key the argument was resolved by, `None` for a value.
    pub fn dependency(&self) -> Option<&dyn Key> {
        self.dependency.as_deref()
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }
}

/// The resolved arguments of a constructor, consumed in declaration order.
#[derive(Debug)]
pub struct Arguments {
    class: &'static str,
    arguments: VecDeque<Argument>,
}

impl Arguments {
    pub fn new(class: &'static str, arguments: Vec<Argument>) -> Self {
        Self {
            class,
            arguments: arguments.into(),
        }
    }

    /// Takes the next argument as a shared object.
    pub fn dependency<T>(&mut self, parameter: &'static str) -> Result<Arc<T>, ContainerError>
    where
        T: Managed + ?Sized,
    {
        let argument = self.next(parameter)?;
        argument
            .instance
            .downcast::<T>()
            .ok_or_else(|| Self::mismatch::<T>(self.class, &argument))
    }

    /// Takes the next argument as an owned value.
    pub fn value<T>(&mut self, parameter: &'static str) -> Result<T, ContainerError>
    where
        T: Managed + Clone,
    {
        let argument = self.next(parameter)?;
        match argument.instance.downcast::<T>() {
            Some(value) => Ok(Arc::unwrap_or_clone(value)),
            None => Err(Self::mismatch::<T>(self.class, &argument)),
        }
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    fn next(&mut self, parameter: &'static str) -> Result<Argument, ContainerError> {
        self.arguments
            .pop_front()
            .ok_or(ContainerError::UnresolvableDependency {
                parameter,
                class: self.class,
                dependency: None,
            })
    }

    fn mismatch<T>(class: &'static str, argument: &Argument) -> ContainerError
    where
        T: ?Sized,
    {
        ContainerError::ArgumentMismatch {
            parameter: argument.parameter,
            class,
            expected: any::type_name::<T>(),
            found: argument.instance.type_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::key;

    use super::*;

    #[test]
    fn arguments_are_taken_in_order() {
        let mut arguments = Arguments::new(
            "Mailer",
            vec![
                Argument::new(
                    "transport",
                    Some(Box::new(key::of::<String>())),
                    Instance::new(Arc::new(String::from("smtp"))),
                ),
                Argument::new("port", None, Instance::new(Arc::new(25u16))),
            ],
        );

        assert_eq!(arguments.len(), 2);
        assert!(arguments.arguments[1].dependency().is_none());
        assert_eq!(*arguments.dependency::<String>("transport").unwrap(), "smtp");
        assert_eq!(arguments.value::<u16>("port").unwrap(), 25);
        assert!(arguments.is_empty());
    }

    #[test]
    fn arguments_value_fails_when_type_differs() {
        let mut arguments = Arguments::new(
            "Mailer",
            vec![Argument::new("port", None, Instance::new(Arc::new(25u32)))],
        );

        assert!(matches!(
            arguments.value::<u16>("port"),
            Err(ContainerError::ArgumentMismatch {
                parameter: "port",
                class: "Mailer",
                expected: "u16",
                found: "u32",
            })
        ));
    }

    #[test]
    fn arguments_dependency_fails_when_type_differs() {
        let mut arguments = Arguments::new(
            "Mailer",
            vec![Argument::new(
                "transport",
                Some(Box::new(key::of::<String>())),
                Instance::new(Arc::new(25u16)),
            )],
        );

        let Err(err) = arguments.dependency::<String>("transport") else {
            panic!("a `u16` should not be taken as a `String`");
        };
        assert!(matches!(
            err,
            ContainerError::ArgumentMismatch {
                parameter: "transport",
                ..
            }
        ));
        assert!(err.to_string().contains("`transport`"));
    }

    #[test]
    fn arguments_dependency_fails_when_exhausted() {
        let mut arguments = Arguments::new("Mailer", Vec::new());

        assert!(matches!(
            arguments.dependency::<String>("transport"),
            Err(ContainerError::UnresolvableDependency {
                parameter: "transport",
                class: "Mailer",
                dependency: None,
            })
        ));
    }
}
