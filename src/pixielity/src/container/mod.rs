pub mod injector;

mod binding;
mod core;
mod handle;
mod instances;

use std::error::Error;
use std::sync::Arc;

use snafu::prelude::*;

use crate::key::Key;

pub use binding::Concrete;
pub use handle::Container;

/// Anything the container can hand out behind an `Arc`.
pub trait Managed: Send + Sync + 'static {}

impl<T> Managed for T where T: Send + Sync + ?Sized + 'static {}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ContainerError {
    #[snafu(display("target {key} is not bound in the container"))]
    #[non_exhaustive]
    NotFound { key: Box<dyn Key> },
    #[snafu(display("unresolvable dependency `{parameter}` in class {class}"))]
    #[non_exhaustive]
    UnresolvableDependency {
        parameter: &'static str,
        class: &'static str,
        dependency: Option<Box<dyn Key>>,
    },
    #[snafu(display("target {key} is not instantiable"))]
    #[non_exhaustive]
    NotInstantiable { key: Box<dyn Key> },
    #[snafu(display("could not resolve {key} which depends on itself: {path}"))]
    #[non_exhaustive]
    CyclicDependency { key: Box<dyn Key>, path: String },
    #[snafu(display("resolved {key} to a value of type {found} instead of {expected}"))]
    #[non_exhaustive]
    TypeMismatch {
        key: Box<dyn Key>,
        expected: &'static str,
        found: &'static str,
    },
    #[snafu(display(
        "argument `{parameter}` of class {class} is a {found} instead of {expected}"
    ))]
    #[non_exhaustive]
    ArgumentMismatch {
        parameter: &'static str,
        class: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[snafu(display("could not construct {key}"))]
    #[non_exhaustive]
    Construction {
        key: Box<dyn Key>,
        source: Arc<dyn Error + Send + Sync>,
    },
    #[snafu(display("construction of {key} was abandoned by the thread running it"))]
    #[non_exhaustive]
    Abandoned { key: Box<dyn Key> },
}

impl Clone for ContainerError {
    fn clone(&self) -> Self {
        match self {
            Self::NotFound { key } => Self::NotFound { key: key.clone() },
            Self::UnresolvableDependency {
                parameter,
                class,
                dependency,
            } => Self::UnresolvableDependency {
                parameter: *parameter,
                class: *class,
                dependency: dependency.clone(),
            },
            Self::NotInstantiable { key } => Self::NotInstantiable { key: key.clone() },
            Self::CyclicDependency { key, path } => Self::CyclicDependency {
                key: key.clone(),
                path: path.clone(),
            },
            Self::TypeMismatch {
                key,
                expected,
                found,
            } => Self::TypeMismatch {
                key: key.clone(),
                expected: *expected,
                found: *found,
            },
            Self::ArgumentMismatch {
                parameter,
                class,
                expected,
                found,
            } => Self::ArgumentMismatch {
                parameter: *parameter,
                class: *class,
                expected: *expected,
                found: *found,
            },
            Self::Construction { key, source } => Self::Construction {
                key: key.clone(),
                source: Arc::clone(source),
            },
            Self::Abandoned { key } => Self::Abandoned { key: key.clone() },
        }
    }
}
