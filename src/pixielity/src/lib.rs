#![allow(clippy::new_without_default)]

extern crate self as pixielity;

pub mod application;
pub mod class;
pub mod container;
pub mod instance;
pub mod key;
mod util;

pub use pixielity_derive::injectable;

#[doc(hidden)]
pub use linkme;

pub mod prelude {
    pub use crate::application::{Application, ApplicationError, VERSION};
    pub use crate::class::{Arguments, Injectable, Parameter};
    pub use crate::container::injector::{Injector, TypedInjector};
    pub use crate::container::{Concrete, Container, ContainerError};
    pub use crate::injectable;
    pub use crate::key;
}
