use std::any;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::Managed;
use crate::instance::Instance;
use crate::key::{Key, TypedKey};

type DefaultFn = dyn Fn() -> Instance + Send + Sync;

/// A declared constructor parameter.
pub struct Parameter {
    name: &'static str,
    type_name: &'static str,
    kind: ParameterKind,
}

pub enum ParameterKind {
    /// A shared object, resolved from the container by its key.
    Dependency(Box<dyn Key>),
    /// A plain value, which the container can only fill with its default.
    Value { default: Option<Box<DefaultFn>> },
}

impl Parameter {
    /// A parameter receiving `Arc<K::Target>`, resolved through `key`.
    pub fn dependency<K>(name: &'static str, key: K) -> Self
    where
        K: TypedKey,
    {
        Self {
            name,
            type_name: any::type_name::<Arc<K::Target>>(),
            kind: ParameterKind::Dependency(Box::new(key)),
        }
    }

    /// A value parameter without a default.
    pub fn value<T>(name: &'static str) -> Self
    where
        T: Managed,
    {
        Self {
            name,
            type_name: any::type_name::<T>(),
            kind: ParameterKind::Value { default: None },
        }
    }

    pub fn with_default<T, F>(name: &'static str, default: F) -> Self
    where
        T: Managed,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            name,
            type_name: any::type_name::<T>(),
            kind: ParameterKind::Value {
                default: Some(Box::new(move || Instance::new(Arc::new(default())))),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    pub fn is_dependency(&self) -> bool {
        matches!(self.kind, ParameterKind::Dependency(_))
    }
}

impl Debug for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut debug = f.debug_struct("Parameter");
        debug.field("name", &self.name).field("type", &self.type_name);
        match &self.kind {
            ParameterKind::Dependency(key) => debug.field("dependency", key),
            ParameterKind::Value { default } => debug.field("default", &default.is_some()),
        };
        debug.finish()
    }
}
