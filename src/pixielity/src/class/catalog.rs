//! The process-wide class catalog.
//!
//! Every type annotated with [`injectable`](crate::injectable) adds an entry
//! to [`CLASSES`] at link time. The catalog is indexed by class key on first
//! lookup.

use std::collections::HashMap;
use std::sync::OnceLock;

use linkme::distributed_slice;
use tracing::{debug, warn};

use crate::class::Class;
use crate::key::Key;

#[distributed_slice]
pub static CLASSES: [fn() -> Class] = [..];

static CATALOG: OnceLock<HashMap<Box<dyn Key>, Class>> = OnceLock::new();

/// Looks up the class registered for `key`.
pub fn find(key: &dyn Key) -> Option<&'static Class> {
    catalog().get(key)
}

pub fn classes() -> impl Iterator<Item = &'static Class> {
    catalog().values()
}

fn catalog() -> &'static HashMap<Box<dyn Key>, Class> {
    CATALOG.get_or_init(|| {
        let mut classes = HashMap::with_capacity(CLASSES.len());
        for register in CLASSES {
            let class = register();
            let key = class.key().dyn_clone();
            if let Some(previous) = classes.insert(key, class) {
                warn!(class = previous.name(), "class registered more than once");
            }
        }
        debug!(count = classes.len(), "indexed class catalog");
        classes
    })
}
