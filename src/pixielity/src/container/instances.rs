use std::collections::HashMap;

use crate::instance::Instance;
use crate::key::Key;

/// Resolved shared objects, keyed by the abstract they were resolved for.
#[derive(Debug, Default)]
pub(crate) struct InstanceCache {
    instances: HashMap<Box<dyn Key>, Instance>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &dyn Key) -> Option<Instance> {
        self.instances.get(key).cloned()
    }

    pub fn insert(&mut self, key: Box<dyn Key>, instance: Instance) -> Option<Instance> {
        self.instances.insert(key, instance)
    }

    pub fn contains(&self, key: &dyn Key) -> bool {
        self.instances.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::key;

    use super::*;

    #[test]
    fn instance_cache_get_succeeds() {
        let mut cache = InstanceCache::new();
        let instance = Instance::new(Arc::new(String::from("pixielity")));
        cache.insert(Box::new(key::named::<String>("app.name")), instance.clone());

        let cached = cache.get(&key::named::<String>("app.name")).unwrap();
        assert!(cached.ptr_eq(&instance));
        assert!(cache.contains(&key::named::<String>("app.name")));
        assert!(cache.get(&key::of::<String>()).is_none());
    }

    #[test]
    fn instance_cache_insert_replaces_previous_instance() {
        let mut cache = InstanceCache::new();
        let first = Instance::new(Arc::new(1u8));
        let second = Instance::new(Arc::new(2u8));

        assert!(cache.insert(Box::new(key::of::<u8>()), first.clone()).is_none());
        let replaced = cache.insert(Box::new(key::of::<u8>()), second).unwrap();

        assert!(replaced.ptr_eq(&first));
        assert_eq!(cache.get(&key::of::<u8>()).unwrap().downcast::<u8>().as_deref(), Some(&2));
    }
}
