use std::any::Any;
use std::hash::{Hash, Hasher};

/// Object-safe equality and hashing, so that `dyn Key` can be used as a map
/// key. Values of different concrete types never compare equal.
pub trait DynHash: Any {
    fn dyn_eq(&self, other: &dyn Any) -> bool;

    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T: Eq + Hash + 'static> DynHash for T {
    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        self.type_id().hash(&mut state);
        self.hash(&mut state);
    }
}

#[cfg(test)]
mod tests {
    use std::hash::DefaultHasher;

    use super::*;

    #[derive(PartialEq, Eq, Hash)]
    struct Named(&'static str);

    #[derive(PartialEq, Eq, Hash)]
    struct Other(&'static str);

    #[test]
    fn dyn_eq_succeeds() {
        let logger = Named("logger");
        assert!(logger.dyn_eq(&Named("logger")));
        assert!(!logger.dyn_eq(&Named("cache")));
        assert!(!logger.dyn_eq(&Other("logger")));
    }

    #[test]
    fn dyn_hash_distinguishes_types_with_equal_payload() {
        assert_eq!(hash_val(&Named("logger")), hash_val(&Named("logger")));
        assert_ne!(hash_val(&Named("logger")), hash_val(&Other("logger")));
    }

    fn hash_val(val: &dyn DynHash) -> u64 {
        let mut hasher = DefaultHasher::new();
        val.dyn_hash(&mut hasher);
        hasher.finish()
    }
}
