use std::any::Any;

pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Trait: AsAny + Send + Sync {}

    impl Trait for i32 {}

    #[test]
    fn as_any_succeeds_when_receiver_is_a_trait_object() {
        let x: Box<dyn Trait> = Box::new(42i32);

        assert_eq!((*x).as_any().downcast_ref::<i32>(), Some(&42));
        assert!((*x).as_any().downcast_ref::<u32>().is_none());
    }

    #[test]
    fn as_any_on_box_erases_the_box_itself() {
        let x: Box<dyn Trait> = Box::new(42i32);

        assert!(x.as_any().downcast_ref::<i32>().is_none());
        assert!(x.as_any().is::<Box<dyn Trait>>());
    }
}
