use std::sync::Arc;

use pixielity::prelude::*;

pub trait Cache: Send + Sync {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Primary,
}

pub struct Store {
    pub cache: Arc<dyn Cache>,
    pub sessions: Arc<dyn Cache>,
    pub mirror: Arc<dyn Cache>,
    pub ttl: u64,
    pub prefix: String,
}

#[injectable]
impl Store {
    #[inject]
    pub fn new(
        cache: Arc<dyn Cache>,
        #[named("sessions")] sessions: Arc<dyn Cache>,
        #[qualified(Region::Primary)] mirror: std::sync::Arc<dyn Cache>,
        #[default(60)] ttl: u64,
        #[default] prefix: String,
    ) -> Self {
        Self {
            cache,
            sessions,
            mirror,
            ttl,
            prefix,
        }
    }

    pub fn helper(&self) -> u64 {
        self.ttl
    }
}

fn main() {}
