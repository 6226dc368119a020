//! Identifier generation for new records.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Produces globally unique record ids
pub trait IdGenerator {
    fn new_id(&self) -> String;
}

/// Collision-resistant cuid2 ids
#[derive(Debug, Clone, Copy, Default)]
pub struct Cuid2Generator;

impl IdGenerator for Cuid2Generator {
    fn new_id(&self) -> String {
        cuid2::create_id()
    }
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Predictable `prefix-N` ids for tests and fixtures
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn new_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}
