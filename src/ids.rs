use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Source of identifiers for fragments and ligation products.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, kind: &str) -> String;
}

/// Random v4 UUIDs; `kind` is ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self, _kind: &str) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `"{kind}-{n}"` with a counter starting at 1, shared by all kinds.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicUsize,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, kind: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{kind}-{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id("fragment"), "fragment-1");
        assert_eq!(ids.next_id("fragment"), "fragment-2");
        assert_eq!(ids.next_id("product"), "product-3");
    }

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids = UuidIds;
        let a = ids.next_id("fragment");
        let b = ids.next_id("fragment");
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
