use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use ciphertext::{Ciphertext, FheUintType, Handle};

#[derive(Debug, Clone)]
pub struct VerifiedCiphertext {
    ciphertext: Arc<Ciphertext>,
    depths: BTreeSet<usize>,
}

impl VerifiedCiphertext {
    pub fn ciphertext(&self) -> &Arc<Ciphertext> {
        &self.ciphertext
    }

    pub fn is_verified_at(&self, depth: usize) -> bool {
        self.depths.contains(&depth)
    }
}

/// Handle to ciphertext mapping owned by one execution context.
///
/// Entries are keyed by content hash and never replaced once inserted; only
/// the set of call depths at which a handle is visible changes.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<Handle, VerifiedCiphertext>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Makes `ciphertext` visible at `depth` under its content hash, which is
    /// returned. Re-importing identical content only adds the depth.
    pub fn import(&mut self, ciphertext: Ciphertext, depth: usize) -> Handle {
        let handle = ciphertext.content_hash();
        self.entries
            .entry(handle)
            .or_insert_with(|| VerifiedCiphertext {
                ciphertext: Arc::new(ciphertext),
                depths: BTreeSet::new(),
            })
            .depths
            .insert(depth);
        handle
    }

    pub fn get(&self, handle: &Handle, depth: usize) -> Option<Arc<Ciphertext>> {
        self.entries
            .get(handle)
            .filter(|entry| entry.is_verified_at(depth))
            .map(|entry| entry.ciphertext.clone())
    }

    pub fn fhe_type(&self, handle: &Handle, depth: usize) -> Option<FheUintType> {
        self.entries
            .get(handle)
            .filter(|entry| entry.is_verified_at(depth))
            .map(|entry| entry.ciphertext.fhe_type())
    }

    pub fn contains(&self, handle: &Handle, depth: usize) -> bool {
        self.fhe_type(handle, depth).is_some()
    }

    /// Delegates an already verified handle to another call depth. Returns
    /// false when the handle is unknown.
    pub fn verify_at_depth(&mut self, handle: &Handle, depth: usize) -> bool {
        match self.entries.get_mut(handle) {
            Some(entry) => {
                entry.depths.insert(depth);
                true
            }
            None => false,
        }
    }

    /// Called when the frame at `depth` returns.
    pub fn retire_depth(&mut self, depth: usize) {
        self.entries.retain(|_, entry| {
            entry.depths.remove(&depth);
            !entry.depths.is_empty()
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ct(byte: u8) -> Ciphertext {
        Ciphertext::new(FheUintType::FheUint8, vec![byte])
    }

    #[test]
    fn handles_are_only_visible_at_their_depth() {
        let mut registry = Registry::new();
        let c = ct(1);
        let h = registry.import(c, 1);
        assert!(registry.contains(&h, 1));
        assert!(registry.get(&h, 2).is_none());

        assert!(registry.verify_at_depth(&h, 2));
        assert!(registry.contains(&h, 2));
        assert!(!registry.verify_at_depth(&Handle([9u8; 32]), 2));
    }

    #[test]
    fn retiring_a_depth_drops_orphaned_entries() {
        let mut registry = Registry::new();
        let a = ct(1);
        let b = ct(2);
        let ha = registry.import(a, 1);
        let hb = registry.import(b, 2);
        registry.verify_at_depth(&ha, 2);

        registry.retire_depth(2);
        assert!(registry.contains(&ha, 1));
        assert!(!registry.contains(&ha, 2));
        assert!(registry.get(&hb, 2).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reimport_keeps_original_entry() {
        let mut registry = Registry::new();
        let a = ct(1);
        let h = a.content_hash();
        assert_eq!(registry.import(a.clone(), 1), h);
        assert_eq!(registry.import(a, 3), h);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&h, 1));
        assert!(registry.contains(&h, 3));
    }

    #[test]
    fn handles_always_match_content_hash() {
        let mut registry = Registry::new();
        let c = ct(4);
        let expected = c.content_hash();
        let h = registry.import(c, 1);
        assert_eq!(h, expected);
        assert!(registry.get(&Handle([7u8; 32]), 1).is_none());
        let stored = registry.get(&h, 1).unwrap();
        assert_eq!(stored.content_hash(), h);
    }
}
