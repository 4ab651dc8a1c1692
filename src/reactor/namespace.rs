//! Per-context namespace storage.
//!
//! Each statement context owns one ordered map per [`NamespaceKind`] it
//! contributes to. Lookup shadows outward: a name is searched in the
//! starting context, then up the parent chain; crossing include/import
//! edges at the module root is the build state's job (it needs the linker).

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::arena::CtxId;
use crate::registry::NamespaceKind;

/// Namespace maps owned by one statement context.
#[derive(Clone, Debug, Default)]
pub struct NamespaceStore {
    maps: FxHashMap<NamespaceKind, IndexMap<SmolStr, CtxId>>,
}

impl NamespaceStore {
    pub fn get(&self, ns: NamespaceKind, name: &str) -> Option<CtxId> {
        self.maps.get(&ns).and_then(|m| m.get(name)).copied()
    }

    /// Insert, rejecting duplicates. Returns the previous holder on clash.
    pub fn insert_unique(
        &mut self,
        ns: NamespaceKind,
        name: SmolStr,
        value: CtxId,
    ) -> Result<(), CtxId> {
        let map = self.maps.entry(ns).or_default();
        if let Some(existing) = map.get(&name) {
            return Err(*existing);
        }
        map.insert(name, value);
        Ok(())
    }

    /// Remove one entry, returning it if present.
    pub fn remove(&mut self, ns: NamespaceKind, name: &str) -> Option<CtxId> {
        self.maps.get_mut(&ns).and_then(|m| m.shift_remove(name))
    }

    /// All entries of one namespace, in insertion order.
    pub fn iter(&self, ns: NamespaceKind) -> impl Iterator<Item = (&SmolStr, CtxId)> {
        self.maps
            .get(&ns)
            .into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k, *v)))
    }

    pub fn clear(&mut self) {
        self.maps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_unique_rejects_duplicates() {
        let mut store = NamespaceStore::default();
        let a = CtxId::from_raw(1);
        let b = CtxId::from_raw(2);
        assert!(store
            .insert_unique(NamespaceKind::Grouping, SmolStr::new("g"), a)
            .is_ok());
        assert_eq!(
            store.insert_unique(NamespaceKind::Grouping, SmolStr::new("g"), b),
            Err(a)
        );
        // Same name in a different namespace is fine.
        assert!(store
            .insert_unique(NamespaceKind::Typedef, SmolStr::new("g"), b)
            .is_ok());
    }

    #[test]
    fn test_iteration_is_insertion_ordered() {
        let mut store = NamespaceStore::default();
        for (i, name) in ["zebra", "alpha", "mango"].iter().enumerate() {
            store
                .insert_unique(
                    NamespaceKind::Feature,
                    SmolStr::new(name),
                    CtxId::from_raw(i as u32),
                )
                .unwrap();
        }
        let names: Vec<_> = store
            .iter(NamespaceKind::Feature)
            .map(|(n, _)| n.as_str().to_owned())
            .collect();
        assert_eq!(names, vec!["zebra", "alpha", "mango"]);
    }
}
