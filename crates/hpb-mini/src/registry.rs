//! Lookup of extensions by extended message and field number.

use hpb_arena::{Arena, ArenaConfig};
use hpb_table::StrTable;

use crate::error::MiniTableError;
use crate::extension::MiniTableExtension;
use crate::id::{MiniTableExtensionId, MiniTableId};
use crate::store::LayoutStore;

/// Initial table size.
pub const DEFAULT_REGISTRY_SIZE: usize = 8;

/// `extendee` then `number`, both little-endian.
fn registry_key(extendee: MiniTableId, number: u32) -> [u8; 8] {
    let mut key = [0u8; 8];
    key[..4].copy_from_slice(&extendee.0.to_le_bytes());
    key[4..].copy_from_slice(&number.to_le_bytes());
    key
}

/// Maps `(extendee, number)` to an extension layout.
///
/// The registry owns its arena, separate from any def pool.
#[derive(Debug)]
pub struct ExtensionRegistry {
    arena: Arena,
    table: StrTable,
}

impl ExtensionRegistry {
    /// Create a registry with the default initial size.
    pub fn new() -> Result<Self, MiniTableError> {
        Self::with_capacity(DEFAULT_REGISTRY_SIZE, &ArenaConfig::default())
    }

    /// Create a registry sized for `expected` entries.
    pub fn with_capacity(expected: usize, config: &ArenaConfig) -> Result<Self, MiniTableError> {
        let arena = Arena::with_config(config);
        let table = StrTable::new(expected, &arena)?;
        Ok(Self { arena, table })
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.table.count()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register `id`. Fails without mutation if its `(extendee, number)`
    /// pair is already taken.
    pub fn add(&mut self, id: MiniTableExtensionId, ext: &MiniTableExtension) -> Result<(), MiniTableError> {
        let key = registry_key(ext.extendee(), ext.number());
        if self.table.lookup(&key).is_some() {
            return Err(MiniTableError::DuplicateExtension {
                extendee: ext.extendee(),
                number: ext.number(),
            });
        }
        self.table.insert(&key, u64::from(id.0), &self.arena)?;
        Ok(())
    }

    /// Register every listed extension, or none of them.
    pub fn add_array<'a>(
        &mut self,
        exts: impl IntoIterator<Item = (MiniTableExtensionId, &'a MiniTableExtension)>,
    ) -> Result<(), MiniTableError> {
        let mut added: Vec<[u8; 8]> = Vec::new();
        for (id, ext) in exts {
            if let Err(e) = self.add(id, ext) {
                for key in &added {
                    self.table.remove(key);
                }
                return Err(e);
            }
            added.push(registry_key(ext.extendee(), ext.number()));
        }
        Ok(())
    }

    /// Register the listed extensions of `store`, or none of them.
    /// Ids missing from `store` are skipped.
    pub fn add_from_store(
        &mut self,
        store: &LayoutStore,
        ids: &[MiniTableExtensionId],
    ) -> Result<(), MiniTableError> {
        self.add_array(
            ids.iter()
                .filter_map(|&id| store.extension(id).map(|ext| (id, ext))),
        )
    }

    /// Unregister the extension `number` of `extendee`.
    pub fn remove(&mut self, extendee: MiniTableId, number: u32) -> Option<MiniTableExtensionId> {
        self.table
            .remove(&registry_key(extendee, number))
            .map(|v| MiniTableExtensionId(v as u32))
    }

    /// Look up the extension `number` of `extendee`.
    pub fn lookup(&self, extendee: MiniTableId, number: u32) -> Option<MiniTableExtensionId> {
        self.table
            .lookup(&registry_key(extendee, number))
            .map(|v| MiniTableExtensionId(v as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::MtDataEncoder;
    use crate::message::{MiniTable, MiniTableSub};
    use hpb_core::{FieldType, Platform};

    fn add_ext(store: &mut LayoutStore, extendee: MiniTableId, number: u32) -> MiniTableExtensionId {
        let mut buf = Vec::new();
        MtDataEncoder::new(&mut buf)
            .encode_extension(FieldType::Int32, number, 0)
            .unwrap();
        let ext = MiniTableExtension::build(
            &buf,
            extendee,
            &MiniTable::empty(),
            MiniTableSub::Message(None),
            Platform::Bits64,
        )
        .unwrap();
        store.add_extension(ext)
    }

    #[test]
    fn add_and_lookup() {
        let mut store = LayoutStore::new(Platform::Bits64);
        let a = add_ext(&mut store, MiniTableId(0), 100);
        let b = add_ext(&mut store, MiniTableId(1), 100);
        let mut reg = ExtensionRegistry::new().unwrap();
        reg.add(a, store.extension(a).unwrap()).unwrap();
        reg.add(b, store.extension(b).unwrap()).unwrap();
        assert_eq!(reg.lookup(MiniTableId(0), 100), Some(a));
        assert_eq!(reg.lookup(MiniTableId(1), 100), Some(b));
        assert_eq!(reg.lookup(MiniTableId(0), 101), None);
        assert_eq!(reg.len(), 2);

        assert_eq!(reg.remove(MiniTableId(0), 100), Some(a));
        assert_eq!(reg.remove(MiniTableId(0), 100), None);
        assert_eq!(reg.lookup(MiniTableId(1), 100), Some(b));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_is_rejected_without_mutation() {
        let mut store = LayoutStore::new(Platform::Bits64);
        let a = add_ext(&mut store, MiniTableId(0), 5);
        let dup = add_ext(&mut store, MiniTableId(0), 5);
        let mut reg = ExtensionRegistry::new().unwrap();
        reg.add(a, store.extension(a).unwrap()).unwrap();
        let err = reg.add(dup, store.extension(dup).unwrap()).unwrap_err();
        assert_eq!(
            err,
            MiniTableError::DuplicateExtension {
                extendee: MiniTableId(0),
                number: 5
            }
        );
        assert_eq!(reg.lookup(MiniTableId(0), 5), Some(a));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn add_array_is_all_or_nothing() {
        let mut store = LayoutStore::new(Platform::Bits64);
        let existing = add_ext(&mut store, MiniTableId(2), 9);
        let mut reg = ExtensionRegistry::new().unwrap();
        reg.add(existing, store.extension(existing).unwrap()).unwrap();

        let mut batch = Vec::new();
        for n in [1, 2, 3, 9] {
            batch.push(add_ext(&mut store, MiniTableId(2), n));
        }
        assert!(reg.add_from_store(&store, &batch).is_err());
        assert_eq!(reg.len(), 1);
        for n in 1..=3 {
            assert_eq!(reg.lookup(MiniTableId(2), n), None);
        }
        assert_eq!(reg.add_from_store(&store, &batch[..3]), Ok(()));
        assert_eq!(reg.len(), 4);
    }

    #[test]
    fn grows_past_initial_size() {
        let mut store = LayoutStore::new(Platform::Bits64);
        let ids: Vec<_> = (1..=200).map(|n| add_ext(&mut store, MiniTableId(0), n)).collect();
        let mut reg = ExtensionRegistry::new().unwrap();
        reg.add_from_store(&store, &ids).unwrap();
        for (n, id) in (1..=200).zip(&ids) {
            assert_eq!(reg.lookup(MiniTableId(0), n), Some(*id));
        }
    }
}
