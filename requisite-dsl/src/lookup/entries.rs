//! Entry lookup table: field identity to the entries produced for it

use crate::reference::FieldRef;
use requisite_core::{EntryHandle, FieldId, Schema};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Errors looking up the entry behind a field reference.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("No entries registered for \"{reference}\"")]
    Unregistered { reference: String },

    #[error("Reference \"{reference}\" points at a field registered with no entries")]
    NoEntries { reference: String },

    #[error("Index {index} in reference \"{reference}\" is out of bounds (expected between 0 and {max})")]
    IndexOutOfRange {
        reference: String,
        index: i32,
        max: i64,
    },
}

/// Entries produced for each field, in production order.
#[derive(Debug, Clone, Default)]
pub struct EntryTable {
    entries: HashMap<FieldId, Vec<EntryHandle>>,
}

impl EntryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entries for `field`. `None` removes the field.
    pub fn register(&mut self, field: FieldId, entries: Option<Vec<EntryHandle>>) {
        match entries {
            Some(list) => {
                self.entries.insert(field, list);
            }
            None => {
                self.entries.remove(&field);
            }
        }
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.entries.contains_key(&field)
    }

    /// Entries for `field`; empty when unregistered.
    pub fn entries(&self, field: FieldId) -> &[EntryHandle] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entry at `index`, where a negative index counts from the end.
    pub fn entry_at(&self, field: FieldId, index: i32) -> Option<&EntryHandle> {
        let list = self.entries.get(&field)?;
        let effective = if index < 0 {
            list.len() as i64 + i64::from(index)
        } else {
            i64::from(index)
        };
        usize::try_from(effective).ok().and_then(|i| list.get(i))
    }

    /// The entry `reference` points at.
    pub fn entry(&self, reference: &FieldRef) -> Result<EntryHandle, LookupError> {
        let list = self
            .entries
            .get(&reference.field)
            .ok_or_else(|| LookupError::Unregistered {
                reference: reference.original.clone(),
            })?;
        if list.is_empty() {
            return Err(LookupError::NoEntries {
                reference: reference.original.clone(),
            });
        }
        self.entry_at(reference.field, reference.index)
            .cloned()
            .ok_or_else(|| LookupError::IndexOutOfRange {
                reference: reference.original.clone(),
                index: reference.index,
                max: list.len() as i64 - 1,
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.entries.keys().copied()
    }

    /// Read-only view keyed by canonical field name.
    pub fn snapshot(&self, schema: &Schema) -> EntryTableSnapshot {
        EntryTableSnapshot {
            fields: self
                .entries
                .iter()
                .map(|(id, list)| (schema.field_key(*id), list.len()))
                .collect(),
        }
    }
}

/// Number of entries registered per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryTableSnapshot {
    pub fields: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use requisite_core::{SchemaBuilder, ValueType};
    use requisite_test_utils::MockEntry;

    fn field() -> (Schema, FieldId) {
        let mut b = SchemaBuilder::new();
        let ty = b.add_root_type("demo", "Config").unwrap();
        let f = b.add_field(ty, "toggles", ValueType::Bool).unwrap();
        (b.build(), f)
    }

    fn three() -> Vec<EntryHandle> {
        (0..3)
            .map(|i| MockEntry::boolean(format!("t{}", i), false).handle())
            .collect()
    }

    #[test]
    fn test_unregistered_is_empty() {
        let (_, f) = field();
        let table = EntryTable::new();
        assert!(table.entries(f).is_empty());
        let err = table.entry(&FieldRef::new(f).with_original("toggles")).unwrap_err();
        assert!(matches!(err, LookupError::Unregistered { .. }));
    }

    #[test]
    fn test_default_index_is_last() {
        let (_, f) = field();
        let mut table = EntryTable::new();
        let list = three();
        table.register(f, Some(list.clone()));
        assert_eq!(table.entry(&FieldRef::new(f)).unwrap(), list[2]);
        assert_eq!(table.entry(&FieldRef::new(f).with_index(0)).unwrap(), list[0]);
    }

    #[test]
    fn test_registration_replaces() {
        let (_, f) = field();
        let mut table = EntryTable::new();
        table.register(f, Some(three()));
        let single = vec![MockEntry::boolean("only", true).handle()];
        table.register(f, Some(single.clone()));
        assert_eq!(table.entries(f), single.as_slice());
        table.register(f, None);
        assert!(!table.contains(f));
    }

    #[test]
    fn test_out_of_range_reports_bounds() {
        let (_, f) = field();
        let mut table = EntryTable::new();
        table.register(f, Some(three()));
        let r = FieldRef::new(f).with_index(3).with_original("toggles[3]");
        let err = table.entry(&r).unwrap_err();
        assert_eq!(
            format!("{}", err),
            "Index 3 in reference \"toggles[3]\" is out of bounds (expected between 0 and 2)"
        );
        assert!(table.entry(&FieldRef::new(f).with_index(-4)).is_err());
    }

    #[test]
    fn test_empty_registration_reports_no_entries() {
        let (_, f) = field();
        let mut table = EntryTable::new();
        table.register(f, Some(Vec::new()));
        assert!(table.contains(f));
        let err = table.entry(&FieldRef::new(f).with_original("toggles")).unwrap_err();
        assert_eq!(err, LookupError::NoEntries { reference: "toggles".to_string() });
        let msg = format!("{}", err);
        assert_eq!(msg, "Reference \"toggles\" points at a field registered with no entries");
        assert!(!msg.contains("-1"));
    }

    #[test]
    fn test_snapshot_uses_canonical_names() {
        let (schema, f) = field();
        let mut table = EntryTable::new();
        table.register(f, Some(three()));
        let snap = table.snapshot(&schema);
        assert_eq!(snap.fields.get("demo.Config#toggles"), Some(&3));
    }
}
