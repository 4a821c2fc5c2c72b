//! Per-attribute value cache.
//!
//! Each driver instance owns one table with an entry per [`Attribute`]. An
//! entry becomes valid after any successful read or write of its attribute and
//! goes stale on reset, close or re-initialization, when the instrument may
//! have changed the value behind the driver's back.

use crate::attribute::{Attribute, AttributeValue};

/// Last known value of one attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheEntry {
    /// Last value written or read
    pub value: Option<AttributeValue>,
    /// `false` once the value may no longer match the instrument
    pub valid: bool,
}

/// Cache table indexed by [`Attribute::index`].
#[derive(Debug, Clone)]
pub struct AttributeCache {
    entries: Vec<CacheEntry>,
}

impl Default for AttributeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeCache {
    /// An empty table with every entry invalid.
    pub fn new() -> Self {
        Self {
            entries: vec![CacheEntry::default(); Attribute::ALL.len()],
        }
    }

    /// Store a value and mark the entry valid.
    pub fn store(&mut self, attribute: Attribute, value: AttributeValue) {
        let entry = &mut self.entries[attribute.index()];
        entry.value = Some(value);
        entry.valid = true;
    }

    /// The cached value, if the entry is valid.
    pub fn get(&self, attribute: Attribute) -> Option<&AttributeValue> {
        let entry = &self.entries[attribute.index()];
        if entry.valid {
            entry.value.as_ref()
        } else {
            None
        }
    }

    /// The raw entry for `attribute`.
    pub fn entry(&self, attribute: Attribute) -> &CacheEntry {
        &self.entries[attribute.index()]
    }

    /// Whether the entry for `attribute` is valid.
    pub fn is_valid(&self, attribute: Attribute) -> bool {
        self.entries[attribute.index()].valid
    }

    /// Mark one entry stale, keeping the old value for diagnostics.
    pub fn invalidate(&mut self, attribute: Attribute) {
        self.entries[attribute.index()].valid = false;
    }

    /// Mark every entry stale. Last known values are kept for inspection.
    pub fn invalidate_all(&mut self) {
        for entry in &mut self.entries {
            entry.valid = false;
        }
    }
}
