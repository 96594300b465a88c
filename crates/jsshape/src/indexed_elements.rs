use std::collections::BTreeMap;

use crate::{
    attributes::{length_attributes, Attributes},
    config::Config,
    memory::{Trace, Visitor},
    property::StoredSlot,
    value::Value,
};

/// Result of a fast-path element read.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Present(Value),
    /// Definitely no own property at this index.
    Absent,
    /// Not in the fast storage; the generic property store must be consulted.
    Fallback,
}

/// Element storage of an array.
///
/// Indices below `max_vector_size` live in `vector`, larger ones in `map`.
/// Missing entries are holes ([`Value::Empty`]). While `dense` is set every
/// indexed property is a plain writable, enumerable, configurable data
/// property held here. Once an index gets any other descriptor it moves to
/// the generic property store and `dense` is cleared for good.
pub struct IndexedElements {
    pub(crate) vector: Vec<Value>,
    pub(crate) map: Option<BTreeMap<u32, Value>>,
    dense: bool,
    length: u32,
    length_attributes: Attributes,
    max_vector_size: u32,
    shrink_scan_threshold: u32,
}

impl IndexedElements {
    pub fn new(length: u32, config: &Config) -> Self {
        let holes = if length <= config.max_vector_size {
            length as usize
        } else {
            0
        };
        Self {
            vector: vec![Value::Empty; holes],
            map: None,
            dense: true,
            length,
            length_attributes: length_attributes(),
            max_vector_size: config.max_vector_size,
            shrink_scan_threshold: config.shrink_scan_threshold,
        }
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub(crate) fn set_length(&mut self, length: u32) {
        self.length = length;
    }

    pub fn is_length_writable(&self) -> bool {
        self.length_attributes.is_writable()
    }

    pub(crate) fn make_length_readonly(&mut self) {
        self.length_attributes.remove(Attributes::WRITABLE);
    }

    pub fn dense(&self) -> bool {
        self.dense
    }

    pub fn sparse(&self) -> bool {
        !self.dense
    }

    pub(crate) fn shrink_scan_threshold(&self) -> u32 {
        self.shrink_scan_threshold
    }

    pub fn max_vector_size(&self) -> u32 {
        self.max_vector_size
    }

    /// One-way switch to the mode where holes may hide generic properties.
    pub fn make_sparse(&mut self) {
        if self.dense {
            tracing::debug!(target: "jsshape::array", length = self.length, "array demoted to sparse");
        }
        self.dense = false;
    }

    /// `length` as a stored data slot.
    pub fn length_slot(&self) -> StoredSlot {
        StoredSlot::new_raw(Value::from_u32(self.length), self.length_attributes)
    }

    /// Writes back a merged `length` slot. The value must already be a valid
    /// array length.
    pub(crate) fn set_length_slot(&mut self, slot: &StoredSlot) {
        let number = slot.value().to_number();
        if number >= 0.0 && number <= f64::from(u32::MAX) {
            self.length = number as u32;
        }
        self.length_attributes = slot.attributes() & (Attributes::WRITABLE | Attributes::DATA);
        self.length_attributes.insert(Attributes::DATA);
    }

    pub fn get(&self, index: u32) -> Element {
        let found = if index < self.max_vector_size {
            self.vector.get(index as usize)
        } else {
            self.map.as_ref().and_then(|map| map.get(&index))
        };
        match found {
            Some(value) if !value.is_empty() => Element::Present(value.clone()),
            _ if self.dense => Element::Absent,
            _ => Element::Fallback,
        }
    }

    /// Value held in the fast storage, if any.
    pub fn peek(&self, index: u32) -> Option<&Value> {
        let found = if index < self.max_vector_size {
            self.vector.get(index as usize)
        } else {
            self.map.as_ref().and_then(|map| map.get(&index))
        };
        found.filter(|value| !value.is_empty())
    }

    pub fn store(&mut self, index: u32, value: Value) {
        if index < self.max_vector_size {
            let index = index as usize;
            if index >= self.vector.len() {
                self.vector.resize(index + 1, Value::Empty);
            }
            self.vector[index] = value;
        } else {
            self.map.get_or_insert_with(BTreeMap::new).insert(index, value);
        }
    }

    /// Removes the value at `index` from the fast storage.
    pub fn take(&mut self, index: u32) -> Option<Value> {
        if index < self.max_vector_size {
            let slot = self.vector.get_mut(index as usize)?;
            if slot.is_empty() {
                return None;
            }
            Some(std::mem::replace(slot, Value::Empty))
        } else {
            self.map.as_mut()?.remove(&index)
        }
    }

    /// Drops every element at or above `length`.
    pub fn compaction_to_length(&mut self, length: u32) {
        if length > self.max_vector_size {
            if let Some(map) = self.map.as_mut() {
                map.split_off(&length);
            }
        } else {
            self.map = None;
            self.vector.truncate(length as usize);
        }
    }

    /// Indices held in the fast storage, ascending.
    pub fn indices(&self) -> Vec<u32> {
        let vector = self
            .vector
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_empty())
            .map(|(index, _)| index as u32);
        let map = self.map.iter().flat_map(|map| map.keys().copied());
        vector.chain(map).collect()
    }
}

impl Trace for IndexedElements {
    fn trace(&self, visitor: &mut dyn Visitor) {
        self.vector.trace(visitor);
        if let Some(map) = &self.map {
            for value in map.values() {
                value.trace(visitor);
            }
        }
    }
}
