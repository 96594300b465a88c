//! Array exotic behaviour: element access and `length` updates.

use crate::{
    attributes::object_data,
    error::{reject, Error, Result},
    indexed_elements::{Element, IndexedElements},
    object::{EnumerationMode, PropertyStore},
    property::{PropertyDescriptor, StoredSlot},
    structure::Structures,
    symbol::Symbol,
    value::{to_uint32, Value},
};

impl IndexedElements {
    pub fn get_own_indexed_property(
        &self,
        store: &PropertyStore,
        heap: &mut Structures,
        index: u32,
    ) -> Option<PropertyDescriptor> {
        match self.get(index) {
            Element::Present(value) => Some(PropertyDescriptor::default_data(value)),
            Element::Absent => None,
            Element::Fallback => store.get_own_property(heap, Symbol::Index(index)),
        }
    }

    /// Value the fast storage would hold after applying `desc`, or `None`
    /// when the element has to live in the generic store.
    fn fast_value(&self, store: &PropertyStore, heap: &mut Structures, index: u32, desc: &PropertyDescriptor) -> Option<Value> {
        if let Some(current) = self.peek(index) {
            let mut slot = StoredSlot::new_default(current.clone());
            slot.merge(desc);
            return (slot.attributes() == object_data()).then(|| slot.value().clone());
        }
        if !desc.is_default() {
            return None;
        }
        if self.sparse() && store.get(heap, Symbol::Index(index)).is_some() {
            return None;
        }
        if desc.is_data() && !desc.is_value_absent() {
            Some(desc.value().clone())
        } else {
            Some(Value::Undefined)
        }
    }

    pub fn define_own_indexed_property(
        &mut self,
        store: &mut PropertyStore,
        heap: &mut Structures,
        index: u32,
        desc: &PropertyDescriptor,
        extensible: bool,
        throwable: bool,
    ) -> Result<bool> {
        let old_len = self.length();
        if index >= old_len && !self.is_length_writable() {
            reject!(throwable, "adding an element to an array whose \"length\" is not writable");
        }

        if let Some(value) = self.fast_value(store, heap, index, desc) {
            if self.peek(index).is_none() && !extensible {
                reject!(throwable, "object not extensible");
            }
            self.store(index, value);
        } else {
            let name = Symbol::Index(index);
            if let Some(current) = self.take(index) {
                // the element keeps its identity while moving to the generic store
                self.make_sparse();
                store.define(heap, name, &PropertyDescriptor::default_data(current), true, false)?;
            }
            if !store.define(heap, name, desc, extensible, throwable)? {
                return Ok(false);
            }
            self.make_sparse();
        }

        if index >= old_len {
            self.set_length(index + 1);
        }
        Ok(true)
    }

    pub fn delete_indexed(
        &mut self,
        store: &mut PropertyStore,
        heap: &mut Structures,
        index: u32,
        throwable: bool,
    ) -> Result<bool> {
        if self.take(index).is_some() || self.dense() {
            return Ok(true);
        }
        store.delete(heap, Symbol::Index(index), throwable)
    }

    fn apply_length(&mut self, desc: &PropertyDescriptor, throwable: bool) -> Result<bool> {
        let mut slot = self.length_slot();
        if !slot.is_defined_property_accepted(desc, throwable)? {
            return Ok(false);
        }
        slot.merge(desc);
        self.set_length_slot(&slot);
        Ok(true)
    }

    /// `[[DefineOwnProperty]]("length")`. Shrinking deletes elements from the
    /// top down and stops at the first element that refuses deletion.
    pub fn define_length(
        &mut self,
        store: &mut PropertyStore,
        heap: &mut Structures,
        desc: &PropertyDescriptor,
        throwable: bool,
    ) -> Result<bool> {
        if desc.is_value_absent() {
            return self.apply_length(desc, throwable);
        }

        let number = desc.value().to_number();
        let new_len = to_uint32(number);
        if f64::from(new_len) != number {
            return Err(Error::Range(String::from("invalid array length")));
        }
        let mut new_len_desc = PropertyDescriptor::data(Value::from_u32(new_len), desc.attributes());
        let old_len = self.length();
        if new_len >= old_len {
            return self.apply_length(&new_len_desc, throwable);
        }
        if !self.is_length_writable() {
            reject!(throwable, "\"length\" not writable");
        }

        let attrs = new_len_desc.attributes();
        let new_writable = attrs.is_writable_absent() || attrs.is_writable();
        new_len_desc.set_writable(true);
        if !self.apply_length(&new_len_desc, throwable)? {
            return Ok(false);
        }

        if self.dense() {
            self.compaction_to_length(new_len);
        } else if old_len - new_len < self.shrink_scan_threshold() {
            tracing::trace!(target: "jsshape::array", old_len, new_len, "linear shrink");
            let mut index = old_len;
            while new_len < index {
                index -= 1;
                if !self.delete_indexed(store, heap, index, false)? {
                    return self.abort_shrink(index + 1, new_writable, throwable);
                }
            }
            self.compaction_to_length(new_len);
        } else {
            tracing::trace!(target: "jsshape::array", old_len, new_len, "enumerating shrink");
            let mut indices: Vec<u32> = self
                .indices()
                .into_iter()
                .chain(
                    store
                        .keys(heap, EnumerationMode::IncludeNotEnumerable)
                        .into_iter()
                        .filter_map(Symbol::as_index),
                )
                .filter(|index| *index >= new_len)
                .collect();
            indices.sort_unstable_by(|a, b| b.cmp(a));
            indices.dedup();
            for index in indices {
                if !self.delete_indexed(store, heap, index, false)? {
                    return self.abort_shrink(index + 1, new_writable, throwable);
                }
            }
            self.compaction_to_length(new_len);
        }

        if !new_writable {
            self.make_length_readonly();
        }
        Ok(true)
    }

    fn abort_shrink(&mut self, length: u32, new_writable: bool, throwable: bool) -> Result<bool> {
        tracing::debug!(target: "jsshape::array", length, "shrink stopped at undeletable element");
        self.compaction_to_length(length);
        self.set_length(length);
        if !new_writable {
            self.make_length_readonly();
        }
        reject!(throwable, "shrink array failed")
    }
}
