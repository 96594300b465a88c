use crate::{
    attributes::Attributes,
    error::{reject, Result},
    indexed_elements::IndexedElements,
    memory::{Gc, Trace, Visitor},
    property::{PropertyDescriptor, StoredSlot},
    structure::{Structure, Structures},
    symbol::Symbol,
    value::Value,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnumerationMode {
    ExcludeNotEnumerable,
    IncludeNotEnumerable,
}

/// Named properties of an object: a structure plus the slots it indexes.
pub struct PropertyStore {
    pub(crate) structure: Gc<Structure>,
    pub(crate) slots: Vec<StoredSlot>,
}

fn vacant_slot() -> StoredSlot {
    StoredSlot::new_raw(Value::Empty, Attributes::empty())
}

impl PropertyStore {
    pub fn new(structure: Gc<Structure>, heap: &Structures) -> Self {
        let capacity = structure.storage_capacity(heap);
        Self {
            structure,
            slots: vec![vacant_slot(); capacity],
        }
    }

    pub fn structure(&self) -> Gc<Structure> {
        self.structure
    }

    pub fn get(&self, heap: &mut Structures, name: Symbol) -> Option<&StoredSlot> {
        let offset = self.structure.get(heap, name)?;
        self.slots.get(offset as usize)
    }

    pub fn get_mut(&mut self, heap: &mut Structures, name: Symbol) -> Option<&mut StoredSlot> {
        let offset = self.structure.get(heap, name)?;
        self.slots.get_mut(offset as usize)
    }

    pub fn get_own_property(&self, heap: &mut Structures, name: Symbol) -> Option<PropertyDescriptor> {
        self.get(heap, name).map(StoredSlot::to_descriptor)
    }

    /// `[[DefineOwnProperty]]` for the generic store.
    pub fn define(
        &mut self,
        heap: &mut Structures,
        name: Symbol,
        desc: &PropertyDescriptor,
        extensible: bool,
        throwable: bool,
    ) -> Result<bool> {
        if let Some(slot) = self.get_mut(heap, name) {
            if !slot.is_defined_property_accepted(desc, throwable)? {
                return Ok(false);
            }
            slot.merge(desc);
            return Ok(true);
        }
        if !extensible {
            reject!(throwable, "object not extensible");
        }
        let (structure, offset) = self.structure.add_property_transition(heap, name);
        self.structure = structure;
        let offset = offset as usize;
        if offset >= self.slots.len() {
            let capacity = structure.storage_capacity(heap).max(offset + 1);
            self.slots.resize(capacity, vacant_slot());
        }
        self.slots[offset] = StoredSlot::new(desc);
        Ok(true)
    }

    pub fn delete(&mut self, heap: &mut Structures, name: Symbol, throwable: bool) -> Result<bool> {
        let Some(offset) = self.structure.get(heap, name) else {
            return Ok(true);
        };
        let offset = offset as usize;
        if !self.slots[offset].attributes().is_configurable() {
            reject!(throwable, "delete failed");
        }
        self.structure = self.structure.delete_property_transition(heap, name);
        self.slots[offset] = vacant_slot();
        Ok(true)
    }

    /// Own keys in slot order.
    pub fn keys(&self, heap: &mut Structures, mode: EnumerationMode) -> Vec<Symbol> {
        self.structure
            .own_property_names(heap)
            .into_iter()
            .filter(|(_, offset)| {
                mode == EnumerationMode::IncludeNotEnumerable
                    || self
                        .slots
                        .get(*offset as usize)
                        .map_or(false, |slot| slot.attributes().is_enumerable())
            })
            .map(|(name, _)| name)
            .collect()
    }
}

impl Trace for PropertyStore {
    fn trace(&self, visitor: &mut dyn Visitor) {
        self.structure.trace(visitor);
        self.slots.trace(visitor);
    }
}

pub enum ObjectKind {
    Ordinary,
    Array(IndexedElements),
}

pub struct Object {
    pub(crate) store: PropertyStore,
    pub(crate) kind: ObjectKind,
    pub(crate) prototype: Option<Gc<Object>>,
    pub(crate) extensible: bool,
}

impl Object {
    pub fn new(store: PropertyStore, kind: ObjectKind, prototype: Option<Gc<Object>>) -> Self {
        Self {
            store,
            kind,
            prototype,
            extensible: true,
        }
    }

    pub fn structure(&self) -> Gc<Structure> {
        self.store.structure
    }

    pub fn prototype(&self) -> Option<Gc<Object>> {
        self.prototype
    }

    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array(_))
    }

    pub fn elements(&self) -> Option<&IndexedElements> {
        match &self.kind {
            ObjectKind::Array(elements) => Some(elements),
            ObjectKind::Ordinary => None,
        }
    }

    pub fn get_own_property(&self, heap: &mut Structures, name: Symbol) -> Option<PropertyDescriptor> {
        match (&self.kind, name) {
            (ObjectKind::Array(elements), Symbol::Index(index)) if index != u32::MAX => {
                elements.get_own_indexed_property(&self.store, heap, index)
            }
            (ObjectKind::Array(elements), Symbol::LENGTH) => Some(elements.length_slot().to_descriptor()),
            _ => self.store.get_own_property(heap, name),
        }
    }

    pub fn define_own_property(
        &mut self,
        heap: &mut Structures,
        name: Symbol,
        desc: &PropertyDescriptor,
        throwable: bool,
    ) -> Result<bool> {
        match (&mut self.kind, name) {
            (ObjectKind::Array(elements), Symbol::Index(index)) if index != u32::MAX => elements
                .define_own_indexed_property(
                    &mut self.store,
                    heap,
                    index,
                    desc,
                    self.extensible,
                    throwable,
                ),
            (ObjectKind::Array(elements), Symbol::LENGTH) => elements.define_length(&mut self.store, heap, desc, throwable),
            _ => self.store.define(heap, name, desc, self.extensible, throwable),
        }
    }

    pub fn delete(&mut self, heap: &mut Structures, name: Symbol, throwable: bool) -> Result<bool> {
        match (&mut self.kind, name) {
            (ObjectKind::Array(elements), Symbol::Index(index)) if index != u32::MAX => {
                elements.delete_indexed(&mut self.store, heap, index, throwable)
            }
            (ObjectKind::Array(_), Symbol::LENGTH) => {
                reject!(throwable, "delete failed")
            }
            _ => self.store.delete(heap, name, throwable),
        }
    }

    /// Array objects list `length`, then indices in ascending order, then the
    /// remaining keys in slot order.
    pub fn get_own_property_names(&self, heap: &mut Structures, mode: EnumerationMode) -> Vec<Symbol> {
        let ObjectKind::Array(elements) = &self.kind else {
            return self.store.keys(heap, mode);
        };
        let mut names = Vec::new();
        if mode == EnumerationMode::IncludeNotEnumerable || elements.length_slot().attributes().is_enumerable() {
            names.push(Symbol::LENGTH);
        }
        let mut indices = elements.indices();
        let mut named = Vec::new();
        for name in self.store.keys(heap, mode) {
            match name {
                Symbol::Index(index) => indices.push(index),
                _ => named.push(name),
            }
        }
        indices.sort_unstable();
        indices.dedup();
        names.extend(indices.into_iter().map(Symbol::Index));
        names.extend(named);
        names
    }
}

impl Trace for Object {
    fn trace(&self, visitor: &mut dyn Visitor) {
        self.store.trace(visitor);
        if let ObjectKind::Array(elements) = &self.kind {
            elements.trace(visitor);
        }
        self.prototype.trace(visitor);
    }
}
