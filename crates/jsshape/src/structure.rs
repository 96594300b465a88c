//! Hidden classes.
//!
//! A [`Structure`] maps property names to slot offsets. Shared structures form
//! a transition tree: adding the same name to the same structure always
//! yields the same child, so objects built the same way end up with the same
//! structure and identical slot layout. Children only record the single
//! `(name, offset)` pair they add; the full table is rebuilt from the
//! `previous` chain the first time somebody needs random access.
//!
//! Unique structures belong to exactly one object and are edited in place.

use std::ops::Index;

use fxhash::FxHashMap;

use crate::{
    memory::{Arena, Gc, Trace, Visitor},
    symbol::Symbol,
};

pub type StructureId = u32;

pub type TargetTable = FxHashMap<Symbol, u32>;

/// Children reachable from a shared structure by adding a property.
pub enum TransitionsTable {
    None,
    Pair(Symbol, Gc<Structure>),
    Table(FxHashMap<Symbol, Gc<Structure>>),
}

impl TransitionsTable {
    pub fn find(&self, name: Symbol) -> Option<Gc<Structure>> {
        match self {
            Self::None => None,
            Self::Pair(key, child) => (*key == name).then_some(*child),
            Self::Table(table) => table.get(&name).copied(),
        }
    }

    pub fn insert(&mut self, name: Symbol, child: Gc<Structure>) {
        match self {
            Self::None => *self = Self::Pair(name, child),
            Self::Pair(key, existing) => {
                let mut table = FxHashMap::default();
                table.insert(*key, *existing);
                table.insert(name, child);
                *self = Self::Table(table);
            }
            Self::Table(table) => {
                table.insert(name, child);
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Pair(..) => 1,
            Self::Table(table) => table.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Trace for TransitionsTable {
    fn trace(&self, visitor: &mut dyn Visitor) {
        match self {
            Self::None => (),
            Self::Pair(_, child) => visitor.visit_structure(*child),
            Self::Table(table) => {
                for child in table.values() {
                    visitor.visit_structure(*child);
                }
            }
        }
    }
}

pub enum StructureKind {
    /// Owned by a single object; mutated in place.
    Unique,
    /// Immutable once created, shared through the transition cache.
    Shared(TransitionsTable),
}

/// Freed slot offsets; the most recently freed slot is reused first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeletedSlots(Vec<u32>);

impl DeletedSlots {
    pub fn push(&mut self, offset: u32) {
        self.0.push(offset);
    }

    pub fn pop(&mut self) -> Option<u32> {
        self.0.pop()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

pub struct Structure {
    id: StructureId,
    kind: StructureKind,
    table: Option<TargetTable>,
    deleted: DeletedSlots,
    added: Option<(Symbol, u32)>,
    previous: Option<Gc<Structure>>,
    /// Slot count of a structure that has not materialized its table yet.
    calculated_size: u32,
}

impl Structure {
    pub fn id(&self) -> StructureId {
        self.id
    }

    pub fn is_unique(&self) -> bool {
        matches!(self.kind, StructureKind::Unique)
    }

    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    pub fn is_adding_map(&self) -> bool {
        self.added.is_some()
    }

    pub fn added(&self) -> Option<(Symbol, u32)> {
        self.added
    }

    pub fn previous(&self) -> Option<Gc<Structure>> {
        self.previous
    }

    pub fn deleted(&self) -> &DeletedSlots {
        &self.deleted
    }

    pub fn transition_count(&self) -> usize {
        match &self.kind {
            StructureKind::Unique => 0,
            StructureKind::Shared(transitions) => transitions.len(),
        }
    }

    pub fn get_slots_size(&self) -> u32 {
        match &self.table {
            Some(table) => (table.len() + self.deleted.len()) as u32,
            None => self.calculated_size,
        }
    }
}

impl Trace for Structure {
    fn trace(&self, visitor: &mut dyn Visitor) {
        if let StructureKind::Shared(transitions) = &self.kind {
            transitions.trace(visitor);
        }
        self.previous.trace(visitor);
    }
}

/// Structure heap.
pub struct Structures {
    pub(crate) arena: Arena<Structure>,
    next_id: StructureId,
    slot_capacity: usize,
}

impl Structures {
    pub fn new(slot_capacity: usize) -> Self {
        Self {
            arena: Arena::new(),
            next_id: 0,
            slot_capacity: slot_capacity.max(1),
        }
    }

    fn next_id(&mut self) -> StructureId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn alloc(&mut self, mut structure: Structure) -> Gc<Structure> {
        structure.id = self.next_id();
        self.arena.alloc(structure)
    }

    /// Root of a transition tree.
    pub fn new_empty(&mut self) -> Gc<Structure> {
        self.alloc(Structure {
            id: 0,
            kind: StructureKind::Shared(TransitionsTable::None),
            table: None,
            deleted: DeletedSlots::default(),
            added: None,
            previous: None,
            calculated_size: 0,
        })
    }

    pub fn new_unique(&mut self) -> Gc<Structure> {
        self.alloc(Structure {
            id: 0,
            kind: StructureKind::Unique,
            table: Some(TargetTable::default()),
            deleted: DeletedSlots::default(),
            added: None,
            previous: None,
            calculated_size: 0,
        })
    }

    /// Unique copy of `previous` with the same slot layout.
    pub fn new_unique_from(&mut self, previous: Gc<Structure>) -> Gc<Structure> {
        let table = previous.materialized_table(self);
        let deleted = self.arena[previous].deleted.clone();
        let calculated_size = self.arena[previous].get_slots_size();
        self.alloc(Structure {
            id: 0,
            kind: StructureKind::Unique,
            table: Some(table),
            deleted,
            added: None,
            previous: None,
            calculated_size,
        })
    }

    pub fn get(&self, structure: Gc<Structure>) -> Option<&Structure> {
        self.arena.get(structure)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

impl Index<Gc<Structure>> for Structures {
    type Output = Structure;

    fn index(&self, structure: Gc<Structure>) -> &Structure {
        &self.arena[structure]
    }
}

impl Gc<Structure> {
    /// Builds this structure's full table from the `previous` chain and caches
    /// it. The chain link is dropped afterwards.
    pub fn allocate_table(self, heap: &mut Structures) {
        if heap.arena[self].has_table() {
            return;
        }
        let table = self.materialized_table(heap);
        tracing::trace!(
            target: "jsshape::structure",
            id = heap.arena[self].id,
            properties = table.len(),
            "materialized table"
        );
        let structure = &mut heap.arena[self];
        structure.table = Some(table);
        structure.previous = None;
    }

    /// Full table without caching it on `self`.
    fn materialized_table(self, heap: &Structures) -> TargetTable {
        let mut stack = Vec::with_capacity(4);
        let mut current = Some(self);
        let mut table = None;
        while let Some(structure) = current {
            let structure = &heap.arena[structure];
            if let Some(existing) = &structure.table {
                table = Some(existing.clone());
                break;
            }
            if let Some(added) = structure.added {
                stack.push(added);
            }
            current = structure.previous;
        }
        let mut table = table.unwrap_or_default();
        for (name, offset) in stack.into_iter().rev() {
            table.insert(name, offset);
        }
        table
    }

    /// Slot offset of `name`, materializing the table if needed.
    pub fn get(self, heap: &mut Structures, name: Symbol) -> Option<u32> {
        let structure = &heap.arena[self];
        if !structure.has_table() {
            if structure.previous.is_none() {
                return structure.added.filter(|(key, _)| *key == name).map(|(_, offset)| offset);
            }
            if let Some((key, offset)) = structure.added {
                if key == name {
                    return Some(offset);
                }
            }
            self.allocate_table(heap);
        }
        heap.arena[self]
            .table
            .as_ref()
            .and_then(|table| table.get(&name).copied())
    }

    pub fn get_slots_size(self, heap: &Structures) -> u32 {
        heap.arena[self].get_slots_size()
    }

    /// Returns the structure for an object that gains `name`, plus the slot
    /// offset assigned to it. `name` must not be present yet.
    pub fn add_property_transition(self, heap: &mut Structures, name: Symbol) -> (Gc<Structure>, u32) {
        if heap.arena[self].is_unique() {
            self.allocate_table(heap);
            let size = self.get_slots_size(heap);
            let structure = &mut heap.arena[self];
            let offset = structure.deleted.pop().unwrap_or(size);
            if let Some(table) = structure.table.as_mut() {
                debug_assert!(!table.contains_key(&name));
                table.insert(name, offset);
            }
            tracing::trace!(target: "jsshape::structure", id = structure.id, ?name, offset, "unique add");
            return (self, offset);
        }

        let cached = match &heap.arena[self].kind {
            StructureKind::Shared(transitions) => transitions.find(name),
            StructureKind::Unique => None,
        };
        if let Some(child) = cached {
            if let Some((_, offset)) = heap.arena[child].added {
                tracing::trace!(target: "jsshape::structure", cache_hit = true, ?name, offset);
                return (child, offset);
            }
        }

        let size = self.get_slots_size(heap);
        let mut deleted = heap.arena[self].deleted.clone();
        let (offset, calculated_size) = match deleted.pop() {
            Some(reused) => (reused, size),
            None => (size, size + 1),
        };
        let child = heap.alloc(Structure {
            id: 0,
            kind: StructureKind::Shared(TransitionsTable::None),
            table: None,
            deleted,
            added: Some((name, offset)),
            previous: Some(self),
            calculated_size,
        });
        if let StructureKind::Shared(transitions) = &mut heap.arena[self].kind {
            transitions.insert(name, child);
        }
        tracing::trace!(target: "jsshape::structure", cache_hit = false, ?name, offset, "new transition");
        (child, offset)
    }

    /// Returns the structure for an object that loses `name`. Shared
    /// structures fork a fresh child that is never entered into the
    /// transition cache.
    pub fn delete_property_transition(self, heap: &mut Structures, name: Symbol) -> Gc<Structure> {
        self.allocate_table(heap);
        if heap.arena[self].is_unique() {
            let id = heap.next_id();
            let structure = &mut heap.arena[self];
            if let Some(offset) = structure.table.as_mut().and_then(|table| table.remove(&name)) {
                structure.deleted.push(offset);
                // new identity so caches keyed on the old layout miss
                structure.id = id;
                tracing::trace!(target: "jsshape::structure", id, ?name, offset, "unique delete");
            }
            return self;
        }

        let parent = &heap.arena[self];
        let mut table = parent.table.clone().unwrap_or_default();
        let Some(offset) = table.remove(&name) else {
            return self;
        };
        let mut deleted = parent.deleted.clone();
        deleted.push(offset);
        let calculated_size = parent.get_slots_size();
        let child = heap.alloc(Structure {
            id: 0,
            kind: StructureKind::Shared(TransitionsTable::None),
            table: Some(table),
            deleted,
            added: None,
            previous: None,
            calculated_size,
        });
        tracing::trace!(target: "jsshape::structure", ?name, offset, "delete fork");
        child
    }

    /// Turns a unique structure into a shared one with an empty transition
    /// cache. Shared structures are left alone.
    pub fn make_transitionable(self, heap: &mut Structures) {
        let structure = &mut heap.arena[self];
        if structure.is_unique() {
            structure.kind = StructureKind::Shared(TransitionsTable::None);
        }
    }

    /// `(name, offset)` pairs ordered by offset.
    pub fn own_property_names(self, heap: &mut Structures) -> Vec<(Symbol, u32)> {
        self.allocate_table(heap);
        let mut names: Vec<(Symbol, u32)> = heap.arena[self]
            .table
            .iter()
            .flat_map(|table| table.iter().map(|(name, offset)| (*name, *offset)))
            .collect();
        names.sort_unstable_by_key(|(_, offset)| *offset);
        names
    }

    /// Slot vector length an object with this structure should reserve.
    pub fn storage_capacity(self, heap: &Structures) -> usize {
        let size = self.get_slots_size(heap) as usize;
        if size <= heap.slot_capacity {
            heap.slot_capacity
        } else {
            size.next_power_of_two()
        }
    }
}
