//! Heap cells and reachability.
//!
//! Cells live in [`Arena`]s and are addressed by copyable [`Gc`] handles.
//! Collection is a plain mark/sweep driven from [`crate::vm::VM::collect`]:
//! every cell type implements [`Trace`] and reports its outgoing edges to a
//! [`Visitor`].

mod arena;

pub use arena::{Arena, Gc};

use crate::{object::Object, structure::Structure};

/// Receives the edges reported by [`Trace::trace`].
pub trait Visitor {
    fn visit_structure(&mut self, structure: Gc<Structure>);
    fn visit_object(&mut self, object: Gc<Object>);
}

/// Indicates that a type can be traced by the collector.
///
/// Implementations must report every handle they keep alive. Forgetting an
/// edge frees a reachable cell, and the next use of its handle panics.
pub trait Trace {
    fn trace(&self, visitor: &mut dyn Visitor) {
        let _ = visitor;
    }
}

impl Trace for Gc<Structure> {
    fn trace(&self, visitor: &mut dyn Visitor) {
        visitor.visit_structure(*self);
    }
}

impl Trace for Gc<Object> {
    fn trace(&self, visitor: &mut dyn Visitor) {
        visitor.visit_object(*self);
    }
}

impl<T: Trace> Trace for Option<T> {
    fn trace(&self, visitor: &mut dyn Visitor) {
        if let Some(value) = self {
            value.trace(visitor);
        }
    }
}

impl<T: Trace> Trace for [T] {
    fn trace(&self, visitor: &mut dyn Visitor) {
        for value in self {
            value.trace(visitor);
        }
    }
}

impl<T: Trace> Trace for Vec<T> {
    fn trace(&self, visitor: &mut dyn Visitor) {
        self.as_slice().trace(visitor);
    }
}

/// Counters returned by a collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GcStats {
    pub live_objects: usize,
    pub freed_objects: usize,
    pub live_structures: usize,
    pub freed_structures: usize,
}

/// Mark state for one collection cycle.
pub(crate) struct Marker {
    objects: Vec<bool>,
    structures: Vec<bool>,
    worklist: Vec<Cell>,
}

#[derive(Clone, Copy)]
pub(crate) enum Cell {
    Object(Gc<Object>),
    Structure(Gc<Structure>),
}

impl Marker {
    pub(crate) fn new(objects: usize, structures: usize) -> Self {
        Self {
            objects: vec![false; objects],
            structures: vec![false; structures],
            worklist: Vec::with_capacity(64),
        }
    }

    pub(crate) fn pop(&mut self) -> Option<Cell> {
        self.worklist.pop()
    }

    pub(crate) fn is_object_marked(&self, object: Gc<Object>) -> bool {
        self.objects.get(object.index()).copied().unwrap_or(false)
    }

    pub(crate) fn is_structure_marked(&self, structure: Gc<Structure>) -> bool {
        self.structures
            .get(structure.index())
            .copied()
            .unwrap_or(false)
    }
}

impl Visitor for Marker {
    fn visit_structure(&mut self, structure: Gc<Structure>) {
        if let Some(mark) = self.structures.get_mut(structure.index()) {
            if !*mark {
                *mark = true;
                self.worklist.push(Cell::Structure(structure));
            }
        }
    }

    fn visit_object(&mut self, object: Gc<Object>) {
        if let Some(mark) = self.objects.get_mut(object.index()) {
            if !*mark {
                *mark = true;
                self.worklist.push(Cell::Object(object));
            }
        }
    }
}
