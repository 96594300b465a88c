use std::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    ops::{Index, IndexMut},
};

/// Handle to a cell stored in an [`Arena`].
///
/// Handles are plain indices tagged with the generation of the slot they were
/// allocated in, so a handle that outlives its cell is detected instead of
/// silently aliasing whatever was allocated in the same slot afterwards.
pub struct Gc<T> {
    index: u32,
    generation: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> Gc<T> {
    fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            marker: PhantomData,
        }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn ptr_eq(a: Self, b: Self) -> bool {
        a == b
    }
}

impl<T> Copy for Gc<T> {}
impl<T> Clone for Gc<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Gc<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Gc<T> {}

impl<T> Hash for Gc<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Gc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gc({}#{})", self.index, self.generation)
    }
}

struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot allocator for one kind of heap cell.
///
/// Freed slots are recycled through a free list; every recycle bumps the slot
/// generation.
pub struct Arena<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn alloc(&mut self, value: T) -> Gc<T> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.value = Some(value);
            return Gc::new(index, entry.generation);
        }
        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            value: Some(value),
        });
        Gc::new(index, 0)
    }

    pub fn get(&self, handle: Gc<T>) -> Option<&T> {
        self.entries
            .get(handle.index())
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Gc<T>) -> Option<&mut T> {
        self.entries
            .get_mut(handle.index())
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.value.as_mut())
    }

    pub fn contains(&self, handle: Gc<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live cells.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Upper bound (exclusive) of [`Gc::index`] for handles from this arena.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn handles(&self) -> impl Iterator<Item = Gc<T>> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.value.is_some())
            .map(|(index, entry)| Gc::new(index as u32, entry.generation))
    }

    /// Frees every live cell for which `keep` returns false. Returns the number
    /// of freed cells.
    pub fn retain(&mut self, mut keep: impl FnMut(Gc<T>) -> bool) -> usize {
        let mut freed = 0;
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.value.is_none() {
                continue;
            }
            if keep(Gc::new(index as u32, entry.generation)) {
                continue;
            }
            entry.value = None;
            entry.generation = entry.generation.wrapping_add(1);
            self.free.push(index as u32);
            freed += 1;
        }
        self.len -= freed;
        freed
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Gc<T>> for Arena<T> {
    type Output = T;

    fn index(&self, handle: Gc<T>) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("use of freed heap cell {:?}", handle),
        }
    }
}

impl<T> IndexMut<Gc<T>> for Arena<T> {
    fn index_mut(&mut self, handle: Gc<T>) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("use of freed heap cell {:?}", handle),
        }
    }
}
