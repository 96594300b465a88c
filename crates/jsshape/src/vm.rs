use crate::{
    config::Config,
    error::Result,
    indexed_elements::IndexedElements,
    memory::{Arena, Cell, Gc, GcStats, Marker, Trace, Visitor},
    object::{EnumerationMode, Object, ObjectKind, PropertyStore},
    property::PropertyDescriptor,
    structure::{Structure, Structures},
    symbol::{Symbol, SymbolTable},
};

/// Owns every object and structure plus the symbol table.
pub struct VM {
    config: Config,
    pub(crate) structures: Structures,
    pub(crate) objects: Arena<Object>,
    symbols: SymbolTable,
    empty_structure: Gc<Structure>,
    array_structure: Gc<Structure>,
}

impl VM {
    pub fn new(config: Config) -> Self {
        let mut structures = Structures::new(config.initial_slot_capacity);
        let empty_structure = structures.new_empty();
        let array_structure = structures.new_empty();
        Self {
            config,
            structures,
            objects: Arena::new(),
            symbols: SymbolTable::new(),
            empty_structure,
            array_structure,
        }
    }

    pub fn from_env() -> Self {
        Self::new(Config::from_env())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn intern(&mut self, name: impl AsRef<str>) -> Symbol {
        self.symbols.intern(name.as_ref())
    }

    pub fn description(&self, symbol: Symbol) -> String {
        self.symbols.description(symbol)
    }

    fn allocate(&mut self, structure: Gc<Structure>, kind: ObjectKind, prototype: Option<Gc<Object>>) -> Gc<Object> {
        let store = PropertyStore::new(structure, &self.structures);
        self.objects.alloc(Object::new(store, kind, prototype))
    }

    /// Ordinary object starting at the shared empty structure.
    pub fn new_object(&mut self, prototype: Option<Gc<Object>>) -> Gc<Object> {
        self.allocate(self.empty_structure, ObjectKind::Ordinary, prototype)
    }

    /// Ordinary object with a structure of its own, for objects that are
    /// never structurally shared such as globals and prototypes.
    pub fn new_object_with_unique_structure(&mut self, prototype: Option<Gc<Object>>) -> Gc<Object> {
        let structure = self.structures.new_unique();
        self.allocate(structure, ObjectKind::Ordinary, prototype)
    }

    pub fn new_array(&mut self, length: u32) -> Gc<Object> {
        let elements = IndexedElements::new(length, &self.config);
        self.allocate(self.array_structure, ObjectKind::Array(elements), None)
    }

    pub fn object(&self, object: Gc<Object>) -> &Object {
        &self.objects[object]
    }

    pub fn try_object(&self, object: Gc<Object>) -> Option<&Object> {
        self.objects.get(object)
    }

    pub fn structure(&self, structure: Gc<Structure>) -> &Structure {
        &self.structures[structure]
    }

    pub fn structure_of(&self, object: Gc<Object>) -> Gc<Structure> {
        self.objects[object].structure()
    }

    /// Moves `object` onto a unique copy of its structure.
    pub fn make_unique(&mut self, object: Gc<Object>) {
        let current = self.objects[object].structure();
        if self.structures[current].is_unique() {
            return;
        }
        let unique = self.structures.new_unique_from(current);
        self.objects[object].store.structure = unique;
    }

    /// Lets objects that start from `object`'s current structure share
    /// transitions.
    pub fn make_transitionable(&mut self, object: Gc<Object>) {
        let structure = self.objects[object].structure();
        structure.make_transitionable(&mut self.structures);
    }

    pub fn prototype(&self, object: Gc<Object>) -> Option<Gc<Object>> {
        self.objects[object].prototype
    }

    pub fn set_prototype(&mut self, object: Gc<Object>, prototype: Option<Gc<Object>>) {
        self.objects[object].prototype = prototype;
    }

    pub fn array_length(&self, object: Gc<Object>) -> Option<u32> {
        self.objects[object].elements().map(IndexedElements::length)
    }

    pub fn get_own_property(&mut self, object: Gc<Object>, name: Symbol) -> Option<PropertyDescriptor> {
        self.objects[object].get_own_property(&mut self.structures, name)
    }

    pub fn define_own_property(
        &mut self,
        object: Gc<Object>,
        name: Symbol,
        desc: &PropertyDescriptor,
        throwable: bool,
    ) -> Result<bool> {
        self.objects[object].define_own_property(&mut self.structures, name, desc, throwable)
    }

    pub fn delete(&mut self, object: Gc<Object>, name: Symbol, throwable: bool) -> Result<bool> {
        self.objects[object].delete(&mut self.structures, name, throwable)
    }

    pub fn get_own_property_names(&mut self, object: Gc<Object>, mode: EnumerationMode) -> Vec<Symbol> {
        self.objects[object].get_own_property_names(&mut self.structures, mode)
    }

    pub fn prevent_extensions(&mut self, object: Gc<Object>) {
        self.objects[object].extensible = false;
    }

    /// Mark/sweep over objects and structures. `roots` plus the VM's root
    /// structures survive along with everything they reach.
    pub fn collect(&mut self, roots: &[Gc<Object>]) -> GcStats {
        let mut marker = Marker::new(self.objects.capacity(), self.structures.arena.capacity());
        for root in roots {
            marker.visit_object(*root);
        }
        marker.visit_structure(self.empty_structure);
        marker.visit_structure(self.array_structure);

        while let Some(cell) = marker.pop() {
            match cell {
                Cell::Object(object) => {
                    if let Some(object) = self.objects.get(object) {
                        object.trace(&mut marker);
                    }
                }
                Cell::Structure(structure) => {
                    if let Some(structure) = self.structures.arena.get(structure) {
                        structure.trace(&mut marker);
                    }
                }
            }
        }

        let freed_objects = self.objects.retain(|object| marker.is_object_marked(object));
        let freed_structures = self
            .structures
            .arena
            .retain(|structure| marker.is_structure_marked(structure));
        let stats = GcStats {
            live_objects: self.objects.len(),
            freed_objects,
            live_structures: self.structures.len(),
            freed_structures,
        };
        tracing::debug!(
            target: "jsshape::gc",
            live_objects = stats.live_objects,
            freed_objects = stats.freed_objects,
            live_structures = stats.live_structures,
            freed_structures = stats.freed_structures,
            "collection finished"
        );
        stats
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
