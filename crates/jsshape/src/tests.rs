use std::collections::HashMap;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    attributes::Attributes,
    config::Config,
    error::ErrorKind,
    memory::Gc,
    object::{EnumerationMode, Object},
    property::PropertyDescriptor,
    symbol::Symbol,
    value::Value,
    vm::VM,
};

fn vm() -> VM {
    VM::new(Config::default())
}

fn array_of(vm: &mut VM, values: &[i32]) -> Gc<Object> {
    let array = vm.new_array(0);
    for (index, value) in values.iter().enumerate() {
        let desc = PropertyDescriptor::default_data(Value::Int32(*value));
        assert_eq!(vm.define_own_property(array, Symbol::Index(index as u32), &desc, true), Ok(true));
    }
    array
}

fn value_at(vm: &mut VM, object: Gc<Object>, index: u32) -> Option<Value> {
    vm.get_own_property(object, Symbol::Index(index))
        .map(|desc| desc.value().clone())
}

fn set_length(vm: &mut VM, array: Gc<Object>, length: Value, throwable: bool) -> crate::Result<bool> {
    let desc = PropertyDescriptor::data(
        length,
        Attributes::UNDEF_WRITABLE | Attributes::UNDEF_ENUMERABLE | Attributes::UNDEF_CONFIGURABLE,
    );
    vm.define_own_property(array, Symbol::LENGTH, &desc, throwable)
}

fn is_dense(vm: &VM, array: Gc<Object>) -> bool {
    vm.object(array).elements().map_or(false, |elements| elements.dense())
}

#[test]
fn objects_built_alike_share_structure() {
    let mut vm = vm();
    let (x, y) = (vm.intern("x"), vm.intern("y"));
    let a = vm.new_object(None);
    let b = vm.new_object(None);
    for object in [a, b] {
        vm.put(object, x, Value::Int32(1), true).unwrap();
        vm.put(object, y, Value::Int32(2), true).unwrap();
    }
    assert_eq!(vm.structure_of(a), vm.structure_of(b));
    let structure = vm.structure_of(a);
    assert_eq!(structure.get(&mut vm.structures, y), Some(1));

    // a different order is a different path
    let c = vm.new_object(None);
    vm.put(c, y, Value::Int32(2), true).unwrap();
    vm.put(c, x, Value::Int32(1), true).unwrap();
    assert_ne!(vm.structure_of(c), vm.structure_of(a));
}

#[test]
fn deleted_slot_is_reused() {
    let mut vm = vm();
    let (p, r, q) = (vm.intern("p"), vm.intern("r"), vm.intern("q"));
    let object = vm.new_object(None);
    vm.put(object, p, Value::Int32(1), true).unwrap();
    vm.put(object, r, Value::Int32(2), true).unwrap();
    let slot_p = vm.structure_of(object).get(&mut vm.structures, p);
    assert_eq!(slot_p, Some(0));

    assert_eq!(vm.delete(object, p, true), Ok(true));
    vm.put(object, q, Value::Int32(3), true).unwrap();
    let structure = vm.structure_of(object);
    assert_eq!(structure.get(&mut vm.structures, q), slot_p);
    assert_eq!(vm.get(object, q).unwrap(), Value::Int32(3));
    assert_eq!(vm.get(object, r).unwrap(), Value::Int32(2));
    assert!(vm.get_own_property(object, p).is_none());
}

#[test]
fn long_chain_materializes_correctly() {
    let mut vm = vm();
    let object = vm.new_object(None);
    let names: Vec<Symbol> = (0..200).map(|i| vm.intern(format!("prop{}", i))).collect();
    for (i, name) in names.iter().enumerate() {
        vm.put(object, *name, Value::Int32(i as i32), true).unwrap();
    }
    let structure = vm.structure_of(object);
    assert!(!vm.structure(structure).has_table());

    let mut slots: Vec<u32> = names
        .iter()
        .map(|name| structure.get(&mut vm.structures, *name).unwrap())
        .collect();
    assert!(vm.structure(structure).has_table());
    for (i, name) in names.iter().enumerate() {
        assert_eq!(vm.get(object, *name).unwrap(), Value::Int32(i as i32));
    }
    slots.sort_unstable();
    slots.dedup();
    assert_eq!(slots.len(), names.len());
}

#[test]
fn dense_array_stays_dense() {
    let mut vm = vm();
    let length = 64;
    let array = vm.new_array(length);
    for index in 0..length {
        vm.put(array, Symbol::Index(index), Value::from_u32(index * 3), true).unwrap();
    }
    for index in 0..length {
        assert_eq!(value_at(&mut vm, array, index), Some(Value::from_u32(index * 3)));
    }
    assert!(is_dense(&vm, array));
    assert_eq!(vm.array_length(array), Some(length));
}

#[test]
fn non_default_descriptor_demotes_for_good() {
    let mut vm = vm();
    let array = array_of(&mut vm, &[10, 11, 12, 13]);
    let readonly = PropertyDescriptor::data_attributes(
        Attributes::ENUMERABLE | Attributes::CONFIGURABLE,
    );
    assert_eq!(vm.define_own_property(array, Symbol::Index(2), &readonly, true), Ok(true));
    assert!(!is_dense(&vm, array));

    let desc = vm.get_own_property(array, Symbol::Index(2)).unwrap();
    assert_eq!(desc.value(), &Value::Int32(12));
    assert!(!desc.is_writable());
    for (index, expected) in [(0, 10), (1, 11), (3, 13)] {
        assert_eq!(value_at(&mut vm, array, index), Some(Value::Int32(expected)));
    }
    assert_eq!(vm.put(array, Symbol::Index(2), Value::Int32(0), false), Ok(false));

    // making it writable again does not bring density back
    let writable = PropertyDescriptor::data(Value::Int32(2), Attributes::DEFAULT);
    assert_eq!(vm.define_own_property(array, Symbol::Index(2), &writable, true), Ok(true));
    assert!(!is_dense(&vm, array));
    assert_eq!(value_at(&mut vm, array, 2), Some(Value::Int32(2)));
}

#[test]
fn shrink_stops_at_unconfigurable_element() {
    let mut vm = vm();
    let array = array_of(&mut vm, &[1, 2, 3]);
    let pinned = PropertyDescriptor::data_attributes(
        Attributes::WRITABLE | Attributes::ENUMERABLE | Attributes::UNDEF_CONFIGURABLE,
    );
    // absent [[Configurable]] on an existing element keeps it, so pin explicitly
    assert_eq!(vm.define_own_property(array, Symbol::Index(1), &pinned, true), Ok(true));
    assert!(vm.get_own_property(array, Symbol::Index(1)).unwrap().is_configurable());
    let pinned = PropertyDescriptor::data_attributes(Attributes::WRITABLE | Attributes::ENUMERABLE);
    assert_eq!(vm.define_own_property(array, Symbol::Index(1), &pinned, true), Ok(true));

    assert_eq!(set_length(&mut vm, array, Value::Int32(0), false), Ok(false));
    assert_eq!(vm.array_length(array), Some(2));
    assert_eq!(value_at(&mut vm, array, 0), Some(Value::Int32(1)));
    assert_eq!(value_at(&mut vm, array, 1), Some(Value::Int32(2)));
    assert_eq!(value_at(&mut vm, array, 2), None);

    let err = set_length(&mut vm, array, Value::Int32(0), true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(vm.array_length(array), Some(2));
}

#[test]
fn failed_shrink_honours_requested_readonly() {
    let mut vm = vm();
    let array = array_of(&mut vm, &[1, 2, 3]);
    let pinned = PropertyDescriptor::data_attributes(Attributes::WRITABLE | Attributes::ENUMERABLE);
    vm.define_own_property(array, Symbol::Index(0), &pinned, true).unwrap();

    let desc = PropertyDescriptor::data(Value::Int32(0), Attributes::UNDEF_ENUMERABLE | Attributes::UNDEF_CONFIGURABLE);
    assert_eq!(vm.define_own_property(array, Symbol::LENGTH, &desc, false), Ok(false));
    assert_eq!(vm.array_length(array), Some(1));
    assert!(!vm.get_own_property(array, Symbol::LENGTH).unwrap().is_writable());
}

#[test]
fn grow_length_adds_no_elements() {
    let mut vm = vm();
    let array = array_of(&mut vm, &[1, 2, 3]);
    assert_eq!(set_length(&mut vm, array, Value::Int32(10), true), Ok(true));
    assert_eq!(vm.array_length(array), Some(10));
    for index in 3..10 {
        assert!(vm.get_own_property(array, Symbol::Index(index)).is_none());
    }
    let names = vm.get_own_property_names(array, EnumerationMode::ExcludeNotEnumerable);
    assert_eq!(names, vec![Symbol::Index(0), Symbol::Index(1), Symbol::Index(2)]);
}

#[test]
fn dense_shrink_truncates_storage() {
    let mut vm = vm();
    let array = array_of(&mut vm, &[1, 2, 3, 4, 5]);
    assert_eq!(set_length(&mut vm, array, Value::string("2"), true), Ok(true));
    assert_eq!(vm.array_length(array), Some(2));
    assert_eq!(vm.object(array).elements().unwrap().indices(), vec![0, 1]);
    assert!(vm.get_own_property(array, Symbol::Index(4)).is_none());
}

#[test]
fn define_then_get_round_trips_across_backings() {
    let mut vm = vm();
    let array = vm.new_array(0);
    let indices = [0, 1, 9_999, 10_000, 65_536, 4_294_000_000, u32::MAX - 1];
    for index in indices {
        let value = Value::from_u32(index);
        let desc = PropertyDescriptor::default_data(value.clone());
        assert_eq!(vm.define_own_property(array, Symbol::Index(index), &desc, true), Ok(true));
        assert_eq!(value_at(&mut vm, array, index), Some(value));
    }
    assert_eq!(vm.array_length(array), Some(u32::MAX));
    assert!(is_dense(&vm, array));
    let elements = vm.object(array).elements().unwrap();
    assert_eq!(elements.vector.len(), 10_000);
    assert_eq!(elements.map.as_ref().map(|map| map.len()), Some(4));
}

#[test]
fn invalid_length_is_range_error() {
    let mut vm = vm();
    let array = vm.new_array(3);
    for bad in [Value::Number(1.5), Value::Number(-1.0), Value::Number(4294967296.0), Value::string("abc")] {
        let err = set_length(&mut vm, array, bad, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }
    assert_eq!(vm.array_length(array), Some(3));
    assert_eq!(set_length(&mut vm, array, Value::Number(4294967295.0), true), Ok(true));
    assert_eq!(vm.array_length(array), Some(u32::MAX));
}

#[test]
fn readonly_length_blocks_growth_and_shrink() {
    let mut vm = vm();
    let array = array_of(&mut vm, &[1, 2]);
    let readonly = PropertyDescriptor::data_attributes(Attributes::UNDEF_ENUMERABLE | Attributes::UNDEF_CONFIGURABLE);
    assert_eq!(vm.define_own_property(array, Symbol::LENGTH, &readonly, true), Ok(true));
    let desc = vm.get_own_property(array, Symbol::LENGTH).unwrap();
    assert!(!desc.is_writable());
    assert_eq!(desc.value(), &Value::Int32(2));

    let push = PropertyDescriptor::default_data(Value::Int32(3));
    assert_eq!(vm.define_own_property(array, Symbol::Index(2), &push, false), Ok(false));
    assert_eq!(set_length(&mut vm, array, Value::Int32(0), false), Ok(false));
    assert_eq!(set_length(&mut vm, array, Value::Int32(5), false), Ok(false));
    assert_eq!(set_length(&mut vm, array, Value::Int32(2), true), Ok(true));
    // existing elements stay writable
    assert_eq!(vm.put(array, Symbol::Index(0), Value::Int32(9), true), Ok(true));
    assert_eq!(vm.array_length(array), Some(2));
}

#[test]
fn length_is_not_deletable_or_reconfigurable() {
    let mut vm = vm();
    let array = vm.new_array(1);
    assert_eq!(vm.delete(array, Symbol::LENGTH, false), Ok(false));
    assert!(vm.delete(array, Symbol::LENGTH, true).is_err());

    let enumerable = PropertyDescriptor::generic(Attributes::ENUMERABLE | Attributes::UNDEF_CONFIGURABLE);
    assert_eq!(vm.define_own_property(array, Symbol::LENGTH, &enumerable, false), Ok(false));
    let accessor = PropertyDescriptor::accessor(None, None, Attributes::UNDEF_ENUMERABLE | Attributes::UNDEF_CONFIGURABLE);
    assert_eq!(vm.define_own_property(array, Symbol::LENGTH, &accessor, false), Ok(false));
    let harmless = PropertyDescriptor::generic(Attributes::UNDEF_ENUMERABLE);
    assert_eq!(vm.define_own_property(array, Symbol::LENGTH, &harmless, true), Ok(true));
}

#[test]
fn enumerating_shrink_over_sparse_storage() {
    let config = Config::default().with_shrink_scan_threshold(4).with_max_vector_size(16);
    let mut vm = VM::new(config);
    let array = array_of(&mut vm, &[0, 1, 2, 3, 4, 5, 6]);
    let far = PropertyDescriptor::default_data(Value::Int32(99));
    vm.define_own_property(array, Symbol::Index(1_000_000), &far, true).unwrap();
    let pinned = PropertyDescriptor::data_attributes(Attributes::WRITABLE | Attributes::ENUMERABLE);
    vm.define_own_property(array, Symbol::Index(3), &pinned, true).unwrap();

    assert_eq!(set_length(&mut vm, array, Value::Int32(1), false), Ok(false));
    assert_eq!(vm.array_length(array), Some(4));
    assert!(vm.get_own_property(array, Symbol::Index(1_000_000)).is_none());
    assert!(vm.get_own_property(array, Symbol::Index(4)).is_none());
    assert_eq!(value_at(&mut vm, array, 3), Some(Value::Int32(3)));
    assert_eq!(value_at(&mut vm, array, 2), Some(Value::Int32(2)));

    // a pinned element cannot be made configurable again
    let loose = PropertyDescriptor::generic(Attributes::CONFIGURABLE | Attributes::UNDEF_ENUMERABLE);
    assert!(vm.define_own_property(array, Symbol::Index(3), &loose, true).is_err());
}

#[test]
fn array_enumeration_order() {
    let mut vm = vm();
    let array = array_of(&mut vm, &[1, 2]);
    let tag = vm.intern("tag");
    vm.put(array, tag, Value::Null, true).unwrap();
    let hidden = PropertyDescriptor::data(Value::Null, Attributes::WRITABLE);
    vm.define_own_property(array, Symbol::Index(5), &hidden, true).unwrap();
    let generic = PropertyDescriptor::data(Value::Null, Attributes::ENUMERABLE);
    vm.define_own_property(array, Symbol::Index(3), &generic, true).unwrap();

    assert_eq!(
        vm.get_own_property_names(array, EnumerationMode::IncludeNotEnumerable),
        vec![
            Symbol::LENGTH,
            Symbol::Index(0),
            Symbol::Index(1),
            Symbol::Index(3),
            Symbol::Index(5),
            tag
        ]
    );
    assert_eq!(
        vm.get_own_property_names(array, EnumerationMode::ExcludeNotEnumerable),
        vec![Symbol::Index(0), Symbol::Index(1), Symbol::Index(3), tag]
    );
    assert_eq!(vm.array_length(array), Some(6));
}

#[test]
fn non_extensible_array_rejects_new_elements() {
    let mut vm = vm();
    let array = array_of(&mut vm, &[1]);
    vm.prevent_extensions(array);
    let desc = PropertyDescriptor::default_data(Value::Int32(2));
    assert_eq!(vm.define_own_property(array, Symbol::Index(1), &desc, false), Ok(false));
    assert_eq!(vm.define_own_property(array, Symbol::Index(0), &desc, true), Ok(true));
    assert_eq!(vm.array_length(array), Some(1));
}

#[test]
fn delete_elements() {
    let mut vm = vm();
    let array = array_of(&mut vm, &[1, 2, 3]);
    assert_eq!(vm.delete(array, Symbol::Index(1), true), Ok(true));
    assert!(vm.get_own_property(array, Symbol::Index(1)).is_none());
    assert_eq!(vm.delete(array, Symbol::Index(1), true), Ok(true));
    assert_eq!(vm.array_length(array), Some(3));

    let pinned = PropertyDescriptor::data_attributes(Attributes::WRITABLE);
    vm.define_own_property(array, Symbol::Index(2), &pinned, true).unwrap();
    assert_eq!(vm.delete(array, Symbol::Index(2), false), Ok(false));
    assert_eq!(vm.delete(array, Symbol::Index(0), false), Ok(true));
}

#[test]
fn unique_structure_is_edited_in_place() {
    let mut vm = vm();
    let global = vm.new_object_with_unique_structure(None);
    let structure = vm.structure_of(global);
    let names: Vec<Symbol> = ["a", "b", "c"].iter().map(|name| vm.intern(name)).collect();
    for name in &names {
        vm.put(global, *name, Value::Bool(true), true).unwrap();
    }
    vm.delete(global, names[1], true).unwrap();
    assert_eq!(vm.structure_of(global), structure);
    assert!(vm.structure(structure).is_unique());
    assert_eq!(vm.structure(structure).transition_count(), 0);

    vm.make_transitionable(global);
    let other = vm.intern("other");
    vm.put(global, other, Value::Null, true).unwrap();
    assert_ne!(vm.structure_of(global), structure);
    assert_eq!(vm.structure(structure).transition_count(), 1);
}

#[test]
fn make_unique_detaches_from_transition_tree() {
    let mut vm = vm();
    let x = vm.intern("x");
    let a = vm.new_object(None);
    let b = vm.new_object(None);
    vm.put(a, x, Value::Int32(1), true).unwrap();
    vm.put(b, x, Value::Int32(2), true).unwrap();
    vm.make_unique(a);
    assert_ne!(vm.structure_of(a), vm.structure_of(b));
    assert!(vm.structure(vm.structure_of(a)).is_unique());
    assert_eq!(vm.get(a, x).unwrap(), Value::Int32(1));
    let y = vm.intern("y");
    let before = vm.structure_of(a);
    vm.put(a, y, Value::Int32(3), true).unwrap();
    assert_eq!(vm.structure_of(a), before);
}

#[test]
fn collect_frees_unreachable_cells() {
    let mut vm = vm();
    let (x, y, z) = (vm.intern("x"), vm.intern("y"), vm.intern("z"));
    let kept = vm.new_object(None);
    vm.put(kept, x, Value::Int32(1), true).unwrap();
    let child = vm.new_object(Some(kept));
    let array = vm.new_array(2);
    vm.put(array, Symbol::Index(0), Value::Object(child), true).unwrap();

    let garbage = vm.new_object(None);
    vm.put(garbage, x, Value::Int32(1), true).unwrap();
    vm.put(garbage, y, Value::Int32(1), true).unwrap();
    vm.delete(garbage, x, true).unwrap();
    let forked = vm.structure_of(garbage);
    let unique = vm.new_object_with_unique_structure(None);
    vm.put(unique, z, Value::Null, true).unwrap();
    let unique_structure = vm.structure_of(unique);

    let stats = vm.collect(&[array]);
    assert_eq!(stats.freed_objects, 2);
    assert_eq!(stats.live_objects, 3);
    assert!(vm.try_object(garbage).is_none());
    assert!(vm.try_object(unique).is_none());
    assert!(vm.structures.get(forked).is_none());
    assert!(vm.structures.get(unique_structure).is_none());
    assert!(stats.freed_structures >= 2);

    // transition children stay reachable from the root structure
    let fresh = vm.new_object(None);
    vm.put(fresh, x, Value::Int32(5), true).unwrap();
    assert_eq!(vm.structure_of(fresh), vm.structure_of(kept));
    assert_eq!(vm.get(child, x).unwrap(), Value::Int32(1));

    let again = vm.collect(&[array]);
    assert_eq!(again.freed_objects, 1);
    assert_eq!(again.freed_structures, 0);
}

#[test]
fn random_add_delete_matches_model() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut vm = vm();
    let names: Vec<Symbol> = (0..12).map(|i| vm.intern(format!("k{}", i))).collect();
    let objects: Vec<Gc<Object>> = (0..6)
        .map(|i| {
            if i % 3 == 0 {
                vm.new_object_with_unique_structure(None)
            } else {
                vm.new_object(None)
            }
        })
        .collect();
    let mut models: Vec<HashMap<Symbol, i32>> = vec![HashMap::new(); objects.len()];

    for step in 0..4000 {
        let which = rng.gen_range(0..objects.len());
        let (object, model) = (objects[which], &mut models[which]);
        let name = names[rng.gen_range(0..names.len())];
        if rng.gen_bool(0.6) {
            vm.put(object, name, Value::Int32(step), true).unwrap();
            model.insert(name, step);
        } else {
            assert_eq!(vm.delete(object, name, true), Ok(true));
            model.remove(&name);
        }

        if step % 97 == 0 {
            vm.collect(&objects);
        }
    }

    for (object, model) in objects.iter().zip(&models) {
        let structure = vm.structure_of(*object);
        let mut slots = Vec::new();
        for name in &names {
            match model.get(name) {
                Some(value) => {
                    assert_eq!(vm.get(*object, *name).unwrap(), Value::Int32(*value));
                    slots.push(structure.get(&mut vm.structures, *name).unwrap());
                }
                None => assert!(vm.get_own_property(*object, *name).is_none()),
            }
        }
        let live = slots.len();
        slots.sort_unstable();
        slots.dedup();
        assert_eq!(slots.len(), live);
        assert!(structure.get_slots_size(&vm.structures) as usize >= live);
        let listed = vm.get_own_property_names(*object, EnumerationMode::IncludeNotEnumerable);
        assert_eq!(listed.len(), model.len());
    }
}
