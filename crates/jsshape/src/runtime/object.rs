//! Prototype-aware property access: `[[GetProperty]]`, `[[Get]]`,
//! `[[CanPut]]` and `[[Put]]`.

use crate::{
    attributes::Attributes,
    error::{reject, Error, Result},
    memory::Gc,
    object::Object,
    property::PropertyDescriptor,
    symbol::Symbol,
    value::Value,
    vm::VM,
};

/// The descriptor governing an assignment and whether it is allowed.
struct PutTarget {
    allowed: bool,
    desc: Option<PropertyDescriptor>,
    own: bool,
}

impl VM {
    /// Own or inherited property, nearest first.
    pub fn get_property(&mut self, object: Gc<Object>, name: Symbol) -> Option<PropertyDescriptor> {
        let mut current = Some(object);
        while let Some(holder) = current {
            if let Some(desc) = self.get_own_property(holder, name) {
                return Some(desc);
            }
            current = self.objects[holder].prototype;
        }
        None
    }

    pub fn get(&mut self, object: Gc<Object>, name: Symbol) -> Result<Value> {
        match self.get_property(object, name) {
            None => Ok(Value::Undefined),
            Some(desc) if desc.is_accessor() => {
                let getter = desc.getter().clone();
                self.call_accessor(getter, Value::Object(object), &[])
            }
            Some(desc) => Ok(desc.value().clone()),
        }
    }

    fn call_accessor(&mut self, accessor: Value, this: Value, args: &[Value]) -> Result<Value> {
        match accessor {
            Value::Undefined => Ok(Value::Undefined),
            Value::Native(native) => native.call(self, this, args),
            other => Err(Error::Type(format!("{:?} is not a native function", other))),
        }
    }

    /// `[[CanPut]]`.
    fn can_put(&mut self, object: Gc<Object>, name: Symbol) -> PutTarget {
        if let Some(desc) = self.get_own_property(object, name) {
            let allowed = if desc.is_accessor() {
                !desc.setter().is_undefined()
            } else {
                desc.is_writable()
            };
            return PutTarget {
                allowed,
                desc: Some(desc),
                own: true,
            };
        }
        let extensible = self.objects[object].extensible;
        let inherited = self.objects[object]
            .prototype
            .and_then(|proto| self.get_property(proto, name));
        let allowed = match &inherited {
            None => extensible,
            Some(desc) if desc.is_accessor() => !desc.setter().is_undefined(),
            Some(desc) => extensible && desc.is_writable(),
        };
        PutTarget {
            allowed,
            desc: inherited,
            own: false,
        }
    }

    /// `[[Put]]`: assignment through setters and writable data properties.
    pub fn put(&mut self, object: Gc<Object>, name: Symbol, value: Value, throwable: bool) -> Result<bool> {
        let PutTarget { allowed, desc, own } = self.can_put(object, name);
        if !allowed {
            reject!(throwable, "put failed");
        }
        match desc {
            Some(desc) if desc.is_accessor() => {
                let setter = desc.setter().clone();
                self.call_accessor(setter, Value::Object(object), &[value])?;
                Ok(true)
            }
            Some(_) if own => {
                let desc = PropertyDescriptor::data(
                    value,
                    Attributes::UNDEF_WRITABLE | Attributes::UNDEF_ENUMERABLE | Attributes::UNDEF_CONFIGURABLE,
                );
                self.define_own_property(object, name, &desc, throwable)
            }
            _ => self.define_own_property(object, name, &PropertyDescriptor::default_data(value), throwable),
        }
    }
}
