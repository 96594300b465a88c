//! Property descriptors and the slots they are stored in.

use crate::{
    attributes::{object_data, Attributes},
    error::{reject, Result},
    memory::{Trace, Visitor},
    value::Value,
};

/// Descriptor passed to `DefineOwnProperty` and returned by
/// `GetOwnProperty`. Fields not supplied by the caller are flagged with the
/// `UNDEF_*` attribute bits.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDescriptor {
    attrs: Attributes,
    value: Value,
    getter: Value,
    setter: Value,
}

impl PropertyDescriptor {
    /// Data descriptor. `attrs` may carry `UNDEF_WRITABLE`,
    /// `UNDEF_ENUMERABLE` or `UNDEF_CONFIGURABLE`.
    pub fn data(value: Value, attrs: Attributes) -> Self {
        Self {
            attrs: (attrs - Attributes::TYPE_MASK - Attributes::UNDEF_VALUE) | Attributes::DATA,
            value,
            getter: Value::Undefined,
            setter: Value::Undefined,
        }
    }

    /// Data descriptor without `[[Value]]`.
    pub fn data_attributes(attrs: Attributes) -> Self {
        let mut desc = Self::data(Value::Undefined, attrs);
        desc.attrs |= Attributes::UNDEF_VALUE;
        desc
    }

    /// Accessor descriptor. `None` leaves the corresponding field absent.
    pub fn accessor(getter: Option<Value>, setter: Option<Value>, attrs: Attributes) -> Self {
        let mut attrs = (attrs - Attributes::TYPE_MASK - Attributes::WRITABLE) | Attributes::ACCESSOR;
        if getter.is_none() {
            attrs |= Attributes::UNDEF_GETTER;
        }
        if setter.is_none() {
            attrs |= Attributes::UNDEF_SETTER;
        }
        Self {
            attrs,
            value: Value::Undefined,
            getter: getter.unwrap_or_default(),
            setter: setter.unwrap_or_default(),
        }
    }

    /// Neither data nor accessor: only `[[Enumerable]]` and
    /// `[[Configurable]]` may be present.
    pub fn generic(attrs: Attributes) -> Self {
        Self {
            attrs: attrs - Attributes::TYPE_MASK - Attributes::WRITABLE,
            value: Value::Undefined,
            getter: Value::Undefined,
            setter: Value::Undefined,
        }
    }

    /// Writable, enumerable, configurable data property holding `value`.
    pub fn default_data(value: Value) -> Self {
        Self::data(value, Attributes::DEFAULT)
    }

    pub fn attributes(&self) -> Attributes {
        self.attrs
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn getter(&self) -> &Value {
        &self.getter
    }

    pub fn setter(&self) -> &Value {
        &self.setter
    }

    pub fn set_value(&mut self, value: Value) {
        self.attrs.remove(Attributes::UNDEF_VALUE);
        self.value = value;
    }

    pub fn set_writable(&mut self, writable: bool) {
        self.attrs.remove(Attributes::UNDEF_WRITABLE);
        self.attrs.set(Attributes::WRITABLE, writable);
    }

    pub fn is_data(&self) -> bool {
        self.attrs.is_data()
    }

    pub fn is_accessor(&self) -> bool {
        self.attrs.is_accessor()
    }

    pub fn is_generic(&self) -> bool {
        self.attrs.is_generic()
    }

    pub fn is_writable(&self) -> bool {
        self.attrs.is_writable()
    }

    pub fn is_enumerable(&self) -> bool {
        self.attrs.is_enumerable()
    }

    pub fn is_configurable(&self) -> bool {
        self.attrs.is_configurable()
    }

    pub fn is_value_absent(&self) -> bool {
        !self.is_data() || self.attrs.is_value_absent()
    }

    /// A generic descriptor with no fields at all.
    pub fn is_absent(&self) -> bool {
        self.is_generic()
            && self.attrs.is_enumerable_absent()
            && self.attrs.is_configurable_absent()
    }

    /// Whether defining this descriptor on an array element can be served by
    /// the fast element storage. Absent attributes count as `false`.
    pub fn is_default(&self) -> bool {
        if !self.is_enumerable() || !self.is_configurable() {
            return false;
        }
        if self.is_accessor() {
            return false;
        }
        if self.is_data() {
            return self.is_writable();
        }
        true
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Accessor {
    pub getter: Value,
    pub setter: Value,
}

/// A stored own property.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredSlot {
    value: Value,
    accessor: Accessor,
    attributes: Attributes,
}

impl StoredSlot {
    /// Materializes `desc` as a fresh property: absent fields become `false`
    /// or `undefined`, a generic descriptor becomes a data property.
    pub fn new(desc: &PropertyDescriptor) -> Self {
        let mut attributes = desc.attrs & Attributes::DEFAULT;
        if desc.is_accessor() {
            attributes.remove(Attributes::WRITABLE);
            attributes |= Attributes::ACCESSOR;
            Self {
                value: Value::Undefined,
                accessor: Accessor {
                    getter: desc.getter.clone(),
                    setter: desc.setter.clone(),
                },
                attributes,
            }
        } else {
            if !desc.is_data() {
                attributes.remove(Attributes::WRITABLE);
            }
            Self {
                value: desc.value.clone(),
                accessor: Accessor::default(),
                attributes: attributes | Attributes::DATA,
            }
        }
    }

    pub fn new_raw(value: Value, attributes: Attributes) -> Self {
        Self {
            value,
            accessor: Accessor::default(),
            attributes: attributes.stored(),
        }
    }

    /// Writable, enumerable, configurable data slot.
    pub fn new_default(value: Value) -> Self {
        Self::new_raw(value, object_data())
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    pub fn attributes(&self) -> Attributes {
        self.attributes
    }

    pub fn to_descriptor(&self) -> PropertyDescriptor {
        if self.attributes.is_accessor() {
            PropertyDescriptor::accessor(
                Some(self.accessor.getter.clone()),
                Some(self.accessor.setter.clone()),
                self.attributes,
            )
        } else {
            PropertyDescriptor::data(self.value.clone(), self.attributes)
        }
    }

    /// ValidateAndApplyPropertyDescriptor, validation half. `Ok(true)` means
    /// `desc` may be merged into `self`.
    pub fn is_defined_property_accepted(
        &self,
        desc: &PropertyDescriptor,
        throwable: bool,
    ) -> Result<bool> {
        if desc.is_absent() || self.merge_with_no_effect(desc) {
            return Ok(true);
        }
        let current = self.attributes;
        if !current.is_configurable() {
            if desc.is_configurable() {
                reject!(
                    throwable,
                    "changing [[Configurable]] of unconfigurable property not allowed"
                );
            }
            if !desc.attrs.is_enumerable_absent() && current.is_enumerable() != desc.is_enumerable()
            {
                reject!(
                    throwable,
                    "changing [[Enumerable]] of unconfigurable property not allowed"
                );
            }
        }

        if desc.is_generic() {
            // only [[Enumerable]] and [[Configurable]], checked above
        } else if current.is_data() != desc.is_data() {
            if !current.is_configurable() {
                reject!(
                    throwable,
                    "changing descriptor type of unconfigurable property not allowed"
                );
            }
        } else if current.is_data() {
            if !current.is_configurable() && !current.is_writable() {
                if desc.is_writable() {
                    reject!(
                        throwable,
                        "changing [[Writable]] of unconfigurable property not allowed"
                    );
                }
                if !desc.attrs.is_value_absent() && !desc.value.same_value(&self.value) {
                    reject!(throwable, "changing [[Value]] of readonly property not allowed");
                }
            }
        } else if !current.is_configurable() {
            let setter_changed =
                !desc.attrs.is_setter_absent() && desc.setter != self.accessor.setter;
            let getter_changed =
                !desc.attrs.is_getter_absent() && desc.getter != self.accessor.getter;
            if setter_changed || getter_changed {
                reject!(
                    throwable,
                    "changing [[Set]] or [[Get]] of unconfigurable property not allowed"
                );
            }
        }
        Ok(true)
    }

    /// Whether merging `desc` would leave `self` unchanged.
    pub fn merge_with_no_effect(&self, desc: &PropertyDescriptor) -> bool {
        let current = self.attributes;
        if !desc.attrs.is_configurable_absent() && desc.is_configurable() != current.is_configurable()
        {
            return false;
        }
        if !desc.attrs.is_enumerable_absent() && desc.is_enumerable() != current.is_enumerable() {
            return false;
        }
        if desc.is_generic() {
            return true;
        }
        if desc.attrs.ty() != current.ty() {
            return false;
        }
        if desc.is_data() {
            if !desc.attrs.is_writable_absent() && desc.is_writable() != current.is_writable() {
                return false;
            }
            desc.attrs.is_value_absent() || desc.value.same_value(&self.value)
        } else {
            (desc.attrs.is_getter_absent() || desc.getter == self.accessor.getter)
                && (desc.attrs.is_setter_absent() || desc.setter == self.accessor.setter)
        }
    }

    /// Applies an accepted descriptor.
    pub fn merge(&mut self, desc: &PropertyDescriptor) {
        let mut attrs = self.attributes;
        if !desc.attrs.is_configurable_absent() {
            attrs.set(Attributes::CONFIGURABLE, desc.is_configurable());
        }
        if !desc.attrs.is_enumerable_absent() {
            attrs.set(Attributes::ENUMERABLE, desc.is_enumerable());
        }
        if desc.is_generic() {
            self.attributes = attrs;
            return;
        }

        if desc.is_data() {
            if attrs.is_accessor() {
                attrs.remove(Attributes::ACCESSOR | Attributes::WRITABLE);
                self.accessor = Accessor::default();
                self.value = Value::Undefined;
            }
            attrs.insert(Attributes::DATA);
            if !desc.attrs.is_value_absent() {
                self.value = desc.value.clone();
            }
            if !desc.attrs.is_writable_absent() {
                attrs.set(Attributes::WRITABLE, desc.is_writable());
            }
        } else {
            if attrs.is_data() {
                attrs.remove(Attributes::DATA | Attributes::WRITABLE);
                self.value = Value::Undefined;
            }
            attrs.insert(Attributes::ACCESSOR);
            if !desc.attrs.is_getter_absent() {
                self.accessor.getter = desc.getter.clone();
            }
            if !desc.attrs.is_setter_absent() {
                self.accessor.setter = desc.setter.clone();
            }
        }
        self.attributes = attrs;
    }
}

impl Trace for StoredSlot {
    fn trace(&self, visitor: &mut dyn Visitor) {
        self.value.trace(visitor);
        self.accessor.getter.trace(visitor);
        self.accessor.setter.trace(visitor);
    }
}
