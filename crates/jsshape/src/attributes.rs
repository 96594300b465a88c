use bitflags::bitflags;

bitflags! {
    /// Property attribute bits.
    ///
    /// Stored properties only ever carry the first five bits. Descriptors
    /// passed to `DefineOwnProperty` additionally use the `UNDEF_*` bits to
    /// mark fields that were not supplied at all, which is different from a
    /// field supplied as `false`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Attributes: u32 {
        const WRITABLE = 1 << 0;
        const ENUMERABLE = 1 << 1;
        const CONFIGURABLE = 1 << 2;
        const DATA = 1 << 3;
        const ACCESSOR = 1 << 4;

        const UNDEF_WRITABLE = 1 << 5;
        const UNDEF_ENUMERABLE = 1 << 6;
        const UNDEF_CONFIGURABLE = 1 << 7;
        const UNDEF_VALUE = 1 << 8;
        const UNDEF_GETTER = 1 << 9;
        const UNDEF_SETTER = 1 << 10;

        const TYPE_MASK = Self::DATA.bits() | Self::ACCESSOR.bits();
        const DEFAULT = Self::WRITABLE.bits() | Self::ENUMERABLE.bits() | Self::CONFIGURABLE.bits();
        const ABSENT = Self::UNDEF_WRITABLE.bits()
            | Self::UNDEF_ENUMERABLE.bits()
            | Self::UNDEF_CONFIGURABLE.bits()
            | Self::UNDEF_VALUE.bits()
            | Self::UNDEF_GETTER.bits()
            | Self::UNDEF_SETTER.bits();
        const STORED = Self::DEFAULT.bits() | Self::TYPE_MASK.bits();
    }
}

impl Attributes {
    pub fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    pub fn is_enumerable(self) -> bool {
        self.contains(Self::ENUMERABLE)
    }

    pub fn is_configurable(self) -> bool {
        self.contains(Self::CONFIGURABLE)
    }

    pub fn is_data(self) -> bool {
        self.contains(Self::DATA)
    }

    pub fn is_accessor(self) -> bool {
        self.contains(Self::ACCESSOR)
    }

    /// Neither a data nor an accessor descriptor.
    pub fn is_generic(self) -> bool {
        !self.intersects(Self::TYPE_MASK)
    }

    pub fn is_writable_absent(self) -> bool {
        self.contains(Self::UNDEF_WRITABLE)
    }

    pub fn is_enumerable_absent(self) -> bool {
        self.contains(Self::UNDEF_ENUMERABLE)
    }

    pub fn is_configurable_absent(self) -> bool {
        self.contains(Self::UNDEF_CONFIGURABLE)
    }

    pub fn is_value_absent(self) -> bool {
        self.contains(Self::UNDEF_VALUE)
    }

    pub fn is_getter_absent(self) -> bool {
        self.contains(Self::UNDEF_GETTER)
    }

    pub fn is_setter_absent(self) -> bool {
        self.contains(Self::UNDEF_SETTER)
    }

    /// Descriptor type bits (`DATA`, `ACCESSOR` or none).
    pub fn ty(self) -> Self {
        self & Self::TYPE_MASK
    }

    /// Attributes as they are kept on a stored property.
    pub fn stored(self) -> Self {
        self & Self::STORED
    }
}

/// Writable, enumerable, configurable data property.
pub fn object_data() -> Attributes {
    Attributes::DEFAULT | Attributes::DATA
}

/// Attributes of an array's `length`: writable only.
pub fn length_attributes() -> Attributes {
    Attributes::WRITABLE | Attributes::DATA
}
