//! Property keys.
//!
//! Canonical array index strings never enter the interner: they become
//! [`Symbol::Index`], which lets arrays route element accesses without a
//! string round-trip.

use std::{fmt, rc::Rc};

use fxhash::FxHashMap;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// Array index in `0..=u32::MAX - 1`.
    Index(u32),
    Named(u32),
}

impl Symbol {
    pub const LENGTH: Symbol = Symbol::Named(0);

    pub fn as_index(self) -> Option<u32> {
        match self {
            Self::Index(index) => Some(index),
            Self::Named(_) => None,
        }
    }

    pub fn is_index(self) -> bool {
        matches!(self, Self::Index(_))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{}", index),
            Self::Named(id) => write!(f, "sym{}", id),
        }
    }
}

impl From<u32> for Symbol {
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

/// Parses `s` as a canonical array index: no sign, no leading zeros and at
/// most `2^32 - 2`.
pub fn parse_array_index(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    let mut value: u64 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u64::from(b - b'0');
    }
    if value >= u64::from(u32::MAX) {
        return None;
    }
    Some(value as u32)
}

pub struct SymbolTable {
    names: Vec<Rc<str>>,
    ids: FxHashMap<Rc<str>, u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            names: Vec::new(),
            ids: FxHashMap::default(),
        };
        let length = table.intern("length");
        debug_assert_eq!(length, Symbol::LENGTH);
        table
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(index) = parse_array_index(name) {
            return Symbol::Index(index);
        }
        if let Some(&id) = self.ids.get(name) {
            return Symbol::Named(id);
        }
        let id = self.names.len() as u32;
        let name: Rc<str> = Rc::from(name);
        self.names.push(name.clone());
        self.ids.insert(name, id);
        Symbol::Named(id)
    }

    /// Interned text of `symbol`. Index symbols render as their decimal form.
    pub fn description(&self, symbol: Symbol) -> String {
        match symbol {
            Symbol::Index(index) => index.to_string(),
            Symbol::Named(id) => self
                .names
                .get(id as usize)
                .map(|name| name.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_indices() {
        assert_eq!(parse_array_index("0"), Some(0));
        assert_eq!(parse_array_index("17"), Some(17));
        assert_eq!(parse_array_index("4294967294"), Some(u32::MAX - 1));
        assert_eq!(parse_array_index("4294967295"), None);
        assert_eq!(parse_array_index("017"), None);
        assert_eq!(parse_array_index("-1"), None);
        assert_eq!(parse_array_index("1.5"), None);
        assert_eq!(parse_array_index(""), None);
        assert_eq!(parse_array_index("99999999999"), None);
    }

    #[test]
    fn interning_is_stable() {
        let mut table = SymbolTable::new();
        assert_eq!(table.intern("length"), Symbol::LENGTH);
        let foo = table.intern("foo");
        assert_eq!(table.intern("foo"), foo);
        assert_ne!(table.intern("bar"), foo);
        assert_eq!(table.intern("12"), Symbol::Index(12));
        assert_eq!(table.description(foo), "foo");
        assert_eq!(table.description(Symbol::Index(12)), "12");
        assert!(table.intern("4294967295").as_index().is_none());
    }
}
