//! Object shapes and array element storage for an ECMAScript runtime.
//!
//! Named properties are resolved through a shared transition graph of
//! [`structure::Structure`]s; array elements live in
//! [`indexed_elements::IndexedElements`] until a non-default descriptor
//! forces them into the generic property store.

pub mod attributes;
pub mod config;
pub mod error;
pub mod indexed_elements;
pub mod memory;
pub mod object;
pub mod property;
pub mod runtime;
pub mod script;
pub mod structure;
pub mod symbol;
pub mod value;
pub mod vm;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use memory::{Gc, GcStats};
pub use object::{EnumerationMode, Object};
pub use property::PropertyDescriptor;
pub use symbol::Symbol;
pub use value::Value;
pub use vm::VM;
