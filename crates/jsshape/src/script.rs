//! Line-oriented command scripts that drive a [`VM`].
//!
//! ```text
//! object p                # ordinary object
//! object o p              # ... with prototype `p`
//! unique g                # object with its own structure
//! array a 3               # array of length 3
//! set o x 1               # o.x = 1
//! define a 1 2 we         # data property, writable + enumerable only
//! define a length - e     # attribute-only update ("-" = no value)
//! length a 0              # a.length = 0
//! delete o x
//! get o x
//! keys o
//! shape o
//! seal o
//! gc a o                  # collect with `a` and `o` as roots
//! ```
//!
//! Language-level errors are reported as output lines starting with `!`.

use fxhash::FxHashMap;
use thiserror::Error;

use crate::{
    attributes::Attributes,
    memory::Gc,
    object::{EnumerationMode, Object},
    property::PropertyDescriptor,
    symbol::Symbol,
    value::Value,
    vm::VM,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: unknown variable `{name}`")]
    UnknownVariable { line: usize, name: String },
}

pub struct Session {
    vm: VM,
    vars: FxHashMap<String, Gc<Object>>,
}

impl Session {
    pub fn new(vm: VM) -> Self {
        Self {
            vm,
            vars: FxHashMap::default(),
        }
    }

    pub fn vm(&mut self) -> &mut VM {
        &mut self.vm
    }

    pub fn run(&mut self, source: &str) -> Result<Vec<String>, ScriptError> {
        let mut output = Vec::new();
        for (index, line) in source.lines().enumerate() {
            let line_no = index + 1;
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let words: Vec<&str> = line.split_whitespace().collect();
            self.execute(line_no, &words, &mut output)?;
        }
        Ok(output)
    }

    fn var(&self, line: usize, name: &str) -> Result<Gc<Object>, ScriptError> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| ScriptError::UnknownVariable {
                line,
                name: name.to_string(),
            })
    }

    fn value(&self, line: usize, word: &str) -> Result<Value, ScriptError> {
        let value = match word {
            "undefined" => Value::Undefined,
            "null" => Value::Null,
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ if word.starts_with('@') => Value::Object(self.var(line, &word[1..])?),
            _ if word.len() >= 2 && word.starts_with('"') && word.ends_with('"') => {
                Value::string(&word[1..word.len() - 1])
            }
            _ => match word.parse::<f64>() {
                Ok(number) => Value::from_f64(number),
                Err(_) => {
                    return Err(ScriptError::Syntax {
                        line,
                        message: format!("bad value `{}`", word),
                    })
                }
            },
        };
        Ok(value)
    }

    fn execute(&mut self, line: usize, words: &[&str], output: &mut Vec<String>) -> Result<(), ScriptError> {
        let arity = |n: usize| -> Result<(), ScriptError> {
            if words.len() == n + 1 {
                Ok(())
            } else {
                Err(ScriptError::Syntax {
                    line,
                    message: format!("`{}` takes {} argument(s)", words[0], n),
                })
            }
        };

        let result = match words[0] {
            "object" => {
                if words.len() != 2 && words.len() != 3 {
                    arity(1)?;
                }
                let prototype = match words.get(2) {
                    Some(name) => Some(self.var(line, name)?),
                    None => None,
                };
                let object = self.vm.new_object(prototype);
                self.vars.insert(words[1].to_string(), object);
                Ok(None)
            }
            "unique" => {
                arity(1)?;
                let object = self.vm.new_object_with_unique_structure(None);
                self.vars.insert(words[1].to_string(), object);
                Ok(None)
            }
            "array" => {
                arity(2)?;
                let length = words[2].parse::<u32>().map_err(|_| ScriptError::Syntax {
                    line,
                    message: format!("bad array length `{}`", words[2]),
                })?;
                let array = self.vm.new_array(length);
                self.vars.insert(words[1].to_string(), array);
                Ok(None)
            }
            "set" => {
                arity(3)?;
                let object = self.var(line, words[1])?;
                let key = self.vm.intern(words[2]);
                let value = self.value(line, words[3])?;
                self.vm.put(object, key, value, true).map(|_| None)
            }
            "define" => {
                arity(4)?;
                let object = self.var(line, words[1])?;
                let key = self.vm.intern(words[2]);
                let attrs = parse_flags(line, words[4])?;
                let desc = if words[3] == "-" {
                    PropertyDescriptor::data_attributes(attrs)
                } else {
                    PropertyDescriptor::data(self.value(line, words[3])?, attrs)
                };
                self.vm
                    .define_own_property(object, key, &desc, true)
                    .map(|_| None)
            }
            "length" => {
                arity(2)?;
                let object = self.var(line, words[1])?;
                let desc = PropertyDescriptor::data(
                    self.value(line, words[2])?,
                    Attributes::UNDEF_WRITABLE | Attributes::UNDEF_ENUMERABLE | Attributes::UNDEF_CONFIGURABLE,
                );
                self.vm
                    .define_own_property(object, Symbol::LENGTH, &desc, true)
                    .map(|_| None)
            }
            "delete" => {
                arity(2)?;
                let object = self.var(line, words[1])?;
                let key = self.vm.intern(words[2]);
                self.vm.delete(object, key, true).map(|_| None)
            }
            "get" => {
                arity(2)?;
                let object = self.var(line, words[1])?;
                let key = self.vm.intern(words[2]);
                self.vm.get(object, key).map(|value| Some(format!("{:?}", value)))
            }
            "keys" => {
                arity(1)?;
                let object = self.var(line, words[1])?;
                let names = self
                    .vm
                    .get_own_property_names(object, EnumerationMode::IncludeNotEnumerable);
                let names: Vec<String> = names.into_iter().map(|name| self.vm.description(name)).collect();
                Ok(Some(format!("[{}]", names.join(", "))))
            }
            "shape" => {
                arity(1)?;
                let object = self.var(line, words[1])?;
                Ok(Some(self.describe_structure(object)))
            }
            "seal" => {
                arity(1)?;
                let object = self.var(line, words[1])?;
                self.vm.prevent_extensions(object);
                Ok(None)
            }
            "gc" => {
                let mut roots = Vec::with_capacity(words.len() - 1);
                for name in &words[1..] {
                    roots.push(self.var(line, name)?);
                }
                let stats = self.vm.collect(&roots);
                let vm = &self.vm;
                self.vars.retain(|_, object| vm.try_object(*object).is_some());
                Ok(Some(format!(
                    "objects: {} live, {} freed; structures: {} live, {} freed",
                    stats.live_objects, stats.freed_objects, stats.live_structures, stats.freed_structures
                )))
            }
            other => {
                return Err(ScriptError::Syntax {
                    line,
                    message: format!("unknown command `{}`", other),
                })
            }
        };

        match result {
            Ok(Some(text)) => output.push(text),
            Ok(None) => (),
            Err(error) => output.push(format!("! {}", error)),
        }
        Ok(())
    }

    fn describe_structure(&mut self, object: Gc<Object>) -> String {
        let handle = self.vm.structure_of(object);
        let structure = self.vm.structure(handle);
        let mut text = format!(
            "structure #{} {} slots={} transitions={}",
            structure.id(),
            if structure.is_unique() { "unique" } else { "shared" },
            structure.get_slots_size(),
            structure.transition_count(),
        );
        if let Some(elements) = self.vm.object(object).elements() {
            text.push_str(&format!(
                " length={} {}",
                elements.length(),
                if elements.dense() { "dense" } else { "sparse" }
            ));
        }
        text
    }
}

/// `w`, `e` and `c` switch the matching attribute on; `-` means none.
fn parse_flags(line: usize, word: &str) -> Result<Attributes, ScriptError> {
    let mut attrs = Attributes::empty();
    for flag in word.chars() {
        match flag {
            'w' => attrs |= Attributes::WRITABLE,
            'e' => attrs |= Attributes::ENUMERABLE,
            'c' => attrs |= Attributes::CONFIGURABLE,
            '-' => (),
            _ => {
                return Err(ScriptError::Syntax {
                    line,
                    message: format!("bad attribute flag `{}`", flag),
                })
            }
        }
    }
    Ok(attrs)
}
