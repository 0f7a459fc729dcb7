//! # Symbol Table
//!
//! A stack of lexical scopes mapping names to [`Descriptor`]s.
//!
//! The table is never empty while a compilation runs: one scope holds the
//! program's globals and one more is pushed for each procedure body and
//! popped at its end. Lookup walks from the innermost scope outward, so
//! locals shadow globals. Insertion always targets the innermost scope.
//!
//! The table knows nothing about source positions; the compiler turns a
//! failed [`lookup`](SymbolTable::lookup) or [`define`](SymbolTable::define)
//! into the "is not declared" / "is already declared" diagnostic at the
//! offending token.

use std::collections::HashMap;

use crate::descriptor::Descriptor;

#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Descriptor>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Open a new innermost scope.
    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Close the innermost scope. Popping an empty table is a compiler bug.
    pub fn pop(&mut self) {
        self.scopes
            .pop()
            .expect("popped an empty symbol table");
    }

    /// How many scopes are open.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// True if `name` is visible in any open scope.
    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(name))
    }

    /// Find the descriptor for `name`, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<&Descriptor> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
    }

    /// Bind `name` in the innermost scope. Returns `false` (and leaves the
    /// table unchanged) if the scope already binds that name.
    pub fn define(&mut self, name: &str, descriptor: Descriptor) -> bool {
        let scope = self
            .scopes
            .last_mut()
            .expect("defined a name in an empty symbol table");
        if scope.contains_key(name) {
            return false;
        }
        scope.insert(name.to_string(), descriptor);
        true
    }
}
