//! # Global Table
//!
//! Collects everything the `.data` section will hold: interned string
//! literals and storage for global variables.
//!
//! String literals are interned: two occurrences of the same text share
//! one label. The intern map is insertion-ordered so the emitted `.data`
//! section is deterministic. Global variables (scalars and arrays alike)
//! are recorded as (label, byte size) in declaration order.

use indexmap::IndexMap;

use crate::asm::{Assembler, Label, LabelFactory};
use crate::types::Type;

#[derive(Debug, Default)]
pub struct GlobalTable {
    strings: IndexMap<String, Label>,
    variables: Vec<(Label, i32)>,
}

impl GlobalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string literal, returning its label. Identical literals
    /// share one label.
    pub fn enter_string(&mut self, text: &str, labels: &mut LabelFactory) -> Label {
        if let Some(label) = self.strings.get(text) {
            return label.clone();
        }
        let label = labels.fresh("S");
        self.strings.insert(text.to_string(), label.clone());
        label
    }

    /// Allocate storage for a global variable of the given type.
    pub fn enter_variable(&mut self, ty: &Type, labels: &mut LabelFactory) -> Label {
        let label = labels.fresh("G");
        self.variables.push((label.clone(), ty.size()));
        label
    }

    /// Write the `.data` contents into the assembler's top stream:
    /// interned strings in intern order, then globals in declaration
    /// order.
    pub fn emit(&self, asm: &mut Assembler) {
        for (text, label) in &self.strings {
            asm.emit_top(format!("{label}: .asciiz \"{text}\""));
        }
        for (label, size) in &self.variables {
            asm.emit_top(format!("{label}: .space {size}"));
        }
    }
}
