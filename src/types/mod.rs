//! # Type Model
//!
//! SNARL's types: basic types, fixed-length arrays, and procedure types.
//!
//! Basic types are *nominal*: identity is the shared allocation, not the
//! name, and each basic type may name a parent, forming single-inheritance
//! chains rooted at the two primordials `int` and `string`. The surface
//! language only ever exposes the primordials; deeper chains exist for the
//! sake of the subtype relation itself (procedure compatibility is defined
//! through it).
//!
//! Subtyping rules:
//! - basic `A <: B` iff they are the same type or `B` is on `A`'s parent
//!   chain
//! - array `A <: B` iff the lengths are equal and the element types are
//!   equal
//! - procedure `P <: Q` iff the arities match, the return type is covariant
//!   and every parameter is contravariant
//! - mixed kinds are never subtypes

#[cfg(test)]
mod tests;

use std::fmt;
use std::rc::Rc;

/// Bytes per MIPS word; also the size of both primordials (`string` is an
/// address).
pub const WORD_SIZE: i32 = 4;

/// A named basic type with an optional parent.
#[derive(Debug)]
pub struct BasicType {
    name: String,
    size: i32,
    parent: Option<Rc<BasicType>>,
}

impl BasicType {
    /// A new root basic type.
    pub fn new(name: &str, size: i32) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            size,
            parent: None,
        })
    }

    /// A new basic type below `parent` in its chain.
    pub fn subtype_of(name: &str, size: i32, parent: &Rc<BasicType>) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            size,
            parent: Some(Rc::clone(parent)),
        })
    }
}

/// Walk `basic`'s parent chain looking for `target`.
fn chain_contains(basic: &Rc<BasicType>, target: &Rc<BasicType>) -> bool {
    let mut current = basic;
    loop {
        if Rc::ptr_eq(current, target) {
            return true;
        }
        match &current.parent {
            Some(parent) => current = parent,
            None => return false,
        }
    }
}

/// A fixed-length array type. SNARL's grammar only produces `int`
/// elements, but the model does not care.
#[derive(Debug)]
pub struct ArrayType {
    pub length: i32,
    pub element: Type,
}

/// A procedure type, built incrementally while its signature is parsed.
#[derive(Debug, Default)]
pub struct ProcedureType {
    parameters: Vec<Type>,
    return_type: Option<Type>,
}

impl ProcedureType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one parameter type.
    pub fn add_parameter(&mut self, parameter: Type) {
        self.parameters.push(parameter);
    }

    /// Set the return type. May be called once.
    pub fn set_return(&mut self, return_type: Type) {
        assert!(
            self.return_type.is_none(),
            "return type set twice on a procedure type"
        );
        self.return_type = Some(return_type);
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter(&self, index: usize) -> &Type {
        &self.parameters[index]
    }

    pub fn return_type(&self) -> &Type {
        self.return_type
            .as_ref()
            .expect("procedure type has no return type yet")
    }
}

/// A SNARL type.
#[derive(Debug, Clone)]
pub enum Type {
    Basic(Rc<BasicType>),
    Array(Rc<ArrayType>),
    Procedure(Rc<ProcedureType>),
}

impl Type {
    pub fn basic(basic: &Rc<BasicType>) -> Type {
        Type::Basic(Rc::clone(basic))
    }

    pub fn array(length: i32, element: Type) -> Type {
        Type::Array(Rc::new(ArrayType { length, element }))
    }

    pub fn procedure(procedure: ProcedureType) -> Type {
        Type::Procedure(Rc::new(procedure))
    }

    /// Storage size in bytes. A procedure value is an address.
    pub fn size(&self) -> i32 {
        match self {
            Type::Basic(basic) => basic.size,
            Type::Array(array) => array.length * array.element.size(),
            Type::Procedure(_) => WORD_SIZE,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    /// The nominal subtype relation.
    pub fn is_subtype(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Basic(a), Type::Basic(b)) => chain_contains(a, b),
            (Type::Array(a), Type::Array(b)) => {
                a.length == b.length && a.element == b.element
            }
            (Type::Procedure(p), Type::Procedure(q)) => {
                p.arity() == q.arity()
                    && p.return_type().is_subtype(q.return_type())
                    && (0..q.arity()).all(|i| q.parameter(i).is_subtype(p.parameter(i)))
            }
            _ => false,
        }
    }
}

/// Type equality: nominal identity for basics, structural for the rest.
impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Basic(a), Type::Basic(b)) => Rc::ptr_eq(a, b),
            (Type::Array(a), Type::Array(b)) => {
                a.length == b.length && a.element == b.element
            }
            (Type::Procedure(p), Type::Procedure(q)) => {
                p.arity() == q.arity()
                    && p.return_type() == q.return_type()
                    && (0..p.arity()).all(|i| p.parameter(i) == q.parameter(i))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(basic) => f.write_str(&basic.name),
            Type::Array(array) => write!(f, "[{}] {}", array.length, array.element),
            Type::Procedure(procedure) => {
                f.write_str("proc (")?;
                for i in 0..procedure.arity() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", procedure.parameter(i))?;
                }
                write!(f, ") {}", procedure.return_type())
            }
        }
    }
}

/// The two primordial basic types, created once per compilation so nominal
/// identity holds everywhere.
#[derive(Debug)]
pub struct Primitives {
    pub int: Type,
    pub string: Type,
}

impl Primitives {
    pub fn new() -> Self {
        Self {
            int: Type::Basic(BasicType::new("int", WORD_SIZE)),
            string: Type::Basic(BasicType::new("string", WORD_SIZE)),
        }
    }
}

impl Default for Primitives {
    fn default() -> Self {
        Self::new()
    }
}
