//! # Descriptors
//!
//! A descriptor is what the symbol table knows about a name: its type plus
//! the addressing strategy that turns the name into registers. Expression
//! results are descriptors too (the register variant), which is what lets
//! the code generator treat `x`, `a[i]` and `f(x) + 1` uniformly.
//!
//! The protocol is two operations:
//! - [`rvalue`](Descriptor::rvalue): a register holding the *value*
//! - [`lvalue`](Descriptor::lvalue): a register holding the *address* to
//!   store through
//!
//! Arrays produce their base address as their rvalue and refuse to be
//! lvalues; procedures refuse both. Register descriptors hand back their
//! register unchanged and never enter the symbol table.

use crate::asm::{Assembler, Label};
use crate::registers::{Reg, RegisterPool};
use crate::types::Type;

/// Why a descriptor could not produce a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorError {
    /// The register pool is exhausted; the user's expression is too
    /// complex.
    OutOfRegisters,
    /// The descriptor is not assignable; the payload names what it is,
    /// article included ("an array" or "a procedure").
    NotAssignable(&'static str),
    /// A procedure was used where a value was expected.
    NotAValue,
}

#[derive(Debug, Clone)]
pub enum Descriptor {
    /// A scalar in `.data`.
    GlobalVariable { ty: Type, label: Label },
    /// An array in `.data`; its rvalue is the base address.
    GlobalArray { ty: Type, label: Label },
    /// A procedure entry point.
    GlobalProcedure { ty: Type, label: Label },
    /// A scalar (or caller-pushed word) on the current frame.
    LocalVariable { ty: Type, offset: i32 },
    /// An array on the current frame; its rvalue is the base address.
    LocalArray { ty: Type, offset: i32 },
    /// The transient result of an expression.
    Register { ty: Type, reg: Reg },
}

impl Descriptor {
    pub fn global_variable(ty: Type, label: Label) -> Self {
        Descriptor::GlobalVariable { ty, label }
    }

    pub fn global_array(ty: Type, label: Label) -> Self {
        Descriptor::GlobalArray { ty, label }
    }

    pub fn global_procedure(ty: Type, label: Label) -> Self {
        Descriptor::GlobalProcedure { ty, label }
    }

    pub fn local_variable(ty: Type, offset: i32) -> Self {
        Descriptor::LocalVariable { ty, offset }
    }

    pub fn local_array(ty: Type, offset: i32) -> Self {
        Descriptor::LocalArray { ty, offset }
    }

    pub fn register(ty: Type, reg: Reg) -> Self {
        Descriptor::Register { ty, reg }
    }

    pub fn ty(&self) -> &Type {
        match self {
            Descriptor::GlobalVariable { ty, .. }
            | Descriptor::GlobalArray { ty, .. }
            | Descriptor::GlobalProcedure { ty, .. }
            | Descriptor::LocalVariable { ty, .. }
            | Descriptor::LocalArray { ty, .. }
            | Descriptor::Register { ty, .. } => ty,
        }
    }

    /// The entry-point label, for procedure descriptors only.
    pub fn procedure_label(&self) -> Option<&Label> {
        match self {
            Descriptor::GlobalProcedure { label, .. } => Some(label),
            _ => None,
        }
    }

    /// Emit code leaving this name's value in a register.
    pub fn rvalue(
        &self,
        asm: &mut Assembler,
        regs: &mut RegisterPool,
    ) -> Result<Reg, DescriptorError> {
        match self {
            Descriptor::GlobalVariable { label, .. } => {
                let reg = regs.request().ok_or(DescriptorError::OutOfRegisters)?;
                asm.emit_rl("la", reg, label);
                asm.emit_mem("lw", reg, 0, reg);
                Ok(reg)
            }
            Descriptor::GlobalArray { label, .. } => {
                let reg = regs.request().ok_or(DescriptorError::OutOfRegisters)?;
                asm.emit_rl("la", reg, label);
                Ok(reg)
            }
            Descriptor::GlobalProcedure { .. } => Err(DescriptorError::NotAValue),
            Descriptor::LocalVariable { offset, .. } => {
                let reg = regs.request().ok_or(DescriptorError::OutOfRegisters)?;
                asm.emit_mem("lw", reg, *offset, Reg::Fp);
                Ok(reg)
            }
            Descriptor::LocalArray { offset, .. } => {
                let reg = regs.request().ok_or(DescriptorError::OutOfRegisters)?;
                asm.emit_rri("addi", reg, Reg::Fp, *offset);
                Ok(reg)
            }
            Descriptor::Register { reg, .. } => Ok(*reg),
        }
    }

    /// Emit code leaving the address to store this name through in a
    /// register.
    pub fn lvalue(
        &self,
        asm: &mut Assembler,
        regs: &mut RegisterPool,
    ) -> Result<Reg, DescriptorError> {
        match self {
            Descriptor::GlobalVariable { ty, label } => {
                if ty.is_array() {
                    return Err(DescriptorError::NotAssignable("an array"));
                }
                let reg = regs.request().ok_or(DescriptorError::OutOfRegisters)?;
                asm.emit_rl("la", reg, label);
                Ok(reg)
            }
            Descriptor::LocalVariable { ty, offset } => {
                if ty.is_array() {
                    return Err(DescriptorError::NotAssignable("an array"));
                }
                let reg = regs.request().ok_or(DescriptorError::OutOfRegisters)?;
                asm.emit_rri("addi", reg, Reg::Fp, *offset);
                Ok(reg)
            }
            Descriptor::GlobalArray { .. } | Descriptor::LocalArray { .. } => {
                Err(DescriptorError::NotAssignable("an array"))
            }
            Descriptor::GlobalProcedure { .. } => {
                Err(DescriptorError::NotAssignable("a procedure"))
            }
            // Register descriptors are expression results; nothing ever
            // assigns through one.
            Descriptor::Register { .. } => unreachable!("lvalue of a register descriptor"),
        }
    }
}
