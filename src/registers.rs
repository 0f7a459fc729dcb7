//! # Register Pool
//!
//! The code generator evaluates expressions in the eight callee-saved MIPS
//! registers `$s0`–`$s7`. The pool is a LIFO of free registers: a request
//! takes the most recently released one, a release pushes it back.
//!
//! Requesting from an empty pool is the *user's* problem (their expression
//! is too deeply nested), so [`RegisterPool::request`] returns `None` and
//! the compiler reports "expression too complex". Releasing a register
//! twice is a compiler bug and panics. The built-in registers (`$fp`,
//! `$sp`, `$ra`, `$v0`, `$zero`) are always live; they are never handed
//! out and never released.

use std::fmt;

/// A MIPS register the compiler knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    // Callee-saved scratch registers, the allocatable pool.
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    // Built-ins, always live.
    Fp,
    Sp,
    Ra,
    V0,
    Zero,
}

impl Reg {
    /// True for the `$s0`–`$s7` pool registers.
    pub fn is_scratch(&self) -> bool {
        use Reg::*;
        matches!(self, S0 | S1 | S2 | S3 | S4 | S5 | S6 | S7)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::S0 => "$s0",
            Reg::S1 => "$s1",
            Reg::S2 => "$s2",
            Reg::S3 => "$s3",
            Reg::S4 => "$s4",
            Reg::S5 => "$s5",
            Reg::S6 => "$s6",
            Reg::S7 => "$s7",
            Reg::Fp => "$fp",
            Reg::Sp => "$sp",
            Reg::Ra => "$ra",
            Reg::V0 => "$v0",
            Reg::Zero => "$zero",
        };
        f.write_str(name)
    }
}

/// All scratch registers, in pool order. `$s0` sits on top of the free
/// stack so it is the first one handed out.
const SCRATCH: [Reg; 8] = [
    Reg::S7,
    Reg::S6,
    Reg::S5,
    Reg::S4,
    Reg::S3,
    Reg::S2,
    Reg::S1,
    Reg::S0,
];

#[derive(Debug)]
pub struct RegisterPool {
    free: Vec<Reg>,
}

impl RegisterPool {
    pub fn new() -> Self {
        Self {
            free: SCRATCH.to_vec(),
        }
    }

    /// Take the top free register, or `None` when all eight are busy.
    pub fn request(&mut self) -> Option<Reg> {
        self.free.pop()
    }

    /// Return a register to the pool.
    pub fn release(&mut self, reg: Reg) {
        assert!(reg.is_scratch(), "released built-in register {reg}");
        assert!(
            !self.free.contains(&reg),
            "released register {reg} twice"
        );
        self.free.push(reg);
    }

    /// How many registers are currently handed out. Zero at every
    /// statement boundary.
    pub fn busy(&self) -> usize {
        SCRATCH.len() - self.free.len()
    }
}

impl Default for RegisterPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_come_in_pool_order() {
        let mut pool = RegisterPool::new();
        assert_eq!(pool.request(), Some(Reg::S0));
        assert_eq!(pool.request(), Some(Reg::S1));
        assert_eq!(pool.request(), Some(Reg::S2));
    }

    #[test]
    fn request_release_restores_the_pool() {
        let mut pool = RegisterPool::new();
        let reg = pool.request().unwrap();
        pool.release(reg);
        // LIFO: the same register comes back first.
        assert_eq!(pool.request(), Some(reg));
    }

    #[test]
    fn exhaustion_yields_none() {
        let mut pool = RegisterPool::new();
        for _ in 0..8 {
            assert!(pool.request().is_some());
        }
        assert_eq!(pool.busy(), 8);
        assert_eq!(pool.request(), None);
    }

    #[test]
    #[should_panic(expected = "twice")]
    fn double_release_panics() {
        let mut pool = RegisterPool::new();
        let reg = pool.request().unwrap();
        pool.release(reg);
        pool.release(reg);
    }

    #[test]
    #[should_panic(expected = "built-in")]
    fn releasing_a_built_in_panics() {
        let mut pool = RegisterPool::new();
        pool.release(Reg::Fp);
    }
}
