//! # Labels and the Assembler Sink
//!
//! [`LabelFactory`] hands out unique printable labels: a short purpose tag
//! (`L` for control flow and procedure entries, `S` for interned strings,
//! `G` for global variables) plus a compilation-wide serial. Labels are
//! never reused.
//!
//! [`Assembler`] buffers the output program as two ordered line streams:
//! the *top* stream holds the `.data` contents and the *text* stream holds
//! instructions and in-text labels in emission order. [`Assembler::finish`]
//! consumes the sink and lays the file out as `.data`, top lines, `.text`,
//! text lines. Taking `self` by value means the sink is finalized exactly
//! once, and a compilation that dies with a diagnostic never produces
//! partial output.
//!
//! The emission helpers cover the operand shapes the code generator needs;
//! each formats one line of MIPS textual syntax, e.g. `lw $s0, -4($fp)` or
//! `beq $s0, $zero, L42`.

use std::fmt;

use crate::registers::Reg;

/// A unique assembly label such as `L17`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints labels. One factory per compilation; the serial never repeats
/// across tags.
#[derive(Debug, Default)]
pub struct LabelFactory {
    counter: u32,
}

impl LabelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, tag: &str) -> Label {
        let serial = self.counter;
        self.counter += 1;
        Label(format!("{tag}{serial}"))
    }
}

#[derive(Debug, Default)]
pub struct Assembler {
    top: Vec<String>,
    text: Vec<String>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line to the `.data` preamble.
    pub fn emit_top(&mut self, line: String) {
        self.top.push(line);
    }

    /// Define a label in the text stream.
    pub fn emit_label(&mut self, label: &Label) {
        self.text.push(format!("{label}:"));
    }

    /// Inject one verbatim line (the `code` escape hatch).
    pub fn emit_verbatim(&mut self, line: &str) {
        self.text.push(line.to_string());
    }

    /// `jr $ra`
    pub fn emit_r(&mut self, op: &str, reg: Reg) {
        self.text.push(format!("    {op} {reg}"));
    }

    /// `move $v0, $s0`
    pub fn emit_rr(&mut self, op: &str, rd: Reg, rs: Reg) {
        self.text.push(format!("    {op} {rd}, {rs}"));
    }

    /// `add $s0, $s0, $s1`
    pub fn emit_rrr(&mut self, op: &str, rd: Reg, rs: Reg, rt: Reg) {
        self.text.push(format!("    {op} {rd}, {rs}, {rt}"));
    }

    /// `li $s0, 42`
    pub fn emit_ri(&mut self, op: &str, rd: Reg, imm: i32) {
        self.text.push(format!("    {op} {rd}, {imm}"));
    }

    /// `addi $sp, $sp, -44` or `sll $s1, $s1, 2`
    pub fn emit_rri(&mut self, op: &str, rd: Reg, rs: Reg, imm: i32) {
        self.text.push(format!("    {op} {rd}, {rs}, {imm}"));
    }

    /// `la $s0, L17`
    pub fn emit_rl(&mut self, op: &str, rd: Reg, label: &Label) {
        self.text.push(format!("    {op} {rd}, {label}"));
    }

    /// `beq $s0, $zero, L42`
    pub fn emit_rrl(&mut self, op: &str, rs: Reg, rt: Reg, label: &Label) {
        self.text.push(format!("    {op} {rs}, {rt}, {label}"));
    }

    /// `j L3` or `jal L3`
    pub fn emit_l(&mut self, op: &str, label: &Label) {
        self.text.push(format!("    {op} {label}"));
    }

    /// `lw $s0, -4($fp)` / `sw $s0, 0($sp)`
    pub fn emit_mem(&mut self, op: &str, reg: Reg, offset: i32, base: Reg) {
        self.text.push(format!("    {op} {reg}, {offset}({base})"));
    }

    /// Lay out the finished program.
    pub fn finish(self) -> String {
        let mut out = String::from(".data\n");
        for line in &self.top {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(".text\n");
        for line in &self.text {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unique_across_tags() {
        let mut labels = LabelFactory::new();
        let a = labels.fresh("L");
        let b = labels.fresh("S");
        let c = labels.fresh("L");
        assert_eq!(a.to_string(), "L0");
        assert_eq!(b.to_string(), "S1");
        assert_eq!(c.to_string(), "L2");
        assert_ne!(a, c);
    }

    #[test]
    fn formats_mips_syntax() {
        let mut labels = LabelFactory::new();
        let label = labels.fresh("L");
        let mut asm = Assembler::new();
        asm.emit_label(&label);
        asm.emit_mem("lw", Reg::S0, -4, Reg::Fp);
        asm.emit_rri("addi", Reg::Sp, Reg::Sp, -44);
        asm.emit_rl("la", Reg::S0, &label);
        asm.emit_rrl("beq", Reg::S0, Reg::Zero, &label);
        asm.emit_r("jr", Reg::Ra);
        let out = asm.finish();
        let expected = "\
.data
.text
L0:
    lw $s0, -4($fp)
    addi $sp, $sp, -44
    la $s0, L0
    beq $s0, $zero, L0
    jr $ra
";
        assert_eq!(out, expected);
    }

    #[test]
    fn top_lines_precede_text_lines() {
        let mut asm = Assembler::new();
        asm.emit_verbatim("    syscall");
        asm.emit_top("S0: .asciiz \"hi\"".to_string());
        let out = asm.finish();
        assert_eq!(out, ".data\nS0: .asciiz \"hi\"\n.text\n    syscall\n");
    }
}
