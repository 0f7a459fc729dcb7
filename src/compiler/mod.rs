//! # Two-Pass Parser and Code Generator
//!
//! A classic recursive descent with one token of lookahead, run twice over
//! the same source:
//!
//! 1. **Pass 1 (signatures)** walks the token stream and records a global
//!    procedure descriptor (procedure type, fresh label) for every `proc`,
//!    skipping everything else. Forward and mutually recursive calls need
//!    no prototypes because every signature exists before any body is
//!    compiled.
//! 2. **Pass 2 (full compile)** rewinds to a fresh scanner and walks the
//!    grammar, consulting the symbol table, allocating registers, and
//!    emitting MIPS instructions as it goes.
//!
//! There is no AST: each grammar function parses, type-checks, and emits in
//! one motion, returning a register descriptor for the value it computed.
//! Registers follow a strict request/release discipline: every transient
//! is released by the operator that consumes it, so the pool is empty at
//! every statement boundary.


use std::rc::Rc;

use crate::asm::{Assembler, LabelFactory};
use crate::descriptor::{Descriptor, DescriptorError};
use crate::error::{Diagnostic, ErrorKind, Span};
use crate::globals::GlobalTable;
use crate::registers::{Reg, RegisterPool};
use crate::scanner::token::TokenKind;
use crate::scanner::Scanner;
use crate::symtab::SymbolTable;
use crate::types::{Primitives, ProcedureType, Type, WORD_SIZE};

/// Bytes of saved registers in every frame: `$ra`, `$fp`, `$s0`–`$s7`.
const SAVED_BYTES: i32 = 40;

/// Save/restore order for the scratch registers: `$s0` at `32($sp)` down
/// to `$s7` at `4($sp)`.
const SAVED_SCRATCH: [Reg; 8] = [
    Reg::S0,
    Reg::S1,
    Reg::S2,
    Reg::S3,
    Reg::S4,
    Reg::S5,
    Reg::S6,
    Reg::S7,
];

/// What the code generator must know about the procedure being compiled.
struct Frame {
    return_type: Type,
    local_bytes: i32,
    arity: usize,
}

pub struct Compiler<'a> {
    source: &'a str,
    scanner: Scanner<'a>,
    symbols: SymbolTable,
    regs: RegisterPool,
    labels: LabelFactory,
    asm: Assembler,
    globals: GlobalTable,
    prims: Primitives,
    frame: Option<Frame>,
}

impl<'a> Compiler<'a> {
    pub fn new(source: &'a str) -> Result<Self, Diagnostic> {
        Ok(Self {
            source,
            scanner: Scanner::new(source)?,
            symbols: SymbolTable::new(),
            regs: RegisterPool::new(),
            labels: LabelFactory::new(),
            asm: Assembler::new(),
            globals: GlobalTable::new(),
            prims: Primitives::new(),
            frame: None,
        })
    }

    /// Run both passes and lay out the finished assembly text.
    pub fn compile(mut self) -> Result<String, Diagnostic> {
        self.symbols.push(); // the program's global scope
        self.declare_signatures()?;
        self.rewind()?;
        self.translate_program()?;
        self.symbols.pop();
        self.globals.emit(&mut self.asm);
        Ok(self.asm.finish())
    }

    /// Restart scanning from the top of the source (the pass boundary).
    fn rewind(&mut self) -> Result<(), Diagnostic> {
        self.scanner = Scanner::new(self.source)?;
        Ok(())
    }

    // === Pass 1 ===

    /// Record a global procedure descriptor for every `proc` in the
    /// source; skip everything else.
    fn declare_signatures(&mut self) -> Result<(), Diagnostic> {
        log::debug!("pass 1: collecting procedure signatures");
        loop {
            match self.scanner.kind() {
                TokenKind::Eof => return Ok(()),
                TokenKind::Proc => self.declare_signature()?,
                _ => self.scanner.next_token()?,
            }
        }
    }

    fn declare_signature(&mut self) -> Result<(), Diagnostic> {
        self.scanner.next_token()?; // proc
        let name_span = self.scanner.span();
        let name = self.expect_name()?;
        let mut procedure = ProcedureType::new();
        self.expect(&TokenKind::OpenParen)?;
        if self.scanner.kind() != &TokenKind::CloseParen {
            loop {
                let (_, ty, _) = self.next_declaration()?;
                procedure.add_parameter(ty);
                if self.scanner.kind() == &TokenKind::Comma {
                    self.scanner.next_token()?;
                } else {
                    break;
                }
            }
        }
        self.expect(&TokenKind::CloseParen)?;
        procedure.set_return(self.next_basic_type()?);
        self.expect(&TokenKind::Colon)?;

        let label = self.labels.fresh("L");
        log::debug!("signature {name}: {} -> {label}", procedure.arity());
        let descriptor = Descriptor::global_procedure(Type::procedure(procedure), label);
        self.define(&name, descriptor, name_span)?;

        // Skip the body; `proc` is reserved, so the next one is top-level.
        loop {
            match self.scanner.kind() {
                TokenKind::Eof | TokenKind::Proc => return Ok(()),
                _ => self.scanner.next_token()?,
            }
        }
    }

    // === Pass 2 ===

    /// program = program-part { ";" program-part } EOF
    fn translate_program(&mut self) -> Result<(), Diagnostic> {
        log::debug!("pass 2: compiling");
        self.next_program_part()?;
        while self.scanner.kind() == &TokenKind::Semicolon {
            self.scanner.next_token()?;
            self.next_program_part()?;
        }
        if self.scanner.kind() != &TokenKind::Eof {
            return Err(self.fail(ErrorKind::ExpectedToken, "expected ; or end of file"));
        }
        Ok(())
    }

    fn next_program_part(&mut self) -> Result<(), Diagnostic> {
        match self.scanner.kind() {
            TokenKind::Proc => self.next_procedure(),
            kind if kind.starts_declaration() => self.next_global_declaration(),
            _ => Err(self.fail(
                ErrorKind::ExpectedToken,
                "expected a declaration or a procedure",
            )),
        }
    }

    /// A declaration at program scope: storage in `.data`, a global
    /// descriptor in the outermost scope.
    fn next_global_declaration(&mut self) -> Result<(), Diagnostic> {
        let (name, ty, span) = self.next_declaration()?;
        let label = self.globals.enter_variable(&ty, &mut self.labels);
        let descriptor = if ty.is_array() {
            Descriptor::global_array(ty, label)
        } else {
            Descriptor::global_variable(ty, label)
        };
        self.define(&name, descriptor, span)
    }

    /// declaration = "int" name | "string" name | "[" intconst "]" "int" name
    ///
    /// Returns the declared name, its type, and the span of the name.
    fn next_declaration(&mut self) -> Result<(String, Type, Span), Diagnostic> {
        let ty = match self.scanner.kind() {
            TokenKind::Int => {
                self.scanner.next_token()?;
                self.prims.int.clone()
            }
            TokenKind::StringKeyword => {
                self.scanner.next_token()?;
                self.prims.string.clone()
            }
            TokenKind::OpenBracket => {
                self.scanner.next_token()?;
                let length = match self.scanner.kind() {
                    TokenKind::IntConstant(value, _) => *value,
                    _ => {
                        return Err(
                            self.fail(ErrorKind::ExpectedToken, "expected an array length")
                        )
                    }
                };
                self.scanner.next_token()?;
                self.expect(&TokenKind::CloseBracket)?;
                self.expect(&TokenKind::Int)?;
                Type::array(length, self.prims.int.clone())
            }
            _ => return Err(self.fail(ErrorKind::ExpectedToken, "expected a declaration")),
        };
        let span = self.scanner.span();
        let name = self.expect_name()?;
        Ok((name, ty, span))
    }

    /// The return type of a procedure: one of the two primordials.
    fn next_basic_type(&mut self) -> Result<Type, Diagnostic> {
        match self.scanner.kind() {
            TokenKind::Int => {
                self.scanner.next_token()?;
                Ok(self.prims.int.clone())
            }
            TokenKind::StringKeyword => {
                self.scanner.next_token()?;
                Ok(self.prims.string.clone())
            }
            _ => Err(self.fail(ErrorKind::ExpectedToken, "expected int or string")),
        }
    }

    /// procedure = "proc" name "(" parameters ")" type ":" body
    ///
    /// The signature was typed in pass 1; this re-parses it to install
    /// parameter descriptors, then compiles the body between prologue and
    /// epilogue.
    fn next_procedure(&mut self) -> Result<(), Diagnostic> {
        self.scanner.next_token()?; // proc
        let name = self.expect_name()?;
        let descriptor = self
            .symbols
            .lookup(&name)
            .cloned()
            .expect("pass 1 recorded every procedure signature");
        let label = descriptor
            .procedure_label()
            .expect("pass 1 made this a procedure descriptor")
            .clone();
        let return_type = match descriptor.ty() {
            Type::Procedure(procedure) => procedure.return_type().clone(),
            _ => unreachable!("pass 1 made this a procedure descriptor"),
        };
        log::debug!("compiling procedure {name}");

        self.symbols.push();

        // Parameters: caller-pushed words at positive offsets; the first
        // parameter sits highest. An array parameter is the one word
        // holding its address, so it installs as a plain local variable.
        self.expect(&TokenKind::OpenParen)?;
        let mut parameters = Vec::new();
        if self.scanner.kind() != &TokenKind::CloseParen {
            loop {
                parameters.push(self.next_declaration()?);
                if self.scanner.kind() == &TokenKind::Comma {
                    self.scanner.next_token()?;
                } else {
                    break;
                }
            }
        }
        self.expect(&TokenKind::CloseParen)?;
        self.next_basic_type()?;
        self.expect(&TokenKind::Colon)?;

        let arity = parameters.len();
        for (index, (param_name, param_ty, param_span)) in parameters.into_iter().enumerate() {
            let offset = WORD_SIZE * (arity - index) as i32;
            self.define(
                &param_name,
                Descriptor::local_variable(param_ty, offset),
                param_span,
            )?;
        }

        // Body-local declarations: full declared size, laid out downward
        // from the frame pointer.
        let mut local_bytes = 0;
        while self.scanner.kind().starts_declaration() {
            let (local_name, local_ty, local_span) = self.next_declaration()?;
            local_bytes += local_ty.size();
            let offset = WORD_SIZE - local_bytes;
            let local = if local_ty.is_array() {
                Descriptor::local_array(local_ty, offset)
            } else {
                Descriptor::local_variable(local_ty, offset)
            };
            self.define(&local_name, local, local_span)?;
            self.expect(&TokenKind::Semicolon)?;
        }

        self.asm.emit_label(&label);
        self.emit_prologue(local_bytes);
        self.frame = Some(Frame {
            return_type,
            local_bytes,
            arity,
        });
        self.next_statement()?;
        self.emit_epilogue(); // the fall-off-the-end return
        self.frame = None;
        self.symbols.pop();
        Ok(())
    }

    /// Reserve the frame and save `$ra`, `$fp`, `$s0`–`$s7`; `$fp` ends up
    /// on the boundary between locals and the caller's argument words.
    fn emit_prologue(&mut self, local_bytes: i32) {
        let frame = SAVED_BYTES + local_bytes;
        self.asm.emit_rri("addi", Reg::Sp, Reg::Sp, -frame);
        self.asm.emit_mem("sw", Reg::Ra, 40, Reg::Sp);
        self.asm.emit_mem("sw", Reg::Fp, 36, Reg::Sp);
        for (index, reg) in SAVED_SCRATCH.iter().enumerate() {
            self.asm.emit_mem("sw", *reg, 32 - WORD_SIZE * index as i32, Reg::Sp);
        }
        self.asm.emit_rri("addi", Reg::Fp, Reg::Sp, frame);
    }

    /// Restore the saved registers, pop the frame plus the caller's
    /// argument words, and return.
    fn emit_epilogue(&mut self) {
        let (local_bytes, arity) = {
            let frame = self.frame.as_ref().expect("epilogue inside a procedure");
            (frame.local_bytes, frame.arity)
        };
        self.asm.emit_mem("lw", Reg::Ra, 40, Reg::Sp);
        self.asm.emit_mem("lw", Reg::Fp, 36, Reg::Sp);
        for (index, reg) in SAVED_SCRATCH.iter().enumerate() {
            self.asm.emit_mem("lw", *reg, 32 - WORD_SIZE * index as i32, Reg::Sp);
        }
        let pop = SAVED_BYTES + local_bytes + WORD_SIZE * arity as i32;
        self.asm.emit_rri("addi", Reg::Sp, Reg::Sp, pop);
        self.asm.emit_r("jr", Reg::Ra);
    }

    // === Statements ===

    fn next_statement(&mut self) -> Result<(), Diagnostic> {
        match self.scanner.kind() {
            TokenKind::Name(_) => self.next_name_statement(),
            TokenKind::Begin => self.next_begin(),
            TokenKind::Code => self.next_code(),
            TokenKind::If => self.next_if(),
            TokenKind::While => self.next_while(),
            TokenKind::Value => self.next_value(),
            _ => Err(self.fail(ErrorKind::ExpectedToken, "expected a statement")),
        }
    }

    /// Statements opening with a name: scalar assignment, array-element
    /// assignment, or a call whose result is discarded.
    fn next_name_statement(&mut self) -> Result<(), Diagnostic> {
        let span = self.scanner.span();
        let name = self.expect_name()?;
        let descriptor = self.lookup(&name, span)?;
        match self.scanner.kind() {
            TokenKind::Assign => self.next_scalar_assignment(&name, descriptor, span),
            TokenKind::OpenBracket => self.next_element_assignment(&name, descriptor),
            TokenKind::OpenParen => {
                let result = self.next_call(&name, &descriptor, span)?;
                let reg = self.rvalue(&result)?;
                self.regs.release(reg);
                Ok(())
            }
            _ => Err(self.fail(
                ErrorKind::ExpectedToken,
                format!("expected :=, [ or ( after {name}"),
            )),
        }
    }

    /// name ":=" expression
    fn next_scalar_assignment(
        &mut self,
        name: &str,
        target: Descriptor,
        span: Span,
    ) -> Result<(), Diagnostic> {
        self.scanner.next_token()?; // :=
        if !(target.ty().is_subtype(&self.prims.int) || target.ty().is_subtype(&self.prims.string))
        {
            return Err(Diagnostic::new(
                ErrorKind::CannotAssign,
                format!("cannot assign to {name}"),
                span,
            ));
        }
        let value_span = self.scanner.span();
        let value = self.next_expression()?;
        self.check(value.ty(), target.ty(), value_span)?;
        let value_reg = self.rvalue(&value)?;
        let address = self.lvalue(&target)?;
        self.asm.emit_mem("sw", value_reg, 0, address);
        self.regs.release(value_reg);
        self.regs.release(address);
        Ok(())
    }

    /// name "[" expression "]" ":=" expression
    fn next_element_assignment(
        &mut self,
        name: &str,
        target: Descriptor,
    ) -> Result<(), Diagnostic> {
        let element = self.element_type(name, &target)?;
        self.scanner.next_token()?; // [
        let base = self.rvalue(&target)?;
        let index_span = self.scanner.span();
        let index = self.next_expression()?;
        self.check(index.ty(), &self.prims.int, index_span)?;
        let index_reg = self.rvalue(&index)?;
        self.expect(&TokenKind::CloseBracket)?;
        self.asm.emit_rri("sll", index_reg, index_reg, 2);
        self.asm.emit_rrr("add", base, base, index_reg);
        self.regs.release(index_reg);
        self.expect(&TokenKind::Assign)?;
        let value_span = self.scanner.span();
        let value = self.next_expression()?;
        self.check(value.ty(), &element, value_span)?;
        let value_reg = self.rvalue(&value)?;
        self.asm.emit_mem("sw", value_reg, 0, base);
        self.regs.release(value_reg);
        self.regs.release(base);
        Ok(())
    }

    /// "begin" [ statement { ";" statement } ] "end"
    fn next_begin(&mut self) -> Result<(), Diagnostic> {
        self.scanner.next_token()?; // begin
        if self.scanner.kind() != &TokenKind::End {
            self.next_statement()?;
            while self.scanner.kind() == &TokenKind::Semicolon {
                self.scanner.next_token()?;
                self.next_statement()?;
            }
        }
        self.expect(&TokenKind::End)
    }

    /// "code" stringconst, the inline-assembly escape hatch. The payload
    /// goes into the text stream verbatim, unvalidated.
    fn next_code(&mut self) -> Result<(), Diagnostic> {
        self.scanner.next_token()?; // code
        let text = match self.scanner.kind() {
            TokenKind::StringConstant(text) => text.clone(),
            _ => {
                return Err(self.fail(
                    ErrorKind::ExpectedToken,
                    "expected a string constant after code",
                ))
            }
        };
        self.asm.emit_verbatim(&text);
        self.scanner.next_token()
    }

    /// "if" expression "then" statement { "else" "if" … } [ "else" … ]
    ///
    /// One shared end label per chain; one next label per arm.
    fn next_if(&mut self) -> Result<(), Diagnostic> {
        let end_label = self.labels.fresh("L");
        loop {
            self.scanner.next_token()?; // if
            let condition_span = self.scanner.span();
            let condition = self.next_expression()?;
            self.check(condition.ty(), &self.prims.int, condition_span)?;
            let reg = self.rvalue(&condition)?;
            let next_label = self.labels.fresh("L");
            self.asm.emit_rrl("beq", reg, Reg::Zero, &next_label);
            self.regs.release(reg);
            self.expect(&TokenKind::Then)?;
            self.next_statement()?;
            self.asm.emit_l("j", &end_label);
            self.asm.emit_label(&next_label);
            if self.scanner.kind() != &TokenKind::Else {
                break;
            }
            self.scanner.next_token()?; // else
            if self.scanner.kind() == &TokenKind::If {
                continue; // else if: the next arm
            }
            self.next_statement()?; // the final else
            break;
        }
        self.asm.emit_label(&end_label);
        Ok(())
    }

    /// "while" expression "do" statement: a pre-tested loop.
    fn next_while(&mut self) -> Result<(), Diagnostic> {
        self.scanner.next_token()?; // while
        let top_label = self.labels.fresh("L");
        let end_label = self.labels.fresh("L");
        self.asm.emit_label(&top_label);
        let condition_span = self.scanner.span();
        let condition = self.next_expression()?;
        self.check(condition.ty(), &self.prims.int, condition_span)?;
        let reg = self.rvalue(&condition)?;
        self.asm.emit_rrl("beq", reg, Reg::Zero, &end_label);
        self.regs.release(reg);
        self.expect(&TokenKind::Do)?;
        self.next_statement()?;
        self.asm.emit_l("j", &top_label);
        self.asm.emit_label(&end_label);
        Ok(())
    }

    /// "value" expression: move the result to `$v0` and return through
    /// the epilogue. A body may hold any number of these.
    fn next_value(&mut self) -> Result<(), Diagnostic> {
        self.scanner.next_token()?; // value
        let result_span = self.scanner.span();
        let result = self.next_expression()?;
        let return_type = self
            .frame
            .as_ref()
            .expect("value inside a procedure")
            .return_type
            .clone();
        self.check(result.ty(), &return_type, result_span)?;
        let reg = self.rvalue(&result)?;
        self.asm.emit_rr("move", Reg::V0, reg);
        self.regs.release(reg);
        self.emit_epilogue();
        Ok(())
    }

    // === Expressions ===
    //
    // Each level returns a register descriptor holding its value; the
    // operator that consumes an operand register releases it.

    /// expression = conjunction { "or" conjunction }, short-circuiting.
    fn next_expression(&mut self) -> Result<Descriptor, Diagnostic> {
        let left_span = self.scanner.span();
        let left = self.next_conjunction()?;
        if self.scanner.kind() != &TokenKind::Or {
            return Ok(left);
        }
        self.check(left.ty(), &self.prims.int, left_span)?;
        let reg = self.rvalue(&left)?;
        let join = self.labels.fresh("L");
        self.asm.emit_rrr("sne", reg, reg, Reg::Zero);
        self.asm.emit_rrl("bne", reg, Reg::Zero, &join);
        while self.scanner.kind() == &TokenKind::Or {
            self.scanner.next_token()?;
            let right_span = self.scanner.span();
            let right = self.next_conjunction()?;
            self.check(right.ty(), &self.prims.int, right_span)?;
            let right_reg = self.rvalue(&right)?;
            self.asm.emit_rrr("sne", reg, right_reg, Reg::Zero);
            self.regs.release(right_reg);
            self.asm.emit_rrl("bne", reg, Reg::Zero, &join);
        }
        self.asm.emit_label(&join);
        Ok(Descriptor::register(self.prims.int.clone(), reg))
    }

    /// conjunction = comparison { "and" comparison }, short-circuiting.
    fn next_conjunction(&mut self) -> Result<Descriptor, Diagnostic> {
        let left_span = self.scanner.span();
        let left = self.next_comparison()?;
        if self.scanner.kind() != &TokenKind::And {
            return Ok(left);
        }
        self.check(left.ty(), &self.prims.int, left_span)?;
        let reg = self.rvalue(&left)?;
        let join = self.labels.fresh("L");
        self.asm.emit_rrr("sne", reg, reg, Reg::Zero);
        self.asm.emit_rrl("beq", reg, Reg::Zero, &join);
        while self.scanner.kind() == &TokenKind::And {
            self.scanner.next_token()?;
            let right_span = self.scanner.span();
            let right = self.next_comparison()?;
            self.check(right.ty(), &self.prims.int, right_span)?;
            let right_reg = self.rvalue(&right)?;
            self.asm.emit_rrr("sne", reg, right_reg, Reg::Zero);
            self.regs.release(right_reg);
            self.asm.emit_rrl("beq", reg, Reg::Zero, &join);
        }
        self.asm.emit_label(&join);
        Ok(Descriptor::register(self.prims.int.clone(), reg))
    }

    /// comparison = sum [ relop sum ], non-associative; 0/1 result.
    fn next_comparison(&mut self) -> Result<Descriptor, Diagnostic> {
        let left_span = self.scanner.span();
        let left = self.next_sum()?;
        let op = match self.scanner.kind() {
            TokenKind::Less => "slt",
            TokenKind::LessEqual => "sle",
            TokenKind::Greater => "sgt",
            TokenKind::GreaterEqual => "sge",
            TokenKind::NotEqual => "sne",
            TokenKind::Equal => "seq",
            _ => return Ok(left),
        };
        self.check(left.ty(), &self.prims.int, left_span)?;
        let left_reg = self.rvalue(&left)?;
        self.scanner.next_token()?;
        let right_span = self.scanner.span();
        let right = self.next_sum()?;
        self.check(right.ty(), &self.prims.int, right_span)?;
        let right_reg = self.rvalue(&right)?;
        self.asm.emit_rrr(op, left_reg, left_reg, right_reg);
        self.regs.release(right_reg);
        Ok(Descriptor::register(self.prims.int.clone(), left_reg))
    }

    /// sum = product { ("+" | "-") product }, left-associative.
    fn next_sum(&mut self) -> Result<Descriptor, Diagnostic> {
        let left_span = self.scanner.span();
        let mut left = self.next_product()?;
        loop {
            let op = match self.scanner.kind() {
                TokenKind::Plus => "add",
                TokenKind::Minus => "sub",
                _ => return Ok(left),
            };
            self.check(left.ty(), &self.prims.int, left_span)?;
            let left_reg = self.rvalue(&left)?;
            self.scanner.next_token()?;
            let right_span = self.scanner.span();
            let right = self.next_product()?;
            self.check(right.ty(), &self.prims.int, right_span)?;
            let right_reg = self.rvalue(&right)?;
            self.asm.emit_rrr(op, left_reg, left_reg, right_reg);
            self.regs.release(right_reg);
            left = Descriptor::register(self.prims.int.clone(), left_reg);
        }
    }

    /// product = unary { ("*" | "/") unary }, left-associative.
    fn next_product(&mut self) -> Result<Descriptor, Diagnostic> {
        let left_span = self.scanner.span();
        let mut left = self.next_unary()?;
        loop {
            let op = match self.scanner.kind() {
                TokenKind::Star => "mul",
                TokenKind::Slash => "div",
                _ => return Ok(left),
            };
            self.check(left.ty(), &self.prims.int, left_span)?;
            let left_reg = self.rvalue(&left)?;
            self.scanner.next_token()?;
            let right_span = self.scanner.span();
            let right = self.next_unary()?;
            self.check(right.ty(), &self.prims.int, right_span)?;
            let right_reg = self.rvalue(&right)?;
            self.asm.emit_rrr(op, left_reg, left_reg, right_reg);
            self.regs.release(right_reg);
            left = Descriptor::register(self.prims.int.clone(), left_reg);
        }
    }

    /// unary = ("-" | "not") unary | unit, with right-associative prefixes.
    fn next_unary(&mut self) -> Result<Descriptor, Diagnostic> {
        let op = match self.scanner.kind() {
            TokenKind::Minus => "sub",
            TokenKind::Not => "seq",
            _ => return self.next_unit(),
        };
        self.scanner.next_token()?;
        let operand_span = self.scanner.span();
        let operand = self.next_unary()?;
        self.check(operand.ty(), &self.prims.int, operand_span)?;
        let reg = self.rvalue(&operand)?;
        // `- x` is 0 - x; `not x` is x == 0.
        self.asm.emit_rrr(op, reg, Reg::Zero, reg);
        Ok(Descriptor::register(self.prims.int.clone(), reg))
    }

    /// unit = intconst | stringconst | "(" expression ")" | name
    ///      | name "(" arguments ")" | name "[" expression "]"
    fn next_unit(&mut self) -> Result<Descriptor, Diagnostic> {
        match self.scanner.kind().clone() {
            TokenKind::IntConstant(value, _) => {
                let reg = self.request()?;
                self.asm.emit_ri("li", reg, value);
                self.scanner.next_token()?;
                Ok(Descriptor::register(self.prims.int.clone(), reg))
            }
            TokenKind::StringConstant(text) => {
                let label = self.globals.enter_string(&text, &mut self.labels);
                let reg = self.request()?;
                self.asm.emit_rl("la", reg, &label);
                self.scanner.next_token()?;
                Ok(Descriptor::register(self.prims.string.clone(), reg))
            }
            TokenKind::OpenParen => {
                self.scanner.next_token()?;
                let inner = self.next_expression()?;
                self.expect(&TokenKind::CloseParen)?;
                Ok(inner)
            }
            TokenKind::Name(name) => {
                // Capture the descriptor now, before `[` or `(` moves the
                // scanner past the name.
                let span = self.scanner.span();
                self.scanner.next_token()?;
                let descriptor = self.lookup(&name, span)?;
                match self.scanner.kind() {
                    TokenKind::OpenParen => self.next_call(&name, &descriptor, span),
                    TokenKind::OpenBracket => self.next_subscript(&name, &descriptor),
                    _ => {
                        let reg = self.rvalue(&descriptor)?;
                        Ok(Descriptor::register(descriptor.ty().clone(), reg))
                    }
                }
            }
            _ => Err(self.fail(ErrorKind::ExpectedToken, "expected an expression")),
        }
    }

    /// name "[" expression "]" in expression position: load the element.
    fn next_subscript(
        &mut self,
        name: &str,
        target: &Descriptor,
    ) -> Result<Descriptor, Diagnostic> {
        let element = self.element_type(name, target)?;
        self.scanner.next_token()?; // [
        let base = self.rvalue(target)?;
        let index_span = self.scanner.span();
        let index = self.next_expression()?;
        self.check(index.ty(), &self.prims.int, index_span)?;
        let index_reg = self.rvalue(&index)?;
        self.expect(&TokenKind::CloseBracket)?;
        self.asm.emit_rri("sll", index_reg, index_reg, 2);
        self.asm.emit_rrr("add", base, base, index_reg);
        self.asm.emit_mem("lw", base, 0, base);
        self.regs.release(index_reg);
        Ok(Descriptor::register(element, base))
    }

    /// name "(" [ expression { "," expression } ] ")", in either
    /// expression or statement position. Arguments are pushed left to
    /// right; the result register receives `$v0`.
    fn next_call(
        &mut self,
        name: &str,
        target: &Descriptor,
        span: Span,
    ) -> Result<Descriptor, Diagnostic> {
        let procedure = match target.ty() {
            Type::Procedure(procedure) => Rc::clone(procedure),
            _ => {
                return Err(Diagnostic::new(
                    ErrorKind::NotAProcedure,
                    format!("{name} is not a procedure"),
                    span,
                ))
            }
        };
        let label = target
            .procedure_label()
            .expect("a procedure-typed descriptor is a global procedure")
            .clone();
        let arity_error = |count: usize| {
            Diagnostic::new(
                ErrorKind::WrongArgumentCount,
                format!(
                    "{name} expects {} arguments, found {count}",
                    procedure.arity()
                ),
                span,
            )
        };

        self.scanner.next_token()?; // (
        let mut count = 0;
        if self.scanner.kind() != &TokenKind::CloseParen {
            loop {
                if count == procedure.arity() {
                    return Err(arity_error(count + 1));
                }
                let argument_span = self.scanner.span();
                let argument = self.next_expression()?;
                self.check(argument.ty(), procedure.parameter(count), argument_span)?;
                let reg = self.rvalue(&argument)?;
                self.asm.emit_mem("sw", reg, 0, Reg::Sp);
                self.asm.emit_rri("addi", Reg::Sp, Reg::Sp, -WORD_SIZE);
                self.regs.release(reg);
                count += 1;
                if self.scanner.kind() == &TokenKind::Comma {
                    self.scanner.next_token()?;
                } else {
                    break;
                }
            }
        }
        self.expect(&TokenKind::CloseParen)?;
        if count != procedure.arity() {
            return Err(arity_error(count));
        }

        self.asm.emit_l("jal", &label);
        let result = self.request()?;
        self.asm.emit_rr("move", result, Reg::V0);
        Ok(Descriptor::register(procedure.return_type().clone(), result))
    }

    // === Helpers ===

    /// A diagnostic at the current token.
    fn fail(&self, kind: ErrorKind, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(kind, message, self.scanner.span())
    }

    /// Consume `kind` or fail with a message naming it.
    fn expect(&mut self, kind: &TokenKind) -> Result<(), Diagnostic> {
        if self.scanner.kind() == kind {
            self.scanner.next_token()
        } else {
            Err(self.fail(ErrorKind::ExpectedToken, format!("expected {kind}")))
        }
    }

    /// Consume a name token and return its text.
    fn expect_name(&mut self) -> Result<String, Diagnostic> {
        match self.scanner.kind() {
            TokenKind::Name(name) => {
                let name = name.clone();
                self.scanner.next_token()?;
                Ok(name)
            }
            _ => Err(self.fail(ErrorKind::ExpectedToken, "expected a name")),
        }
    }

    fn lookup(&self, name: &str, span: Span) -> Result<Descriptor, Diagnostic> {
        self.symbols.lookup(name).cloned().ok_or_else(|| {
            Diagnostic::new(
                ErrorKind::NotDeclared,
                format!("{name} is not declared"),
                span,
            )
        })
    }

    fn define(&mut self, name: &str, descriptor: Descriptor, span: Span) -> Result<(), Diagnostic> {
        if self.symbols.define(name, descriptor) {
            Ok(())
        } else {
            Err(Diagnostic::new(
                ErrorKind::AlreadyDeclared,
                format!("{name} is already declared"),
                span,
            ))
        }
    }

    /// Assert `ty` is acceptable where `expected` is wanted.
    fn check(&self, ty: &Type, expected: &Type, span: Span) -> Result<(), Diagnostic> {
        if ty.is_subtype(expected) {
            Ok(())
        } else {
            Err(Diagnostic::new(
                ErrorKind::TypeMismatch,
                format!("expected {expected}, found {ty}"),
                span,
            ))
        }
    }

    /// The element type of an array-typed descriptor.
    fn element_type(&self, name: &str, target: &Descriptor) -> Result<Type, Diagnostic> {
        match target.ty() {
            Type::Array(array) => Ok(array.element.clone()),
            _ => Err(self.fail(ErrorKind::NotAnArray, format!("{name} is not an array"))),
        }
    }

    fn request(&mut self) -> Result<Reg, Diagnostic> {
        self.regs
            .request()
            .ok_or_else(|| self.fail(ErrorKind::TooManyRegisters, "expression too complex"))
    }

    fn rvalue(&mut self, descriptor: &Descriptor) -> Result<Reg, Diagnostic> {
        descriptor
            .rvalue(&mut self.asm, &mut self.regs)
            .map_err(|error| self.descriptor_error(error))
    }

    fn lvalue(&mut self, descriptor: &Descriptor) -> Result<Reg, Diagnostic> {
        descriptor
            .lvalue(&mut self.asm, &mut self.regs)
            .map_err(|error| self.descriptor_error(error))
    }

    fn descriptor_error(&self, error: DescriptorError) -> Diagnostic {
        match error {
            DescriptorError::OutOfRegisters => {
                self.fail(ErrorKind::TooManyRegisters, "expression too complex")
            }
            DescriptorError::NotAssignable(what) => {
                self.fail(ErrorKind::CannotAssign, format!("cannot assign to {what}"))
            }
            DescriptorError::NotAValue => {
                self.fail(ErrorKind::NotAValue, "a procedure is not a value")
            }
        }
    }
}
