//! Instruction sequences.
//!
//! Jump targets are stored as offsets relative to the owning instruction's
//! index in the same list. An instruction therefore compares equal to its
//! counterpart in another version of the method whenever its opcode, its
//! operands and the distance to its targets are unchanged, no matter how
//! many instructions were inserted or removed elsewhere.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constant::{Constant, DynamicRef, MemberRef};
use crate::opcodes;

/// A typed instruction operand.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    /// Integer immediate (`bipush`, `sipush`, `newarray`, `iinc` increment,
    /// switch keys and bounds, `multianewarray` dimensions).
    Int(i32),
    /// Jump target as an offset from the owning instruction.
    Label(i32),
    /// Local variable slot.
    Var(u16),
    Constant(Constant),
    /// Internal name or array descriptor.
    Type(String),
    Field(MemberRef),
    Method(MemberRef),
    Dynamic(DynamicRef),
}

/// A single bytecode instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: u8,
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// An instruction without operands.
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            operands: Vec::new(),
        }
    }

    pub fn int(opcode: u8, value: i32) -> Self {
        Self {
            opcode,
            operands: vec![Operand::Int(value)],
        }
    }

    pub fn var(opcode: u8, slot: u16) -> Self {
        Self {
            opcode,
            operands: vec![Operand::Var(slot)],
        }
    }

    /// A conditional or unconditional jump `offset` instructions away.
    pub fn jump(opcode: u8, offset: i32) -> Self {
        Self {
            opcode,
            operands: vec![Operand::Label(offset)],
        }
    }

    pub fn ldc(constant: Constant) -> Self {
        Self {
            opcode: opcodes::LDC,
            operands: vec![Operand::Constant(constant)],
        }
    }

    pub fn type_insn(opcode: u8, descriptor: impl Into<String>) -> Self {
        Self {
            opcode,
            operands: vec![Operand::Type(descriptor.into())],
        }
    }

    pub fn field(opcode: u8, field: MemberRef) -> Self {
        Self {
            opcode,
            operands: vec![Operand::Field(field)],
        }
    }

    pub fn method(opcode: u8, method: MemberRef) -> Self {
        Self {
            opcode,
            operands: vec![Operand::Method(method)],
        }
    }

    pub fn iinc(slot: u16, increment: i32) -> Self {
        Self {
            opcode: opcodes::IINC,
            operands: vec![Operand::Var(slot), Operand::Int(increment)],
        }
    }

    /// `tableswitch`: operands are `low`, `high`, the default target, then
    /// one target per key in `low..=high`.
    pub fn table_switch(low: i32, high: i32, default: i32, targets: Vec<i32>) -> Self {
        let mut operands = vec![Operand::Int(low), Operand::Int(high), Operand::Label(default)];
        operands.extend(targets.into_iter().map(Operand::Label));
        Self {
            opcode: opcodes::TABLESWITCH,
            operands,
        }
    }

    /// `lookupswitch`: operands are the default target followed by
    /// `(key, target)` pairs.
    pub fn lookup_switch(default: i32, cases: Vec<(i32, i32)>) -> Self {
        let mut operands = vec![Operand::Label(default)];
        for (key, target) in cases {
            operands.push(Operand::Int(key));
            operands.push(Operand::Label(target));
        }
        Self {
            opcode: opcodes::LOOKUPSWITCH,
            operands,
        }
    }

    /// Relative offsets of every label operand.
    pub fn label_offsets(&self) -> impl Iterator<Item = i32> + '_ {
        self.operands.iter().filter_map(|op| match op {
            Operand::Label(offset) => Some(*offset),
            _ => None,
        })
    }

    /// Absolute targets of every label operand, given this instruction's
    /// position in its list.
    pub fn targets(&self, position: usize) -> impl Iterator<Item = i64> + '_ {
        self.label_offsets()
            .map(move |offset| position as i64 + i64::from(offset))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match opcodes::mnemonic(self.opcode) {
            Some(name) => write!(f, "{name}")?,
            None => write!(f, "op#{}", self.opcode)?,
        }
        for operand in &self.operands {
            match operand {
                Operand::Int(v) => write!(f, " {v}")?,
                Operand::Label(offset) => write!(f, " @{offset:+}")?,
                Operand::Var(slot) => write!(f, " ${slot}")?,
                Operand::Constant(c) => write!(f, " {c}")?,
                Operand::Type(t) => write!(f, " {t}")?,
                Operand::Field(r) | Operand::Method(r) => write!(f, " {r}")?,
                Operand::Dynamic(d) => write!(f, " {}{}", d.name, d.descriptor)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::*;

    #[test]
    fn jump_targets_are_relative() {
        let insn = Instruction::jump(GOTO, -2);
        assert_eq!(insn.targets(5).collect::<Vec<_>>(), vec![3]);
        assert_eq!(insn.targets(10).collect::<Vec<_>>(), vec![8]);
    }

    #[test]
    fn switch_operand_layout() {
        let table = Instruction::table_switch(0, 1, 3, vec![1, 2]);
        assert_eq!(table.label_offsets().collect::<Vec<_>>(), vec![3, 1, 2]);

        let lookup = Instruction::lookup_switch(4, vec![(10, 1), (20, 2)]);
        assert_eq!(lookup.label_offsets().collect::<Vec<_>>(), vec![4, 1, 2]);
        assert_eq!(lookup.operands.len(), 5);
    }

    #[test]
    fn display_mnemonics() {
        assert_eq!(Instruction::var(ALOAD, 0).to_string(), "aload $0");
        assert_eq!(Instruction::jump(IFEQ, 3).to_string(), "ifeq @+3");
        assert_eq!(Instruction::simple(26).to_string(), "op#26");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn shifting_a_jump_keeps_it_equal(offset in -1000i32..1000, position in 0usize..1000, shift in 0usize..1000) {
                let insn = Instruction::jump(GOTO, offset);
                let here: Vec<i64> = insn.targets(position).collect();
                let there: Vec<i64> = insn.targets(position + shift).collect();
                prop_assert_eq!(there[0] - here[0], shift as i64);
                prop_assert_eq!(insn.clone(), Instruction::jump(GOTO, offset));
            }
        }
    }
}
