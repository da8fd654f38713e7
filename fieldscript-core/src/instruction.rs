use crate::catalog::{self, Family};
use crate::{DecompileError, Result};

/// One decoded bytecode instruction.
///
/// `opcode` is the primary opcode byte, or `outer << 8 | inner` for the
/// two-level SPECIAL/KAWAI families. Operands are stored in layout order;
/// bank nibble pairs contribute two entries (high, low).
#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: u16,
    pub address: usize,
    pub mnemonic: &'static str,
    pub family: Family,
    pub operands: Vec<i64>,
}

impl Instruction {
    pub fn is_cond_jump(&self) -> bool {
        self.family == Family::CondJump
    }

    pub fn is_uncond_jump(&self) -> bool {
        self.family == Family::UncondJump
    }

    pub fn is_jump(&self) -> bool {
        self.is_cond_jump() || self.is_uncond_jump()
    }

    /// Absolute destination of a jump instruction. Offsets are relative to
    /// the position of the offset operand itself, so each opcode adds the
    /// size of the fields preceding it.
    pub fn destination(&self) -> Result<usize> {
        let off = *self.operands.last().ok_or(DecompileError::UnknownJump {
            address: self.address,
            opcode: self.opcode,
        })? as usize;
        match self.opcode {
            catalog::OP_JMPF | catalog::OP_JMPFL => Ok(self.address + 1 + off),
            catalog::OP_JMPB | catalog::OP_JMPBL => Ok(self.address.saturating_sub(off)),
            catalog::OP_IFUB | catalog::OP_IFUBL => Ok(self.address + 5 + off),
            catalog::OP_IFSW | catalog::OP_IFSWL | catalog::OP_IFUW | catalog::OP_IFUWL => {
                Ok(self.address + 7 + off)
            }
            catalog::OP_IFKEY | catalog::OP_IFKEYON | catalog::OP_IFKEYOFF => {
                Ok(self.address + 3 + off)
            }
            catalog::OP_IFPRTYQ | catalog::OP_IFMEMBQ => Ok(self.address + 2 + off),
            _ => Err(DecompileError::UnknownJump {
                address: self.address,
                opcode: self.opcode,
            }),
        }
    }

    /// Disassembly-style text, used for the transcription comment block.
    pub fn to_text(&self) -> String {
        if self.operands.is_empty() {
            self.mnemonic.to_string()
        } else {
            let args = self
                .operands
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} {}", self.mnemonic, args)
        }
    }
}

/// Source text for an IF-family comparison operator code. Codes 9 and 10
/// (bit test on/off) have no infix form and are rendered by the caller.
pub fn comparison_operator(code: u8) -> Option<&'static str> {
    Some(match code {
        0 => "==",
        1 => "!=",
        2 => ">",
        3 => "<",
        4 => ">=",
        5 => "<=",
        6 => "&",
        7 => "^",
        8 => "|",
        _ => return None,
    })
}

pub const COMPARE_BIT_ON: u8 = 9;
pub const COMPARE_BIT_OFF: u8 = 10;
