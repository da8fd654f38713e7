//! Static opcode catalog.
//!
//! Maps a primary opcode byte (and, for the two-level SPECIAL/KAWAI
//! families, the sub-opcode byte) to a mnemonic, an operand layout and an
//! instruction family. The layout is a string of fixed-width field codes:
//!
//! - `b` unsigned byte, `B` signed byte
//! - `w` unsigned word, `W` signed word
//! - `d` unsigned dword
//! - `N` bank nibble pair: one byte decoded as two operands (high, low)
//!
//! Opcodes absent from the catalog are unknown and abort the conversion.
//! Byte lengths implied by the layouts follow the PC field script opcode
//! length table used by the surrounding tooling.

/// Instruction family, selecting the translation handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    ControlFlow,
    CondJump,
    UncondJump,
    Math,
    Model,
    Camera,
    Party,
    Background,
    Media,
    Window,
    Walkmesh,
    Uncategorized,
    NoOp,
}

#[derive(Debug, Clone, Copy)]
pub struct OpcodeDesc {
    pub mnemonic: &'static str,
    pub layout: &'static str,
    pub family: Family,
}

const fn op(mnemonic: &'static str, layout: &'static str, family: Family) -> OpcodeDesc {
    OpcodeDesc { mnemonic, layout, family }
}

// Opcodes referenced outside the catalog. SPECIAL and KAWAI sub-opcodes are
// composed as `outer << 8 | inner`.
pub const OP_RET: u16 = 0x00;
pub const OP_REQ: u16 = 0x01;
pub const OP_REQSW: u16 = 0x02;
pub const OP_REQEW: u16 = 0x03;
pub const OP_SPECIAL: u16 = 0x0F;
pub const OP_JMPF: u16 = 0x10;
pub const OP_JMPFL: u16 = 0x11;
pub const OP_JMPB: u16 = 0x12;
pub const OP_JMPBL: u16 = 0x13;
pub const OP_IFUB: u16 = 0x14;
pub const OP_IFUBL: u16 = 0x15;
pub const OP_IFSW: u16 = 0x16;
pub const OP_IFSWL: u16 = 0x17;
pub const OP_IFUW: u16 = 0x18;
pub const OP_IFUWL: u16 = 0x19;
pub const OP_WAIT: u16 = 0x24;
pub const OP_KAWAI: u16 = 0x28;
pub const OP_IFKEY: u16 = 0x30;
pub const OP_IFKEYON: u16 = 0x31;
pub const OP_IFKEYOFF: u16 = 0x32;
pub const OP_MAPJUMP: u16 = 0x60;
pub const OP_CHAR: u16 = 0xA1;
pub const OP_IFPRTYQ: u16 = 0xCB;
pub const OP_IFMEMBQ: u16 = 0xCC;
pub const OP_LINE: u16 = 0xD0;

/// Total encoded size in bytes of an instruction with this layout,
/// including the opcode byte itself.
pub fn layout_size(layout: &str) -> usize {
    1 + layout
        .chars()
        .map(|c| match c {
            'b' | 'B' | 'N' => 1,
            'w' | 'W' => 2,
            'd' => 4,
            _ => 0,
        })
        .sum::<usize>()
}

/// Decode rule for a primary opcode byte. SPECIAL (0x0F) and KAWAI (0x28)
/// are not listed here; they dispatch through [`special`] and [`kawai`].
pub fn lookup(opcode: u8) -> Option<OpcodeDesc> {
    use Family::*;
    Some(match opcode {
        0x00 => op("RET", "", ControlFlow),
        0x01 => op("REQ", "bb", ControlFlow),
        0x02 => op("REQSW", "bb", ControlFlow),
        0x03 => op("REQEW", "bb", ControlFlow),
        0x04 => op("PREQ", "bb", ControlFlow),
        0x05 => op("PRQSW", "bb", ControlFlow),
        0x06 => op("PRQEW", "bb", ControlFlow),
        0x07 => op("RETTO", "b", ControlFlow),
        0x08 => op("JOIN", "b", Model),
        0x09 => op("SPLIT", "NNNWWbWWbb", Model),
        0x0A => op("SPTYE", "NNbbb", Party),
        0x0B => op("GTPYE", "NNbbb", Party),
        0x0E => op("DSKCG", "b", Uncategorized),
        0x10 => op("JMPF", "b", UncondJump),
        0x11 => op("JMPFL", "w", UncondJump),
        0x12 => op("JMPB", "b", UncondJump),
        0x13 => op("JMPBL", "w", UncondJump),
        0x14 => op("IFUB", "Nbbbb", CondJump),
        0x15 => op("IFUBL", "Nbbbw", CondJump),
        0x16 => op("IFSW", "NWWbb", CondJump),
        0x17 => op("IFSWL", "NWWbw", CondJump),
        0x18 => op("IFUW", "Nwwbb", CondJump),
        0x19 => op("IFUWL", "Nwwbw", CondJump),
        0x20 => op("MINIGAME", "wWWWbb", Uncategorized),
        0x21 => op("TUTOR", "b", Uncategorized),
        0x22 => op("BTMD2", "d", Uncategorized),
        0x23 => op("BTRLD", "Nb", Uncategorized),
        0x24 => op("WAIT", "w", ControlFlow),
        0x25 => op("NFADE", "NNbbbbw", Camera),
        0x26 => op("BLINK", "b", Model),
        0x27 => op("BGMOVIE", "b", Background),
        0x29 => op("KAWIW", "", Model),
        0x2A => op("PMOVA", "b", Model),
        0x2B => op("SLIP", "b", Walkmesh),
        0x2C => op("BGPDH", "Nbw", Background),
        0x2D => op("BGSCR", "NbWW", Background),
        0x2E => op("WCLS", "b", Window),
        0x2F => op("WSIZW", "bwwww", Window),
        0x30 => op("IFKEY", "wb", CondJump),
        0x31 => op("IFKEYON", "wb", CondJump),
        0x32 => op("IFKEYOFF", "wb", CondJump),
        0x33 => op("UC", "b", Model),
        0x34 => op("PDIRA", "b", Model),
        0x35 => op("PTURA", "bbb", Model),
        0x36 => op("WSPCL", "bbbb", Window),
        0x37 => op("WNUMB", "Nbdb", Window),
        0x38 => op("STTIM", "NNbbb", Window),
        0x39 => op("GOLDU", "Nd", Party),
        0x3A => op("GOLDD", "Nd", Party),
        0x3B => op("CHGLD", "Nbb", Party),
        0x3C => op("HMPMAX1", "", Party),
        0x3D => op("HMPMAX2", "", Party),
        0x3E => op("MHMMX", "", Party),
        0x3F => op("HMPMAX3", "", Party),
        0x40 => op("MESSAGE", "bb", Window),
        0x41 => op("MPARA", "Nbbb", Window),
        0x42 => op("MPRA2", "Nbbw", Window),
        0x43 => op("MPNAM", "b", Window),
        0x45 => op("MPU", "Nbw", Party),
        0x47 => op("MPD", "Nbw", Party),
        0x48 => op("ASK", "Nbbbbb", Window),
        0x49 => op("MENU", "Nbb", Window),
        0x4A => op("MENU2", "b", Window),
        0x4B => op("BTLTB", "b", Uncategorized),
        0x4D => op("HPU", "Nbw", Party),
        0x4F => op("HPD", "Nbw", Party),
        0x50 => op("WINDOW", "bwwww", Window),
        0x51 => op("WMOVE", "bWW", Window),
        0x52 => op("WMODE", "bbb", Window),
        0x53 => op("WREST", "b", Window),
        0x54 => op("WCLSE", "b", Window),
        0x55 => op("WROW", "bb", Window),
        0x56 => op("GWCOL", "NNbbbb", Window),
        0x57 => op("SWCOL", "NNbbbb", Window),
        0x58 => op("STITM", "Nwb", Party),
        0x59 => op("DLITM", "Nwb", Party),
        0x5A => op("CKITM", "Nwb", Party),
        0x5B => op("SMTRA", "NNbbbb", Party),
        0x5C => op("DMTRA", "NNbbbbb", Party),
        0x5D => op("CMTRA", "NNNbbbbw", Party),
        0x5E => op("SHAKE", "bbbbbbb", Camera),
        0x5F => op("NOP", "", NoOp),
        0x60 => op("MAPJUMP", "wWWwb", Uncategorized),
        0x61 => op("SCRLO", "b", Camera),
        0x62 => op("SCRLC", "Nwb", Camera),
        0x63 => op("SCRLA", "Nwbb", Camera),
        0x64 => op("SCR2D", "NWW", Camera),
        0x65 => op("SCRCC", "", Camera),
        0x66 => op("SCR2DC", "NNWWw", Camera),
        0x67 => op("SCRLW", "", Camera),
        0x68 => op("SCR2DL", "NNWWw", Camera),
        0x69 => op("MPDSP", "b", Uncategorized),
        0x6A => op("VWOFT", "NWWb", Camera),
        0x6B => op("FADE", "NNbbbbbb", Camera),
        0x6C => op("FADEW", "", Camera),
        0x6D => op("IDLCK", "wb", Walkmesh),
        0x6E => op("LSTMP", "Nb", Uncategorized),
        0x6F => op("SCRLP", "Nwbb", Camera),
        0x70 => op("BATTLE", "Nw", Uncategorized),
        0x71 => op("BTLON", "b", Uncategorized),
        0x72 => op("BTLMD", "w", Uncategorized),
        0x73 => op("PGTDR", "Nbb", Party),
        0x74 => op("GETPC", "Nbb", Party),
        0x75 => op("PXYZI", "NNbbbbb", Model),
        0x76 => op("PLUS!", "Nbb", Math),
        0x77 => op("PLUS2!", "Nbw", Math),
        0x78 => op("MINUS!", "Nbb", Math),
        0x79 => op("MINUS2!", "Nbw", Math),
        0x7A => op("INC!", "Nb", Math),
        0x7B => op("INC2!", "Nb", Math),
        0x7C => op("DEC!", "Nb", Math),
        0x7D => op("DEC2!", "Nb", Math),
        0x7E => op("TLKON", "b", Model),
        0x7F => op("RDMSD", "Nb", Uncategorized),
        0x80 => op("SETBYTE", "Nbb", Math),
        0x81 => op("SETWORD", "Nbw", Math),
        0x82 => op("BITON", "Nbb", Math),
        0x83 => op("BITOFF", "Nbb", Math),
        0x84 => op("BITXOR", "Nbb", Math),
        0x85 => op("PLUS", "Nbb", Math),
        0x86 => op("PLUS2", "Nbw", Math),
        0x87 => op("MINUS", "Nbb", Math),
        0x88 => op("MINUS2", "Nbw", Math),
        0x89 => op("MUL", "Nbb", Math),
        0x8A => op("MUL2", "Nbw", Math),
        0x8B => op("DIV", "Nbb", Math),
        0x8C => op("DIV2", "Nbw", Math),
        0x8D => op("MOD", "Nbb", Math),
        0x8E => op("MOD2", "Nbw", Math),
        0x8F => op("AND", "Nbb", Math),
        0x90 => op("AND2", "Nbw", Math),
        0x91 => op("OR", "Nbb", Math),
        0x92 => op("OR2", "Nbw", Math),
        0x93 => op("XOR", "Nbb", Math),
        0x94 => op("XOR2", "Nbw", Math),
        0x95 => op("INC", "Nb", Math),
        0x96 => op("INC2", "Nb", Math),
        0x97 => op("DEC", "Nb", Math),
        0x98 => op("DEC2", "Nb", Math),
        0x99 => op("RANDOM", "Nb", Math),
        0x9A => op("LBYTE", "Nbb", Math),
        0x9B => op("HBYTE", "Nbw", Math),
        0x9C => op("2BYTE", "NNbbb", Math),
        0x9D => op("SETX", "bbbbbb", Math),
        0x9E => op("GETX", "bbbbbb", Math),
        0x9F => op("SEARCHX", "NNNwwbbb", Math),
        0xA0 => op("PC", "b", Model),
        0xA1 => op("CHAR", "b", Model),
        0xA2 => op("DFANM", "bb", Model),
        0xA3 => op("ANIME1", "bb", Model),
        0xA4 => op("VISI", "b", Model),
        0xA5 => op("XYZI", "NNWWWw", Model),
        0xA6 => op("XYI", "NNWWw", Model),
        0xA7 => op("XYZ", "NNWWW", Model),
        0xA8 => op("MOVE", "NWW", Model),
        0xA9 => op("CMOVE", "NWW", Model),
        0xAA => op("MOVA", "b", Model),
        0xAB => op("TURA", "bbb", Model),
        0xAC => op("ANIMW", "", Model),
        0xAD => op("FMOVE", "NWW", Model),
        0xAE => op("ANIME2", "bb", Model),
        0xAF => op("ANIM!1", "bb", Model),
        0xB0 => op("CANIM1", "bbbb", Model),
        0xB1 => op("CANM!1", "bbbb", Model),
        0xB2 => op("MSPED", "Nw", Model),
        0xB3 => op("DIR", "Nb", Model),
        0xB4 => op("TURNGEN", "Nbbbb", Model),
        0xB5 => op("TURN", "Nbbbb", Model),
        0xB6 => op("DIRA", "b", Model),
        0xB7 => op("GETDIR", "Nbb", Model),
        0xB8 => op("GETAXY", "Nbbb", Model),
        0xB9 => op("GETAI", "Nbb", Model),
        0xBA => op("ANIM!2", "bb", Model),
        0xBB => op("CANIM2", "bbbb", Model),
        0xBC => op("CANM!2", "bbbb", Model),
        0xBD => op("ASPED", "Nw", Model),
        0xBF => op("CC", "b", Model),
        0xC0 => op("JUMP", "NNWWww", Model),
        0xC1 => op("AXYZI", "NNbbbbb", Model),
        0xC2 => op("LADER", "NNWWWwbbbb", Model),
        0xC3 => op("OFST", "NNbWWWw", Model),
        0xC4 => op("OFSTW", "", Model),
        0xC5 => op("TALKR", "Nb", Model),
        0xC6 => op("SLIDR", "Nb", Model),
        0xC7 => op("SOLID", "b", Model),
        0xC8 => op("PRTYP", "b", Party),
        0xC9 => op("PRTYM", "b", Party),
        0xCA => op("PRTYE", "bbb", Party),
        0xCB => op("IFPRTYQ", "bb", CondJump),
        0xCC => op("IFMEMBQ", "bb", CondJump),
        0xCD => op("MMBUD", "Nb", Party),
        0xCE => op("MMBLK", "b", Party),
        0xCF => op("MMBUK", "b", Party),
        0xD0 => op("LINE", "WWWWWW", Walkmesh),
        0xD1 => op("LINON", "b", Walkmesh),
        0xD2 => op("MPJPO", "b", Walkmesh),
        0xD3 => op("SLINE", "NNNWWWWWW", Walkmesh),
        0xD4 => op("SIN", "NNwwwb", Math),
        0xD5 => op("COS", "NNwwwb", Math),
        0xD6 => op("TLKR2", "Nw", Model),
        0xD7 => op("SLDR2", "Nw", Model),
        0xD8 => op("PMJMP", "w", Uncategorized),
        0xD9 => op("PMJMP2", "", Uncategorized),
        0xDA => op("AKAO2", "NNNbwwwww", Media),
        0xDB => op("FCFIX", "b", Model),
        0xDC => op("CCANM", "bbb", Model),
        0xDD => op("ANIMB", "", Model),
        0xDE => op("TURNW", "", Model),
        0xDF => op("MPPAL", "NNNbbbbbbb", Background),
        0xE0 => op("BGON", "Nbb", Background),
        0xE1 => op("BGOFF", "Nbb", Background),
        0xE2 => op("BGROL", "Nb", Background),
        0xE3 => op("BGROL2", "Nb", Background),
        0xE4 => op("BGCLR", "Nb", Background),
        0xE5 => op("STPAL", "Nbbb", Background),
        0xE6 => op("LDPAL", "Nbbb", Background),
        0xE7 => op("CPPAL", "Nbbb", Background),
        0xE8 => op("RTPAL", "NNbbbb", Background),
        0xE9 => op("ADPAL", "NNNbbbbbb", Background),
        0xEA => op("MPPAL2", "NNNbbbbbb", Background),
        0xEB => op("STPLS", "bbbb", Background),
        0xEC => op("LDPLS", "bbbb", Background),
        0xED => op("CPPAL2", "bbbbbbb", Background),
        0xEE => op("RTPAL2", "bbbbbbb", Background),
        0xEF => op("ADPAL2", "bbbbbbbbbb", Background),
        0xF0 => op("MUSIC", "b", Media),
        0xF1 => op("SOUND", "Nwb", Media),
        0xF2 => op("AKAO", "NNNbbwwww", Media),
        0xF3 => op("MUSVT", "b", Media),
        0xF4 => op("MUSVM", "b", Media),
        0xF5 => op("MULCK", "b", Media),
        0xF6 => op("BMUSC", "b", Media),
        0xF7 => op("CHMPH", "bbb", Media),
        0xF8 => op("PMVIE", "b", Media),
        0xF9 => op("MOVIE", "", Media),
        0xFA => op("MVIEF", "Nb", Media),
        0xFB => op("MVCAM", "b", Camera),
        0xFC => op("FMUSC", "b", Media),
        0xFD => op("CMUSC", "bbbbbbb", Media),
        0xFE => op("CHMST", "Nb", Media),
        0xFF => op("GAMEOVER", "", Uncategorized),
        _ => return None,
    })
}

/// Decode rule for a SPECIAL (0x0F) sub-opcode.
pub fn special(sub: u8) -> Option<OpcodeDesc> {
    use Family::*;
    Some(match sub {
        0xF5 => op("ARROW", "b", Uncategorized),
        0xF6 => op("PNAME", "b", Uncategorized),
        0xF7 => op("GMSPD", "b", Uncategorized),
        0xF8 => op("SMSPD", "bb", Uncategorized),
        0xF9 => op("FLMAT", "", Party),
        0xFA => op("FLITM", "", Party),
        0xFB => op("BTLCK", "b", Uncategorized),
        0xFC => op("MVLCK", "b", Media),
        0xFD => op("SPCNM", "bb", Uncategorized),
        0xFE => op("RSGLB", "", Uncategorized),
        0xFF => op("CLITM", "", Party),
        _ => return None,
    })
}

/// Mnemonic for a KAWAI (0x28) character-graphics sub-opcode. KAWAI
/// operands are raw payload bytes whose count comes from the opcode's own
/// length field, so sub-opcodes carry no layout.
pub fn kawai(sub: u8) -> Option<&'static str> {
    Some(match sub {
        0x00 => "EYETX",
        0x01 => "TRNSP",
        0x02 => "AMBNT",
        0x04 => "LIGHT",
        0x06 => "SBOBJ",
        0x08 => "SHINE",
        0x0D => "RESET",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::{layout_size, lookup, special};

    // Opcode byte lengths from the PC field-script length table (0 marks an
    // opcode that is unknown here or, for SPECIAL/KAWAI, variable-length).
    const EXPECTED: [u8; 256] = [
        1, 3, 3, 3, 3, 3, 3, 2, 2, 15, 6, 6, 0, 0, 2, 0,
        2, 3, 2, 3, 6, 7, 8, 9, 8, 9, 0, 0, 0, 0, 0, 0,
        11, 2, 5, 3, 3, 9, 2, 2, 0, 1, 2, 2, 5, 7, 2, 10,
        4, 4, 4, 2, 2, 4, 5, 8, 6, 6, 6, 4, 1, 1, 1, 1,
        3, 5, 6, 2, 0, 5, 0, 5, 7, 4, 2, 2, 0, 5, 0, 5,
        10, 6, 4, 2, 2, 3, 7, 7, 5, 5, 5, 7, 8, 10, 8, 1,
        10, 2, 5, 6, 6, 1, 9, 1, 9, 2, 7, 9, 1, 4, 3, 6,
        4, 2, 3, 4, 4, 8, 4, 5, 4, 5, 3, 3, 3, 3, 2, 3,
        4, 5, 4, 4, 4, 4, 5, 4, 5, 4, 5, 4, 5, 4, 5, 4,
        5, 4, 5, 4, 5, 3, 3, 3, 3, 3, 4, 5, 6, 7, 7, 11,
        2, 2, 3, 3, 2, 11, 9, 9, 6, 6, 2, 4, 1, 6, 3, 3,
        5, 5, 4, 3, 6, 6, 2, 4, 5, 4, 3, 5, 5, 4, 0, 2,
        11, 8, 15, 12, 1, 3, 3, 2, 2, 2, 4, 3, 3, 3, 2, 2,
        13, 2, 2, 16, 10, 10, 4, 4, 3, 1, 15, 2, 4, 1, 1, 11,
        4, 4, 3, 3, 3, 5, 5, 5, 7, 10, 10, 5, 5, 8, 8, 11,
        2, 5, 14, 2, 2, 2, 2, 4, 2, 1, 3, 2, 2, 8, 3, 1,
    ];

    #[test]
    fn layout_sizes_match_the_opcode_length_table() {
        for code in 0u16..=0xFF {
            let expected = EXPECTED[code as usize];
            match lookup(code as u8) {
                Some(desc) => {
                    assert_eq!(
                        layout_size(desc.layout) as u8,
                        expected,
                        "length mismatch for {:#04x} {}",
                        code,
                        desc.mnemonic
                    );
                }
                None => {
                    assert_eq!(expected, 0, "opcode {code:#04x} missing from catalog");
                }
            }
        }
    }

    #[test]
    fn special_sub_opcodes_resolve() {
        assert_eq!(special(0xF5).unwrap().mnemonic, "ARROW");
        assert_eq!(layout_size(special(0xF8).unwrap().layout), 3);
        assert!(special(0x00).is_none());
    }

    #[test]
    fn unknown_opcodes_are_absent() {
        assert!(lookup(0x0C).is_none());
        assert!(lookup(0x44).is_none());
        assert!(lookup(0xBE).is_none());
    }
}
