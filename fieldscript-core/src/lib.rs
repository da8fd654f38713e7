//! Field-script decompiler core.
//!
//! Converts the compiled bytecode embedded in a field map's script section
//! into readable structured script source. The pipeline is a disassembler
//! (bytes to typed instructions plus entity/function tables) feeding a code
//! generator (typed instructions to structured text); a collaborator
//! formatter supplies human-friendly names and collects spawn points.
//!
//! The core is a pure function of the decompressed input bytes and the
//! formatter: no file I/O, no shared state between fields. Construct a
//! fresh pipeline per field file via [`decompile`] or
//! [`decompile_field_file`].

use thiserror::Error;

pub mod catalog;
pub mod codegen;
pub mod disassembler;
pub mod engine;
pub mod formatter;
pub mod instruction;
mod opcodes;
pub mod reader;
pub mod value;

pub use catalog::Family;
pub use disassembler::{Disassembler, ScriptHeader, SCRIPT_MAGIC};
pub use engine::{
    Entity, EntityRecord, FieldEngine, Function, FunctionMetadata, LineRecord, Point3,
};
pub use formatter::{FieldTextFormatter, NullFormatter, SpawnPoint};
pub use instruction::Instruction;
pub use value::{Value, ValueStack};

use reader::BufferReader;

/// Errors that abort the conversion of one field file. Translation-level
/// degradation (an opcode without a handler) is not an error; it becomes an
/// inert comment in the output.
#[derive(Debug, Error)]
pub enum DecompileError {
    #[error("invalid script header magic {found:#06x}, expected 0x0502")]
    InvalidHeader { found: u16 },

    #[error("unexpected end of data at {address:#06x} (wanted {wanted} bytes)")]
    UnexpectedEof { address: usize, wanted: usize },

    #[error("unknown opcode {opcode:#04x} at {address:#06x}")]
    UnknownOpcode { address: usize, opcode: u16 },

    #[error("unknown sub-opcode {sub:#04x} of opcode {opcode:#04x} at {address:#06x}")]
    UnknownSubOpcode { address: usize, opcode: u16, sub: u8 },

    #[error("graphics opcode at {address:#06x} declares size {size}, minimum is 3")]
    MalformedKawai { address: usize, size: usize },

    #[error(
        "script of entity \"{entity}\" stops at {address:#06x} instead of the slot boundary {expected:#06x}"
    )]
    MalformedScript {
        entity: String,
        address: usize,
        expected: usize,
    },

    #[error("unknown comparison operator {operator} at {address:#06x}")]
    UnknownComparison { address: usize, operator: u8 },

    #[error("cannot compute a jump destination for opcode {opcode:#04x} at {address:#06x}")]
    UnknownJump { address: usize, opcode: u16 },

    #[error("script {script} of entity {entity} cannot be resolved")]
    UnresolvedCall { entity: usize, script: usize },

    #[error("value stack is empty at {address:#06x}")]
    StackEmpty { address: usize },

    #[error("section offset table entry {section} ({offset:#x}) is invalid")]
    InvalidSectionTable { section: usize, offset: usize },
}

pub type Result<T> = std::result::Result<T, DecompileError>;

/// Number of section offsets at the start of a full field file.
pub const NUM_SECTIONS: usize = 7;

/// Everything one field file decompiles to.
pub struct Decompiled {
    pub script: String,
    pub entities: Vec<EntityRecord>,
    pub lines: Vec<LineRecord>,
}

/// Decompile a decompressed script section (the buffer starts at the
/// section header).
pub fn decompile(
    buffer: &[u8],
    formatter: &mut dyn FieldTextFormatter,
    map_id: u32,
) -> Result<Decompiled> {
    let disassembler = Disassembler::new(buffer)?;
    let mut engine = FieldEngine::new(disassembler.header().scale_factor());
    let instructions = disassembler.disassemble(&mut engine, &*formatter)?;
    let script = codegen::generate(&engine, &instructions, formatter, map_id)?;
    let (entities, lines) = engine.records();
    Ok(Decompiled {
        script,
        entities,
        lines,
    })
}

/// Decompile a full decompressed field file: a table of [`NUM_SECTIONS`]
/// absolute section offsets, the first of which locates the script section.
pub fn decompile_field_file(
    buffer: &[u8],
    formatter: &mut dyn FieldTextFormatter,
    map_id: u32,
) -> Result<Decompiled> {
    let mut r = BufferReader::new(buffer);
    let mut offsets = [0usize; NUM_SECTIONS];
    for (section, slot) in offsets.iter_mut().enumerate() {
        let offset = r.read_u32()? as usize;
        if offset > buffer.len() {
            return Err(DecompileError::InvalidSectionTable { section, offset });
        }
        *slot = offset;
    }

    let start = offsets[0];
    if start >= buffer.len() {
        return Err(DecompileError::InvalidSectionTable {
            section: 0,
            offset: start,
        });
    }
    let end = if offsets[1] > start {
        offsets[1]
    } else {
        buffer.len()
    };
    decompile(&buffer[start..end], formatter, map_id)
}
