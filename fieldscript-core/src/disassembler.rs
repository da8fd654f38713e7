use log::debug;

use crate::catalog::{self, Family};
use crate::engine::{
    Entity, FieldEngine, Function, FunctionMetadata, Point3, SCRIPT_SLOT_COUNT,
};
use crate::formatter::FieldTextFormatter;
use crate::instruction::Instruction;
use crate::reader::BufferReader;
use crate::{DecompileError, Result};

/// Magic number opening every field script section.
pub const SCRIPT_MAGIC: u16 = 0x0502;

/// Parsed field script section header.
///
/// The fixed part is 32 bytes; the entity name table, audio-block offset
/// table and per-entity script entry-point tables follow immediately.
#[derive(Debug, Clone)]
pub struct ScriptHeader {
    pub magic: u16,
    pub number_of_entities: u8,
    pub number_of_models: u8,
    pub offset_to_strings: u16,
    pub number_of_akao_offsets: u16,
    pub scale: u16,
    pub creator: String,
    pub name: String,
    pub entity_names: Vec<String>,
    pub akao_offsets: Vec<u32>,
    pub entity_scripts: Vec<[u16; SCRIPT_SLOT_COUNT]>,
}

fn trim_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim_end().to_string()
}

impl ScriptHeader {
    pub fn read(r: &mut BufferReader) -> Result<ScriptHeader> {
        let magic = r.read_u16()?;
        if magic != SCRIPT_MAGIC {
            return Err(DecompileError::InvalidHeader { found: magic });
        }

        let number_of_entities = r.read_u8()?;
        let number_of_models = r.read_u8()?;
        let offset_to_strings = r.read_u16()?;
        let number_of_akao_offsets = r.read_u16()?;
        let scale = r.read_u16()?;
        r.read_bytes(6)?;
        let creator = trim_name(r.read_bytes(8)?);
        let name = trim_name(r.read_bytes(8)?);

        let mut entity_names = Vec::with_capacity(number_of_entities as usize);
        for _ in 0..number_of_entities {
            entity_names.push(trim_name(r.read_bytes(8)?));
        }

        let mut akao_offsets = Vec::with_capacity(number_of_akao_offsets as usize);
        for _ in 0..number_of_akao_offsets {
            akao_offsets.push(r.read_u32()?);
        }

        let mut entity_scripts = Vec::with_capacity(number_of_entities as usize);
        for _ in 0..number_of_entities {
            let mut slots = [0u16; SCRIPT_SLOT_COUNT];
            for slot in slots.iter_mut() {
                *slot = r.read_u16()?;
            }
            entity_scripts.push(slots);
        }

        Ok(ScriptHeader {
            magic,
            number_of_entities,
            number_of_models,
            offset_to_strings,
            number_of_akao_offsets,
            scale,
            creator,
            name,
            entity_names,
            akao_offsets,
            entity_scripts,
        })
    }

    /// Fixed-point field coordinate scale: raw / 512.
    pub fn scale_factor(&self) -> f32 {
        self.scale as f32 / 512.0
    }
}

struct Pending {
    slot: usize,
    name: String,
    start: usize,
    end: usize,
    instructions: Vec<Instruction>,
    /// Whether this function answers for its slot in script request
    /// resolution. The synthetic second half of slot 0 does not.
    owns_slot: bool,
}

/// Walks one field's decompressed script section and produces the flat
/// instruction stream plus the entity/function tables. One disassembler is
/// constructed per field file; it holds no cross-file state.
pub struct Disassembler<'a> {
    buffer: &'a [u8],
    header: ScriptHeader,
}

impl<'a> Disassembler<'a> {
    /// Parse the section header. Fails on a bad magic number.
    pub fn new(buffer: &'a [u8]) -> Result<Disassembler<'a>> {
        let mut r = BufferReader::new(buffer);
        let header = ScriptHeader::read(&mut r)?;
        Ok(Disassembler { buffer, header })
    }

    pub fn header(&self) -> &ScriptHeader {
        &self.header
    }

    /// Disassemble every distinct script of every entity, filling `engine`
    /// with the function and entity tables and returning the instruction
    /// stream in function order.
    pub fn disassemble(
        &self,
        engine: &mut FieldEngine,
        formatter: &dyn FieldTextFormatter,
    ) -> Result<Vec<Instruction>> {
        let mut instructions = Vec::new();

        for entity_index in 0..self.header.number_of_entities as usize {
            let raw_name = &self.header.entity_names[entity_index];
            let entity_name = formatter
                .friendly_entity_name(raw_name)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| raw_name.clone());

            let pending = self.disassemble_entity(entity_index, &entity_name)?;
            if pending.is_empty() {
                continue;
            }

            self.commit_entity(engine, formatter, entity_index, &entity_name, pending, &mut instructions);
        }

        Ok(instructions)
    }

    fn disassemble_entity(&self, entity_index: usize, entity_name: &str) -> Result<Vec<Pending>> {
        let slots = &self.header.entity_scripts[entity_index];
        let mut seen: Vec<u16> = Vec::new();
        let mut pending: Vec<Pending> = Vec::new();
        let mut is_line = false;

        for (slot, &raw) in slots.iter().enumerate() {
            // Zero entries are absent scripts; repeated entries are shared
            // (empty) scripts. Neither is parsed again.
            if raw == 0 || seen.contains(&raw) {
                continue;
            }
            seen.push(raw);

            let entry = raw as usize;
            let next = self.next_entry_point(entity_index, slot);

            if slot == 0 {
                // Slot 0 stops at its first return and becomes the
                // initialiser; anything after the return up to the slot
                // boundary is the per-frame update script.
                let (insts, stop) = self.read_script(entry, next, true)?;
                is_line |= insts.iter().any(|i| i.opcode == catalog::OP_LINE);
                pending.push(Pending {
                    slot,
                    name: "on_start".to_string(),
                    start: entry,
                    end: stop,
                    instructions: insts,
                    owns_slot: true,
                });

                if stop < next {
                    let (insts, stop2) = self.read_script(stop, next, false)?;
                    if stop2 != next {
                        return Err(DecompileError::MalformedScript {
                            entity: entity_name.to_string(),
                            address: stop2,
                            expected: next,
                        });
                    }
                    is_line |= insts.iter().any(|i| i.opcode == catalog::OP_LINE);
                    pending.push(Pending {
                        slot,
                        name: "on_update".to_string(),
                        start: stop,
                        end: next,
                        instructions: insts,
                        owns_slot: false,
                    });
                }
            } else {
                let (insts, stop) = self.read_script(entry, next, false)?;
                is_line |= insts.iter().any(|i| i.opcode == catalog::OP_LINE);
                let name = match slot {
                    1 => "on_interact".to_string(),
                    2 if is_line => "on_approach".to_string(),
                    3 if is_line => "on_cross".to_string(),
                    4 if is_line => "on_near".to_string(),
                    5 if is_line => "on_near_once".to_string(),
                    6 if is_line => "on_leave".to_string(),
                    n => format!("script_{n}"),
                };
                pending.push(Pending {
                    slot,
                    name,
                    start: entry,
                    end: stop,
                    instructions: insts,
                    owns_slot: true,
                });
            }
        }

        debug!(
            "entity {} ({}): {} function(s)",
            entity_index,
            entity_name,
            pending.len()
        );
        Ok(pending)
    }

    fn commit_entity(
        &self,
        engine: &mut FieldEngine,
        formatter: &dyn FieldTextFormatter,
        entity_index: usize,
        entity_name: &str,
        pending: Vec<Pending>,
        instructions: &mut Vec<Instruction>,
    ) {
        // The character id comes from a CHAR opcode in any of the entity's
        // own scripts; functions without one inherit the first id found.
        let own_ids: Vec<Option<i32>> = pending
            .iter()
            .map(|p| {
                p.instructions
                    .iter()
                    .find(|i| i.opcode == catalog::OP_CHAR)
                    .map(|i| i.operands[0] as i32)
            })
            .collect();
        let entity_char = own_ids.iter().flatten().next().copied();

        let mut line_points = None;
        for p in &pending {
            for inst in &p.instructions {
                if inst.opcode == catalog::OP_LINE {
                    line_points = Some(line_points_of(inst));
                }
            }
        }

        let entity: &mut Entity = engine.entity_mut(entity_index, entity_name);
        if let Some(id) = entity_char {
            entity.set_character_id(id);
        }
        if let Some((from, to)) = line_points {
            entity.mark_as_line(from, to);
        }

        let last = pending.len() - 1;
        for (i, p) in pending.into_iter().enumerate() {
            let name = formatter
                .friendly_function_name(entity_name, &p.name)
                .filter(|n| !n.is_empty())
                .unwrap_or(p.name);

            if p.owns_slot {
                engine
                    .entity_mut(entity_index, entity_name)
                    .add_function(p.slot, name.clone());
            }

            let metadata = FunctionMetadata {
                first_of_entity: i == 0,
                last_of_entity: i == last,
                character_id: own_ids[i].or(entity_char),
                entity_name: entity_name.to_string(),
            };

            engine.add_function(Function {
                name,
                start_addr: p.start,
                end_addr: p.end,
                num_instructions: p.instructions.len(),
                metadata: metadata.encode(),
            });
            instructions.extend(p.instructions);
        }
    }

    /// Where the script starting at `slots[slot]` ends: the first following
    /// table entry with a different non-zero value, wrapping into the next
    /// entity's table and finally falling back to the string-table offset.
    fn next_entry_point(&self, entity_index: usize, slot: usize) -> usize {
        let value = self.header.entity_scripts[entity_index][slot];

        let same = &self.header.entity_scripts[entity_index];
        for &v in &same[slot + 1..] {
            if v != 0 && v != value {
                return v as usize;
            }
        }
        for table in &self.header.entity_scripts[entity_index + 1..] {
            for &v in table.iter() {
                if v != 0 && v != value {
                    return v as usize;
                }
            }
        }
        self.header.offset_to_strings as usize
    }

    /// Decode instructions over `[start, end)`. With `stop_at_ret`, reading
    /// stops right after the first return instruction. Returns the decoded
    /// instructions and the position reading actually stopped at.
    fn read_script(
        &self,
        start: usize,
        end: usize,
        stop_at_ret: bool,
    ) -> Result<(Vec<Instruction>, usize)> {
        let mut r = BufferReader::new(self.buffer);
        r.seek(start)?;
        let mut out = Vec::new();

        while r.tell() < end {
            let address = r.tell();
            let code = r.read_u8()?;
            let inst = match code as u16 {
                catalog::OP_SPECIAL => {
                    let sub = r.read_u8()?;
                    let desc = catalog::special(sub).ok_or(DecompileError::UnknownSubOpcode {
                        address,
                        opcode: catalog::OP_SPECIAL,
                        sub,
                    })?;
                    Instruction {
                        opcode: catalog::OP_SPECIAL << 8 | sub as u16,
                        address,
                        mnemonic: desc.mnemonic,
                        family: desc.family,
                        operands: read_operands(&mut r, desc.layout)?,
                    }
                }
                catalog::OP_KAWAI => {
                    // The byte after the opcode is the full instruction
                    // size, which covers the opcode, the size byte and the
                    // sub-opcode byte itself.
                    let size = r.read_u8()? as usize;
                    if size < 3 {
                        return Err(DecompileError::MalformedKawai { address, size });
                    }
                    let sub = r.read_u8()?;
                    let mnemonic =
                        catalog::kawai(sub).ok_or(DecompileError::UnknownSubOpcode {
                            address,
                            opcode: catalog::OP_KAWAI,
                            sub,
                        })?;
                    let payload = r.read_bytes(size - 3)?;
                    Instruction {
                        opcode: catalog::OP_KAWAI << 8 | sub as u16,
                        address,
                        mnemonic,
                        family: Family::Model,
                        operands: payload.iter().map(|&b| b as i64).collect(),
                    }
                }
                _ => {
                    let desc = catalog::lookup(code).ok_or(DecompileError::UnknownOpcode {
                        address,
                        opcode: code as u16,
                    })?;
                    Instruction {
                        opcode: code as u16,
                        address,
                        mnemonic: desc.mnemonic,
                        family: desc.family,
                        operands: read_operands(&mut r, desc.layout)?,
                    }
                }
            };

            let is_ret = inst.opcode == catalog::OP_RET;
            out.push(inst);
            if stop_at_ret && is_ret {
                break;
            }
        }

        Ok((out, r.tell()))
    }
}

fn read_operands(r: &mut BufferReader, layout: &str) -> Result<Vec<i64>> {
    let mut ops = Vec::new();
    for c in layout.chars() {
        match c {
            'b' => ops.push(r.read_u8()? as i64),
            'B' => ops.push(r.read_i8()? as i64),
            'w' => ops.push(r.read_u16()? as i64),
            'W' => ops.push(r.read_i16()? as i64),
            'd' => ops.push(r.read_u32()? as i64),
            'N' => {
                let v = r.read_u8()?;
                ops.push((v >> 4) as i64);
                ops.push((v & 0x0F) as i64);
            }
            _ => {}
        }
    }
    Ok(ops)
}

fn line_points_of(inst: &Instruction) -> (Point3, Point3) {
    let o = &inst.operands;
    (
        Point3 {
            x: o[0] as i16,
            y: o[1] as i16,
            z: o[2] as i16,
        },
        Point3 {
            x: o[3] as i16,
            y: o[4] as i16,
            z: o[5] as i16,
        },
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Disassembler, ScriptHeader, SCRIPT_MAGIC};
    use crate::engine::{FieldEngine, SCRIPT_SLOT_COUNT};
    use crate::formatter::NullFormatter;
    use crate::reader::BufferReader;
    use crate::DecompileError;

    /// Build a synthetic script section: header, then each script's bytes at
    /// the offsets given in the slot tables. `code` entries are
    /// (offset, bytes) and must be laid out in ascending order.
    pub(crate) fn build_section(
        entities: &[(&str, [u16; SCRIPT_SLOT_COUNT])],
        code: &[(u16, Vec<u8>)],
        offset_to_strings: u16,
        scale: u16,
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend(SCRIPT_MAGIC.to_le_bytes());
        buf.push(entities.len() as u8);
        buf.push(0); // models
        buf.extend(offset_to_strings.to_le_bytes());
        buf.extend(0u16.to_le_bytes()); // akao offsets
        buf.extend(scale.to_le_bytes());
        buf.extend([0u8; 6]);
        buf.extend(*b"tester\0\0");
        buf.extend(*b"field\0\0\0");
        for (name, _) in entities {
            let mut field = [0u8; 8];
            field[..name.len()].copy_from_slice(name.as_bytes());
            buf.extend(field);
        }
        for (_, slots) in entities {
            for s in slots {
                buf.extend(s.to_le_bytes());
            }
        }
        for (offset, bytes) in code {
            assert!(buf.len() <= *offset as usize, "script offsets overlap");
            buf.resize(*offset as usize, 0xFF);
            buf.extend(bytes);
        }
        if (buf.len() as u16) < offset_to_strings {
            buf.resize(offset_to_strings as usize, 0xFF);
        }
        buf
    }

    pub(crate) fn slots(entries: &[u16]) -> [u16; SCRIPT_SLOT_COUNT] {
        let mut table = [0u16; SCRIPT_SLOT_COUNT];
        table[..entries.len()].copy_from_slice(entries);
        table
    }

    /// Header base size for one entity with no audio blocks.
    pub(crate) fn one_entity_base() -> u16 {
        (32 + 8 + SCRIPT_SLOT_COUNT * 2) as u16
    }

    #[test]
    fn header_round_trips_known_values() {
        let base = one_entity_base();
        let buf = build_section(&[("cl", slots(&[base]))], &[(base, vec![0x00])], base + 1, 512);
        let mut r = BufferReader::new(&buf);
        let header = ScriptHeader::read(&mut r).unwrap();
        assert_eq!(header.magic, SCRIPT_MAGIC);
        assert_eq!(header.number_of_entities, 1);
        assert_eq!(header.offset_to_strings, base + 1);
        assert_eq!(header.entity_names, vec!["cl".to_string()]);
        assert_eq!(header.entity_scripts[0][0], base);
        assert_eq!(header.scale_factor(), 1.0);
    }

    #[test]
    fn scale_factor_is_raw_over_512() {
        let base = one_entity_base();
        let buf = build_section(&[("cl", slots(&[base]))], &[(base, vec![0x00])], base + 1, 256);
        let header = ScriptHeader::read(&mut BufferReader::new(&buf)).unwrap();
        assert_eq!(header.scale_factor(), 0.5);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let base = one_entity_base();
        let mut buf = build_section(&[("cl", slots(&[base]))], &[(base, vec![0x00])], base + 1, 512);
        buf[0] = 0x03;
        match Disassembler::new(&buf).err() {
            Some(DecompileError::InvalidHeader { found }) => assert_eq!(found, 0x0503),
            other => panic!("expected InvalidHeader, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_entry_points_produce_one_function() {
        let base = one_entity_base();
        // Slot 1 and 2 share one entry point: only one on_interact script.
        let buf = build_section(
            &[("cl", slots(&[base, base + 1, base + 1]))],
            &[(base, vec![0x00]), (base + 1, vec![0x00])],
            base + 2,
            512,
        );
        let dis = Disassembler::new(&buf).unwrap();
        let mut engine = FieldEngine::new(dis.header().scale_factor());
        dis.disassemble(&mut engine, &NullFormatter).unwrap();
        let names: Vec<&str> = engine.functions().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["on_start", "on_interact"]);
    }

    #[test]
    fn slot_zero_splits_at_the_first_return() {
        let base = one_entity_base();
        // RET, then a NOP and a final RET up to the slot boundary.
        let buf = build_section(
            &[("cl", slots(&[base, base + 3]))],
            &[(base, vec![0x00, 0x5F, 0x00]), (base + 3, vec![0x00])],
            base + 4,
            512,
        );
        let dis = Disassembler::new(&buf).unwrap();
        let mut engine = FieldEngine::new(1.0);
        dis.disassemble(&mut engine, &NullFormatter).unwrap();
        let funcs = engine.functions();
        assert_eq!(funcs.len(), 3);
        assert_eq!(funcs[0].name, "on_start");
        assert_eq!(funcs[0].num_instructions, 1);
        assert_eq!(funcs[1].name, "on_update");
        assert_eq!((funcs[1].start_addr, funcs[1].end_addr), (base as usize + 1, base as usize + 3));
        assert_eq!(funcs[2].name, "on_interact");
    }

    #[test]
    fn update_script_must_end_on_the_slot_boundary() {
        let base = one_entity_base();
        // After on_start's RET, a WAIT (3 bytes) overruns the 2-byte
        // remainder of the slot.
        let buf = build_section(
            &[("cl", slots(&[base, base + 3]))],
            &[(base, vec![0x00, 0x24, 0x0A, 0x00, 0x00])],
            base + 5,
            512,
        );
        let dis = Disassembler::new(&buf).unwrap();
        let mut engine = FieldEngine::new(1.0);
        match dis.disassemble(&mut engine, &NullFormatter) {
            Err(DecompileError::MalformedScript { address, expected, .. }) => {
                assert_eq!(address, base as usize + 4);
                assert_eq!(expected, base as usize + 3);
            }
            other => panic!("expected MalformedScript, got {other:?}"),
        }
    }

    #[test]
    fn line_opcode_marks_the_entity_and_renames_slots() {
        let base = one_entity_base();
        let mut line = vec![0xD0];
        for v in [1i16, 2, 3, -4, -5, -6] {
            line.extend(v.to_le_bytes());
        }
        line.push(0x00);
        let line_len = line.len() as u16;
        let buf = build_section(
            &[("gate", slots(&[base, base + line_len, base + line_len + 1]))],
            &[
                (base, line),
                (base + line_len, vec![0x00]),
                (base + line_len + 1, vec![0x00]),
            ],
            base + line_len + 2,
            512,
        );
        let dis = Disassembler::new(&buf).unwrap();
        let mut engine = FieldEngine::new(1.0);
        dis.disassemble(&mut engine, &NullFormatter).unwrap();

        let entity = engine.entity(0).unwrap();
        assert!(entity.is_line());
        let (from, to) = entity.line_points().unwrap();
        assert_eq!((from.x, from.y, from.z), (1, 2, 3));
        assert_eq!((to.x, to.y, to.z), (-4, -5, -6));
        assert_eq!(entity.function_by_slot(2), Some("on_approach"));
    }

    #[test]
    fn character_id_backfills_functions_without_char() {
        let base = one_entity_base();
        // Slot 0 has no CHAR; slot 1 does (CHAR 7). Both functions end up
        // with character id 7 in their metadata.
        let buf = build_section(
            &[("cl", slots(&[base, base + 1]))],
            &[(base, vec![0x00]), (base + 1, vec![0xA1, 0x07, 0x00])],
            base + 4,
            512,
        );
        let dis = Disassembler::new(&buf).unwrap();
        let mut engine = FieldEngine::new(1.0);
        dis.disassemble(&mut engine, &NullFormatter).unwrap();
        assert_eq!(engine.entity(0).unwrap().character_id(), Some(7));
        for f in engine.functions() {
            assert!(f.metadata.contains('7'), "metadata {:?}", f.metadata);
        }
    }

    #[test]
    fn unknown_opcode_carries_address_and_code() {
        let base = one_entity_base();
        let buf = build_section(
            &[("cl", slots(&[base]))],
            &[(base, vec![0x5F, 0x0C, 0x00])],
            base + 3,
            512,
        );
        let dis = Disassembler::new(&buf).unwrap();
        let mut engine = FieldEngine::new(1.0);
        match dis.disassemble(&mut engine, &NullFormatter) {
            Err(DecompileError::UnknownOpcode { address, opcode }) => {
                assert_eq!(address, base as usize + 1);
                assert_eq!(opcode, 0x0C);
            }
            other => panic!("expected UnknownOpcode, got {other:?}"),
        }
    }

    #[test]
    fn kawai_consumes_its_declared_payload() {
        let base = one_entity_base();
        // KAWAI size=5 sub=TRNSP with two payload bytes, then RET.
        let buf = build_section(
            &[("cl", slots(&[base]))],
            &[(base, vec![0x28, 0x05, 0x01, 0xAA, 0xBB, 0x00])],
            base + 6,
            512,
        );
        let dis = Disassembler::new(&buf).unwrap();
        let mut engine = FieldEngine::new(1.0);
        let insts = dis.disassemble(&mut engine, &NullFormatter).unwrap();
        assert_eq!(insts[0].mnemonic, "TRNSP");
        assert_eq!(insts[0].operands, vec![0xAA, 0xBB]);
        assert_eq!(insts[1].address, base as usize + 5);
    }
}
