//! Instruction family handlers.
//!
//! Each family owns one `process` entry point with a switch over its
//! concrete opcodes. Opcodes the catalog recognises but no handler
//! translates yet fall through to [`not_implemented`], which emits an inert
//! comment and keeps the conversion going: partial output is a feature, not
//! a failure.

mod background;
mod camera;
mod control;
mod math;
mod media;
mod model;
mod party;
mod uncategorized;
mod walkmesh;
mod window;

use log::warn;

use crate::catalog::Family;
use crate::codegen::FunctionContext;
use crate::instruction::Instruction;
use crate::Result;

/// Frame counts divide by this to become seconds in the output.
pub(crate) const FRAMES_PER_SECOND: f32 = 30.0;

/// Fixed-point position divisor for the current field.
pub(crate) fn position_scale(ctx: &FunctionContext) -> f32 {
    128.0 * ctx.scale()
}

pub(crate) fn process_instruction(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    match inst.family {
        Family::ControlFlow | Family::CondJump | Family::UncondJump => control::process(inst, ctx),
        Family::Math => math::process(inst, ctx),
        Family::Model => model::process(inst, ctx),
        Family::Camera => camera::process(inst, ctx),
        Family::Party => party::process(inst, ctx),
        Family::Background => background::process(inst, ctx),
        Family::Media => media::process(inst, ctx),
        Family::Window => window::process(inst, ctx),
        Family::Walkmesh => walkmesh::process(inst, ctx),
        Family::Uncategorized => uncategorized::process(inst, ctx),
        Family::NoOp => Ok(()),
    }
}

/// Uniform degradation path for opcodes without a translation. Never fails;
/// the comment carries everything needed to find the site again.
pub(crate) fn not_implemented(inst: &Instruction, ctx: &mut FunctionContext) {
    warn!(
        "no translation for {} ({:#04x}) at {:#06x}",
        inst.mnemonic, inst.opcode, inst.address
    );
    let text = format!(
        "entity \"{}\": opcode {} ({:#04x}) at {:#06x} is not implemented",
        ctx.meta.entity_name, inst.mnemonic, inst.opcode, inst.address
    );
    ctx.comment(text);
}

#[cfg(test)]
mod tests {
    use crate::catalog::{self, Family};
    use crate::codegen::generate;
    use crate::engine::{FieldEngine, Function, FunctionMetadata};
    use crate::formatter::{FieldTextFormatter, NullFormatter, SpawnPoint};
    use crate::instruction::Instruction;

    fn inst(opcode: u16, address: usize, mnemonic: &'static str, family: Family, operands: Vec<i64>) -> Instruction {
        Instruction { opcode, address, mnemonic, family, operands }
    }

    fn engine_for(insts: &[Instruction], name: &str, scale: f32) -> FieldEngine {
        let mut engine = FieldEngine::new(scale);
        let metadata = FunctionMetadata {
            first_of_entity: true,
            last_of_entity: true,
            character_id: None,
            entity_name: "cl".to_string(),
        };
        let end = insts.last().map(|i| i.address + 1).unwrap_or(1);
        engine.add_function(Function {
            name: name.to_string(),
            start_addr: 0,
            end_addr: end,
            num_instructions: insts.len(),
            metadata: metadata.encode(),
        });
        engine
    }

    #[test]
    fn unhandled_opcode_reports_entity_address_and_opcode() {
        let insts = vec![
            inst(0x5E, 0x10, "SHAKE", Family::Camera, vec![0, 0, 0, 0, 0, 0, 0]),
            inst(catalog::OP_RET, 0x18, "RET", Family::ControlFlow, vec![]),
        ];
        let engine = engine_for(&insts, "on_interact", 1.0);
        let script = generate(&engine, &insts, &mut NullFormatter, 0).unwrap();
        assert!(script.contains("entity \"cl\""), "{script}");
        assert!(script.contains("SHAKE"), "{script}");
        assert!(script.contains("0x0010"), "{script}");
    }

    #[test]
    fn wait_converts_frames_to_seconds() {
        let insts = vec![
            inst(catalog::OP_WAIT, 0, "WAIT", Family::ControlFlow, vec![15]),
            inst(catalog::OP_RET, 3, "RET", Family::ControlFlow, vec![]),
        ];
        let engine = engine_for(&insts, "on_interact", 1.0);
        let script = generate(&engine, &insts, &mut NullFormatter, 0).unwrap();
        assert!(script.contains("script:wait(0.5)"), "{script}");
    }

    #[test]
    fn setbyte_assigns_through_the_bank_accessor() {
        let insts = vec![
            inst(0x80, 0, "SETBYTE", Family::Math, vec![1, 0, 20, 5]),
            inst(catalog::OP_RET, 4, "RET", Family::ControlFlow, vec![]),
        ];
        let engine = engine_for(&insts, "on_interact", 1.0);
        let script = generate(&engine, &insts, &mut NullFormatter, 0).unwrap();
        assert!(script.contains("Banks[1][20] = 5"), "{script}");
    }

    #[test]
    fn saturating_plus_documents_the_clamp_without_applying_it() {
        let insts = vec![
            inst(0x76, 0, "PLUS!", Family::Math, vec![1, 0, 20, 5]),
            inst(catalog::OP_RET, 4, "RET", Family::ControlFlow, vec![]),
        ];
        let engine = engine_for(&insts, "on_interact", 1.0);
        let script = generate(&engine, &insts, &mut NullFormatter, 0).unwrap();
        assert!(
            script.contains("Banks[1][20] = Banks[1][20] + 5 -- clamped to 8-bit range"),
            "{script}"
        );
    }

    #[test]
    fn positions_divide_by_128_times_the_map_scale() {
        // XYZI x=256 with scale factor 1.0: 256 / 128 = 2.0.
        let insts = vec![
            inst(0xA5, 0, "XYZI", Family::Model, vec![0, 0, 0, 0, 256, -128, 0, 7]),
            inst(catalog::OP_RET, 10, "RET", Family::ControlFlow, vec![]),
        ];
        let engine = engine_for(&insts, "on_interact", 1.0);
        let script = generate(&engine, &insts, &mut NullFormatter, 0).unwrap();
        assert!(
            script.contains("self.cl:set_position(2.0, -1.0, 0.0)"),
            "{script}"
        );
        assert!(script.contains("walkmesh triangle 7"), "{script}");
    }

    #[test]
    fn angles_render_in_degrees() {
        // DIR 128 is half a turn: 180 degrees.
        let insts = vec![
            inst(0xB3, 0, "DIR", Family::Model, vec![0, 0, 128]),
            inst(catalog::OP_RET, 3, "RET", Family::ControlFlow, vec![]),
        ];
        let engine = engine_for(&insts, "on_interact", 1.0);
        let script = generate(&engine, &insts, &mut NullFormatter, 0).unwrap();
        assert!(script.contains("self.cl:set_rotation(180.0)"), "{script}");
    }

    #[test]
    fn mapjump_records_a_spawn_point() {
        #[derive(Default)]
        struct Collector {
            points: Vec<SpawnPoint>,
        }
        impl FieldTextFormatter for Collector {
            fn add_spawn_point(&mut self, point: SpawnPoint) {
                self.points.push(point);
            }
            fn map_name(&self, map_id: u32) -> Option<String> {
                (map_id == 3).then(|| "uttown".to_string())
            }
        }

        let insts = vec![
            inst(catalog::OP_MAPJUMP, 0, "MAPJUMP", Family::Uncategorized, vec![3, 10, -20, 5, 128]),
            inst(catalog::OP_RET, 10, "RET", Family::ControlFlow, vec![]),
        ];
        let engine = engine_for(&insts, "on_interact", 1.0);
        let mut formatter = Collector::default();
        let script = generate(&engine, &insts, &mut formatter, 0).unwrap();
        assert!(script.contains("load_field_map(\"uttown\""), "{script}");
        assert_eq!(formatter.points.len(), 1);
        let p = &formatter.points[0];
        assert_eq!((p.map_id, p.x, p.y, p.triangle_id, p.angle), (3, 10, -20, 5, 128));
        assert_eq!(p.entity, "cl");
        assert_eq!(p.function, "on_interact");
    }
}
