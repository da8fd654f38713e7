use crate::codegen::FunctionContext;
use crate::instruction::Instruction;
use crate::opcodes::not_implemented;
use crate::Result;

pub(crate) fn process(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    let ops = inst.operands.clone();
    match inst.opcode {
        0xD0 => {
            // The trigger itself was attached to the entity during
            // disassembly; the script body only documents the segment.
            ctx.comment(format!(
                "line trigger ({}, {}, {}) - ({}, {}, {})",
                ops[0], ops[1], ops[2], ops[3], ops[4], ops[5]
            ));
        }
        0xD1 => {
            let me = ctx.meta.entity_name.clone();
            ctx.write(format!("self.{me}:set_line_active({})", ops[0] != 0));
        }
        0x6D => {
            ctx.write(format!(
                "walkmesh:lock_triangle({}, {})",
                ops[0],
                ops[1] != 0
            ));
        }
        _ => {
            // SLIP, SLINE and the gateway toggle.
            not_implemented(inst, ctx);
        }
    }
    Ok(())
}
