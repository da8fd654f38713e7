use crate::catalog as cat;
use crate::codegen::FunctionContext;
use crate::formatter::SpawnPoint;
use crate::instruction::Instruction;
use crate::opcodes::not_implemented;
use crate::value::Value;
use crate::Result;

pub(crate) fn process(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    let ops = inst.operands.clone();
    match inst.opcode {
        cat::OP_MAPJUMP => map_jump(inst, ctx),
        0x70 => {
            let id = Value::or_variable(ops[0], ops[2]).render(&*ctx.formatter);
            ctx.write(format!("battle:start({id})"));
            Ok(())
        }
        0x71 => {
            ctx.write(format!("battle:set_random_encounters({})", ops[0] == 0));
            Ok(())
        }
        0xFF => {
            ctx.write("game_over()");
            Ok(())
        }
        0x0FFB => {
            ctx.write(format!("battle:lock({})", ops[0] != 0));
            Ok(())
        }
        _ => {
            // Minigames, disc swaps, tutorials, battle table selection and
            // the remaining SPECIAL sub-opcodes.
            not_implemented(inst, ctx);
            Ok(())
        }
    }
}

/// A MAPJUMP is both an output line and a side effect: the gateway is
/// reported to the collaborator so spawn points accumulate across a batch.
fn map_jump(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    let map_id = inst.operands[0] as u32;
    let entity = ctx.meta.entity_name.clone();
    let function = ctx.function.name.clone();

    ctx.formatter.add_spawn_point(SpawnPoint {
        map_id,
        entity: entity.clone(),
        function: function.clone(),
        address: inst.address,
        x: inst.operands[1] as i16,
        y: inst.operands[2] as i16,
        triangle_id: inst.operands[3] as u16,
        angle: inst.operands[4] as u8,
    });

    let spawn = ctx
        .formatter
        .spawn_point_name(map_id, &entity, &function, inst.address)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("spawn_0x{:x}", inst.address));
    let map = ctx
        .formatter
        .map_name(map_id)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("map_{map_id}"));

    ctx.write(format!("load_field_map(\"{map}\", \"{spawn}\")"));
    Ok(())
}
