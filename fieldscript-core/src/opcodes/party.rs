use crate::codegen::FunctionContext;
use crate::instruction::Instruction;
use crate::opcodes::not_implemented;
use crate::value::Value;
use crate::Result;

pub(crate) fn process(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    let ops = inst.operands.clone();
    match inst.opcode {
        0x39 => {
            let amount = Value::or_variable(ops[0], ops[2]).render(&*ctx.formatter);
            ctx.write(format!("party:add_gold({amount})"));
        }
        0x3A => {
            let amount = Value::or_variable(ops[0], ops[2]).render(&*ctx.formatter);
            ctx.write(format!("party:remove_gold({amount})"));
        }
        0x3B => {
            let low = Value::or_variable(ops[0], ops[2]).render(&*ctx.formatter);
            let high = Value::or_variable(ops[1], ops[3]).render(&*ctx.formatter);
            ctx.write(format!("{low}, {high} = party:get_gold()"));
        }
        0x3C | 0x3D | 0x3F => ctx.write("party:restore_hp_mp()"),
        0x3E => ctx.write("party:max_hp_mp()"),
        0x45 => mp_hp(inst, ctx, "party:add_mp"),
        0x47 => mp_hp(inst, ctx, "party:remove_mp"),
        0x4D => mp_hp(inst, ctx, "party:add_hp"),
        0x4F => mp_hp(inst, ctx, "party:remove_hp"),
        0x58 => item(inst, ctx, "party:add_item"),
        0x59 => item(inst, ctx, "party:remove_item"),
        0x5A => {
            let id = Value::or_variable(ops[0], ops[2]).render(&*ctx.formatter);
            let dest = Value::or_variable(ops[1], ops[3]).render(&*ctx.formatter);
            ctx.write(format!("{dest} = party:item_quantity({id})"));
        }
        0x5B => {
            if ops[0] != 0 || ops[1] != 0 || ops[2] != 0 || ops[3] != 0 {
                not_implemented(inst, ctx);
            } else {
                let ap = ops[5] | ops[6] << 8 | ops[7] << 16;
                ctx.write(format!("party:add_materia({}, {ap})", ops[4]));
            }
        }
        0xC8 => ctx.write(format!("party:add_member({})", ops[0])),
        0xC9 => ctx.write(format!("party:remove_member({})", ops[0])),
        0xCA => ctx.write(format!("party:set_members({}, {}, {})", ops[0], ops[1], ops[2])),
        0x0FF9 => ctx.write("party:fill_materia()"),
        0x0FFA => ctx.write("party:fill_items()"),
        0x0FFF => ctx.write("party:clear_items()"),
        _ => {
            // Materia removal/checking, party-member queries and the
            // phs-list ops.
            not_implemented(inst, ctx);
        }
    }
    Ok(())
}

fn mp_hp(inst: &Instruction, ctx: &mut FunctionContext, call: &str) {
    let amount = Value::or_variable(inst.operands[0], inst.operands[3]).render(&*ctx.formatter);
    ctx.write(format!("{call}({}, {amount})", inst.operands[2]));
}

fn item(inst: &Instruction, ctx: &mut FunctionContext, call: &str) {
    let id = Value::or_variable(inst.operands[0], inst.operands[2]).render(&*ctx.formatter);
    let qty = Value::or_variable(inst.operands[1], inst.operands[3]).render(&*ctx.formatter);
    ctx.write(format!("{call}({id}, {qty})"));
}
