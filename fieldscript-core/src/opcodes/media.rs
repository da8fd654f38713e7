use crate::codegen::FunctionContext;
use crate::instruction::Instruction;
use crate::opcodes::not_implemented;
use crate::value::Value;
use crate::Result;

pub(crate) fn process(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    let ops = inst.operands.clone();
    match inst.opcode {
        0xF0 => ctx.write(format!("music:play({})", ops[0])),
        0xF1 => {
            let id = Value::or_variable(ops[0], ops[2]).render(&*ctx.formatter);
            let pan = Value::or_variable(ops[1], ops[3]).render(&*ctx.formatter);
            ctx.write(format!("audio:play_sound({id}, {pan})"));
        }
        0xF5 => ctx.write(format!("music:lock({})", ops[0] != 0)),
        0xF6 => ctx.write(format!("music:set_battle_music({})", ops[0])),
        0xF8 => ctx.write(format!("movie:set({})", ops[0])),
        0xF9 => ctx.write("movie:play()"),
        0xFA => {
            let dest = Value::or_variable(ops[0], ops[2]).render(&*ctx.formatter);
            ctx.write(format!("{dest} = movie:get_current_frame()"));
        }
        0x0FFC => ctx.write(format!("movie:lock({})", ops[0] != 0)),
        _ => {
            // The AKAO sound-command family and music volume transitions.
            not_implemented(inst, ctx);
        }
    }
    Ok(())
}
