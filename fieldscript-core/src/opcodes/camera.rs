use crate::codegen::FunctionContext;
use crate::instruction::Instruction;
use crate::opcodes::{not_implemented, FRAMES_PER_SECOND};
use crate::value::Value;
use crate::Result;

pub(crate) fn process(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    let ops = inst.operands.clone();
    match inst.opcode {
        0x25 => {
            let r = Value::or_variable(ops[0], ops[5]).render(&*ctx.formatter);
            let g = Value::or_variable(ops[1], ops[6]).render(&*ctx.formatter);
            let b = Value::or_variable(ops[2], ops[7]).render(&*ctx.formatter);
            let seconds = Value::scaled(ops[3], ops[8], FRAMES_PER_SECOND).render(&*ctx.formatter);
            ctx.write(format!("screen:fade({}, {r}, {g}, {b}, {seconds})", ops[4]));
        }
        0x6C => ctx.write("screen:fade_sync()"),
        0x64 => {
            let x = Value::or_variable(ops[0], ops[2]).render(&*ctx.formatter);
            let y = Value::or_variable(ops[1], ops[3]).render(&*ctx.formatter);
            ctx.write(format!("background:scroll_to_position({x}, {y})"));
        }
        0x66 | 0x68 => {
            let x = Value::or_variable(ops[0], ops[4]).render(&*ctx.formatter);
            let y = Value::or_variable(ops[1], ops[5]).render(&*ctx.formatter);
            let speed = Value::or_variable(ops[2], ops[6]).render(&*ctx.formatter);
            ctx.write(format!("background:scroll_to_position({x}, {y}, {speed})"));
        }
        0x67 => ctx.write("background:scroll_sync()"),
        _ => {
            // FADE, SHAKE, the scroll-tracking family and movie camera
            // control.
            not_implemented(inst, ctx);
        }
    }
    Ok(())
}
