use crate::codegen::FunctionContext;
use crate::instruction::Instruction;
use crate::opcodes::not_implemented;
use crate::value::Value;
use crate::Result;

pub(crate) fn process(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    let ops = inst.operands.clone();
    match inst.opcode {
        0xE0 => {
            let area = Value::or_variable(ops[0], ops[2]).render(&*ctx.formatter);
            let layer = Value::or_variable(ops[1], ops[3]).render(&*ctx.formatter);
            ctx.write(format!("background:show({area}, {layer})"));
        }
        0xE1 => {
            let area = Value::or_variable(ops[0], ops[2]).render(&*ctx.formatter);
            let layer = Value::or_variable(ops[1], ops[3]).render(&*ctx.formatter);
            ctx.write(format!("background:hide({area}, {layer})"));
        }
        0xE4 => {
            let area = Value::or_variable(ops[0], ops[2]).render(&*ctx.formatter);
            ctx.write(format!("background:clear({area})"));
        }
        _ => {
            // Rolling layers, the palette block and the background movie
            // toggles stay untranslated.
            not_implemented(inst, ctx);
        }
    }
    Ok(())
}
