use crate::codegen::FunctionContext;
use crate::instruction::Instruction;
use crate::opcodes::not_implemented;
use crate::value::Value;
use crate::Result;

pub(crate) fn process(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    let ops = inst.operands.clone();
    match inst.opcode {
        0x40 => ctx.write(format!("dialog:show_text({}, {})", ops[0], ops[1])),
        0x50 | 0x2F => ctx.write(format!(
            "dialog:set_window({}, {}, {}, {}, {})",
            ops[0], ops[1], ops[2], ops[3], ops[4]
        )),
        0x51 => ctx.write(format!("dialog:move_window({}, {}, {})", ops[0], ops[1], ops[2])),
        0x52 => ctx.write(format!(
            "dialog:set_window_mode({}, {}, {})",
            ops[0], ops[1], ops[2]
        )),
        0x53 => ctx.write(format!("dialog:reset_window({})", ops[0])),
        0x54 | 0x2E => ctx.write(format!("dialog:close_window({})", ops[0])),
        0x55 => ctx.write(format!("dialog:set_window_rows({}, {})", ops[0], ops[1])),
        0x48 => {
            let dest = Value::or_variable(ops[1], ops[6]).render(&*ctx.formatter);
            ctx.write(format!(
                "{dest} = dialog:ask({}, {}, {}, {})",
                ops[2], ops[3], ops[4], ops[5]
            ));
        }
        0x49 => {
            let param = Value::or_variable(ops[0], ops[3]).render(&*ctx.formatter);
            ctx.write(format!("menu:open({}, {param})", ops[2]));
        }
        0x4A => ctx.write(format!("menu:lock({})", ops[0] != 0)),
        0x43 => ctx.write(format!("map:set_name({})", ops[0])),
        _ => {
            // Window decorations, counters, timers and colour controls.
            not_implemented(inst, ctx);
        }
    }
    Ok(())
}
