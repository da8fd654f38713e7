use crate::codegen::FunctionContext;
use crate::instruction::Instruction;
use crate::opcodes::not_implemented;
use crate::value::Value;
use crate::Result;

const CLAMP_8: &str = "clamped to 8-bit range";
const CLAMP_16: &str = "clamped to 16-bit range";

pub(crate) fn process(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    match inst.opcode {
        0x80 | 0x81 => assign(inst, ctx),
        0x82 => bit_call(inst, ctx, "bit_set"),
        0x83 => bit_call(inst, ctx, "bit_clear"),
        0x84 => bit_call(inst, ctx, "bit_toggle"),
        // The `!` variants saturate in the game's VM. The clamp is not
        // applied to the emitted arithmetic, only recorded next to it.
        0x76 => binary(inst, ctx, "+", Some(CLAMP_8)),
        0x77 => binary(inst, ctx, "+", Some(CLAMP_16)),
        0x78 => binary(inst, ctx, "-", Some(CLAMP_8)),
        0x79 => binary(inst, ctx, "-", Some(CLAMP_16)),
        0x85 | 0x86 => binary(inst, ctx, "+", None),
        0x87 | 0x88 => binary(inst, ctx, "-", None),
        0x89 | 0x8A => binary(inst, ctx, "*", None),
        0x8B | 0x8C => binary(inst, ctx, "/", None),
        0x8D | 0x8E => binary(inst, ctx, "%", None),
        0x8F | 0x90 => binary(inst, ctx, "&", None),
        0x91 | 0x92 => binary(inst, ctx, "|", None),
        0x93 | 0x94 => binary(inst, ctx, "~", None),
        0x7A => step(inst, ctx, "+", Some(CLAMP_8)),
        0x7B => step(inst, ctx, "+", Some(CLAMP_16)),
        0x7C => step(inst, ctx, "-", Some(CLAMP_8)),
        0x7D => step(inst, ctx, "-", Some(CLAMP_16)),
        0x95 | 0x96 => step(inst, ctx, "+", None),
        0x97 | 0x98 => step(inst, ctx, "-", None),
        0x99 => {
            let dest = Value::or_variable(inst.operands[0], inst.operands[2]).render(&*ctx.formatter);
            ctx.write(format!("{dest} = math.random(0, 255)"));
            Ok(())
        }
        0x9A => byte_pick(inst, ctx, "low_byte"),
        0x9B => byte_pick(inst, ctx, "high_byte"),
        _ => {
            // 2BYTE, SETX/GETX, SEARCHX, SIN, COS.
            not_implemented(inst, ctx);
            Ok(())
        }
    }
}

fn assign(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    let dest = Value::or_variable(inst.operands[0], inst.operands[2]).render(&*ctx.formatter);
    let src = Value::or_variable(inst.operands[1], inst.operands[3]).render(&*ctx.formatter);
    ctx.write(format!("{dest} = {src}"));
    Ok(())
}

fn binary(
    inst: &Instruction,
    ctx: &mut FunctionContext,
    op: &str,
    clamp: Option<&str>,
) -> Result<()> {
    let dest = Value::or_variable(inst.operands[0], inst.operands[2]).render(&*ctx.formatter);
    let src = Value::or_variable(inst.operands[1], inst.operands[3]).render(&*ctx.formatter);
    let mut line = format!("{dest} = {dest} {op} {src}");
    if let Some(clamp) = clamp {
        line.push_str(" -- ");
        line.push_str(clamp);
    }
    ctx.write(line);
    Ok(())
}

fn step(
    inst: &Instruction,
    ctx: &mut FunctionContext,
    op: &str,
    clamp: Option<&str>,
) -> Result<()> {
    let dest = Value::or_variable(inst.operands[0], inst.operands[2]).render(&*ctx.formatter);
    let mut line = format!("{dest} = {dest} {op} 1");
    if let Some(clamp) = clamp {
        line.push_str(" -- ");
        line.push_str(clamp);
    }
    ctx.write(line);
    Ok(())
}

fn bit_call(inst: &Instruction, ctx: &mut FunctionContext, call: &str) -> Result<()> {
    let dest = Value::or_variable(inst.operands[0], inst.operands[2]).render(&*ctx.formatter);
    let bit = Value::or_variable(inst.operands[1], inst.operands[3]).render(&*ctx.formatter);
    ctx.write(format!("{dest} = {call}({dest}, {bit})"));
    Ok(())
}

fn byte_pick(inst: &Instruction, ctx: &mut FunctionContext, call: &str) -> Result<()> {
    let dest = Value::or_variable(inst.operands[0], inst.operands[2]).render(&*ctx.formatter);
    let src = Value::or_variable(inst.operands[1], inst.operands[3]).render(&*ctx.formatter);
    ctx.write(format!("{dest} = {call}({src})"));
    Ok(())
}
