use crate::codegen::FunctionContext;
use crate::instruction::Instruction;
use crate::opcodes::{not_implemented, position_scale, FRAMES_PER_SECOND};
use crate::value::Value;
use crate::Result;

/// Degrees text for a fixed-point angle operand: 256 raw units per full
/// turn. Literal angles are converted exactly; banked angles render as the
/// variable accessor.
fn degrees(ctx: &FunctionContext, bank: i64, value: i64) -> String {
    if bank == 0 {
        let mut s = (value as f64 * 360.0 / 256.0).to_string();
        if !s.contains('.') {
            s.push_str(".0");
        }
        s
    } else {
        Value::or_variable(bank, value).render(&*ctx.formatter)
    }
}

/// Quoted animation name when the formatter knows one, numeric id
/// otherwise.
fn animation(ctx: &FunctionContext, id: i64) -> String {
    let char_id = ctx.meta.character_id.unwrap_or(-1);
    match ctx.formatter.friendly_animation_name(char_id, id as u32) {
        Some(name) if !name.is_empty() => format!("\"{name}\""),
        _ => id.to_string(),
    }
}

pub(crate) fn process(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    let me = ctx.meta.entity_name.clone();
    let ops = inst.operands.clone();
    match inst.opcode {
        0x08 => {
            let seconds = Value::scaled(0, ops[0], FRAMES_PER_SECOND).render(&*ctx.formatter);
            ctx.write(format!("join_party({seconds})"));
        }
        0xA0 => ctx.write(format!("self.{me}:set_playable_character({})", ops[0])),
        0xA1 => ctx.write(format!("self.{me} = entity_manager:get_entity(\"{me}\")")),
        0xA4 => ctx.write(format!("self.{me}:set_visible({})", ops[0] != 0)),
        0xA5 => {
            let scale = position_scale(ctx);
            let x = Value::scaled(ops[0], ops[4], scale).render(&*ctx.formatter);
            let y = Value::scaled(ops[1], ops[5], scale).render(&*ctx.formatter);
            let z = Value::scaled(ops[2], ops[6], scale).render(&*ctx.formatter);
            ctx.write(format!(
                "self.{me}:set_position({x}, {y}, {z}) -- walkmesh triangle {}",
                ops[7]
            ));
        }
        0xA6 => {
            let scale = position_scale(ctx);
            let x = Value::scaled(ops[0], ops[4], scale).render(&*ctx.formatter);
            let y = Value::scaled(ops[1], ops[5], scale).render(&*ctx.formatter);
            ctx.write(format!(
                "self.{me}:set_position({x}, {y}) -- walkmesh triangle {}",
                ops[6]
            ));
        }
        0xA7 => {
            let scale = position_scale(ctx);
            let x = Value::scaled(ops[0], ops[4], scale).render(&*ctx.formatter);
            let y = Value::scaled(ops[1], ops[5], scale).render(&*ctx.formatter);
            let z = Value::scaled(ops[2], ops[6], scale).render(&*ctx.formatter);
            ctx.write(format!("self.{me}:set_position({x}, {y}, {z})"));
        }
        0xA8 => {
            let scale = position_scale(ctx);
            let x = Value::scaled(ops[0], ops[2], scale).render(&*ctx.formatter);
            let y = Value::scaled(ops[1], ops[3], scale).render(&*ctx.formatter);
            ctx.write(format!("self.{me}:move_to_position({x}, {y})"));
        }
        0xAA => ctx.write(format!("self.{me}:move_to_entity({})", ops[0])),
        0xAC => ctx.write(format!("self.{me}:animation_sync()")),
        0xA2 => {
            let anim = animation(ctx, ops[0]);
            ctx.write(format!("self.{me}:set_default_animation({anim})"));
        }
        0xA3 => {
            let anim = animation(ctx, ops[0]);
            ctx.write(format!("self.{me}:play_animation({anim})"));
            ctx.write(format!("self.{me}:animation_sync()"));
        }
        0xAE | 0xAF | 0xBA => {
            let anim = animation(ctx, ops[0]);
            ctx.write(format!("self.{me}:play_animation({anim})"));
        }
        0xB0 | 0xBB | 0xB1 | 0xBC => {
            let anim = animation(ctx, ops[0]);
            let first = Value::scaled(0, ops[1], FRAMES_PER_SECOND).render(&*ctx.formatter);
            let last = Value::scaled(0, ops[2], FRAMES_PER_SECOND).render(&*ctx.formatter);
            ctx.write(format!(
                "self.{me}:play_animation({anim}, {first}, {last})"
            ));
            if matches!(inst.opcode, 0xB0 | 0xBB) {
                ctx.write(format!("self.{me}:animation_sync()"));
            }
        }
        0xB2 => {
            let scale = position_scale(ctx);
            let speed = Value::scaled(ops[0], ops[2], scale).render(&*ctx.formatter);
            ctx.write(format!("self.{me}:set_move_speed({speed})"));
        }
        0xB3 => {
            let angle = degrees(ctx, ops[0], ops[2]);
            ctx.write(format!("self.{me}:set_rotation({angle})"));
        }
        0xB4 | 0xB5 => {
            let angle = degrees(ctx, ops[0], ops[2]);
            let seconds = Value::scaled(0, ops[5], FRAMES_PER_SECOND).render(&*ctx.formatter);
            ctx.write(format!(
                "self.{me}:turn_to_direction({angle}, {seconds}) -- rotations {}, type {}",
                ops[3], ops[4]
            ));
        }
        0xB7 => {
            let dest = Value::or_variable(ops[1], ops[3]).render(&*ctx.formatter);
            ctx.write(format!("{dest} = entity_manager:get_entity_direction({})", ops[2]));
        }
        0xC0 => {
            let scale = position_scale(ctx);
            let x = Value::scaled(ops[0], ops[4], scale).render(&*ctx.formatter);
            let y = Value::scaled(ops[1], ops[5], scale).render(&*ctx.formatter);
            let triangle = Value::or_variable(ops[2], ops[6]).render(&*ctx.formatter);
            let steps = Value::or_variable(ops[3], ops[7]).render(&*ctx.formatter);
            ctx.write(format!(
                "self.{me}:jump_to({x}, {y}, {triangle}, {steps})"
            ));
        }
        0xC3 => {
            let scale = position_scale(ctx);
            let x = Value::scaled(ops[0], ops[5], scale).render(&*ctx.formatter);
            let y = Value::scaled(ops[1], ops[6], scale).render(&*ctx.formatter);
            let z = Value::scaled(ops[2], ops[7], scale).render(&*ctx.formatter);
            let seconds = Value::scaled(ops[3], ops[8], FRAMES_PER_SECOND).render(&*ctx.formatter);
            ctx.write(format!(
                "self.{me}:offset_to_position({x}, {y}, {z}, {}, {seconds})",
                ops[4]
            ));
        }
        0xC4 => ctx.write(format!("self.{me}:offset_sync()")),
        0xC5 => {
            let scale = position_scale(ctx);
            let radius = Value::scaled(ops[0], ops[2], scale).render(&*ctx.formatter);
            ctx.write(format!("self.{me}:set_talk_radius({radius})"));
        }
        0xC6 => {
            let scale = position_scale(ctx);
            let radius = Value::scaled(ops[0], ops[2], scale).render(&*ctx.formatter);
            ctx.write(format!("self.{me}:set_collision_radius({radius})"));
        }
        0xD6 => {
            let scale = position_scale(ctx);
            let radius = Value::scaled(ops[0], ops[2], scale).render(&*ctx.formatter);
            ctx.write(format!("self.{me}:set_talk_radius({radius})"));
        }
        0xD7 => {
            let scale = position_scale(ctx);
            let radius = Value::scaled(ops[0], ops[2], scale).render(&*ctx.formatter);
            ctx.write(format!("self.{me}:set_collision_radius({radius})"));
        }
        0xC7 => ctx.write(format!("self.{me}:set_solid({})", ops[0] == 0)),
        0x7E => ctx.write(format!("self.{me}:set_talkable({})", ops[0] == 0)),
        0x33 => ctx.write(format!("entity_manager:set_player_lock({})", ops[0] != 0)),
        0x26 => ctx.write(format!("self.{me}:set_blinking({})", ops[0] != 0)),
        0xDE => ctx.write(format!("self.{me}:turn_sync()")),
        _ => {
            // SPLIT, KAWAI graphics sub-opcodes, ladders, party-member
            // movement and the remaining look-at ops.
            not_implemented(inst, ctx);
        }
    }
    Ok(())
}
