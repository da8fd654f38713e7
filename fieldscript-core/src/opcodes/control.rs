use log::warn;

use crate::catalog as cat;
use crate::codegen::{classify_uncond_jump, label_name, FunctionContext, UncondJump, RETURN_LINE};
use crate::instruction::{comparison_operator, Instruction, COMPARE_BIT_OFF, COMPARE_BIT_ON};
use crate::opcodes::{not_implemented, FRAMES_PER_SECOND};
use crate::value::Value;
use crate::{DecompileError, Result};

pub(crate) fn process(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    match inst.opcode {
        cat::OP_RET => {
            ctx.write(RETURN_LINE);
            Ok(())
        }
        cat::OP_REQ => request(inst, ctx, "script:request"),
        cat::OP_REQSW => request(inst, ctx, "script:request_start_sync"),
        cat::OP_REQEW => match request(inst, ctx, "script:request_end_sync") {
            // Cross-entity function tables can be incomplete mid-decompile;
            // for the end-synchronised variant this is survivable.
            Err(DecompileError::UnresolvedCall { entity, script }) => {
                warn!(
                    "REQEW at {:#06x}: script {} of entity {} not found",
                    inst.address, script, entity
                );
                ctx.comment(format!(
                    "script:request_end_sync: script {script} of entity {entity} not found"
                ));
                Ok(())
            }
            other => other,
        },
        cat::OP_WAIT => {
            let seconds = Value::scaled(0, inst.operands[0], FRAMES_PER_SECOND);
            let text = format!("script:wait({})", seconds.render(&*ctx.formatter));
            ctx.write(text);
            Ok(())
        }
        cat::OP_JMPF | cat::OP_JMPFL | cat::OP_JMPB | cat::OP_JMPBL => uncond_jump(inst, ctx),
        cat::OP_IFUB | cat::OP_IFUBL | cat::OP_IFSW | cat::OP_IFSWL | cat::OP_IFUW
        | cat::OP_IFUWL | cat::OP_IFKEY | cat::OP_IFKEYON | cat::OP_IFKEYOFF
        | cat::OP_IFPRTYQ | cat::OP_IFMEMBQ => cond_jump(inst, ctx),
        _ => {
            // PREQ/PRQSW/PRQEW address scripts through party slots, RETTO
            // re-queues the caller; neither has a translation yet.
            not_implemented(inst, ctx);
            Ok(())
        }
    }
}

/// Resolve and emit a cross-entity script request. The second operand packs
/// the priority into the high three bits and the script slot into the rest.
fn request(inst: &Instruction, ctx: &mut FunctionContext, call: &str) -> Result<()> {
    let entity_index = inst.operands[0] as usize;
    let arg = inst.operands[1];
    let slot = (arg & 0x1F) as usize;
    let priority = arg >> 5;

    let engine = ctx.engine;
    let miss = DecompileError::UnresolvedCall {
        entity: entity_index,
        script: slot,
    };
    let entity = engine.entity(entity_index).ok_or(miss)?;
    let function = entity.function_by_slot(slot).ok_or(DecompileError::UnresolvedCall {
        entity: entity_index,
        script: slot,
    })?;

    let text = format!("{call}(\"{}\", \"{function}\", {priority})", entity.name());
    ctx.write(text);
    Ok(())
}

fn uncond_jump(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    match classify_uncond_jump(inst, ctx.function)? {
        UncondJump::Goto(dest) => {
            ctx.write(format!("goto {}", label_name(dest)));
        }
        UncondJump::OutOfFunction(dest) => {
            ctx.comment(format!(
                "jump to {} is outside this function",
                label_name(dest)
            ));
            ctx.write(RETURN_LINE);
        }
        UncondJump::SuppressedLoop(dest) => {
            ctx.comment(format!(
                "jump back to {} suppressed so the initialiser runs to completion",
                label_name(dest)
            ));
        }
    }
    Ok(())
}

fn cond_jump(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    push_condition(inst, ctx)?;
    let condition = ctx.stack.pop().ok_or(DecompileError::StackEmpty {
        address: inst.address,
    })?;
    let text = format!("if ({}) then", condition.render(&*ctx.formatter));
    ctx.write_open(text);
    *ctx.open_blocks += 1;
    Ok(())
}

fn push_condition(inst: &Instruction, ctx: &mut FunctionContext) -> Result<()> {
    let condition = match inst.opcode {
        cat::OP_IFUB | cat::OP_IFUBL | cat::OP_IFSW | cat::OP_IFSWL | cat::OP_IFUW
        | cat::OP_IFUWL => {
            let lhs = Value::or_variable(inst.operands[0], inst.operands[2]).render(&*ctx.formatter);
            let rhs = Value::or_variable(inst.operands[1], inst.operands[3]).render(&*ctx.formatter);
            let code = inst.operands[4] as u8;
            match code {
                COMPARE_BIT_ON => format!("bit({lhs}, {rhs}) == 1"),
                COMPARE_BIT_OFF => format!("bit({lhs}, {rhs}) == 0"),
                _ => {
                    let op = comparison_operator(code).ok_or(DecompileError::UnknownComparison {
                        address: inst.address,
                        operator: code,
                    })?;
                    format!("{lhs} {op} {rhs}")
                }
            }
        }
        cat::OP_IFKEY => format!("is_key_down({})", inst.operands[0]),
        cat::OP_IFKEYON => format!("was_key_pressed({})", inst.operands[0]),
        cat::OP_IFKEYOFF => format!("was_key_released({})", inst.operands[0]),
        cat::OP_IFPRTYQ => format!("party:is_member({})", inst.operands[0]),
        cat::OP_IFMEMBQ => format!("party:is_available({})", inst.operands[0]),
        _ => {
            return Err(DecompileError::UnknownJump {
                address: inst.address,
                opcode: inst.opcode,
            })
        }
    };
    ctx.stack.push(Value::Expr(condition));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::catalog::{self, Family};
    use crate::codegen::generate;
    use crate::engine::{FieldEngine, Function, FunctionMetadata};
    use crate::formatter::NullFormatter;
    use crate::instruction::Instruction;
    use crate::DecompileError;

    fn req(opcode: u16, mnemonic: &'static str, entity: i64, arg: i64) -> Instruction {
        Instruction {
            opcode,
            address: 0,
            mnemonic,
            family: Family::ControlFlow,
            operands: vec![entity, arg],
        }
    }

    fn ret(address: usize) -> Instruction {
        Instruction {
            opcode: catalog::OP_RET,
            address,
            mnemonic: "RET",
            family: Family::ControlFlow,
            operands: vec![],
        }
    }

    fn engine_with_target() -> FieldEngine {
        let mut engine = FieldEngine::new(1.0);
        engine
            .entity_mut(2, "gate")
            .add_function(1, "on_interact".to_string());
        let metadata = FunctionMetadata {
            first_of_entity: true,
            last_of_entity: true,
            character_id: None,
            entity_name: "cl".to_string(),
        };
        engine.add_function(Function {
            name: "on_start".to_string(),
            start_addr: 0,
            end_addr: 4,
            num_instructions: 2,
            metadata: metadata.encode(),
        });
        engine
    }

    #[test]
    fn req_resolves_entity_and_script_slot() {
        // Priority 3 in the high bits, slot 1 in the low bits.
        let insts = vec![req(catalog::OP_REQ, "REQ", 2, (3 << 5) | 1), ret(3)];
        let engine = engine_with_target();
        let script = generate(&engine, &insts, &mut NullFormatter, 0).unwrap();
        assert!(
            script.contains("script:request(\"gate\", \"on_interact\", 3)"),
            "{script}"
        );
    }

    #[test]
    fn req_with_unknown_target_is_fatal() {
        let insts = vec![req(catalog::OP_REQ, "REQ", 9, 1), ret(3)];
        let engine = engine_with_target();
        match generate(&engine, &insts, &mut NullFormatter, 0) {
            Err(DecompileError::UnresolvedCall { entity, script }) => {
                assert_eq!((entity, script), (9, 1));
            }
            other => panic!("expected UnresolvedCall, got {other:?}"),
        }
    }

    #[test]
    fn reqew_with_unknown_target_degrades_to_a_comment() {
        let insts = vec![req(catalog::OP_REQEW, "REQEW", 9, 1), ret(3)];
        let engine = engine_with_target();
        let script = generate(&engine, &insts, &mut NullFormatter, 0).unwrap();
        assert!(
            script.contains("-- script:request_end_sync: script 1 of entity 9 not found"),
            "{script}"
        );
    }

    #[test]
    fn unknown_comparison_operator_is_fatal() {
        let insts = vec![
            Instruction {
                opcode: catalog::OP_IFUB,
                address: 0,
                mnemonic: "IFUB",
                family: Family::CondJump,
                operands: vec![0, 0, 1, 1, 11, 1],
            },
            ret(6),
        ];
        let engine = engine_with_target();
        match generate(&engine, &insts, &mut NullFormatter, 0) {
            Err(DecompileError::UnknownComparison { operator, .. }) => assert_eq!(operator, 11),
            other => panic!("expected UnknownComparison, got {other:?}"),
        }
    }

    #[test]
    fn bit_test_comparisons_have_no_infix_form() {
        let insts = vec![
            Instruction {
                opcode: catalog::OP_IFUB,
                address: 0,
                mnemonic: "IFUB",
                family: Family::CondJump,
                operands: vec![1, 0, 20, 4, 9, 1],
            },
            ret(6),
        ];
        let engine = engine_with_target();
        let script = generate(&engine, &insts, &mut NullFormatter, 0).unwrap();
        assert!(
            script.contains("if (bit(Banks[1][20], 4) == 1) then"),
            "{script}"
        );
    }
}
