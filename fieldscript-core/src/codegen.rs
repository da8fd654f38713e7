use std::collections::BTreeMap;

use log::debug;

use crate::engine::{FieldEngine, Function, FunctionMetadata};
use crate::formatter::FieldTextFormatter;
use crate::instruction::Instruction;
use crate::opcodes;
use crate::value::ValueStack;
use crate::Result;

pub(crate) const RETURN_LINE: &str = "do return 0 end";

/// One line of pending output. Indentation is not baked into the text:
/// each line carries hints that the rendering pass applies to a running
/// indentation counter.
pub(crate) struct OutputLine {
    pub text: String,
    pub unindent_before: bool,
    pub indent_after: bool,
}

impl OutputLine {
    fn plain(text: String) -> OutputLine {
        OutputLine { text, unindent_before: false, indent_after: false }
    }

    fn open(text: String) -> OutputLine {
        OutputLine { text, unindent_before: false, indent_after: true }
    }

    fn close(text: String) -> OutputLine {
        OutputLine { text, unindent_before: true, indent_after: false }
    }
}

/// Everything an instruction handler may touch while translating one
/// instruction of one function.
pub(crate) struct FunctionContext<'a> {
    pub function: &'a Function,
    pub meta: &'a FunctionMetadata,
    pub engine: &'a FieldEngine,
    pub formatter: &'a mut dyn FieldTextFormatter,
    pub stack: &'a mut ValueStack,
    pub open_blocks: &'a mut usize,
    lines: &'a mut Vec<OutputLine>,
}

impl FunctionContext<'_> {
    pub fn write(&mut self, text: impl Into<String>) {
        self.lines.push(OutputLine::plain(text.into()));
    }

    pub fn write_open(&mut self, text: impl Into<String>) {
        self.lines.push(OutputLine::open(text.into()));
    }

    pub fn comment(&mut self, text: impl AsRef<str>) {
        self.lines.push(OutputLine::plain(format!("-- {}", text.as_ref())));
    }

    pub fn scale(&self) -> f32 {
        self.engine.scale_factor()
    }
}

pub(crate) fn label_name(address: usize) -> String {
    format!("label_0x{address:x}")
}

/// How an unconditional jump renders. The classification is shared between
/// the label pass and the control-flow handler so both always agree.
pub(crate) enum UncondJump {
    /// In-function target: `goto` plus a label at the destination.
    Goto(usize),
    /// Target lies outside the sliced function span; the label is gone, so
    /// the jump becomes a comment and an early return.
    OutOfFunction(usize),
    /// Backward (or self-) jump inside the initialiser: commented out so
    /// the script runs to completion.
    SuppressedLoop(usize),
}

pub(crate) fn classify_uncond_jump(inst: &Instruction, function: &Function) -> Result<UncondJump> {
    let dest = inst.destination()?;
    if dest < function.start_addr || dest >= function.end_addr {
        return Ok(UncondJump::OutOfFunction(dest));
    }
    if function.name == "on_start" && dest <= inst.address {
        return Ok(UncondJump::SuppressedLoop(dest));
    }
    Ok(UncondJump::Goto(dest))
}

#[derive(Default, Clone, Copy)]
struct JumpTarget {
    cond_jumps: usize,
    gotos: usize,
}

fn collect_jump_targets(
    function: &Function,
    instructions: &[Instruction],
) -> Result<BTreeMap<usize, JumpTarget>> {
    let mut targets: BTreeMap<usize, JumpTarget> = BTreeMap::new();
    for inst in instructions {
        if inst.is_cond_jump() {
            let dest = inst.destination()?;
            // A conditional jump whose target never materialises (for
            // example a fall-through to the function's natural end) is
            // closed by the trailing cleanup instead of a label entry.
            if dest >= function.start_addr && dest < function.end_addr {
                targets.entry(dest).or_default().cond_jumps += 1;
            }
        } else if inst.is_uncond_jump() {
            if let UncondJump::Goto(dest) = classify_uncond_jump(inst, function)? {
                targets.entry(dest).or_default().gotos += 1;
            }
        }
    }
    Ok(targets)
}

/// Translate the instruction stream into structured script source.
///
/// The stream must be in function order: each function's body is sliced off
/// the front by its instruction count. The disassembler produces exactly
/// that ordering.
pub fn generate(
    engine: &FieldEngine,
    instructions: &[Instruction],
    formatter: &mut dyn FieldTextFormatter,
    map_id: u32,
) -> Result<String> {
    debug!(
        "translating {} function(s) for map {}",
        engine.functions().len(),
        map_id
    );
    let mut lines: Vec<OutputLine> = Vec::new();
    let mut offset = 0usize;
    for function in engine.functions() {
        let body = &instructions[offset..offset + function.num_instructions];
        offset += function.num_instructions;
        emit_function(engine, function, body, formatter, &mut lines)?;
    }
    Ok(render(&lines))
}

fn emit_function(
    engine: &FieldEngine,
    function: &Function,
    body: &[Instruction],
    formatter: &mut dyn FieldTextFormatter,
    lines: &mut Vec<OutputLine>,
) -> Result<()> {
    let meta = FunctionMetadata::parse(&function.metadata);

    if meta.first_of_entity {
        lines.push(OutputLine::open(format!(
            "EntityContainer[\"{}\"] = {{",
            meta.entity_name
        )));
        if meta.character_id.is_some() {
            lines.push(OutputLine::plain(format!("{} = nil,", meta.entity_name)));
        }
    }

    lines.push(OutputLine::open(format!("{} = function(self)", function.name)));

    if let Some(comment) = formatter
        .function_comment(&meta.entity_name, &function.name)
        .filter(|c| !c.is_empty())
    {
        lines.push(OutputLine::plain(format!("-- {comment}")));
    }

    lines.push(OutputLine::plain("--[[".to_string()));
    for inst in body {
        lines.push(OutputLine::plain(format!(
            "{:#06x}: {}",
            inst.address,
            inst.to_text()
        )));
    }
    lines.push(OutputLine::plain("]]".to_string()));

    let targets = collect_jump_targets(function, body)?;
    let mut stack = ValueStack::default();
    let mut open_blocks = 0usize;

    for inst in body {
        if let Some(target) = targets.get(&inst.address) {
            // Every conditional jump converging on this address opened a
            // block of its own; close one `end` per jump, not one in total.
            for _ in 0..target.cond_jumps {
                lines.push(OutputLine::close("end".to_string()));
                open_blocks = open_blocks.saturating_sub(1);
            }
            if target.gotos > 0 {
                lines.push(OutputLine::plain(format!("::{}::", label_name(inst.address))));
            }
        }

        let mut ctx = FunctionContext {
            function,
            meta: &meta,
            engine,
            formatter: &mut *formatter,
            stack: &mut stack,
            open_blocks: &mut open_blocks,
            lines: &mut *lines,
        };
        opcodes::process_instruction(inst, &mut ctx)?;
    }

    // Blocks whose label never appeared fall through to the natural end of
    // the function and are closed here.
    while open_blocks > 0 {
        lines.push(OutputLine::close("end".to_string()));
        open_blocks -= 1;
    }

    let already_returns = lines
        .last()
        .map(|l| l.text == RETURN_LINE)
        .unwrap_or(false);
    if !already_returns {
        lines.push(OutputLine::plain(RETURN_LINE.to_string()));
    }

    lines.push(OutputLine::close("end,".to_string()));
    if meta.last_of_entity {
        lines.push(OutputLine::close("}".to_string()));
    }
    Ok(())
}

fn render(lines: &[OutputLine]) -> String {
    let mut out = String::new();
    let mut indent = 0usize;
    for line in lines {
        if line.unindent_before {
            indent = indent.saturating_sub(1);
        }
        for _ in 0..indent {
            out.push_str("    ");
        }
        out.push_str(&line.text);
        out.push('\n');
        if line.indent_after {
            indent += 1;
        }
    }
    out
}
