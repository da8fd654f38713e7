use std::collections::BTreeMap;

use serde::Serialize;

/// Number of script slots per entity in the field header.
pub const SCRIPT_SLOT_COUNT: usize = 32;

/// Free-form metadata attached to a decompiled function, encoded as
/// underscore-delimited tokens: `start`, `end`, character id, entity name.
/// Tokens are consumed greedily left to right; whatever remains after the
/// first three fields is the entity name, which may itself contain
/// underscores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionMetadata {
    pub first_of_entity: bool,
    pub last_of_entity: bool,
    pub character_id: Option<i32>,
    pub entity_name: String,
}

impl FunctionMetadata {
    pub fn encode(&self) -> String {
        let mut tokens: Vec<String> = Vec::new();
        if self.first_of_entity {
            tokens.push("start".to_string());
        }
        if self.last_of_entity {
            tokens.push("end".to_string());
        }
        tokens.push(self.character_id.unwrap_or(-1).to_string());
        tokens.push(self.entity_name.clone());
        tokens.join("_")
    }

    pub fn parse(text: &str) -> FunctionMetadata {
        let mut meta = FunctionMetadata::default();
        let mut tokens = text.split('_').peekable();
        if tokens.peek() == Some(&"start") {
            meta.first_of_entity = true;
            tokens.next();
        }
        if tokens.peek() == Some(&"end") {
            meta.last_of_entity = true;
            tokens.next();
        }
        if let Some(tok) = tokens.peek() {
            if let Ok(id) = tok.parse::<i32>() {
                if id >= 0 {
                    meta.character_id = Some(id);
                }
                tokens.next();
            }
        }
        meta.entity_name = tokens.collect::<Vec<_>>().join("_");
        meta
    }
}

/// One decompiled unit of bytecode: a single script slot (or the synthetic
/// second half of slot 0).
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub start_addr: usize,
    /// Exclusive end of the byte span this function was sliced from.
    pub end_addr: usize,
    pub num_instructions: usize,
    pub metadata: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point3 {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// A scriptable actor on the field: player, NPC, prop or invisible line
/// trigger. Created lazily the first time a function is attached to its
/// index.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    index: usize,
    character_id: Option<i32>,
    functions: BTreeMap<usize, String>,
    line: Option<(Point3, Point3)>,
}

impl Entity {
    pub fn new(name: String, index: usize) -> Entity {
        Entity {
            name,
            index,
            character_id: None,
            functions: BTreeMap::new(),
            line: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn character_id(&self) -> Option<i32> {
        self.character_id
    }

    pub fn set_character_id(&mut self, id: i32) {
        self.character_id = Some(id);
    }

    pub fn add_function(&mut self, slot: usize, name: String) {
        self.functions.insert(slot, name);
    }

    pub fn function_by_slot(&self, slot: usize) -> Option<&str> {
        self.functions.get(&slot).map(String::as_str)
    }

    pub fn is_line(&self) -> bool {
        self.line.is_some()
    }

    /// Record the trigger segment discovered from a LINE opcode. Later
    /// encounters overwrite the points; the line flag itself never clears.
    pub fn mark_as_line(&mut self, from: Point3, to: Point3) {
        self.line = Some((from, to));
    }

    pub fn line_points(&self) -> Option<(Point3, Point3)> {
        self.line
    }

    /// Names standing in for script slots 1-4 of a line entity, used when
    /// wiring the trigger into the target engine.
    pub fn trigger_function_names(&self) -> [&'static str; 4] {
        ["on_enter", "move_to", "cross", "leave_line"]
    }
}

/// A non-line entity as reported in the decompiler's side lists.
#[derive(Debug, Clone, Serialize)]
pub struct EntityRecord {
    pub name: String,
    pub index: usize,
    pub character_id: Option<i32>,
}

/// A line-trigger entity as reported in the decompiler's side lists. The
/// trigger names stand in for the entity's script slots 1-4 when the
/// segment is wired into the target engine.
#[derive(Debug, Clone, Serialize)]
pub struct LineRecord {
    pub name: String,
    pub from: Point3,
    pub to: Point3,
    pub triggers: Vec<String>,
}

/// Bookkeeping shared by the disassembler (writer) and the code generator
/// (reader): the function table keyed by entry-point address, the entity
/// table, and the field's coordinate scale.
pub struct FieldEngine {
    scale_factor: f32,
    entities: BTreeMap<usize, Entity>,
    functions: Vec<Function>,
    functions_by_addr: BTreeMap<usize, usize>,
}

impl FieldEngine {
    pub fn new(scale_factor: f32) -> FieldEngine {
        FieldEngine {
            scale_factor,
            entities: BTreeMap::new(),
            functions: Vec::new(),
            functions_by_addr: BTreeMap::new(),
        }
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn entity_mut(&mut self, index: usize, name: &str) -> &mut Entity {
        self.entities
            .entry(index)
            .or_insert_with(|| Entity::new(name.to_string(), index))
    }

    pub fn entity(&self, index: usize) -> Option<&Entity> {
        self.entities.get(&index)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Functions in disassembly stream order. The code generator slices the
    /// instruction stream by walking this in order.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function_at(&self, addr: usize) -> Option<&Function> {
        self.functions_by_addr
            .get(&addr)
            .map(|&i| &self.functions[i])
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions_by_addr
            .insert(function.start_addr, self.functions.len());
        self.functions.push(function);
    }

    /// Function name for a (entity index, script slot) pair, used to resolve
    /// cross-entity script request calls.
    pub fn script_name(&self, entity_index: usize, slot: usize) -> Option<&str> {
        self.entity(entity_index)
            .and_then(|e| e.function_by_slot(slot))
    }

    /// Split the entity table into the non-line and line side lists.
    pub fn records(&self) -> (Vec<EntityRecord>, Vec<LineRecord>) {
        let mut entities = Vec::new();
        let mut lines = Vec::new();
        for entity in self.entities.values() {
            match entity.line_points() {
                Some((from, to)) => lines.push(LineRecord {
                    name: entity.name().to_string(),
                    from,
                    to,
                    triggers: entity
                        .trigger_function_names()
                        .iter()
                        .map(|n| n.to_string())
                        .collect(),
                }),
                None => entities.push(EntityRecord {
                    name: entity.name().to_string(),
                    index: entity.index(),
                    character_id: entity.character_id(),
                }),
            }
        }
        (entities, lines)
    }
}
