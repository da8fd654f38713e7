use serde::Serialize;

/// A field map gateway discovered while translating a MAPJUMP opcode.
///
/// The decompiler hands these to the collaborator formatter so that an
/// installer layer can accumulate spawn points across a whole batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnPoint {
    pub map_id: u32,
    pub entity: String,
    pub function: String,
    pub address: usize,
    pub x: i16,
    pub y: i16,
    pub triangle_id: u16,
    pub angle: u8,
}

/// Collaborator interface supplying human-friendly names to the decompiler.
///
/// Every lookup is optional: returning `None` everywhere (see
/// [`NullFormatter`]) degrades the output to generic bank/index accessors and
/// positional names, never to an error. Lookups must be stable between calls,
/// since the same operand may be formatted more than once.
pub trait FieldTextFormatter {
    fn friendly_variable_name(&self, _bank: u8, _address: u8) -> Option<String> {
        None
    }

    fn friendly_entity_name(&self, _raw_name: &str) -> Option<String> {
        None
    }

    fn friendly_function_name(&self, _entity: &str, _function: &str) -> Option<String> {
        None
    }

    fn friendly_animation_name(&self, _char_id: i32, _animation_id: u32) -> Option<String> {
        None
    }

    fn spawn_point_name(
        &self,
        _map_id: u32,
        _entity: &str,
        _function: &str,
        _address: usize,
    ) -> Option<String> {
        None
    }

    fn add_spawn_point(&mut self, _point: SpawnPoint) {}

    fn map_name(&self, _map_id: u32) -> Option<String> {
        None
    }

    fn function_comment(&self, _entity: &str, _function: &str) -> Option<String> {
        None
    }
}

/// Formatter with no knowledge of any field; every lookup misses.
pub struct NullFormatter;

impl FieldTextFormatter for NullFormatter {}
