use std::collections::HashMap;

use serde::Deserialize;

use fieldscript_core::{FieldTextFormatter, SpawnPoint};

/// Friendly-name tables loaded from a JSON file. Every table is optional;
/// an empty set degrades the output to generic names.
///
/// Keys: `variables` uses `"bank:address"`, `functions` and
/// `function_comments` use `"entity.function"`, `animations` uses
/// `"char_id:animation_id"`, `maps` uses the decimal map id.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct NameTables {
    #[serde(default)]
    pub variables: HashMap<String, String>,
    #[serde(default)]
    pub entities: HashMap<String, String>,
    #[serde(default)]
    pub functions: HashMap<String, String>,
    #[serde(default)]
    pub animations: HashMap<String, String>,
    #[serde(default)]
    pub maps: HashMap<String, String>,
    #[serde(default)]
    pub function_comments: HashMap<String, String>,
}

/// Formatter backed by [`NameTables`]; also accumulates the spawn points
/// discovered while one field converts.
pub(crate) struct TableFormatter<'a> {
    tables: &'a NameTables,
    spawn_points: Vec<SpawnPoint>,
}

impl<'a> TableFormatter<'a> {
    pub fn new(tables: &'a NameTables) -> TableFormatter<'a> {
        TableFormatter {
            tables,
            spawn_points: Vec::new(),
        }
    }

    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }
}

impl FieldTextFormatter for TableFormatter<'_> {
    fn friendly_variable_name(&self, bank: u8, address: u8) -> Option<String> {
        self.tables.variables.get(&format!("{bank}:{address}")).cloned()
    }

    fn friendly_entity_name(&self, raw_name: &str) -> Option<String> {
        self.tables.entities.get(raw_name).cloned()
    }

    fn friendly_function_name(&self, entity: &str, function: &str) -> Option<String> {
        self.tables.functions.get(&format!("{entity}.{function}")).cloned()
    }

    fn friendly_animation_name(&self, char_id: i32, animation_id: u32) -> Option<String> {
        self.tables
            .animations
            .get(&format!("{char_id}:{animation_id}"))
            .cloned()
    }

    fn spawn_point_name(
        &self,
        map_id: u32,
        entity: &str,
        _function: &str,
        address: usize,
    ) -> Option<String> {
        let map = self
            .tables
            .maps
            .get(&map_id.to_string())
            .cloned()
            .unwrap_or_else(|| format!("map_{map_id}"));
        Some(format!("{map}_{entity}_0x{address:x}"))
    }

    fn add_spawn_point(&mut self, point: SpawnPoint) {
        self.spawn_points.push(point);
    }

    fn map_name(&self, map_id: u32) -> Option<String> {
        self.tables.maps.get(&map_id.to_string()).cloned()
    }

    fn function_comment(&self, entity: &str, function: &str) -> Option<String> {
        self.tables
            .function_comments
            .get(&format!("{entity}.{function}"))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{NameTables, TableFormatter};
    use fieldscript_core::FieldTextFormatter;

    #[test]
    fn tables_deserialize_with_missing_sections() {
        let json = r#"{
            "variables": { "1:20": "progress_game" },
            "maps": { "3": "uttown" }
        }"#;
        let tables: NameTables = serde_json::from_str(json).unwrap();
        let formatter = TableFormatter::new(&tables);
        assert_eq!(
            formatter.friendly_variable_name(1, 20),
            Some("progress_game".to_string())
        );
        assert_eq!(formatter.map_name(3), Some("uttown".to_string()));
        assert_eq!(formatter.friendly_entity_name("cl"), None);
    }

    #[test]
    fn spawn_point_names_are_deterministic() {
        let tables = NameTables::default();
        let formatter = TableFormatter::new(&tables);
        assert_eq!(
            formatter.spawn_point_name(3, "gate", "on_interact", 0x40),
            Some("map_3_gate_0x40".to_string())
        );
    }
}
