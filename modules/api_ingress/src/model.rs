use std::collections::BTreeMap;

use modkit::api::SchemaCollection;
use utoipa::openapi::{schema::Schema, RefOr};

/// Outcome of registering one named schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaInsert {
    Inserted,
    Identical,
    /// Different content under an existing name; the first one is kept.
    Conflict,
}

#[derive(Debug, Default, Clone)]
pub struct ComponentsRegistry {
    /// Component name -> utoipa schema (serialized to `components.schemas`)
    pub schemas: BTreeMap<String, RefOr<Schema>>,
}

impl ComponentsRegistry {
    /// Register a single schema; first registration wins on conflicts.
    pub fn register_schema(&mut self, name: impl Into<String>, schema: RefOr<Schema>) -> SchemaInsert {
        let name = name.into();
        match self.schemas.get(&name) {
            None => {
                self.schemas.insert(name, schema);
                SchemaInsert::Inserted
            }
            Some(existing) => {
                let same = match (serde_json::to_value(existing), serde_json::to_value(&schema)) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => false,
                };
                if same {
                    SchemaInsert::Identical
                } else {
                    SchemaInsert::Conflict
                }
            }
        }
    }

    /// Register a root schema together with everything it references.
    pub fn register_collection(&mut self, schemas: SchemaCollection) -> Vec<(String, SchemaInsert)> {
        schemas
            .into_iter()
            .map(|(name, schema)| {
                let outcome = self.register_schema(name.clone(), schema);
                (name, outcome)
            })
            .collect()
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::schema::{ObjectBuilder, Type};

    fn object(prop: &str) -> RefOr<Schema> {
        RefOr::T(Schema::Object(
            ObjectBuilder::new()
                .property(prop, ObjectBuilder::new().schema_type(Type::String))
                .build(),
        ))
    }

    #[test]
    fn first_registration_wins() {
        let mut reg = ComponentsRegistry::default();
        assert_eq!(reg.register_schema("User", object("id")), SchemaInsert::Inserted);
        assert_eq!(reg.register_schema("User", object("id")), SchemaInsert::Identical);
        assert_eq!(reg.register_schema("User", object("email")), SchemaInsert::Conflict);

        let kept = serde_json::to_value(&reg.schemas["User"]).unwrap();
        assert!(kept["properties"].get("id").is_some());
        assert!(kept["properties"].get("email").is_none());
    }

    #[test]
    fn collection_registers_dependencies() {
        let mut reg = ComponentsRegistry::default();
        let outcomes =
            reg.register_collection(vec![("Post".into(), object("id")), ("Comment".into(), object("text"))]);
        assert_eq!(outcomes.len(), 2);
        assert!(reg.has_schema("Post"));
        assert!(reg.has_schema("Comment"));
    }
}
