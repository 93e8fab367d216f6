//! Schema contracts consumed by the parser.
//!
//! The engine never scans annotations or introspects a database; it resolves
//! entity and property names against descriptors supplied by the caller
//! through the [`Schema`] trait. [`SchemaMap`] is the bundled registry
//! implementation for callers that assemble descriptors by hand.

use indexmap::IndexMap;

/// A property of an entity, mapped to a table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
    column: String,
    embedded: bool,
    referenced_entity: Option<String>,
}

impl Property {
    /// Creates a plain column-mapped property.
    #[must_use]
    pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            embedded: false,
            referenced_entity: None,
        }
    }

    /// Creates an embedded composite property.
    ///
    /// The referenced entity's properties are flattened into the parent
    /// table; dotted paths in queries recurse into it.
    #[must_use]
    pub fn embedded(name: impl Into<String>, referenced_entity: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            embedded: true,
            referenced_entity: Some(referenced_entity.into()),
        }
    }

    /// Returns the property name as written in queries.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the mapped column name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column
    }

    /// Returns whether this property is an embedded composite.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// Returns the referenced entity name; only meaningful when embedded.
    #[must_use]
    pub fn referenced_entity(&self) -> Option<&str> {
        self.referenced_entity.as_deref()
    }
}

/// An entity, mapped to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: String,
    table_name: String,
    properties: Vec<Property>,
}

impl Entity {
    /// Creates an entity with no properties.
    #[must_use]
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            properties: Vec::new(),
        }
    }

    /// Adds a property, keeping declaration order.
    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Returns the entity name as written in queries.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the mapped table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Returns the property at `index` in declaration order.
    #[must_use]
    pub fn property_at(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }

    /// Returns all properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Provider of entity descriptors.
pub trait Schema {
    /// Looks up an entity by name.
    fn find_entity(&self, name: &str) -> Option<&Entity>;
}

/// An in-memory entity registry.
#[derive(Debug, Clone, Default)]
pub struct SchemaMap {
    entities: IndexMap<String, Entity>,
}

impl SchemaMap {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity, replacing any previous one of the same name.
    #[must_use]
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }
}

impl Schema for SchemaMap {
    fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Entity {
        Entity::new("User", "users")
            .with_property(Property::new("id", "id"))
            .with_property(Property::new("name", "name"))
    }

    #[test]
    fn find_entity_is_exact_match() {
        let schema = SchemaMap::new().with_entity(user());
        assert!(schema.find_entity("User").is_some());
        assert!(schema.find_entity("user").is_none());
        assert!(schema.find_entity("Missing").is_none());
    }

    #[test]
    fn properties_keep_declaration_order() {
        let e = user();
        assert_eq!(e.property_count(), 2);
        assert_eq!(e.property_at(0).unwrap().name(), "id");
        assert_eq!(e.property_at(1).unwrap().name(), "name");
        assert!(e.property_at(2).is_none());
    }

    #[test]
    fn embedded_property_references_entity() {
        let p = Property::embedded("address", "Address");
        assert!(p.is_embedded());
        assert_eq!(p.referenced_entity(), Some("Address"));

        let plain = Property::new("id", "id");
        assert!(!plain.is_embedded());
        assert_eq!(plain.referenced_entity(), None);
    }
}
