#![allow(dead_code)]

use oql_core::{
    DefaultDialect, Entity, ParseError, ParsedQuery, ParsedStructure, Property, QueryParser,
    SchemaMap,
};

/// Test schema: a plain entity, plus an entity with an embedded composite.
pub fn schema() -> SchemaMap {
    SchemaMap::new()
        .with_entity(
            Entity::new("User", "users")
                .with_property(Property::new("id", "id"))
                .with_property(Property::new("name", "name"))
                .with_property(Property::new("flags", "flags")),
        )
        .with_entity(
            Entity::new("Customer", "customers")
                .with_property(Property::new("id", "id"))
                .with_property(Property::new("name", "name"))
                .with_property(Property::embedded("address", "Address")),
        )
        .with_entity(
            Entity::new("Address", "addresses")
                .with_property(Property::new("street", "street"))
                .with_property(Property::new("city", "city"))
                .with_property(Property::new("zip", "zip_code")),
        )
}

pub fn parse<'s>(schema: &'s SchemaMap, source: &str) -> ParsedStructure<'s> {
    QueryParser::parse(source, schema)
        .unwrap_or_else(|e| panic!("failed to parse: {source}\nerror: {e}"))
}

pub fn parse_err(schema: &SchemaMap, source: &str) -> ParseError {
    QueryParser::parse(source, schema)
        .map(|_| ())
        .expect_err(&format!("expected parse error for: {source}"))
}

pub fn emit<'s>(schema: &'s SchemaMap, source: &str) -> ParsedQuery<'s> {
    parse(schema, source)
        .emit(&DefaultDialect::new())
        .unwrap_or_else(|e| panic!("failed to emit: {source}\nerror: {e}"))
}

pub fn sql(schema: &SchemaMap, source: &str) -> String {
    emit(schema, source).sql().to_string()
}
