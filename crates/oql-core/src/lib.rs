//! # oql-core
//!
//! An object-query-language front-end: parses Hibernate-style query strings
//! phrased in terms of entity and property names and emits equivalent SQL
//! phrased in terms of tables and columns, together with a bound-parameter
//! plan.
//!
//! The crate provides:
//! - A hand-written lexer with keyword recognition and multi-character
//!   operator folding
//! - A clause parser resolving entities, aliases and dotted property paths
//!   (including embedded composites) against a caller-supplied [`Schema`]
//! - A precedence-driven WHERE expression reducer
//! - A dialect-aware SQL emitter assigning positional indices to named
//!   parameters
//! - A binding facility applying values through a driver-agnostic
//!   [`StatementWriter`]
//!
//! ## Parsing and emitting
//!
//! ```rust
//! use oql_core::{DefaultDialect, Entity, Property, QueryParser, SchemaMap};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = SchemaMap::new().with_entity(
//!     Entity::new("User", "users")
//!         .with_property(Property::new("id", "id"))
//!         .with_property(Property::new("name", "name")),
//! );
//!
//! let parsed = QueryParser::parse(
//!     "FROM User AS u WHERE u.name LIKE :pattern ORDER BY id DESC",
//!     &schema,
//! )?;
//! let query = parsed.emit(&DefaultDialect::new())?;
//!
//! assert_eq!(
//!     query.sql(),
//!     "SELECT _t1.id, _t1.name FROM users AS _t1 \
//!      WHERE _t1.name LIKE ? ORDER BY _t1.id DESC"
//! );
//! assert_eq!(query.parameter_indices("pattern"), Some(&[1][..]));
//! # Ok(())
//! # }
//! ```
//!
//! ## Binding parameters
//!
//! Each named parameter occurrence becomes a `?` placeholder with a 1-based
//! positional index. Values are bound by name and applied through a
//! [`StatementWriter`] implemented over the database driver:
//!
//! ```rust
//! use oql_core::{
//!     DefaultDialect, Entity, Property, QueryParser, SchemaMap,
//!     StatementWriter, Value,
//! };
//!
//! struct PrintWriter;
//! impl StatementWriter for PrintWriter {
//!     fn set_value(&mut self, index: usize, value: &Value) {
//!         println!("bind {index} = {value:?}");
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = SchemaMap::new().with_entity(
//!     Entity::new("User", "users").with_property(Property::new("id", "id")),
//! );
//! let query = QueryParser::parse("FROM User WHERE id = :Id", &schema)?
//!     .emit(&DefaultDialect::new())?;
//!
//! let mut values = query.bind();
//! values.set("Id", 42_i64)?;
//! values.apply(&mut PrintWriter)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Scope
//!
//! Queries take the form `SELECT items FROM Entity [AS alias] [WHERE expr]
//! [ORDER BY items]` over a single entity. JOINs, sub-selects, grouping,
//! aggregates and DML are out of scope, as are connection handling and
//! result hydration; the engine is a pure function from source and schema
//! to SQL text.

pub mod bind;
pub mod dialect;
mod emit;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod query;
pub mod schema;

pub use bind::{ParameterValues, StatementWriter, ToValue, Value};
pub use dialect::{DefaultDialect, Dialect};
pub use error::{BindError, LexicalError, ParseError, SyntaxError};
pub use lexer::{Keyword, Lexer, Op, Token, TokenKind};
pub use parser::{FromItem, OrderByItem, ParsedStructure, QueryParser, SelectItem};
pub use query::ParsedQuery;
pub use schema::{Entity, Property, Schema, SchemaMap};
