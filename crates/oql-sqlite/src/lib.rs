//! # oql-sqlite
//!
//! SQLite dialect for [`oql-core`](oql_core): double-quoted identifiers and
//! ANSI quote-doubling inside string literals.

mod dialect;

pub use dialect::SqliteDialect;
