//! The emitted query.

use core::fmt;

use indexmap::IndexMap;

use crate::bind::ParameterValues;
use crate::schema::Entity;

/// A fully translated query: the SQL text plus the positional plan for its
/// named parameters.
///
/// Self-contained and immutable after emission; safe to share across
/// threads for read-only use.
#[derive(Debug, Clone)]
pub struct ParsedQuery<'s> {
    oql: String,
    pub(crate) sql: String,
    params: IndexMap<String, Vec<usize>>,
    param_count: usize,
    pub(crate) entity: Option<&'s Entity>,
    pub(crate) col_count: usize,
}

impl<'s> ParsedQuery<'s> {
    /// Creates an empty query plan for the given source.
    #[must_use]
    pub fn new(oql: impl Into<String>) -> Self {
        Self {
            oql: oql.into(),
            sql: String::new(),
            params: IndexMap::new(),
            param_count: 0,
            entity: None,
            col_count: 0,
        }
    }

    /// Records one occurrence of a named parameter, assigning the next
    /// 1-based positional index. Repeated names accumulate indices.
    pub fn add_param(&mut self, name: &str) -> usize {
        self.param_count += 1;
        self.params
            .entry(name.to_string())
            .or_default()
            .push(self.param_count);
        self.param_count
    }

    /// Returns the original query source.
    #[must_use]
    pub fn oql(&self) -> &str {
        &self.oql
    }

    /// Returns the emitted SQL.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parameter names in first-occurrence order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Returns the 1-based positional indices recorded for a parameter.
    #[must_use]
    pub fn parameter_indices(&self, name: &str) -> Option<&[usize]> {
        self.params.get(name).map(Vec::as_slice)
    }

    /// Returns the total number of `?` placeholders in the SQL.
    #[must_use]
    pub const fn param_count(&self) -> usize {
        self.param_count
    }

    /// Returns the projected entity for whole-entity projections.
    #[must_use]
    pub const fn entity(&self) -> Option<&'s Entity> {
        self.entity
    }

    /// Returns the number of projected columns.
    #[must_use]
    pub const fn col_count(&self) -> usize {
        self.col_count
    }

    /// Starts binding values to the query's named parameters.
    #[must_use]
    pub fn bind(&self) -> ParameterValues {
        ParameterValues::new(&self.oql, self.params.clone())
    }
}

impl fmt::Display for ParsedQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
