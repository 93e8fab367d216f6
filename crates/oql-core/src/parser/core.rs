//! Clause-level parsing: splitting the token stream into clauses and
//! interpreting FROM, SELECT and ORDER BY against the schema.

use std::ops::Range;

use tracing::debug;

use crate::error::{ParseError, SyntaxError};
use crate::lexer::{Keyword, Lexer, Token, TokenKind};
use crate::schema::{Entity, Property, Schema};

use super::expr;

/// One entry of the FROM clause.
///
/// Created by the FROM parser and immutable afterwards; tokens and clause
/// items refer to it by index.
#[derive(Debug, Clone)]
pub struct FromItem<'s> {
    /// The entity name as written in the query.
    pub entity_name: String,
    /// The resolved entity descriptor.
    pub entity: &'s Entity,
    /// The user-supplied alias, if any.
    pub alias: Option<String>,
    /// The synthesized SQL table alias (`_t1`, `_t2`, …).
    pub sql_alias: String,
}

/// One entry of the SELECT clause. A missing property means "project all
/// columns of the entity".
#[derive(Debug, Clone, Copy)]
pub struct SelectItem<'s> {
    /// Index of the projected FROM item.
    pub from_item: usize,
    /// The projected property, or `None` for a whole-entity projection.
    pub property: Option<&'s Property>,
}

/// One entry of the ORDER BY clause.
#[derive(Debug, Clone, Copy)]
pub struct OrderByItem<'s> {
    /// Index of the FROM item the property belongs to.
    pub from_item: usize,
    /// The resolved property.
    pub property: &'s Property,
    /// Sort direction; ascending unless DESC was written.
    pub ascending: bool,
}

/// The outcome of a parse: resolved clause structures plus the reduced
/// WHERE tree, ready for SQL emission.
#[derive(Debug)]
pub struct ParsedStructure<'s> {
    pub(crate) source: String,
    pub(crate) from_items: Vec<FromItem<'s>>,
    pub(crate) select_items: Vec<SelectItem<'s>>,
    pub(crate) order_by: Vec<OrderByItem<'s>>,
    pub(crate) where_tree: Option<Token<'s>>,
}

impl<'s> ParsedStructure<'s> {
    /// Returns the original query source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the FROM items.
    #[must_use]
    pub fn from_items(&self) -> &[FromItem<'s>] {
        &self.from_items
    }

    /// Returns the SELECT items (the implied whole-entity projection when
    /// the query has no SELECT clause).
    #[must_use]
    pub fn select_items(&self) -> &[SelectItem<'s>] {
        &self.select_items
    }

    /// Returns the ORDER BY items.
    #[must_use]
    pub fn order_by_items(&self) -> &[OrderByItem<'s>] {
        &self.order_by
    }

    /// Returns the distinct named parameters of the WHERE clause in source
    /// order.
    #[must_use]
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if let Some(tree) = &self.where_tree {
            collect_params(tree, &mut names);
        }
        names
    }
}

fn collect_params<'a>(tok: &'a Token<'_>, names: &mut Vec<&'a str>) {
    if tok.kind() == TokenKind::Param && !names.contains(&tok.text()) {
        names.push(tok.text());
    }
    for child in &tok.children {
        collect_params(child, names);
    }
}

/// Clause ranges over the token stream, keyword tokens excluded.
struct Clauses {
    select: Option<Range<usize>>,
    from: Range<usize>,
    where_clause: Option<Range<usize>>,
    order_by: Option<Range<usize>>,
}

/// The query parser.
///
/// Owns the token array exclusively for the duration of the parse; tokens
/// are re-tagged and folded in place and never exposed to consumers.
pub struct QueryParser<'s> {
    schema: &'s dyn Schema,
    source: String,
    tokens: Vec<Token<'s>>,
    from_items: Vec<FromItem<'s>>,
}

impl<'s> QueryParser<'s> {
    /// Parses a query against the given schema.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Lexical`] when tokenization fails and
    /// [`ParseError::Syntax`] for structural violations, unknown entities,
    /// and unknown properties.
    pub fn parse(source: &str, schema: &'s dyn Schema) -> Result<ParsedStructure<'s>, ParseError> {
        debug!(query = source, "parsing query");
        let tokens = Lexer::new(source).tokenize()?;
        let mut parser = Self {
            schema,
            source: source.to_string(),
            tokens,
            from_items: Vec::new(),
        };
        let clauses = parser.split_clauses()?;
        parser.parse_from(&clauses.from)?;
        let select_items = parser.parse_select(clauses.select.as_ref())?;
        let order_by = parser.parse_order_by(clauses.order_by.as_ref())?;
        let where_tree = match clauses.where_clause {
            Some(range) => Some(parser.parse_where(range)?),
            None => None,
        };
        Ok(ParsedStructure {
            source: parser.source,
            from_items: parser.from_items,
            select_items,
            order_by,
            where_tree,
        })
    }

    fn err(&self, message: impl Into<String>, pos: usize) -> SyntaxError {
        SyntaxError::new(message, pos, &self.source)
    }

    fn token_err(&self, message: impl Into<String>, index: usize) -> SyntaxError {
        let pos = self
            .tokens
            .get(index)
            .map_or(self.source.len(), Token::pos);
        self.err(message, pos)
    }

    /// Locates the top-level clause keywords and computes clause ranges,
    /// validating their relative ordering.
    fn split_clauses(&self) -> Result<Clauses, SyntaxError> {
        let find = |kw: Keyword| self.tokens.iter().position(|t| t.is_keyword(kw));
        let len = self.tokens.len();

        let select = find(Keyword::Select);
        let from = find(Keyword::From).ok_or_else(|| self.err("FROM clause expected", 0))?;
        let where_kw = find(Keyword::Where);
        let order = find(Keyword::Order);

        match select {
            Some(s) => {
                if s > from {
                    return Err(self.token_err("SELECT must precede FROM", s));
                }
                if s != 0 {
                    return Err(self.token_err("query must start with SELECT or FROM", 0));
                }
                if from <= s + 1 {
                    return Err(self.token_err("SELECT clause is empty", from));
                }
            }
            None => {
                if from != 0 {
                    return Err(self.token_err("query must start with SELECT or FROM", 0));
                }
            }
        }

        if let Some(w) = where_kw {
            if w < from {
                return Err(self.token_err("WHERE must follow FROM", w));
            }
        }
        if let Some(o) = order {
            if o < from {
                return Err(self.token_err("ORDER BY must follow FROM", o));
            }
            if let Some(w) = where_kw {
                if w > o {
                    return Err(self.token_err("WHERE must precede ORDER BY", w));
                }
            }
            if !self
                .tokens
                .get(o + 1)
                .is_some_and(|t| t.is_keyword(Keyword::By))
            {
                return Err(self.token_err("BY expected after ORDER", o + 1));
            }
            if o + 2 >= len {
                return Err(self.token_err("ORDER BY clause is empty", o + 1));
            }
        }

        let from_end = where_kw.unwrap_or(len).min(order.unwrap_or(len));
        if from + 1 >= from_end {
            return Err(self.token_err("entity name expected after FROM", from));
        }

        let where_clause = match where_kw {
            Some(w) => {
                let end = order.unwrap_or(len);
                if w + 1 >= end {
                    return Err(self.token_err("WHERE clause is empty", w));
                }
                Some(w + 1..end)
            }
            None => None,
        };

        Ok(Clauses {
            select: select.map(|s| s + 1..from),
            from: from + 1..from_end,
            where_clause,
            order_by: order.map(|o| o + 2..len),
        })
    }

    /// Parses `Entity`, `Entity alias` or `Entity AS alias`, resolves the
    /// entity, and re-tags every matching identifier in the whole source.
    fn parse_from(&mut self, range: &Range<usize>) -> Result<(), SyntaxError> {
        let toks = &self.tokens[range.clone()];
        let head = &toks[0];
        if head.kind() != TokenKind::Ident {
            return Err(self.err("entity name expected", head.pos()));
        }
        let entity_name = head.text().to_string();
        let entity_pos = head.pos();

        let alias = match toks.len() {
            1 => None,
            2 => {
                if toks[1].kind() != TokenKind::Ident {
                    return Err(self.err("alias expected", toks[1].pos()));
                }
                Some(toks[1].text().to_string())
            }
            3 => {
                if !toks[1].is_keyword(Keyword::As) || toks[2].kind() != TokenKind::Ident {
                    return Err(self.err("AS alias expected", toks[1].pos()));
                }
                Some(toks[2].text().to_string())
            }
            _ => {
                return Err(self.err("single entity expected in FROM clause", toks[3].pos()));
            }
        };

        let schema = self.schema;
        let entity = schema
            .find_entity(&entity_name)
            .ok_or_else(|| self.err(format!("entity `{entity_name}` not found"), entity_pos))?;

        let index = self.from_items.len();
        self.from_items.push(FromItem {
            entity_name: entity_name.clone(),
            entity,
            alias: alias.clone(),
            sql_alias: format!("_t{}", index + 1),
        });

        for tok in &mut self.tokens {
            if tok.kind == TokenKind::Ident && tok.text == entity_name {
                tok.kind = TokenKind::Entity;
                tok.entity = Some(entity);
            }
        }
        if let Some(alias) = &alias {
            for tok in &mut self.tokens {
                if tok.kind == TokenKind::Ident && tok.text == *alias {
                    tok.kind = TokenKind::Alias;
                    tok.from_item = Some(index);
                }
            }
        }
        Ok(())
    }

    /// Splits a clause range into comma-separated item slices, rejecting
    /// empty items.
    fn split_items(&self, range: &Range<usize>) -> Result<Vec<Range<usize>>, SyntaxError> {
        let mut items = Vec::new();
        let mut start = range.start;
        for i in range.clone() {
            if self.tokens[i].kind() == TokenKind::Comma {
                if i == start {
                    return Err(self.token_err("item expected before `,`", i));
                }
                items.push(start..i);
                start = i + 1;
            }
        }
        if start >= range.end {
            return Err(self.token_err("item expected after `,`", range.end));
        }
        items.push(start..range.end);
        Ok(items)
    }

    /// Resolves `property` or `alias . property` against the FROM items.
    fn resolve_item_path(
        &self,
        toks: &[Token<'s>],
        what: &str,
    ) -> Result<(usize, &'s Property), SyntaxError> {
        let (from_item, name_tok) = match toks {
            [p] if p.kind() == TokenKind::Ident => (0, p),
            [a, d, p]
                if a.kind() == TokenKind::Alias
                    && d.kind() == TokenKind::Dot
                    && p.kind() == TokenKind::Ident =>
            {
                let index = a
                    .from_item
                    .ok_or_else(|| self.err("unresolved alias", a.pos()))?;
                (index, p)
            }
            _ => {
                let pos = toks.first().map_or(self.source.len(), Token::pos);
                return Err(self.err(format!("property or alias expected in {what}"), pos));
            }
        };
        let entity = self.from_items[from_item].entity;
        let property = entity.find_property(name_tok.text()).ok_or_else(|| {
            self.err(
                format!(
                    "property `{}` not found in entity `{}`",
                    name_tok.text(),
                    entity.name()
                ),
                name_tok.pos(),
            )
        })?;
        Ok((from_item, property))
    }

    /// Parses the SELECT clause, or synthesizes the default whole-entity
    /// projection when the clause is absent.
    fn parse_select(
        &self,
        range: Option<&Range<usize>>,
    ) -> Result<Vec<SelectItem<'s>>, SyntaxError> {
        let Some(range) = range else {
            return Ok(vec![SelectItem {
                from_item: 0,
                property: None,
            }]);
        };

        let mut items = Vec::new();
        for item in self.split_items(range)? {
            let toks = &self.tokens[item];
            match toks {
                [a] if a.kind() == TokenKind::Alias => {
                    let from_item = a
                        .from_item
                        .ok_or_else(|| self.err("unresolved alias", a.pos()))?;
                    items.push(SelectItem {
                        from_item,
                        property: None,
                    });
                }
                _ => {
                    let (from_item, property) = self.resolve_item_path(toks, "SELECT clause")?;
                    items.push(SelectItem {
                        from_item,
                        property: Some(property),
                    });
                }
            }
        }

        let whole_count = items.iter().filter(|i| i.property.is_none()).count();
        if whole_count > 0 && items.len() > 1 {
            return Err(self.token_err(
                "whole-entity projection cannot be combined with other select items",
                range.start,
            ));
        }
        Ok(items)
    }

    /// Parses the ORDER BY clause.
    fn parse_order_by(
        &self,
        range: Option<&Range<usize>>,
    ) -> Result<Vec<OrderByItem<'s>>, SyntaxError> {
        let Some(range) = range else {
            return Ok(Vec::new());
        };

        let mut items = Vec::new();
        for item in self.split_items(range)? {
            let toks = &self.tokens[item];
            let (toks, ascending) = match toks.last() {
                Some(t) if t.is_keyword(Keyword::Asc) => (&toks[..toks.len() - 1], true),
                Some(t) if t.is_keyword(Keyword::Desc) => (&toks[..toks.len() - 1], false),
                _ => (toks, true),
            };
            let (from_item, property) = self.resolve_item_path(toks, "ORDER BY clause")?;
            items.push(OrderByItem {
                from_item,
                property,
                ascending,
            });
        }
        Ok(items)
    }

    /// Runs the expression passes over the WHERE range and returns the
    /// reduced tree.
    fn parse_where(&mut self, range: Range<usize>) -> Result<Token<'s>, SyntaxError> {
        let start_pos = self.tokens[range.start].pos();
        let children: Vec<Token<'s>> = self.tokens.drain(range).collect();
        let mut root = Token::new(TokenKind::Expr, start_pos, "");
        root.children = children;
        expr::reduce(&mut root, &self.from_items, self.schema, &self.source)?;

        if root.children.len() != 1 {
            let pos = root.children.get(1).map_or(start_pos, Token::pos);
            return Err(self.err("WHERE clause is not a single expression", pos));
        }
        Ok(root.children.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Property, SchemaMap};

    #[test]
    fn from_clause_retags_entity_and_alias_tokens() {
        let schema = SchemaMap::new().with_entity(
            Entity::new("User", "users").with_property(Property::new("id", "id")),
        );
        let source = "FROM User u WHERE u.id = 1 AND User.id = 1";
        let tokens = Lexer::new(source).tokenize().expect("lexes");
        let mut parser = QueryParser {
            schema: &schema,
            source: source.to_string(),
            tokens,
            from_items: Vec::new(),
        };
        let clauses = parser.split_clauses().expect("clauses split");
        parser.parse_from(&clauses.from).expect("entity resolves");

        let entities: Vec<_> = parser
            .tokens
            .iter()
            .filter(|t| t.kind() == TokenKind::Entity)
            .collect();
        assert_eq!(entities.len(), 2);
        assert!(entities
            .iter()
            .all(|t| t.entity_ref().map(Entity::name) == Some("User")));

        let aliases: Vec<_> = parser
            .tokens
            .iter()
            .filter(|t| t.kind() == TokenKind::Alias)
            .collect();
        assert_eq!(aliases.len(), 2);
        assert!(aliases.iter().all(|t| t.from_item == Some(0)));
        assert_eq!(parser.from_items[0].sql_alias, "_t1");
    }

    #[test]
    fn sql_aliases_are_synthesized_in_sequence() {
        let schema = SchemaMap::new().with_entity(
            Entity::new("User", "users").with_property(Property::new("id", "id")),
        );
        let parsed = QueryParser::parse("FROM User AS u", &schema).expect("parses");
        assert_eq!(parsed.from_items()[0].sql_alias, "_t1");
        assert_eq!(parsed.from_items()[0].alias.as_deref(), Some("u"));
    }
}
