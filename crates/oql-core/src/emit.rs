//! SQL emission.
//!
//! Walks the parsed clause structures and the WHERE tree, rendering SQL
//! with the dialect's quoting rules and assigning positional indices to
//! named parameters in left-to-right emission order.

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::SyntaxError;
use crate::lexer::{Op, Token, TokenKind};
use crate::parser::ParsedStructure;
use crate::query::ParsedQuery;

impl<'s> ParsedStructure<'s> {
    /// Emits SQL for this query using the given dialect.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] when the WHERE tree contains an operator
    /// the emitter does not support (a raw `IN` or `IS`).
    pub fn emit(&self, dialect: &dyn Dialect) -> Result<ParsedQuery<'s>, SyntaxError> {
        let mut query = ParsedQuery::new(self.source.clone());
        let mut sql = String::from("SELECT ");

        let Some(root) = self.from_items.first() else {
            return Err(SyntaxError::new("query has no FROM item", 0, &self.source));
        };

        if self.select_items.len() == 1 && self.select_items[0].property.is_none() {
            let item = &self.from_items[self.select_items[0].from_item];
            for (n, prop) in item.entity.properties().iter().enumerate() {
                if n > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&item.sql_alias);
                sql.push('.');
                sql.push_str(&dialect.quote_identifier(prop.column_name()));
            }
            query.entity = Some(item.entity);
            query.col_count = item.entity.property_count();
        } else {
            for (n, select) in self.select_items.iter().enumerate() {
                let Some(prop) = select.property else {
                    return Err(SyntaxError::new(
                        "whole-entity projection cannot be combined with other select items",
                        0,
                        &self.source,
                    ));
                };
                if n > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&self.from_items[select.from_item].sql_alias);
                sql.push('.');
                sql.push_str(&dialect.quote_identifier(prop.column_name()));
            }
            query.col_count = self.select_items.len();
        }

        sql.push_str(" FROM ");
        sql.push_str(&dialect.quote_identifier(root.entity.table_name()));
        sql.push_str(" AS ");
        sql.push_str(&root.sql_alias);

        if let Some(tree) = &self.where_tree {
            sql.push_str(" WHERE ");
            self.emit_expr(tree, 0, &mut sql, &mut query, dialect)?;
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            for (n, item) in self.order_by.iter().enumerate() {
                if n > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&self.from_items[item.from_item].sql_alias);
                sql.push('.');
                sql.push_str(&dialect.quote_identifier(item.property.column_name()));
                if !item.ascending {
                    sql.push_str(" DESC");
                }
            }
        }

        query.sql = sql;
        debug!(sql = query.sql(), params = query.param_count(), "emitted SQL");
        Ok(query)
    }

    /// Renders one expression node. `parent_prec` is the precedence of the
    /// enclosing operator; a node wraps itself in parentheses when it binds
    /// looser than its parent.
    fn emit_expr(
        &self,
        tok: &Token<'s>,
        parent_prec: u8,
        out: &mut String,
        query: &mut ParsedQuery<'s>,
        dialect: &dyn Dialect,
    ) -> Result<(), SyntaxError> {
        match tok.kind() {
            TokenKind::Number => out.push_str(tok.text()),
            TokenKind::Str => out.push_str(&dialect.quote_string(tok.text())),
            TokenKind::Param => {
                out.push('?');
                query.add_param(tok.text());
            }
            TokenKind::Field => {
                let item = tok
                    .from_item
                    .and_then(|i| self.from_items.get(i))
                    .ok_or_else(|| {
                        SyntaxError::new("unresolved field", tok.pos(), &self.source)
                    })?;
                let prop = tok.property.ok_or_else(|| {
                    SyntaxError::new("unresolved field", tok.pos(), &self.source)
                })?;
                out.push_str(&item.sql_alias);
                out.push('.');
                out.push_str(&dialect.quote_identifier(prop.column_name()));
            }
            TokenKind::OpExpr => self.emit_op(tok, parent_prec, out, query, dialect)?,
            _ => {
                return Err(SyntaxError::new(
                    format!("unexpected `{}` in expression", tok.text()),
                    tok.pos(),
                    &self.source,
                ));
            }
        }
        Ok(())
    }

    fn emit_op(
        &self,
        tok: &Token<'s>,
        parent_prec: u8,
        out: &mut String,
        query: &mut ParsedQuery<'s>,
        dialect: &dyn Dialect,
    ) -> Result<(), SyntaxError> {
        let Some(op) = tok.op_tag() else {
            return Err(SyntaxError::new(
                "malformed operator expression",
                tok.pos(),
                &self.source,
            ));
        };
        if matches!(op, Op::In | Op::Is) {
            return Err(SyntaxError::new(
                format!("operator `{}` is not supported", op.sql()),
                tok.pos(),
                &self.source,
            ));
        }

        let prec = op.precedence();
        let wrap = prec < parent_prec;
        if wrap {
            out.push('(');
        }
        match (op, tok.children.as_slice()) {
            (Op::Not, [operand]) => {
                out.push_str("NOT ");
                self.emit_expr(operand, prec, out, query, dialect)?;
            }
            (Op::UnaryPlus | Op::UnaryMinus, [operand]) => {
                out.push_str(op.sql());
                self.emit_expr(operand, prec, out, query, dialect)?;
            }
            (Op::IsNull | Op::IsNotNull, [operand]) => {
                self.emit_expr(operand, prec, out, query, dialect)?;
                out.push(' ');
                out.push_str(op.sql());
            }
            (Op::Between, [operand, low, high]) => {
                self.emit_expr(operand, prec, out, query, dialect)?;
                out.push_str(" BETWEEN ");
                self.emit_expr(low, prec, out, query, dialect)?;
                out.push_str(" AND ");
                self.emit_expr(high, prec, out, query, dialect)?;
            }
            (_, [left, right]) => {
                self.emit_expr(left, prec, out, query, dialect)?;
                out.push(' ');
                out.push_str(op.sql());
                out.push(' ');
                self.emit_expr(right, prec, out, query, dialect)?;
            }
            _ => {
                return Err(SyntaxError::new(
                    "malformed operator expression",
                    tok.pos(),
                    &self.source,
                ));
            }
        }
        if wrap {
            out.push(')');
        }
        Ok(())
    }
}
