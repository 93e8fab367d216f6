//! WHERE-clause expression reduction.
//!
//! The clause's tokens are wrapped in a synthetic root and rewritten in
//! place by a fixed sequence of passes: field resolution, IS [NOT] NULL
//! folding, unary plus/minus disambiguation, bracket folding, precedence-
//! driven operator folding, and bracket elision. Operator selection is a
//! linear scan per reduction (highest precedence wins, leftmost among
//! equals); the tie-breaking is part of the language definition, so no
//! cleverer scheme is used here.

use crate::error::SyntaxError;
use crate::lexer::{Keyword, Op, Token, TokenKind};
use crate::schema::Schema;

use super::core::FromItem;

/// Runs every pass over the synthetic root node.
pub(crate) fn reduce<'s>(
    root: &mut Token<'s>,
    from_items: &[FromItem<'s>],
    schema: &'s dyn Schema,
    source: &str,
) -> Result<(), SyntaxError> {
    resolve_fields(&mut root.children, from_items, schema, source)?;
    fold_is_null(&mut root.children);
    mark_unary(root);
    fold_brackets(root, source)?;
    fold_operators(root, source)?;
    elide_braces(root);
    Ok(())
}

/// Collapses each maximal `Ident (. Ident)*` or `Alias (. Ident)*` chain
/// into a single Field token, recursing through embedded properties.
fn resolve_fields<'s>(
    children: &mut Vec<Token<'s>>,
    from_items: &[FromItem<'s>],
    schema: &'s dyn Schema,
    source: &str,
) -> Result<(), SyntaxError> {
    let err = |message: String, pos: usize| SyntaxError::new(message, pos, source);
    let is_dot = |t: Option<&Token<'_>>| t.is_some_and(|t| t.kind == TokenKind::Dot);
    let mut i = 0;

    while i < children.len() {
        if !matches!(children[i].kind, TokenKind::Alias | TokenKind::Ident) {
            i += 1;
            continue;
        }
        let head_pos = children[i].pos;
        let mut path = children[i].text.clone();
        let mut end = i + 1;

        // Resolve the head to (from item, first property).
        let (from_item, mut property) = if children[i].kind == TokenKind::Alias {
            let index = children[i]
                .from_item
                .ok_or_else(|| err("unresolved alias".into(), head_pos))?;
            if !is_dot(children.get(end)) {
                return Err(err(
                    format!("property expected after alias `{path}`"),
                    head_pos,
                ));
            }
            let name = children.get(end + 1).filter(|t| t.kind == TokenKind::Ident);
            let Some(name) = name else {
                return Err(err("property name expected after `.`".into(), children[end].pos));
            };
            let entity = from_items[index].entity;
            let property = entity.find_property(&name.text).ok_or_else(|| {
                err(
                    format!(
                        "property `{}` not found in entity `{}`",
                        name.text,
                        entity.name()
                    ),
                    name.pos,
                )
            })?;
            path.push('.');
            path.push_str(&name.text);
            end += 2;
            (index, property)
        } else {
            let entity = from_items[0].entity;
            let property = entity.find_property(&path).ok_or_else(|| {
                err(
                    format!("property `{path}` not found in entity `{}`", entity.name()),
                    head_pos,
                )
            })?;
            (0, property)
        };

        // Follow further names through embedded composites.
        while is_dot(children.get(end)) {
            let dot_pos = children[end].pos;
            if !property.is_embedded() {
                return Err(err(
                    format!("property `{path}` is not embedded"),
                    dot_pos,
                ));
            }
            let name = children.get(end + 1).filter(|t| t.kind == TokenKind::Ident);
            let Some(name) = name else {
                return Err(err("property name expected after `.`".into(), dot_pos));
            };
            let referenced = property.referenced_entity().unwrap_or_default();
            let entity = schema.find_entity(referenced).ok_or_else(|| {
                err(
                    format!("entity `{referenced}` referenced by `{path}` not found"),
                    dot_pos,
                )
            })?;
            property = entity.find_property(&name.text).ok_or_else(|| {
                err(
                    format!(
                        "property `{}` not found in entity `{}`",
                        name.text,
                        entity.name()
                    ),
                    name.pos,
                )
            })?;
            path.push('.');
            path.push_str(&name.text);
            end += 2;
        }

        let mut field = Token::new(TokenKind::Field, head_pos, path);
        field.from_item = Some(from_item);
        field.property = Some(property);
        children.splice(i..end, [field]);
        i += 1;
    }
    Ok(())
}

/// Folds `IS NULL` pairs and `IS NOT NULL` triples into single postfix
/// operator tokens. Scans right to left so adjacent occurrences fold
/// cleanly; a raw `IS` with anything else after it is left in place for the
/// emitter to reject.
fn fold_is_null(children: &mut Vec<Token<'_>>) {
    let mut i = children.len();
    while i > 0 {
        i -= 1;
        if !children[i].is_op(Op::Is) {
            continue;
        }
        let pos = children[i].pos;
        if children
            .get(i + 1)
            .is_some_and(|t| t.is_keyword(Keyword::Null))
        {
            children.splice(i..i + 2, [Token::operator(pos, Op::IsNull, "IS NULL")]);
        } else if children.get(i + 1).is_some_and(|t| t.is_op(Op::Not))
            && children
                .get(i + 2)
                .is_some_and(|t| t.is_keyword(Keyword::Null))
        {
            children.splice(i..i + 3, [Token::operator(pos, Op::IsNotNull, "IS NOT NULL")]);
        }
    }
}

/// Re-tags `+` and `-` as unary when nothing expression-bearing precedes
/// them. A close bracket also ends an expression; brackets are folded in a
/// later pass.
fn mark_unary(tok: &mut Token<'_>) {
    for child in &mut tok.children {
        mark_unary(child);
    }
    for i in 0..tok.children.len() {
        if tok.children[i].kind != TokenKind::Operator {
            continue;
        }
        let unary = match tok.children[i].op {
            Some(Op::Add) => Op::UnaryPlus,
            Some(Op::Sub) => Op::UnaryMinus,
            _ => continue,
        };
        let follows_expression = i > 0
            && (tok.children[i - 1].is_expression()
                || tok.children[i - 1].kind == TokenKind::CloseParen);
        if !follows_expression {
            tok.children[i].op = Some(unary);
        }
    }
}

/// Repeatedly folds the innermost bracket pair (the last `(` preceding the
/// first `)`) into a Braces node.
fn fold_brackets<'s>(tok: &mut Token<'s>, source: &str) -> Result<(), SyntaxError> {
    loop {
        let Some(close) = tok
            .children
            .iter()
            .position(|t| t.kind == TokenKind::CloseParen)
        else {
            if let Some(open) = tok
                .children
                .iter()
                .find(|t| t.kind == TokenKind::OpenParen)
            {
                return Err(SyntaxError::new("unmatched `(`", open.pos, source));
            }
            return Ok(());
        };
        let open = tok.children[..close]
            .iter()
            .rposition(|t| t.kind == TokenKind::OpenParen)
            .ok_or_else(|| SyntaxError::new("unmatched `)`", tok.children[close].pos, source))?;

        let inner: Vec<Token<'s>> = tok.children.drain(open + 1..close).collect();
        let pos = tok.children[open].pos;
        tok.children
            .splice(open..open + 2, [Token::braces(pos, inner)]);
    }
}

/// Reduces operators by precedence, highest first and leftmost among
/// equals, until none remain at this level. Recurses into compound
/// children first.
fn fold_operators<'s>(tok: &mut Token<'s>, source: &str) -> Result<(), SyntaxError> {
    for child in &mut tok.children {
        if matches!(child.kind, TokenKind::Braces | TokenKind::Expr) {
            fold_operators(child, source)?;
        }
    }
    loop {
        let mut best: Option<(usize, u8)> = None;
        for (i, t) in tok.children.iter().enumerate() {
            if t.kind == TokenKind::Operator {
                let p = t.op.map_or(0, |o| o.precedence());
                if best.map_or(true, |(_, bp)| p > bp) {
                    best = Some((i, p));
                }
            }
        }
        let Some((i, _)) = best else {
            return Ok(());
        };
        reduce_operator(tok, i, source)?;
    }
}

/// Reduces the operator at `index`, consuming its operands.
fn reduce_operator<'s>(
    parent: &mut Token<'s>,
    index: usize,
    source: &str,
) -> Result<(), SyntaxError> {
    let pos = parent.children[index].pos;
    let Some(op) = parent.children[index].op else {
        return Err(SyntaxError::new("malformed operator token", pos, source));
    };
    let err = |message: String| SyntaxError::new(message, pos, source);
    let expr_at =
        |children: &[Token<'s>], i: usize| children.get(i).is_some_and(Token::is_expression);

    if op.is_prefix() {
        if !expr_at(&parent.children, index + 1) {
            return Err(err(format!("operand expected after `{}`", op.sql())));
        }
        let operand = parent.children.remove(index + 1);
        parent.children[index] = Token::op_expr(pos, op, vec![operand]);
    } else if op.is_postfix() {
        if index == 0 || !parent.children[index - 1].is_expression() {
            return Err(err(format!("operand expected before `{}`", op.sql())));
        }
        let operand = parent.children.remove(index - 1);
        parent.children[index - 1] = Token::op_expr(pos, op, vec![operand]);
    } else if op == Op::Between {
        if index == 0 || !parent.children[index - 1].is_expression() {
            return Err(err("operand expected before `BETWEEN`".into()));
        }
        if !expr_at(&parent.children, index + 1) {
            return Err(err("operand expected after `BETWEEN`".into()));
        }
        if !parent
            .children
            .get(index + 2)
            .is_some_and(|t| t.is_op(Op::And))
        {
            return Err(err("`AND` expected between BETWEEN bounds".into()));
        }
        if !expr_at(&parent.children, index + 3) {
            return Err(err("operand expected after `AND`".into()));
        }
        let high = parent.children.remove(index + 3);
        parent.children.remove(index + 2); // the AND
        let low = parent.children.remove(index + 1);
        let operand = parent.children.remove(index - 1);
        parent.children[index - 1] = Token::op_expr(pos, op, vec![operand, low, high]);
    } else {
        if index == 0 || !parent.children[index - 1].is_expression() {
            return Err(err(format!("operand expected before `{}`", op.sql())));
        }
        if !expr_at(&parent.children, index + 1) {
            return Err(err(format!("operand expected after `{}`", op.sql())));
        }
        let right = parent.children.remove(index + 1);
        let left = parent.children.remove(index - 1);
        parent.children[index - 1] = Token::op_expr(pos, op, vec![left, right]);
    }
    Ok(())
}

/// Replaces every single-child Braces node with its child, bottom-up.
/// Multi-child groups (bracketed lists) are kept as-is.
fn elide_braces(tok: &mut Token<'_>) {
    for child in &mut tok.children {
        elide_braces(child);
    }
    for child in &mut tok.children {
        if child.kind == TokenKind::Braces && child.children.len() == 1 {
            let inner = child.children.remove(0);
            *child = inner;
        }
    }
}
